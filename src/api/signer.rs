/*
 Ocivm
 Copyright 2024-2026 Peter Pearson.
 Licensed under the Apache License, Version 2.0 (the "License");
 You may not use this file except in compliance with the License.
 You may obtain a copy of the License at
 http://www.apache.org/licenses/LICENSE-2.0
 Unless required by applicable law or agreed to in writing, software
 distributed under the License is distributed on an "AS IS" BASIS,
 WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 See the License for the specific language governing permissions and
 limitations under the License.
 ---------
*/

// OCI authenticates API requests with draft-cavage HTTP signatures: a fixed
// set of headers is assembled into a signing string, signed with the
// account's RSA API key (RSASSA-PKCS1-v1.5 / SHA-256), and the base64
// signature goes into the Authorization header along with the key id
// ("tenancy/user/fingerprint").

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{PaddingScheme, RsaPrivateKey};
use sha2::{Digest, Sha256};

use crate::common::ProvisionError;
use crate::config::AccountConfig;

const GET_HEADERS: &str = "date (request-target) host";
const POST_HEADERS: &str = "date (request-target) host content-length content-type x-content-sha256";

pub const JSON_CONTENT_TYPE: &str = "application/json";

pub struct RequestSigner {
    key_id: String,
    private_key: RsaPrivateKey,
}

// the extra headers a signed request needs to carry
pub struct SignedHeaders {
    pub date: String,
    pub authorization: String,
    // only for requests with a body
    pub content_sha256: Option<String>,
}

impl RequestSigner {
    pub fn from_config(config: &AccountConfig) -> Result<RequestSigner, ProvisionError> {
        let pem = std::fs::read_to_string(&config.key_file).map_err(|e| {
            ProvisionError::KeyError(format!(
                "Failed to read API key file '{}': {}",
                config.key_file.display(),
                e
            ))
        })?;

        let private_key = load_private_key_pem(&pem)?;

        Ok(RequestSigner {
            key_id: config.api_key_id(),
            private_key,
        })
    }

    pub fn new(key_id: String, private_key: RsaPrivateKey) -> RequestSigner {
        RequestSigner {
            key_id,
            private_key,
        }
    }

    // signs a bodyless (GET) request for the current time
    pub fn sign_get(&self, host: &str, target: &str) -> Result<SignedHeaders, ProvisionError> {
        self.sign("get", host, target, None, &http_date_now())
    }

    // signs a json POST request for the current time
    pub fn sign_post(&self, host: &str, target: &str, body: &str) -> Result<SignedHeaders, ProvisionError> {
        self.sign("post", host, target, Some(body), &http_date_now())
    }

    fn sign(
        &self,
        method: &str,
        host: &str,
        target: &str,
        body: Option<&str>,
        date: &str,
    ) -> Result<SignedHeaders, ProvisionError> {
        let content_sha256 = body.map(|b| base64::encode(Sha256::digest(b.as_bytes())));

        let body_info = match (body, &content_sha256) {
            (Some(b), Some(sha)) => Some((b.len(), sha.as_str())),
            _ => None,
        };

        let signing_string = build_signing_string(method, host, target, date, body_info);

        let digest = Sha256::digest(signing_string.as_bytes());
        let signature = self
            .private_key
            .sign(PaddingScheme::new_pkcs1v15_sign::<Sha256>(), &digest)
            .map_err(|e| ProvisionError::KeyError(format!("Failed to sign request: {}", e)))?;

        let headers_list = if body.is_some() { POST_HEADERS } else { GET_HEADERS };

        let authorization = format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            headers_list,
            base64::encode(&signature)
        );

        Ok(SignedHeaders {
            date: date.to_string(),
            authorization,
            content_sha256,
        })
    }
}

// the canonical string that actually gets signed: one "name: value" line per
// header, in the order of the headers list, joined with newlines
fn build_signing_string(
    method: &str,
    host: &str,
    target: &str,
    date: &str,
    body: Option<(usize, &str)>,
) -> String {
    let mut lines = vec![
        format!("date: {}", date),
        format!("(request-target): {} {}", method, target),
        format!("host: {}", host),
    ];

    if let Some((content_length, content_sha256)) = body {
        lines.push(format!("content-length: {}", content_length));
        lines.push(format!("content-type: {}", JSON_CONTENT_TYPE));
        lines.push(format!("x-content-sha256: {}", content_sha256));
    }

    lines.join("\n")
}

// API key PEMs come in both PKCS#8 ("BEGIN PRIVATE KEY") and the older
// PKCS#1 ("BEGIN RSA PRIVATE KEY") flavours, so sniff the label...
fn load_private_key_pem(pem: &str) -> Result<RsaPrivateKey, ProvisionError> {
    let parsed = if pem.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())
    } else {
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| e.to_string())
    };

    parsed.map_err(|e| ProvisionError::KeyError(format!("Failed to parse API key file: {}", e)))
}

fn http_date_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::PublicKey;

    fn test_key() -> RsaPrivateKey {
        let mut rng = rand::thread_rng();
        RsaPrivateKey::new(&mut rng, 2048).unwrap()
    }

    #[test]
    fn test_signing_string_get1() {
        let signing_string = build_signing_string(
            "get",
            "identity.uk-london-1.oraclecloud.com",
            "/20160918/users/ocid1.user.oc1..aaaa",
            "Thu, 05 Jan 2023 21:31:40 GMT",
            None,
        );

        assert_eq!(
            signing_string,
            "date: Thu, 05 Jan 2023 21:31:40 GMT\n\
             (request-target): get /20160918/users/ocid1.user.oc1..aaaa\n\
             host: identity.uk-london-1.oraclecloud.com"
        );
    }

    #[test]
    fn test_signing_string_post1() {
        let signing_string = build_signing_string(
            "post",
            "iaas.uk-london-1.oraclecloud.com",
            "/20160918/instances",
            "Thu, 05 Jan 2023 21:31:40 GMT",
            Some((2, "RBNvo1WzZ4oRRq0W9+hknpT7T8If536DEMBg9hyq/4o=")),
        );

        assert!(signing_string.contains("(request-target): post /20160918/instances"));
        assert!(signing_string.contains("content-length: 2"));
        assert!(signing_string.contains("content-type: application/json"));
        assert!(signing_string.contains("x-content-sha256: RBNvo1WzZ4oRRq0W9+hknpT7T8If536DEMBg9hyq/4o="));
    }

    #[test]
    fn test_get_signature_verifies1() {
        let private_key = test_key();
        let public_key = private_key.to_public_key();

        let signer = RequestSigner::new("tenancy/user/fp".to_string(), private_key);

        let host = "identity.uk-london-1.oraclecloud.com";
        let target = "/20160918/availabilityDomains/?compartmentId=ocid1.tenancy.oc1..cccc";
        let date = "Thu, 05 Jan 2023 21:31:40 GMT";
        let signed = signer.sign("get", host, target, None, date).unwrap();

        assert_eq!(signed.date, date);
        assert!(signed.content_sha256.is_none());

        // pull the base64 signature back out of the header...
        let marker = "signature=\"";
        let sig_start = signed.authorization.find(marker).unwrap() + marker.len();
        let sig_b64 = &signed.authorization[sig_start..signed.authorization.len() - 1];
        let signature = base64::decode(sig_b64).unwrap();

        let signing_string = build_signing_string("get", host, target, date, None);
        let digest = Sha256::digest(signing_string.as_bytes());

        let res = public_key.verify(
            PaddingScheme::new_pkcs1v15_sign::<Sha256>(),
            &digest,
            &signature,
        );
        assert!(res.is_ok());
    }

    #[test]
    fn test_authorization_header_fields1() {
        let signer = RequestSigner::new("tenancy/user/fp".to_string(), test_key());

        let signed = signer
            .sign("get", "host", "/target", None, "Thu, 05 Jan 2023 21:31:40 GMT")
            .unwrap();

        assert!(signed.authorization.starts_with("Signature version=\"1\""));
        assert!(signed.authorization.contains("keyId=\"tenancy/user/fp\""));
        assert!(signed.authorization.contains("algorithm=\"rsa-sha256\""));
        assert!(signed.authorization.contains("headers=\"date (request-target) host\""));
    }

    #[test]
    fn test_post_includes_content_sha256_header1() {
        let signer = RequestSigner::new("tenancy/user/fp".to_string(), test_key());

        let body = "{}";
        let signed = signer
            .sign("post", "host", "/target", Some(body), "Thu, 05 Jan 2023 21:31:40 GMT")
            .unwrap();

        // base64(sha256("{}"))
        assert_eq!(
            signed.content_sha256.as_deref(),
            Some("RBNvo1WzZ4oRRq0W9+hknpT7T8If536DEMBg9hyq/4o=")
        );
        assert!(signed
            .authorization
            .contains("headers=\"date (request-target) host content-length content-type x-content-sha256\""));
    }

    #[test]
    fn test_load_private_key_bad_pem1() {
        assert!(load_private_key_pem("not a pem at all").is_err());
    }
}
