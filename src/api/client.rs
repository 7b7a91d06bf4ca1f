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

use serde_json::Value;
use ureq::Error;

use crate::common::ProvisionError;
use crate::config::AccountConfig;

use super::signer::{RequestSigner, JSON_CONTENT_TYPE};

const API_VERSION: &str = "20160918";

// which regional endpoint a request goes to
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Service {
    Identity,
    Core,
}

impl Service {
    fn host(&self, region: &str) -> String {
        match self {
            Service::Identity => format!("identity.{}.oraclecloud.com", region),
            Service::Core => format!("iaas.{}.oraclecloud.com", region),
        }
    }
}

pub struct ApiClient {
    agent: ureq::Agent,
    signer: RequestSigner,
    region: String,
    tenancy: String,
}

impl ApiClient {
    pub fn from_config(config: &AccountConfig) -> Result<ApiClient, ProvisionError> {
        let signer = RequestSigner::from_config(config)?;

        Ok(ApiClient {
            agent: ureq::agent(),
            signer,
            region: config.region.clone(),
            tenancy: config.tenancy.clone(),
        })
    }

    // the compartment everything gets provisioned into
    pub fn tenancy(&self) -> &str {
        &self.tenancy
    }

    // target is the path (plus any query string) below the API version
    // prefix, i.e. "vcns?compartmentId=..."
    pub fn get(&self, service: Service, target: &str) -> Result<Value, ProvisionError> {
        let host = service.host(&self.region);
        let full_target = format!("/{}/{}", API_VERSION, target);

        let signed = self.signer.sign_get(&host, &full_target)?;

        let resp = self
            .agent
            .get(&format!("https://{}{}", host, full_target))
            .set("date", &signed.date)
            .set("authorization", &signed.authorization)
            .call();

        handle_response(resp)
    }

    pub fn post(&self, service: Service, target: &str, body: &Value) -> Result<Value, ProvisionError> {
        let host = service.host(&self.region);
        let full_target = format!("/{}/{}", API_VERSION, target);
        let body_string = body.to_string();

        let signed = self.signer.sign_post(&host, &full_target, &body_string)?;

        let mut request = self
            .agent
            .post(&format!("https://{}{}", host, full_target))
            .set("date", &signed.date)
            .set("authorization", &signed.authorization)
            .set("content-type", JSON_CONTENT_TYPE);

        if let Some(content_sha256) = &signed.content_sha256 {
            request = request.set("x-content-sha256", content_sha256);
        }

        let resp = request.send_string(&body_string);

        handle_response(resp)
    }
}

fn handle_response(resp: Result<ureq::Response, Error>) -> Result<Value, ProvisionError> {
    match resp {
        Ok(response) => {
            let resp_string = response
                .into_string()
                .map_err(|e| ProvisionError::TransportError(e.to_string()))?;

            serde_json::from_str::<Value>(&resp_string).map_err(|_| {
                ProvisionError::TransportError(format!(
                    "Unexpected non-json response from OCI: {}",
                    resp_string
                ))
            })
        }
        Err(Error::Status(code, response)) => {
            let resp_string = response.into_string().unwrap_or_default();
            let message = extract_service_message(&resp_string);

            if code == 429 {
                return Err(ProvisionError::RateLimited(message));
            }

            Err(ProvisionError::ApiError(code, message))
        }
        Err(e) => Err(ProvisionError::TransportError(e.to_string())),
    }
}

// OCI error bodies are {"code": "...", "message": "..."} - use the message
// when it parses, otherwise fall back to the raw body
fn extract_service_message(resp_string: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(resp_string) {
        if let Some(message) = parsed.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }

    resp_string.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_hosts1() {
        assert_eq!(
            Service::Identity.host("uk-london-1"),
            "identity.uk-london-1.oraclecloud.com"
        );
        assert_eq!(
            Service::Core.host("us-ashburn-1"),
            "iaas.us-ashburn-1.oraclecloud.com"
        );
    }

    #[test]
    fn test_extract_service_message1() {
        let body = r#"{"code": "TooManyRequests", "message": "Too many requests for the user"}"#;
        assert_eq!(extract_service_message(body), "Too many requests for the user");
    }

    #[test]
    fn test_extract_service_message_fallback1() {
        assert_eq!(extract_service_message("<html>gateway error</html>"), "<html>gateway error</html>");

        let no_message = r#"{"code": "NotAuthenticated"}"#;
        assert_eq!(extract_service_message(no_message), no_message);
    }
}
