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

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::common::ProvisionError;

// Account configuration loaded from an OCI-style config file, which is an
// INI-ish file of [PROFILE] sections of key = value lines, conventionally
// at ~/.oci/config:
//
//   [DEFAULT]
//   user=ocid1.user.oc1..aaaa...
//   fingerprint=aa:bb:cc:...
//   key_file=~/.oci/api_key.pem
//   tenancy=ocid1.tenancy.oc1..aaaa...
//   region=uk-london-1
//
#[derive(Clone, Debug)]
pub struct AccountConfig {
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: String,
}

impl AccountConfig {
    pub fn from_file(path: &Path, profile: &str) -> Result<AccountConfig, ProvisionError> {
        if !path.exists() {
            return Err(ProvisionError::ConfigError(format!(
                "Config file does not exist: '{}'.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)?;

        AccountConfig::from_string(&contents, profile)
    }

    pub fn from_string(contents: &str, profile: &str) -> Result<AccountConfig, ProvisionError> {
        let values = parse_profile(contents, profile)?;

        let get_required = |key: &str| -> Result<String, ProvisionError> {
            match values.get(key) {
                Some(val) => Ok(val.to_string()),
                None => Err(ProvisionError::ConfigError(format!(
                    "Config profile '{}' is missing required key: '{}'.",
                    profile, key
                ))),
            }
        };

        let key_file = expand_tilde(&get_required("key_file")?);

        Ok(AccountConfig {
            user: get_required("user")?,
            fingerprint: get_required("fingerprint")?,
            key_file,
            tenancy: get_required("tenancy")?,
            region: get_required("region")?,
        })
    }

    // "keyId" value for request signing, as OCI expects it
    pub fn api_key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }
}

// extracts the key = value pairs of a single [section] from the file contents
fn parse_profile(contents: &str, profile: &str) -> Result<BTreeMap<String, String>, ProvisionError> {
    let mut values = BTreeMap::new();
    let mut in_wanted_section = false;
    let mut seen_section = false;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let section_name = line[1..line.len() - 1].trim();
            in_wanted_section = section_name == profile;
            if in_wanted_section {
                seen_section = true;
            }
            continue;
        }

        if !in_wanted_section {
            continue;
        }

        if let Some(pos) = line.find('=') {
            let key = line[..pos].trim().to_string();
            let value = line[pos + 1..].trim().to_string();
            if !key.is_empty() {
                values.insert(key, value);
            }
        }
    }

    if !seen_section {
        return Err(ProvisionError::ConfigError(format!(
            "Config file has no '{}' profile.",
            profile
        )));
    }

    Ok(values)
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    } else if let Some(remainder) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(remainder);
        }
    }

    PathBuf::from(path)
}

pub fn default_config_path() -> PathBuf {
    expand_tilde("~/.oci/config")
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_CONFIG: &str = r#"
# generated by the console
[DEFAULT]
user=ocid1.user.oc1..aaaabbbb
fingerprint=12:34:56:78:90:ab:cd:ef:12:34:56:78:90:ab:cd:ef
key_file=/home/peter/.oci/api_key.pem
tenancy=ocid1.tenancy.oc1..ccccdddd
region=uk-london-1

[SECONDARY]
user = ocid1.user.oc1..eeeeffff
fingerprint = ab:cd
key_file = /tmp/other_key.pem
tenancy = ocid1.tenancy.oc1..gggghhhh
region = us-ashburn-1
"#;

    #[test]
    fn test_parse_default_profile1() {
        let config = AccountConfig::from_string(TEST_CONFIG, "DEFAULT").unwrap();

        assert_eq!(config.user, "ocid1.user.oc1..aaaabbbb");
        assert_eq!(config.tenancy, "ocid1.tenancy.oc1..ccccdddd");
        assert_eq!(config.region, "uk-london-1");
        assert_eq!(config.key_file, PathBuf::from("/home/peter/.oci/api_key.pem"));
    }

    #[test]
    fn test_parse_other_profile_with_spaces1() {
        let config = AccountConfig::from_string(TEST_CONFIG, "SECONDARY").unwrap();

        assert_eq!(config.user, "ocid1.user.oc1..eeeeffff");
        assert_eq!(config.region, "us-ashburn-1");
    }

    #[test]
    fn test_missing_profile_is_error1() {
        let res = AccountConfig::from_string(TEST_CONFIG, "NO_SUCH_PROFILE");
        assert!(res.is_err());
    }

    #[test]
    fn test_missing_key_is_error1() {
        let partial = "[DEFAULT]\nuser=ocid1.user.oc1..aaaa\n";

        let res = AccountConfig::from_string(partial, "DEFAULT");
        assert!(res.is_err());
        if let Err(err) = res {
            assert!(err.to_string().contains("fingerprint") || err.to_string().contains("key_file"));
        }
    }

    #[test]
    fn test_api_key_id1() {
        let config = AccountConfig::from_string(TEST_CONFIG, "SECONDARY").unwrap();

        assert_eq!(
            config.api_key_id(),
            "ocid1.tenancy.oc1..gggghhhh/ocid1.user.oc1..eeeeffff/ab:cd"
        );
    }

    #[test]
    fn test_expand_tilde_no_tilde1() {
        assert_eq!(expand_tilde("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }
}
