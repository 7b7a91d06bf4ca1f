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

use serde::Deserialize;

use crate::common::ProvisionError;
use crate::terminal;

use super::client::{ApiClient, Service};

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AvailabilityDomain {
    pub name: String,
}

// fetches the configured account's user record - this doubles as the
// authentication check before any provisioning starts
pub fn get_user(client: &ApiClient, user_id: &str) -> Result<User, ProvisionError> {
    let value = client.get(Service::Identity, &format!("users/{}", user_id))?;

    serde_json::from_value(value)
        .map_err(|e| ProvisionError::TransportError(format!("Unexpected user response from OCI: {}", e)))
}

// lists the availability domains of the tenancy and prints them; an empty
// list means there is nowhere to launch, so that is an error
pub fn fetch_availability_domains(client: &ApiClient) -> Result<Vec<AvailabilityDomain>, ProvisionError> {
    let value = client.get(
        Service::Identity,
        &format!("availabilityDomains/?compartmentId={}", client.tenancy()),
    )?;

    let availability_domains: Vec<AvailabilityDomain> = serde_json::from_value(value).map_err(|e| {
        ProvisionError::TransportError(format!(
            "Unexpected availability domain response from OCI: {}",
            e
        ))
    })?;

    if availability_domains.is_empty() {
        return Err(ProvisionError::ApiError(
            404,
            "No availability domains in user's compartment!".to_string(),
        ));
    }

    println!("{} availability domains detected:", availability_domains.len());
    for availability_domain in &availability_domains {
        println!(
            "  - {}",
            terminal::paint(&availability_domain.name, &[terminal::BRIGHT_YELLOW])
        );
    }

    Ok(availability_domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserialize1() {
        let body = r#"{
            "compartmentId": "ocid1.tenancy.oc1..cccc",
            "id": "ocid1.user.oc1..aaaa",
            "name": "peter@example.com",
            "lifecycleState": "ACTIVE"
        }"#;

        let user: User = serde_json::from_str(body).unwrap();
        assert_eq!(user.name, "peter@example.com");
    }

    #[test]
    fn test_availability_domains_deserialize1() {
        let body = r#"[
            {"compartmentId": "ocid1.tenancy.oc1..cccc", "id": "ocid1.ad.1", "name": "qIZq:UK-LONDON-1-AD-1"},
            {"compartmentId": "ocid1.tenancy.oc1..cccc", "id": "ocid1.ad.2", "name": "qIZq:UK-LONDON-1-AD-2"}
        ]"#;

        let ads: Vec<AvailabilityDomain> = serde_json::from_str(body).unwrap();
        assert_eq!(ads.len(), 2);
        assert_eq!(ads[1].name, "qIZq:UK-LONDON-1-AD-2");
    }
}
