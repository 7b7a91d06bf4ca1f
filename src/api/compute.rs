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
use serde_json::{json, Value};

use crate::common::ProvisionError;
use crate::terminal;
use crate::terminal::{BOLD, BRIGHT_GREEN, BRIGHT_RED, BRIGHT_YELLOW, CYAN};

use super::client::{ApiClient, Service};

// always-free ARM shape, and the launch template defaults that go with it
pub const SHAPE: &str = "VM.Standard.A1.Flex";
const SHAPE_OCPUS: u32 = 4;
const SHAPE_MEMORY_GBS: u32 = 24;
const BOOT_VOLUME_SIZE_GBS: u32 = 200;
const BOOT_VOLUME_VPUS_PER_GB: u32 = 120;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub display_name: String,
    pub operating_system: String,
}

// everything the caller chooses per launch; the rest of the payload is a
// fixed template
pub struct LaunchRequest<'a> {
    pub availability_domain: &'a str,
    pub display_name: &'a str,
    pub image_id: &'a str,
    pub subnet_id: &'a str,
    pub ssh_authorized_keys: &'a str,
}

// Resolves the image to boot from: in auto mode prefer an Ubuntu image,
// otherwise present the images grouped by operating system as a menu.
pub fn resolve_image(client: &ApiClient, auto: bool) -> Result<Image, ProvisionError> {
    let images = list_images(client)?;

    if images.is_empty() {
        return Err(ProvisionError::ApiError(
            404,
            format!("No images in user's compartment for shape '{}'!", SHAPE),
        ));
    }

    let image = if auto {
        println!(
            "\"Auto\" mode is {}, selecting image automatically...",
            terminal::paint("enabled", &[BOLD, BRIGHT_GREEN])
        );

        pick_auto_image(&images).clone()
    } else {
        println!(
            "\"Auto\" mode is {}, please select image manually.",
            terminal::paint("disabled", &[BOLD, BRIGHT_RED])
        );
        println!(
            "{}\n",
            terminal::paint(
                &format!("{} image{} available:", images.len(), terminal::plural(images.len())),
                &[BOLD, BRIGHT_GREEN]
            )
        );

        for (operating_system, indexed_images) in group_by_os(&images) {
            println!("{}:", operating_system);

            for (index, image) in indexed_images {
                println!(
                    "  - {} [{}]",
                    terminal::paint(&image.display_name, &[BRIGHT_YELLOW]),
                    terminal::paint(&format!("{}", index + 1), &[CYAN])
                );
            }
        }

        println!();
        let index = terminal::prompt_menu_index(
            "Enter the ID of the image to be selected: ",
            images.len(),
        )?;

        images[index].clone()
    };

    println!(
        "selected image: {}",
        terminal::paint(&image.display_name, &[BRIGHT_YELLOW])
    );

    Ok(image)
}

// auto mode wants a stock Ubuntu if there is one, otherwise whatever is first
fn pick_auto_image(images: &[Image]) -> &Image {
    images
        .iter()
        .find(|image| image.display_name.contains("Ubuntu"))
        .unwrap_or(&images[0])
}

// groups images under their operating system, keeping the list order and
// the global menu indices
fn group_by_os(images: &[Image]) -> Vec<(&str, Vec<(usize, &Image)>)> {
    let mut grouped: Vec<(&str, Vec<(usize, &Image)>)> = Vec::new();

    for (index, image) in images.iter().enumerate() {
        match grouped.iter_mut().find(|(os, _)| *os == image.operating_system) {
            Some((_, entries)) => entries.push((index, image)),
            None => grouped.push((image.operating_system.as_str(), vec![(index, image)])),
        }
    }

    grouped
}

fn list_images(client: &ApiClient) -> Result<Vec<Image>, ProvisionError> {
    let value = client.get(
        Service::Core,
        &format!("images?compartmentId={}&shape={}", client.tenancy(), SHAPE),
    )?;

    serde_json::from_value(value)
        .map_err(|e| ProvisionError::TransportError(format!("Unexpected image response from OCI: {}", e)))
}

pub fn launch_instance(client: &ApiClient, request: &LaunchRequest) -> Result<(), ProvisionError> {
    let details = build_launch_details(client.tenancy(), request);

    client.post(Service::Core, "instances", &details)?;

    Ok(())
}

// The fixed launch template: flex ARM shape with 4 OCPUs / 24GB, image boot
// volume at 200GB / 120 VPUs-per-GB, a public IP on the chosen subnet, and
// only the instance monitoring agent plugin left enabled.
fn build_launch_details(compartment_id: &str, request: &LaunchRequest) -> Value {
    let disabled_plugins = [
        "Vulnerability Scanning",
        "Compute RDMA GPU Monitoring",
        "Compute HPC RDMA Auto-Configuration",
        "Compute HPC RDMA Authentication",
        "Block Volume Management",
        "Bastion",
    ];

    let mut plugins_config = vec![json!({
        "name": "Compute Instance Monitoring",
        "desiredState": "ENABLED",
    })];
    for plugin_name in disabled_plugins {
        plugins_config.push(json!({
            "name": plugin_name,
            "desiredState": "DISABLED",
        }));
    }

    json!({
        "agentConfig": {
            "pluginsConfig": plugins_config,
        },
        "availabilityDomain": request.availability_domain,
        "compartmentId": compartment_id,
        "createVnicDetails": {
            "assignPublicIp": true,
            "subnetId": request.subnet_id,
        },
        "displayName": request.display_name,
        "metadata": {
            "ssh_authorized_keys": request.ssh_authorized_keys,
        },
        "shape": SHAPE,
        "shapeConfig": {
            "memoryInGBs": SHAPE_MEMORY_GBS,
            "ocpus": SHAPE_OCPUS,
        },
        "sourceDetails": {
            "bootVolumeSizeInGBs": BOOT_VOLUME_SIZE_GBS,
            "bootVolumeVpusPerGB": BOOT_VOLUME_VPUS_PER_GB,
            "imageId": request.image_id,
            "sourceType": "image",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_images() -> Vec<Image> {
        vec![
            Image {
                id: "ocid1.image.oc1..oracle8".to_string(),
                display_name: "Oracle-Linux-8.10-aarch64-2026.01.31-0".to_string(),
                operating_system: "Oracle Linux".to_string(),
            },
            Image {
                id: "ocid1.image.oc1..ubuntu".to_string(),
                display_name: "Canonical-Ubuntu-24.04-aarch64-2026.01.31-0".to_string(),
                operating_system: "Canonical Ubuntu".to_string(),
            },
            Image {
                id: "ocid1.image.oc1..oracle9".to_string(),
                display_name: "Oracle-Linux-9.5-aarch64-2026.01.31-0".to_string(),
                operating_system: "Oracle Linux".to_string(),
            },
        ]
    }

    #[test]
    fn test_pick_auto_image_prefers_ubuntu1() {
        let images = test_images();
        assert_eq!(pick_auto_image(&images).id, "ocid1.image.oc1..ubuntu");
    }

    #[test]
    fn test_pick_auto_image_fallback1() {
        let mut images = test_images();
        images.remove(1);
        // no Ubuntu left, so the first image wins
        assert_eq!(pick_auto_image(&images).id, "ocid1.image.oc1..oracle8");
    }

    #[test]
    fn test_group_by_os_keeps_global_indices1() {
        let images = test_images();
        let grouped = group_by_os(&images);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, "Oracle Linux");
        assert_eq!(grouped[0].1.len(), 2);
        // global indices are preserved across groups
        assert_eq!(grouped[0].1[1].0, 2);
        assert_eq!(grouped[1].0, "Canonical Ubuntu");
        assert_eq!(grouped[1].1[0].0, 1);
    }

    #[test]
    fn test_build_launch_details1() {
        let request = LaunchRequest {
            availability_domain: "qIZq:UK-LONDON-1-AD-1",
            display_name: "my-instance",
            image_id: "ocid1.image.oc1..ubuntu",
            subnet_id: "ocid1.subnet.oc1..ssss",
            ssh_authorized_keys: "ssh-rsa AAAA...",
        };

        let details = build_launch_details("ocid1.tenancy.oc1..cccc", &request);

        assert_eq!(details["shape"], "VM.Standard.A1.Flex");
        assert_eq!(details["availabilityDomain"], "qIZq:UK-LONDON-1-AD-1");
        assert_eq!(details["compartmentId"], "ocid1.tenancy.oc1..cccc");
        assert_eq!(details["displayName"], "my-instance");
        assert_eq!(details["shapeConfig"]["ocpus"], 4);
        assert_eq!(details["shapeConfig"]["memoryInGBs"], 24);
        assert_eq!(details["sourceDetails"]["sourceType"], "image");
        assert_eq!(details["sourceDetails"]["bootVolumeSizeInGBs"], 200);
        assert_eq!(details["sourceDetails"]["bootVolumeVpusPerGB"], 120);
        assert_eq!(details["sourceDetails"]["imageId"], "ocid1.image.oc1..ubuntu");
        assert_eq!(details["createVnicDetails"]["assignPublicIp"], true);
        assert_eq!(details["createVnicDetails"]["subnetId"], "ocid1.subnet.oc1..ssss");
        assert_eq!(details["metadata"]["ssh_authorized_keys"], "ssh-rsa AAAA...");
    }

    #[test]
    fn test_build_launch_details_agent_plugins1() {
        let request = LaunchRequest {
            availability_domain: "ad",
            display_name: "name",
            image_id: "image",
            subnet_id: "subnet",
            ssh_authorized_keys: "key",
        };

        let details = build_launch_details("compartment", &request);

        let plugins = details["agentConfig"]["pluginsConfig"].as_array().unwrap();
        assert_eq!(plugins.len(), 7);

        for plugin in plugins {
            let expected_state = if plugin["name"] == "Compute Instance Monitoring" {
                "ENABLED"
            } else {
                "DISABLED"
            };
            assert_eq!(plugin["desiredState"], expected_state);
        }
    }
}
