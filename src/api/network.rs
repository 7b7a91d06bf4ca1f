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

use crate::common::{default_name, ProvisionError};
use crate::terminal;
use crate::terminal::{BRIGHT_GREEN, BRIGHT_YELLOW, BOLD, CYAN};

use super::client::{ApiClient, Service};

// console defaults for a freshly-created network
const VCN_CIDR: &str = "10.0.0.0/16";
const SUBNET_CIDR: &str = "10.0.0.0/24";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vcn {
    pub id: String,
    pub display_name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    pub display_name: String,
}

// Resolves the subnet the instance will attach to: use an existing one
// (first one in auto mode, menu selection otherwise), or walk the same
// list-or-create dance for a VCN first and create a subnet inside it.
pub fn resolve_subnet(client: &ApiClient, auto: bool) -> Result<Subnet, ProvisionError> {
    let subnets = list_subnets(client)?;

    if subnets.is_empty() {
        let vcn = resolve_vcn(client, auto)?;

        println!();
        println!("No subnets detected:");

        let name = if auto {
            let name = default_name("subnet");
            println!(
                "  - Creating new subnet... [{}]",
                terminal::paint(&name, &[BRIGHT_YELLOW])
            );
            name
        } else {
            terminal::prompt_line("  - Enter the name of the subnet to be created: ", BRIGHT_YELLOW)?
        };

        let subnet = create_subnet(client, &name, &vcn.id)?;
        println!(
            "  - {}",
            terminal::paint("Subnet successfully created!", &[BOLD, BRIGHT_GREEN])
        );

        return Ok(subnet);
    }

    print_detected("subnet", subnets.iter().map(|s| s.display_name.as_str()), auto || subnets.len() == 1);

    if auto || subnets.len() == 1 {
        return Ok(subnets[0].clone());
    }

    println!();
    let index = terminal::prompt_menu_index(
        "Enter the ID of the subnet to be selected: ",
        subnets.len(),
    )?;

    println!(
        "selected subnet: {}",
        terminal::paint(&subnets[index].display_name, &[BRIGHT_YELLOW])
    );

    Ok(subnets[index].clone())
}

fn resolve_vcn(client: &ApiClient, auto: bool) -> Result<Vcn, ProvisionError> {
    let vcns = list_vcns(client)?;

    if vcns.is_empty() {
        println!("No virtual cloud networks detected:");

        let name = if auto {
            let name = default_name("vcn");
            println!(
                "  - Creating new virtual cloud network... [{}]",
                terminal::paint(&name, &[BRIGHT_YELLOW])
            );
            name
        } else {
            terminal::prompt_line(
                "  - Enter the name of the virtual cloud network to be created: ",
                BRIGHT_YELLOW,
            )?
        };

        let vcn = create_vcn(client, &name)?;
        println!(
            "  - {}",
            terminal::paint("Virtual cloud network successfully created!", &[BOLD, BRIGHT_GREEN])
        );

        return Ok(vcn);
    }

    print_detected(
        "virtual cloud network",
        vcns.iter().map(|v| v.display_name.as_str()),
        auto || vcns.len() == 1,
    );

    if auto || vcns.len() == 1 {
        return Ok(vcns[0].clone());
    }

    println!();
    let index = terminal::prompt_menu_index(
        "Enter the ID of the virtual cloud network to be selected: ",
        vcns.len(),
    )?;

    println!(
        "selected virtual cloud network: {}",
        terminal::paint(&vcns[index].display_name, &[BRIGHT_YELLOW])
    );

    Ok(vcns[index].clone())
}

// "N <kind>s detected:" plus one line per name; either the first entry
// gets an [auto-selected] tag, or every entry gets a menu index
fn print_detected<'a>(kind: &str, names: impl Iterator<Item = &'a str>, first_selected: bool) {
    let names: Vec<&str> = names.collect();

    println!("{} {}{} detected:", names.len(), kind, terminal::plural(names.len()));

    for (index, name) in names.iter().enumerate() {
        let annotation = if first_selected {
            if index == 0 {
                format!(" [{}]", terminal::paint("auto-selected", &[CYAN]))
            } else {
                String::new()
            }
        } else {
            format!(" [{}]", terminal::paint(&format!("{}", index + 1), &[CYAN]))
        };

        println!("  - {}{}", terminal::paint(name, &[BRIGHT_YELLOW]), annotation);
    }
}

fn list_subnets(client: &ApiClient) -> Result<Vec<Subnet>, ProvisionError> {
    let value = client.get(
        Service::Core,
        &format!("subnets?compartmentId={}", client.tenancy()),
    )?;

    serde_json::from_value(value)
        .map_err(|e| ProvisionError::TransportError(format!("Unexpected subnet response from OCI: {}", e)))
}

fn list_vcns(client: &ApiClient) -> Result<Vec<Vcn>, ProvisionError> {
    let value = client.get(
        Service::Core,
        &format!("vcns?compartmentId={}", client.tenancy()),
    )?;

    serde_json::from_value(value)
        .map_err(|e| ProvisionError::TransportError(format!("Unexpected VCN response from OCI: {}", e)))
}

fn create_subnet(client: &ApiClient, display_name: &str, vcn_id: &str) -> Result<Subnet, ProvisionError> {
    let details = build_create_subnet_details(client.tenancy(), display_name, vcn_id);

    let value = client
        .post(Service::Core, "subnets", &details)
        .map_err(|_| ProvisionError::ApiError(0, "Failed to create a subnet!".to_string()))?;

    serde_json::from_value(value)
        .map_err(|_| ProvisionError::ApiError(0, "Failed to create a subnet!".to_string()))
}

fn create_vcn(client: &ApiClient, display_name: &str) -> Result<Vcn, ProvisionError> {
    let details = build_create_vcn_details(client.tenancy(), display_name);

    let value = client
        .post(Service::Core, "vcns", &details)
        .map_err(|_| ProvisionError::ApiError(0, "Failed to create a virtual cloud network!".to_string()))?;

    serde_json::from_value(value)
        .map_err(|_| ProvisionError::ApiError(0, "Failed to create a virtual cloud network!".to_string()))
}

fn build_create_subnet_details(compartment_id: &str, display_name: &str, vcn_id: &str) -> Value {
    json!({
        "cidrBlock": SUBNET_CIDR,
        "compartmentId": compartment_id,
        "displayName": display_name,
        "vcnId": vcn_id,
    })
}

fn build_create_vcn_details(compartment_id: &str, display_name: &str) -> Value {
    json!({
        "cidrBlock": VCN_CIDR,
        "compartmentId": compartment_id,
        "displayName": display_name,
    })
}
