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

use std::env;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::thread::sleep;
use std::time::Duration;

mod api;
mod common;
mod config;
mod keys;
mod terminal;

use api::client::ApiClient;
use api::compute::{self, Image, LaunchRequest};
use api::identity::{self, AvailabilityDomain};
use api::network::{self, Subnet};

use common::{default_name, ProvisionError};
use config::AccountConfig;
use keys::SshKeyPair;

use terminal::{BOLD, BRIGHT_GREEN, BRIGHT_RED, BRIGHT_YELLOW, CYAN};

const RATE_LIMIT_WAIT_SECS: u64 = 2;
const NEXT_DOMAIN_WAIT_SECS: u64 = 1;

struct Args {
    auto: bool,
    config_path: PathBuf,
    profile: String,
}

fn print_usage() {
    println!("Usage: ocivm [options]");
    println!();
    println!("Launches an OCI virtual machine instance, creating the network");
    println!("prerequisites and an ssh keypair on the way, and retrying across");
    println!("availability domains until capacity is found.");
    println!();
    println!("Options:");
    println!("  -a, --auto             run without user input (names and selections");
    println!("                         will be set automatically)");
    println!("      --config <path>    config file to use (default: ~/.oci/config)");
    println!("      --profile <name>   config profile to use (default: DEFAULT)");
    println!("  -h, --help             print this help");
}

fn parse_args() -> Option<Args> {
    let mut args = Args {
        auto: false,
        config_path: config::default_config_path(),
        profile: "DEFAULT".to_string(),
    };

    let raw_args: Vec<String> = env::args().collect();
    let mut index = 1;
    while index < raw_args.len() {
        match raw_args[index].as_str() {
            "-a" | "--auto" => {
                args.auto = true;
            }
            "--config" => {
                index += 1;
                if index >= raw_args.len() {
                    eprintln!("Error: --config requires a path argument.");
                    return None;
                }
                args.config_path = PathBuf::from(&raw_args[index]);
            }
            "--profile" => {
                index += 1;
                if index >= raw_args.len() {
                    eprintln!("Error: --profile requires a name argument.");
                    return None;
                }
                args.profile = raw_args[index].clone();
            }
            "-h" | "--help" => {
                print_usage();
                exit(0);
            }
            other => {
                eprintln!("Error: unrecognised argument: '{}'.", other);
                return None;
            }
        }

        index += 1;
    }

    Some(args)
}

fn main() {
    let args = match parse_args() {
        Some(args) => args,
        None => exit(1),
    };

    let client = match authenticate(&args.config_path, &args.profile) {
        Ok(client) => client,
        Err(e) => {
            terminal::print_error(&e.to_string());
            exit(1);
        }
    };

    let (availability_domains, subnet, image, keypair) = match gather_resources(&client, args.auto) {
        Ok(resources) => resources,
        Err(e) => {
            terminal::print_error(&e.to_string());
            exit(1);
        }
    };

    let name = match instance_name(args.auto) {
        Ok(name) => name,
        Err(e) => {
            terminal::print_error(&e.to_string());
            exit(1);
        }
    };

    println!("Creating new instance...");

    launch_until_created(&client, &availability_domains, &subnet, &image, &keypair, &name);
}

// loads the account config and makes sure its credentials actually work
// before anything gets provisioned
fn authenticate(config_path: &Path, profile: &str) -> Result<ApiClient, ProvisionError> {
    let account_config = AccountConfig::from_file(config_path, profile)?;
    let client = ApiClient::from_config(&account_config)?;

    let user = identity::get_user(&client, &account_config.user)?;

    println!(
        "Authentication successful [{}]",
        terminal::paint(&user.name, &[BRIGHT_YELLOW])
    );

    Ok(client)
}

fn gather_resources(
    client: &ApiClient,
    auto: bool,
) -> Result<(Vec<AvailabilityDomain>, Subnet, Image, SshKeyPair), ProvisionError> {
    println!();
    let availability_domains = identity::fetch_availability_domains(client)?;

    println!();
    let subnet = network::resolve_subnet(client, auto)?;

    println!();
    let image = compute::resolve_image(client, auto)?;

    let keypair = keys::generate_ssh_keypair()?;

    Ok((availability_domains, subnet, image, keypair))
}

fn instance_name(auto: bool) -> Result<String, ProvisionError> {
    if auto {
        let name = default_name("instance");
        println!(
            "\nName of the instance: {} [{}]",
            terminal::paint(&name, &[BRIGHT_YELLOW]),
            terminal::paint("auto-generated", &[CYAN])
        );
        return Ok(name);
    }

    let name = terminal::prompt_line("\nEnter the name of the instance: ", BRIGHT_YELLOW)?;
    Ok(name)
}

// Cycles over the availability domains forever, attempting a launch in each:
// a rate-limited attempt waits and retries the same domain, any other
// failure moves on to the next one, and the first success saves the ssh key
// and ends the program.
fn launch_until_created(
    client: &ApiClient,
    availability_domains: &[AvailabilityDomain],
    subnet: &Subnet,
    image: &Image,
    keypair: &SshKeyPair,
    name: &str,
) -> ! {
    let mut attempt = 0u64;

    loop {
        for availability_domain in availability_domains {
            attempt += 1;
            println!(
                "\n{}:{}",
                terminal::paint(&format!("{}", attempt), &[CYAN]),
                availability_domain.name
            );

            loop {
                let request = LaunchRequest {
                    availability_domain: &availability_domain.name,
                    display_name: name,
                    image_id: &image.id,
                    subnet_id: &subnet.id,
                    ssh_authorized_keys: &keypair.public_openssh,
                };

                match compute::launch_instance(client, &request) {
                    Ok(()) => {
                        println!(
                            "{} Instance created successfully.\n",
                            terminal::paint("Success:", &[BOLD, BRIGHT_GREEN])
                        );

                        save_private_key(name, keypair);

                        exit(0);
                    }
                    Err(ProvisionError::RateLimited(message)) => {
                        println!(
                            "{} {}, waiting...",
                            terminal::paint("Error:", &[BOLD, BRIGHT_YELLOW]),
                            message
                        );

                        sleep(Duration::from_secs(RATE_LIMIT_WAIT_SECS));
                    }
                    Err(e) => {
                        println!(
                            "{} {}",
                            terminal::paint("Failed:", &[BOLD, BRIGHT_RED]),
                            e
                        );
                        break;
                    }
                }
            }

            sleep(Duration::from_secs(NEXT_DOMAIN_WAIT_SECS));
        }
    }
}

// the private key is the only way into the new instance, so if it can't be
// saved (or a key file for this name already exists) print it rather than
// lose it
fn save_private_key(name: &str, keypair: &SshKeyPair) {
    let key_file = PathBuf::from(format!("{}-key.pem", name));

    let write_result = if key_file.is_file() {
        Err(())
    } else {
        std::fs::write(&key_file, &keypair.private_pem).map_err(|_| ())
    };

    match write_result {
        Ok(()) => {
            println!(
                "Saved private key file for authentication to {}.",
                terminal::paint(&format!("'{}'", key_file.display()), &[CYAN])
            );
        }
        Err(()) => {
            terminal::print_error("Failed to save private key file, printing it instead:");
            println!("\n{}", keypair.private_pem);
        }
    }
}
