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

use std::fmt;
use std::io;

use rand::distributions::Alphanumeric;
use rand::Rng;

#[derive(Debug)]
pub enum ProvisionError {
    // config file problems (missing file, missing profile, missing keys...)
    ConfigError(String),
    // the API signing key or generated ssh keypair
    KeyError(String),
    // OCI returned a 429 for the request
    RateLimited(String),
    // any other non-success status from OCI, with the service error message
    // extracted from the response body when there was one
    ApiError(u16, String),
    // transport-level (DNS, TLS, connect...) problems
    TransportError(String),
    IOError(io::Error),
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::ConfigError(err) => write!(f, "{}", err),
            ProvisionError::KeyError(err) => write!(f, "{}", err),
            ProvisionError::RateLimited(err) => write!(f, "{}", err),
            ProvisionError::ApiError(_status, err) => write!(f, "{}", err),
            ProvisionError::TransportError(err) => write!(f, "{}", err),
            ProvisionError::IOError(err) => write!(f, "{}", err),
        }
    }
}

impl From<io::Error> for ProvisionError {
    fn from(error: io::Error) -> Self {
        ProvisionError::IOError(error)
    }
}

// default display name for a new resource, i.e. "instance-2026-08-29-x4Tz91qA"
pub fn default_name(resource: &str) -> String {
    let date_str = chrono::Local::now().format("%Y-%m-%d");
    let rand_str: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    format!("{}-{}-{}", resource, date_str, rand_str)
}
