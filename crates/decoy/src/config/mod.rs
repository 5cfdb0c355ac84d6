//! Configuration file format for the `decoy` binary.
//!
//! ```yaml
//! listen:
//!   host: 127.0.0.1
//!   port: 8080
//! record_requests: true
//! defaults:
//!   content_type: application/json
//! stubs:
//!   - predicates:
//!       - method: GET
//!         path: { equals: /users }
//!     responses:
//!       - status: 200
//!         body: '[]'
//! ```

mod stubs;

use crate::server::DefaultResponse;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

pub use stubs::{
    CompiledStub, FieldMatcher, JsonPathMatcher, PredicateConfig, PredicateOptions,
    ResponseConfig, StubConfig,
};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// 0 picks an ephemeral port
    #[serde(default)]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
        }
    }
}

impl ListenConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("invalid listen host '{}'", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,

    /// Whether received requests are kept for verification
    #[serde(default = "default_record_requests")]
    pub record_requests: bool,

    #[serde(default)]
    pub defaults: DefaultResponse,

    /// Stub rules, registered in file order
    #[serde(default)]
    pub stubs: Vec<StubConfig>,
}

fn default_record_requests() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            record_requests: default_record_requests(),
            defaults: DefaultResponse::default(),
            stubs: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate YAML (or JSON) text.
    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.listen.socket_addr()?;

        if !(100..=999).contains(&self.defaults.status) {
            anyhow::bail!(
                "defaults.status must be a valid HTTP status, got {}",
                self.defaults.status
            );
        }

        for (idx, stub) in self.stubs.iter().enumerate() {
            stub.compile().with_context(|| describe_stub(idx, stub))?;
            for response in &stub.responses {
                if let Some(status) = response.status {
                    if !(100..=999).contains(&status) {
                        anyhow::bail!(
                            "{}: invalid response status {}",
                            describe_stub(idx, stub),
                            status
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Compile every stub, in file order.
    pub fn compile_stubs(&self) -> Result<Vec<CompiledStub>, anyhow::Error> {
        self.stubs
            .iter()
            .enumerate()
            .map(|(idx, stub)| stub.compile().with_context(|| describe_stub(idx, stub)))
            .collect()
    }
}

fn describe_stub(idx: usize, stub: &StubConfig) -> String {
    match &stub.id {
        Some(id) => format!("stub #{idx} ({id})"),
        None => format!("stub #{idx}"),
    }
}
