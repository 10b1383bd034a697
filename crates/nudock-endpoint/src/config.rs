use std::path::PathBuf;

use nudock_schema::SchemaConfig;
use nudock_transport::{CommunicationKind, TransportConfig};
use nudock_wire::{FrameConfig, DEFAULT_MAX_PAYLOAD};

/// Version string this build announces during the start-up handshake.
pub const VERSION: &str = env!("NUDOCK_VERSION");

/// Directory searched for `<name>.schema.json` files, fixed at build time.
pub const DEFAULT_SCHEMAS_DIR: &str = env!("NUDOCK_SCHEMAS_DIR");

/// Endpoint configuration.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Validate request and response documents against their schemas.
    /// Default: `true`.
    pub validate: bool,
    /// Directory holding `<name>.schema.json` files.
    pub schemas_dir: PathBuf,
    pub transport: TransportConfig,
    pub schema: SchemaConfig,
    /// Largest envelope either side will frame or accept. Default: 16 MiB.
    pub max_message_size: usize,
    /// Version announced in the handshake. Default: [`VERSION`].
    pub version: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            validate: true,
            schemas_dir: PathBuf::from(DEFAULT_SCHEMAS_DIR),
            transport: TransportConfig::default(),
            schema: SchemaConfig::default(),
            max_message_size: DEFAULT_MAX_PAYLOAD,
            version: VERSION.to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_schemas_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schemas_dir = dir.into();
        self
    }

    pub fn with_transport(mut self, kind: CommunicationKind, port: u16) -> Self {
        self.transport.kind = kind;
        self.transport.port = port;
        self
    }

    pub fn with_socket_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transport.socket_dir = dir.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_message_size,
        }
    }
}
