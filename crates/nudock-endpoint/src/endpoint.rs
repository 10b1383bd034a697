use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nudock_transport::{Listener, TransportTarget};
use serde_json::Value;
use tracing::{debug, error, info, info_span, warn};

use crate::client::ClientConnection;
use crate::config::EndpointConfig;
use crate::dispatch::Dispatcher;
use crate::error::{EndpointError, Result};
use crate::handler::Handler;
use crate::handshake;
use crate::registry::{normalize_name, HandlerRegistry, Registration, SchemaSource};
use crate::server::{self, ServerHandle};

/// Lifecycle of a server endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Starting,
    Running,
    Stopped,
}

/// The one role an endpoint plays. Chosen once, never changed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Unset,
    Server(ServerPhase),
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unset => f.write_str("unset"),
            Role::Server(ServerPhase::Starting) => f.write_str("server (starting)"),
            Role::Server(ServerPhase::Running) => f.write_str("server (running)"),
            Role::Server(ServerPhase::Stopped) => f.write_str("server (stopped)"),
            Role::Client => f.write_str("client"),
        }
    }
}

/// One side of a nudock connection.
///
/// Register handlers, then call [`start_server`](Self::start_server); or call
/// [`start_client`](Self::start_client) and send requests with
/// [`send_request`](Self::send_request).
pub struct Endpoint {
    config: EndpointConfig,
    role: Role,
    registry: Arc<HandlerRegistry>,
    served: Arc<AtomicU64>,
    sent: u64,
    handle: ServerHandle,
    client: Option<ClientConnection>,
    peer_version: Option<String>,
}

impl Endpoint {
    pub fn new(config: EndpointConfig) -> Self {
        let registry = HandlerRegistry::new(config.schemas_dir.clone(), config.schema);
        Self {
            config,
            role: Role::Unset,
            registry: Arc::new(registry),
            served: Arc::default(),
            sent: 0,
            handle: ServerHandle::default(),
            client: None,
            peer_version: None,
        }
    }

    /// Register `handler` under `name`, validated by
    /// `<schemas_dir>/<name>.schema.json`.
    ///
    /// Empty, reserved and duplicate names are logged and skipped. A schema
    /// file that cannot be loaded fails the call and nothing is registered.
    pub fn register_handler(
        &mut self,
        name: &str,
        handler: impl Handler,
    ) -> Result<Registration> {
        self.register(name, Arc::new(handler), SchemaSource::Default)
    }

    /// Register `handler` with an explicit schema file.
    pub fn register_handler_with_schema(
        &mut self,
        name: &str,
        handler: impl Handler,
        schema_path: &Path,
    ) -> Result<Registration> {
        self.register(name, Arc::new(handler), SchemaSource::File(schema_path))
    }

    /// Register `handler` with an in-memory schema document.
    pub fn register_handler_with_schema_document(
        &mut self,
        name: &str,
        handler: impl Handler,
        schema: &Value,
    ) -> Result<Registration> {
        self.register(name, Arc::new(handler), SchemaSource::Document(schema))
    }

    fn register(
        &mut self,
        name: &str,
        handler: Arc<dyn Handler>,
        source: SchemaSource<'_>,
    ) -> Result<Registration> {
        if self.role != Role::Unset {
            warn!(name, role = %self.role, "handlers can only be registered before starting");
            return Ok(Registration::SkippedStarted);
        }
        let Some(registry) = Arc::get_mut(&mut self.registry) else {
            warn!(name, "handler registry is in use");
            return Ok(Registration::SkippedStarted);
        };
        registry.register(name, handler, source)
    }

    /// Bind the configured transport and serve requests until stopped.
    ///
    /// Blocks the calling thread. Returns when a [`ServerHandle`] is stopped
    /// or a client fails the handshake. Fails without side effects if the
    /// endpoint already plays a role.
    pub fn start_server(&mut self) -> Result<()> {
        self.ensure_unset()?;
        self.role = Role::Server(ServerPhase::Starting);
        let _span = info_span!("server", version = %self.config.version).entered();

        let result = self.serve();
        if let Err(err) = &result {
            error!(%err, "server failed");
        }
        self.role = Role::Server(ServerPhase::Stopped);
        result
    }

    fn serve(&mut self) -> Result<()> {
        let target = self.config.transport.resolve()?;
        let listener = Listener::bind(&target)?;
        let dispatcher = Arc::new(Dispatcher::new(
            self.config.version.clone(),
            self.config.validate,
            Arc::clone(&self.registry),
            Arc::clone(&self.served),
        ));

        self.role = Role::Server(ServerPhase::Running);
        info!(
            target = %listener.local_target(),
            handlers = ?self.registry.names(),
            validate = self.config.validate,
            "server listening"
        );
        server::run(
            &listener,
            dispatcher,
            &self.handle,
            &self.config.frame_config(),
        )
    }

    /// Handle for stopping a server started on another thread.
    pub fn server_handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Connect to the server and perform the version handshake.
    ///
    /// A version mismatch is logged, not an error. On failure the endpoint
    /// stays unset and the call may be retried.
    pub fn try_start_client(&mut self) -> Result<()> {
        self.ensure_unset()?;
        let _span = info_span!("client", version = %self.config.version).entered();

        let target = self.config.transport.resolve()?;
        let mut connection = ClientConnection::open(target, self.config.frame_config())?;
        let peer_version = handshake::greet(&mut connection, &self.config.version)?;

        info!(target = %connection.target(), "client connected");
        self.peer_version = peer_version;
        self.client = Some(connection);
        self.role = Role::Client;
        Ok(())
    }

    /// Like [`try_start_client`](Self::try_start_client), but a failed
    /// connection or handshake terminates the process.
    ///
    /// Only [`EndpointError::AlreadyStarted`] is returned.
    pub fn start_client(&mut self) -> Result<()> {
        match self.try_start_client() {
            Ok(()) => Ok(()),
            Err(err @ EndpointError::AlreadyStarted(_)) => Err(err),
            Err(err) => {
                error!(%err, "client failed to start; aborting");
                std::process::abort()
            }
        }
    }

    /// Send `message` to the handler registered under `name` and return its
    /// response document.
    pub fn try_send_request(&mut self, name: &str, message: &Value) -> Result<Value> {
        let Some(connection) = self.client.as_mut() else {
            return Err(EndpointError::NotClient);
        };
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(EndpointError::EmptyRequestName);
        }

        self.sent += 1;
        let path = format!("/{name}");
        let body = serde_json::to_string(message)?;
        let response = connection.post(&path, body)?;
        if !response.is_success() {
            return Err(EndpointError::RequestFailed {
                path,
                status: response.status,
                body: response.body,
            });
        }

        let document = serde_json::from_str(&response.body)?;
        debug!(request = name, count = self.sent, "response received");
        Ok(document)
    }

    /// Like [`try_send_request`](Self::try_send_request), but any failure
    /// terminates the process.
    pub fn send_request(&mut self, name: &str, message: &Value) -> Value {
        match self.try_send_request(name, message) {
            Ok(document) => document,
            Err(err) => {
                error!(request = name, %err, document = %message, "request failed; aborting");
                std::process::abort()
            }
        }
    }

    fn ensure_unset(&self) -> Result<()> {
        if self.role == Role::Unset {
            return Ok(());
        }
        error!(role = %self.role, "client or server already started");
        Err(EndpointError::AlreadyStarted(self.role))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Version the server announced during the handshake.
    pub fn peer_version(&self) -> Option<&str> {
        self.peer_version.as_deref()
    }

    /// Where the client is connected.
    pub fn peer_target(&self) -> Option<&TransportTarget> {
        self.client.as_ref().map(ClientConnection::target)
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registered_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Requests handled (server) or sent (client) so far.
    pub fn request_count(&self) -> u64 {
        match self.role {
            Role::Client => self.sent,
            _ => self.served.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("role", &self.role)
            .field("version", &self.config.version)
            .field("handlers", &self.registry.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::handler::handler_fn;
    use nudock_transport::CommunicationKind;

    fn any_schema() -> Value {
        json!({ "properties": { "request": {}, "response": {} } })
    }

    #[test]
    fn fresh_endpoint_is_unset() {
        let endpoint = Endpoint::new(EndpointConfig::default());
        assert_eq!(endpoint.role(), Role::Unset);
        assert!(endpoint.registered_names().is_empty());
        assert_eq!(endpoint.request_count(), 0);
        assert!(endpoint.peer_version().is_none());
    }

    #[test]
    fn send_before_start_is_rejected() {
        let mut endpoint = Endpoint::new(EndpointConfig::default());
        assert!(matches!(
            endpoint.try_send_request("ping", &json!({})),
            Err(EndpointError::NotClient)
        ));
    }

    #[test]
    fn unsupported_transport_fails_start_and_locks_role() {
        let config = EndpointConfig::default().with_transport(CommunicationKind::Tcp, 1234);
        let mut endpoint = Endpoint::new(config);
        let schema = any_schema();
        let pong = handler_fn(|_| Ok(json!("pong")));
        endpoint
            .register_handler_with_schema_document("ping", pong, &schema)
            .expect("registration should succeed");

        assert!(matches!(
            endpoint.start_server(),
            Err(EndpointError::Transport(_))
        ));
        assert_eq!(endpoint.role(), Role::Server(ServerPhase::Stopped));
        assert!(matches!(
            endpoint.start_server(),
            Err(EndpointError::AlreadyStarted(Role::Server(ServerPhase::Stopped)))
        ));

        let late = handler_fn(|_| Ok(json!(1)));
        let outcome = endpoint
            .register_handler_with_schema_document("late", late, &schema)
            .expect("late registration should not error");
        assert_eq!(outcome, Registration::SkippedStarted);
    }

    #[test]
    fn failed_client_start_leaves_role_unset() {
        let config = EndpointConfig::default().with_transport(CommunicationKind::Tcp, 1234);
        let mut endpoint = Endpoint::new(config);
        assert!(endpoint.try_start_client().is_err());
        assert_eq!(endpoint.role(), Role::Unset);
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::Unset.to_string(), "unset");
        assert_eq!(
            Role::Server(ServerPhase::Running).to_string(),
            "server (running)"
        );
        assert_eq!(Role::Client.to_string(), "client");
    }
}
