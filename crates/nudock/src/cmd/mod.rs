use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use nudock_endpoint::{CommunicationKind, EndpointConfig, SchemaConfig};
use nudock_transport::{DEFAULT_PORT, DEFAULT_SOCKET_DIR};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod info;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the demonstration experiment server.
    Serve(ServeArgs),
    /// Validate against a server and send one request.
    Send(SendArgs),
    /// Validate against a server and report both versions.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    Localhost,
    #[value(alias = "uds")]
    UnixDomainSocket,
    Tcp,
}

impl From<TransportArg> for CommunicationKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Localhost => CommunicationKind::Localhost,
            TransportArg::UnixDomainSocket => CommunicationKind::UnixDomainSocket,
            TransportArg::Tcp => CommunicationKind::Tcp,
        }
    }
}

/// Where the two endpoints meet.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Transport kind.
    #[arg(long, value_enum, env = "NUDOCK_TRANSPORT", default_value = "localhost")]
    pub transport: TransportArg,
    /// Loopback port; also names the domain socket file.
    #[arg(long, env = "NUDOCK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Directory holding domain socket files.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SOCKET_DIR)]
    pub socket_dir: PathBuf,
}

impl ConnectionArgs {
    pub fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig::default()
            .with_transport(self.transport.into(), self.port)
            .with_socket_dir(&self.socket_dir)
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Directory holding `<name>.schema.json` files.
    #[arg(long, value_name = "DIR", env = "NUDOCK_SCHEMAS_DIR")]
    pub schemas_dir: Option<PathBuf>,
    /// Skip request and response validation.
    #[arg(long)]
    pub no_validate: bool,
    /// Close object schemas that leave `additionalProperties` open.
    #[arg(long)]
    pub strict: bool,
}

impl ServeArgs {
    pub fn endpoint_config(&self) -> EndpointConfig {
        let mut config = self
            .connection
            .endpoint_config()
            .with_validation(!self.no_validate);
        if let Some(dir) = &self.schemas_dir {
            config = config.with_schemas_dir(dir);
        }
        config.schema = SchemaConfig {
            strict_mode: self.strict,
            ..SchemaConfig::default()
        };
        config
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Request name (with or without a leading `/`).
    pub name: String,
    /// JSON request document. Default: `{}`.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the request document from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// How long to keep retrying the connection (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
