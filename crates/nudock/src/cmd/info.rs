use std::time::{Duration, Instant};

use nudock_endpoint::{Endpoint, EndpointConfig, EndpointError, TransportError};
use serde::Serialize;

use crate::cmd::InfoArgs;
use crate::exit::{endpoint_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_json_line, OutputFormat};

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Serialize)]
struct InfoOutput {
    target: String,
    transport: String,
    local_version: String,
    server_version: Option<String>,
    versions_match: bool,
    connected: bool,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let config = args.connection.endpoint_config();
    let endpoint = connect_with_timeout(&config, timeout)?;

    let server_version = endpoint.peer_version().map(str::to_string);
    let out = InfoOutput {
        target: endpoint
            .peer_target()
            .map(ToString::to_string)
            .unwrap_or_default(),
        transport: config.transport.kind.to_string(),
        local_version: endpoint.version().to_string(),
        versions_match: server_version.as_deref() == Some(endpoint.version()),
        server_version,
        connected: true,
    };

    print_info(&out, format);
    Ok(SUCCESS)
}

fn connect_with_timeout(config: &EndpointConfig, timeout: Duration) -> CliResult<Endpoint> {
    let start = Instant::now();
    loop {
        let mut endpoint = Endpoint::new(config.clone());
        match endpoint.try_start_client() {
            Ok(()) => return Ok(endpoint),
            Err(err) => {
                if !is_retryable_connect_error(&err) {
                    return Err(endpoint_error("connect failed", err));
                }
                if start.elapsed() >= timeout {
                    return Err(CliError::new(
                        TIMEOUT,
                        format!("connect timed out after {timeout:?}"),
                    ));
                }
                std::thread::sleep(RETRY_INTERVAL);
            }
        }
    }
}

fn is_retryable_connect_error(err: &EndpointError) -> bool {
    match err {
        EndpointError::Transport(TransportError::Connect { source, .. }) => matches!(
            source.kind(),
            std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
        ),
        _ => false,
    }
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json_line(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Connection Info:");
            println!("  Target:          {}", out.target);
            println!("  Transport:       {}", out.transport);
            println!("  Local version:   {}", out.local_version);
            println!(
                "  Server version:  {}",
                out.server_version.as_deref().unwrap_or("unknown")
            );
            println!("  Versions match:  {}", out.versions_match);
        }
        OutputFormat::Raw => {
            println!("{}", out.server_version.as_deref().unwrap_or(""));
        }
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };
    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
