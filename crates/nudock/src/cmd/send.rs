use std::fs;

use nudock_endpoint::Endpoint;
use serde_json::Value;

use crate::cmd::SendArgs;
use crate::exit::{endpoint_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_exchange, Exchange, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let document = resolve_document(&args)?;

    let mut endpoint = Endpoint::new(args.connection.endpoint_config());
    endpoint
        .try_start_client()
        .map_err(|err| endpoint_error("connect failed", err))?;
    let response = endpoint
        .try_send_request(&args.name, &document)
        .map_err(|err| endpoint_error("request failed", err))?;

    print_exchange(
        &Exchange {
            request: &args.name,
            server_version: endpoint.peer_version(),
            response: &response,
        },
        format,
    );
    Ok(SUCCESS)
}

fn resolve_document(args: &SendArgs) -> CliResult<Value> {
    if let Some(json) = &args.json {
        return parse_document("--json", json);
    }
    if let Some(path) = &args.file {
        let text = fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        return parse_document(&path.display().to_string(), &text);
    }
    Ok(Value::Object(serde_json::Map::new()))
}

fn parse_document(source: &str, text: &str) -> CliResult<Value> {
    serde_json::from_str(text)
        .map_err(|err| CliError::new(USAGE, format!("{source} is not valid JSON: {err}")))
}
