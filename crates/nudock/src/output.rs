use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One completed request, as printed by `send`.
#[derive(Serialize)]
pub struct Exchange<'a> {
    pub request: &'a str,
    pub server_version: Option<&'a str>,
    pub response: &'a Value,
}

pub fn print_exchange(exchange: &Exchange<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json_line(exchange),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["REQUEST", "SERVER", "RESPONSE"])
                .add_row(vec![
                    exchange.request.to_string(),
                    exchange.server_version.unwrap_or("unknown").to_string(),
                    pretty(exchange.response),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "request={} server={}",
                exchange.request,
                exchange.server_version.unwrap_or("unknown")
            );
            println!("{}", pretty(exchange.response));
        }
        OutputFormat::Raw => print_raw(exchange.response.to_string().as_bytes()),
    }
}

/// Compact JSON on a single stdout line.
pub fn print_json_line<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
