//! Start-up version exchange.
//!
//! The client's first request is `POST /validate_start` with
//! `{"version": "<client version>"}`. The server answers any parseable request
//! with 200 and its own `{"version": ...}`. On a mismatch the
//! server stops accepting connections once the reply is sent, the client
//! only logs it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::client::ClientConnection;
use crate::dispatch::{AfterReply, Dispatched};
use crate::error::{EndpointError, Result};
use nudock_wire::Response;

/// Route reserved for the handshake.
pub const HANDSHAKE_PATH: &str = "/validate_start";
pub(crate) const HANDSHAKE_NAME: &str = "validate_start";

/// Body of both handshake messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMessage {
    pub version: String,
}

/// Result of comparing a received handshake document with the local version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    Match,
    /// The peer announced a different version (non-string values are
    /// rendered as JSON).
    Mismatch { remote: String },
    /// The document has no `version` field.
    Missing,
}

/// Compare the `version` field of `message` with `local`.
pub fn check_version(local: &str, message: &Value) -> VersionCheck {
    match message.get("version") {
        None => VersionCheck::Missing,
        Some(Value::String(remote)) if remote == local => VersionCheck::Match,
        Some(Value::String(remote)) => VersionCheck::Mismatch {
            remote: remote.clone(),
        },
        Some(other) => VersionCheck::Mismatch {
            remote: other.to_string(),
        },
    }
}

/// Server side: answer a handshake request and decide whether to keep
/// accepting connections.
pub(crate) fn answer(local: &str, body: &str) -> Dispatched {
    let message: Value = match serde_json::from_str(body) {
        Ok(message) => message,
        Err(err) => {
            error!(%err, "handshake request is not valid JSON; server will stop");
            return Dispatched {
                response: Response::bad_request(format!(
                    "failed to parse handshake request: {err}"
                )),
                after: AfterReply::StopAccepting,
            };
        }
    };

    let reply = VersionMessage {
        version: local.to_string(),
    };
    let response = match serde_json::to_string(&reply) {
        Ok(body) => Response::ok_json(body),
        Err(err) => Response::bad_request(format!("failed to encode handshake reply: {err}")),
    };

    let after = match check_version(local, &message) {
        VersionCheck::Match => {
            info!(version = local, "client version accepted");
            AfterReply::Continue
        }
        VersionCheck::Mismatch { remote } => {
            error!(
                server = local,
                client = %remote,
                "client and server versions differ; server will stop"
            );
            AfterReply::StopAccepting
        }
        VersionCheck::Missing => {
            error!("handshake request carries no version; server will stop");
            AfterReply::StopAccepting
        }
    };

    Dispatched { response, after }
}

/// Client side: announce `local` and read back the server's version.
///
/// A version mismatch is logged, not returned as an error. Returns the
/// version the server announced, if any.
pub(crate) fn greet(connection: &mut ClientConnection, local: &str) -> Result<Option<String>> {
    let body = serde_json::to_string(&VersionMessage {
        version: local.to_string(),
    })?;
    let response = connection.post(HANDSHAKE_PATH, body)?;
    if !response.is_success() {
        return Err(EndpointError::HandshakeFailed(format!(
            "server replied with status {}: {}",
            response.status, response.body
        )));
    }

    let reply: Value = serde_json::from_str(&response.body)?;
    match check_version(local, &reply) {
        VersionCheck::Match => {
            info!(version = local, "server version confirmed");
            Ok(Some(local.to_string()))
        }
        VersionCheck::Mismatch { remote } => {
            warn!(client = local, server = %remote, "client and server versions differ");
            Ok(Some(remote))
        }
        VersionCheck::Missing => {
            warn!("server handshake reply carries no version");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use nudock_wire::{STATUS_BAD_REQUEST, STATUS_OK};

    #[test]
    fn check_version_variants() {
        assert_eq!(
            check_version("1.0.0", &json!({ "version": "1.0.0" })),
            VersionCheck::Match
        );
        assert_eq!(
            check_version("1.0.0", &json!({ "version": "0.9.0" })),
            VersionCheck::Mismatch {
                remote: "0.9.0".to_string()
            }
        );
        assert_eq!(
            check_version("1.0.0", &json!({ "version": 1 })),
            VersionCheck::Mismatch {
                remote: "1".to_string()
            }
        );
        assert_eq!(check_version("1.0.0", &json!({})), VersionCheck::Missing);
    }

    #[test]
    fn matching_version_keeps_accepting() {
        let dispatched = answer("1.0.0", r#"{"version":"1.0.0"}"#);
        assert_eq!(dispatched.response.status, STATUS_OK);
        assert_eq!(dispatched.after, AfterReply::Continue);

        let reply: VersionMessage =
            serde_json::from_str(&dispatched.response.body).expect("reply should parse");
        assert_eq!(reply.version, "1.0.0");
    }

    #[test]
    fn mismatch_still_replies_with_server_version() {
        let dispatched = answer("1.0.0", r#"{"version":"0.9.0"}"#);
        assert_eq!(dispatched.response.status, STATUS_OK);
        assert_eq!(dispatched.after, AfterReply::StopAccepting);

        let reply: VersionMessage =
            serde_json::from_str(&dispatched.response.body).expect("reply should parse");
        assert_eq!(reply.version, "1.0.0");
    }

    #[test]
    fn missing_version_stops_accepting() {
        let dispatched = answer("1.0.0", "{}");
        assert_eq!(dispatched.response.status, STATUS_OK);
        assert_eq!(dispatched.after, AfterReply::StopAccepting);
    }

    #[test]
    fn unparseable_request_is_rejected() {
        let dispatched = answer("1.0.0", "not json");
        assert_eq!(dispatched.response.status, STATUS_BAD_REQUEST);
        assert_eq!(dispatched.after, AfterReply::StopAccepting);
    }
}
