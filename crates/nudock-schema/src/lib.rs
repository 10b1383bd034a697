//! JSON Schema validation for nudock messages.
//!
//! Every request name owns one schema document shaped as
//!
//! ```json
//! { "properties": { "request": { ... }, "response": { ... } } }
//! ```
//!
//! which compiles into a [`SchemaPair`]: one validator for what the client
//! sends, one for what the handler returns. A [`SchemaSet`] keeps the pairs
//! of every registered request name.

pub mod config;
pub mod error;
pub mod pair;
pub mod set;
mod strict;

pub use config::SchemaConfig;
pub use error::{Direction, Result, SchemaError, Violation};
pub use pair::SchemaPair;
pub use set::SchemaSet;
