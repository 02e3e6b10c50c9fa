// Veil: content visibility and moderation policy engine.
//
// This is the library root. `filtering` holds the decision core (strategies,
// thresholds, the decision engine and the rule composer), `rules` the
// catalog of composable policy units, and `redact` the post-fetch redaction
// templates. `db` is the reference SQLite query layer that executes the
// predicates the rules produce.

pub mod config;
pub mod error;
pub mod filtering;
pub mod models;
pub mod output;
pub mod redact;
pub mod rules;

#[cfg(feature = "sqlite")]
pub mod db;

pub use error::PolicyError;
pub use filtering::types::{Action, ContentType};
