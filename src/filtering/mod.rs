// Filtering: the decision core.
//
// Leaves first: value types, viewing-context strategies, thresholds and
// severity levels, the decision engine that combines them, and the composer
// that ANDs rule predicates into one WHERE clause.

pub mod composer;
pub mod engine;
pub mod severity;
pub mod sql;
pub mod strategy;
pub mod thresholds;
pub mod types;
