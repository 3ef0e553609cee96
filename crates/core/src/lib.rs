//! Domain logic for the patrimoni registry.
//!
//! Everything in this crate is pure: no database, no HTTP. The api crate
//! wires these pieces to sqlx and the completion service.

pub mod completion;
pub mod error;
pub mod normalizer;
pub mod prompt;
pub mod sql_guard;
pub mod sync;
pub mod types;
