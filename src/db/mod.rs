//! SQLite persistence: the dedup ledger and the secret (refresh-token) table.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the database
//! - `actor.rs`: actor owning the pool; callers talk to it through [`DbActorHandle`]

pub mod actor;
pub mod schema;

pub use actor::{DbActorHandle, spawn};
pub use schema::SQLITE_INIT;
