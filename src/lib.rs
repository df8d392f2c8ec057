pub mod alert;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod http;
mod oauth_utils;
pub mod runner;
pub mod store;
pub mod token;
mod utils;

pub use config::Config;
pub use error::RelayError;
pub use runner::{RelayComponents, RelayRunner, RunReport, RunSettings};
