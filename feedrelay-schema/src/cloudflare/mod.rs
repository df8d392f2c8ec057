mod d1;
mod envelope;

pub use d1::{D1QueryRequest, D1QueryResult};
pub use envelope::{CfEnvelope, CfMessage};
