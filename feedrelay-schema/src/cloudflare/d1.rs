use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body for `POST /accounts/{account}/d1/database/{db}/query`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct D1QueryRequest {
    pub sql: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

/// One statement's result inside the envelope's `result` array.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct D1QueryResult {
    #[serde(default)]
    pub results: Vec<Map<String, Value>>,

    #[serde(default)]
    pub success: bool,
}
