use chrono::{DateTime, Utc};

/// Access credential handed to enrichment calls. Held in memory only.
///
/// Replaced wholesale on rotation; never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    issued_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            issued_at,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}
