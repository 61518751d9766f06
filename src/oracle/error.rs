//! Oracle HTTP client errors.

use std::error::Error;

#[derive(Debug)]
pub enum OracleError {
    Http(minreq::Error),
    Json(serde_json::Error),
    /// The oracle returned a successful response but the fact record inside it wasn't
    /// shaped the way we expect (e.g. a pubkey field that isn't valid hex).
    MalformedFact(String),
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for OracleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl From<minreq::Error> for OracleError {
    fn from(value: minreq::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for OracleError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
