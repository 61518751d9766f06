//! The oracle HTTP client: fetches the published "Yes"/"No" keys for a fact, and,
//! once the fact is decided, the winning side's private key.

pub mod error;

use std::str::FromStr;

use bitcoin::{secp256k1::SecretKey, PublicKey};
use serde::Deserialize;

use error::OracleError;

/// The raw JSON shape returned by the oracle for a single fact. All fields but the
/// pubkeys are optional because a fact can be registered but not yet decided.
#[derive(Debug, Clone, Deserialize)]
pub struct FactRecord {
    pub yes_pubkey: String,
    pub no_pubkey: String,
    pub winner: Option<String>,
    pub winner_privkey: Option<String>,
}

impl FactRecord {
    pub fn yes_pubkey(&self) -> Result<PublicKey, OracleError> {
        parse_pubkey(&self.yes_pubkey)
    }

    pub fn no_pubkey(&self) -> Result<PublicKey, OracleError> {
        parse_pubkey(&self.no_pubkey)
    }

    /// `Some("yes")`/`Some("no")` once decided, `None` while the fact is still open.
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn winner_privkey(&self) -> Result<Option<SecretKey>, OracleError> {
        match &self.winner_privkey {
            Some(hex) => Ok(Some(parse_privkey(hex)?)),
            None => Ok(None),
        }
    }
}

fn parse_pubkey(hex: &str) -> Result<PublicKey, OracleError> {
    PublicKey::from_str(hex)
        .map_err(|_| OracleError::MalformedFact(format!("bad pubkey: {}", hex)))
}

fn parse_privkey(hex: &str) -> Result<SecretKey, OracleError> {
    let bytes = bitcoin::hashes::hex::FromHex::from_hex(hex)
        .map_err(|_| OracleError::MalformedFact(format!("bad privkey hex: {}", hex)))?;
    SecretKey::from_slice(&bytes)
        .map_err(|_| OracleError::MalformedFact(format!("bad privkey: {}", hex)))
}

/// Abstracts over "fetch this fact" so engines can be tested against a canned record
/// instead of a live oracle.
pub trait OracleClient {
    fn fetch_fact(&self, fact_id: &str) -> Result<FactRecord, OracleError>;
}

/// Fetches facts from a real oracle server over HTTPS.
pub struct HttpOracleClient {
    pub base_url: String,
}

impl HttpOracleClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl OracleClient for HttpOracleClient {
    fn fetch_fact(&self, fact_id: &str) -> Result<FactRecord, OracleError> {
        let url = format!(
            "{}/fact/{}/?accept_terms_of_service=current",
            self.base_url.trim_end_matches('/'),
            fact_id
        );
        log::debug!("fetching fact from {}", url);
        let response = minreq::get(&url).send()?;
        let record: FactRecord = serde_json::from_str(response.as_str()?)?;
        Ok(record)
    }
}

/// A fixed, in-memory fact record. Used in tests and by the `--seed`-driven test
/// vectors, in place of a network round trip.
pub struct StaticOracleClient(pub FactRecord);

impl OracleClient for StaticOracleClient {
    fn fetch_fact(&self, _fact_id: &str) -> Result<FactRecord, OracleError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_undecided_fact() {
        let record = FactRecord {
            yes_pubkey: "0460d353f4c834bccd1a0e690dc5b7a3c0e07f1ed916f05234ea539c08c0792f3ee90b7704a329e6e0a9e4cda2eb156ac6b1721f53a308d2bda2cce56efa925ddd".to_string(),
            no_pubkey: "04e08a571e7a61d03fb293be00a8a3e106dfc78cc47e6ef7e088850f3883b22deaa4c904b7e9e96f6ce70a2e9c7a060374f3bbf3d5b081d68d98e6e73ec0093b22".to_string(),
            winner: None,
            winner_privkey: None,
        };
        assert!(record.yes_pubkey().is_ok());
        assert!(record.no_pubkey().is_ok());
        assert_eq!(record.winner(), None);
        assert!(record.winner_privkey().unwrap().is_none());
    }
}
