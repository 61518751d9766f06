//! Getting a finished transaction onto the network, with two things that can go
//! wrong along the way: no relay reachable, and a relay's standardness policy
//! rejecting the IF/ELSE redeemscript's non-standard shape. Both engines that
//! produce a spendable transaction ([`crate::claim`], [`crate::refund`]) go through
//! this same fallback chain.

use bitcoin::{consensus::encode::serialize_hex, Transaction};

use crate::oracle::error::OracleError;

/// What happened when we tried to get a transaction out.
#[derive(Debug)]
pub enum BroadcastReport {
    /// A relay accepted it.
    Broadcast { relay: &'static str },
    /// Every relay refused it, or broadcasting was disabled; here's the raw hex to
    /// submit by hand (e.g. via `bitcoin-cli sendrawtransaction`).
    Manual { raw_hex: String },
}

/// One way of getting a raw transaction onto the network.
pub trait Relay {
    fn name(&self) -> &'static str;
    fn push(&self, raw_hex: &str) -> Result<(), OracleError>;
}

/// The primary relay: a standard HTTP push-tx endpoint that enforces normal
/// standardness policy.
pub struct HttpRelay {
    pub name: &'static str,
    pub url: String,
}

impl Relay for HttpRelay {
    fn name(&self) -> &'static str {
        self.name
    }

    fn push(&self, raw_hex: &str) -> Result<(), OracleError> {
        log::debug!("pushing transaction via {} ({})", self.name, self.url);
        let response = minreq::post(&self.url)
            .with_body(raw_hex.to_string())
            .send()?;
        if response.status_code >= 200 && response.status_code < 300 {
            Ok(())
        } else {
            Err(OracleError::MalformedFact(format!(
                "{} rejected transaction: HTTP {}",
                self.name, response.status_code
            )))
        }
    }
}

/// Try each relay in order; the first to accept wins. If none do (or `no_broadcast`
/// is set), return the hex for manual submission rather than failing outright — a
/// non-standard IF/ELSE script getting rejected everywhere isn't this crate's bug to
/// fix, just something the operator needs to push through a node with relaxed
/// policy themselves.
pub fn broadcast_with_fallback(
    relays: &[&dyn Relay],
    tx: &Transaction,
    no_broadcast: bool,
) -> BroadcastReport {
    let raw_hex = serialize_hex(tx);

    if no_broadcast {
        return BroadcastReport::Manual { raw_hex };
    }

    for relay in relays {
        match relay.push(&raw_hex) {
            Ok(()) => {
                return BroadcastReport::Broadcast {
                    relay: relay.name(),
                }
            }
            Err(e) => log::warn!("{} failed: {:?}", relay.name(), e),
        }
    }

    BroadcastReport::Manual { raw_hex }
}
