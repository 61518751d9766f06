//! The UTXO source abstraction: every engine needs "find me an unspent output paying
//! this address with roughly this value" without caring whether the answer came from
//! a live node or a literal list typed on the command line.
//!
//! Both backends resolve ambiguity the same way: zero matching candidates means
//! "not funded yet", and more than one matching candidate is refused rather than
//! guessed at — a party who wants a specific UTXO picked should use the literal
//! override list for the run instead.

use std::{convert::TryFrom, str::FromStr};

use bitcoin::{Address, Network, OutPoint, Txid};

use super::{
    error::WalletError,
    rpc::{list_unspent_at, RPCConfig},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub value: u64,
}

/// Picks the sole unspent output at `address` whose value falls in
/// `[min_value, max_value]` (`max_value: None` means unbounded). Returns `Ok(None)`
/// both when nothing matches and when more than one candidate does.
pub trait UtxoSource {
    fn find_stake_utxo(
        &self,
        address: &Address,
        min_value: u64,
        max_value: Option<u64>,
    ) -> Result<Option<Utxo>, WalletError>;
}

fn pick_unique(candidates: Vec<Utxo>) -> Option<Utxo> {
    let mut iter = candidates.into_iter();
    let first = iter.next()?;
    if iter.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Backed by a Bitcoin Core wallet via RPC.
pub struct RpcSource {
    client: bitcoincore_rpc::Client,
}

impl RpcSource {
    pub fn connect(config: &RPCConfig) -> Result<Self, WalletError> {
        Ok(Self {
            client: bitcoincore_rpc::Client::try_from(config)?,
        })
    }
}

impl UtxoSource for RpcSource {
    fn find_stake_utxo(
        &self,
        address: &Address,
        min_value: u64,
        max_value: Option<u64>,
    ) -> Result<Option<Utxo>, WalletError> {
        let candidates = list_unspent_at(&self.client, address)?
            .into_iter()
            .filter(|(_, _, value)| {
                *value >= min_value && max_value.map_or(true, |max| *value <= max)
            })
            .map(|(txid, vout, value)| Utxo {
                outpoint: OutPoint { txid, vout },
                value,
            })
            .collect();
        Ok(pick_unique(candidates))
    }
}

/// Backed by a literal `address:txid:vout:value` list, e.g. from `--inputs`. Used when
/// no node is reachable, and to reproduce deterministic test vectors.
pub struct OverrideSource {
    entries: Vec<(Address, OutPoint, u64)>,
}

impl OverrideSource {
    pub fn parse(network: Network, literals: &[String]) -> Result<Self, WalletError> {
        let entries = literals
            .iter()
            .map(|literal| parse_override(network, literal))
            .collect::<Result<Vec<_>, WalletError>>()?;
        Ok(Self { entries })
    }
}

fn parse_override(network: Network, literal: &str) -> Result<(Address, OutPoint, u64), WalletError> {
    let parts: Vec<&str> = literal.split(':').collect();
    let [address, txid, vout, value] = parts.as_slice() else {
        return Err(WalletError::Protocol(format!(
            "malformed override '{}', expected address:txid:vout:value",
            literal
        )));
    };
    let address = Address::from_str(address)
        .map_err(|e| WalletError::Protocol(format!("bad address in override: {}", e)))?
        .require_network(network)
        .map_err(|e| WalletError::Protocol(format!("override address wrong network: {}", e)))?;
    let txid = Txid::from_str(txid)
        .map_err(|e| WalletError::Protocol(format!("bad txid in override: {}", e)))?;
    let vout: u32 = vout
        .parse()
        .map_err(|_| WalletError::Protocol(format!("bad vout in override: {}", vout)))?;
    let value: u64 = value
        .parse()
        .map_err(|_| WalletError::Protocol(format!("bad value in override: {}", value)))?;
    Ok((address, OutPoint { txid, vout }, value))
}

impl UtxoSource for OverrideSource {
    fn find_stake_utxo(
        &self,
        address: &Address,
        min_value: u64,
        max_value: Option<u64>,
    ) -> Result<Option<Utxo>, WalletError> {
        let candidates = self
            .entries
            .iter()
            .filter(|(entry_addr, _, value)| {
                entry_addr == address
                    && *value >= min_value
                    && max_value.map_or(true, |max| *value <= max)
            })
            .map(|(_, outpoint, value)| Utxo {
                outpoint: *outpoint,
                value: *value,
            })
            .collect();
        Ok(pick_unique(candidates))
    }
}
