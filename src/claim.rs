//! Claim Engine: the winner-side spend of a funded contract.

use bitcoin::{absolute::LockTime, Address, PublicKey, Sequence, Transaction, TxIn, TxOut, Witness};

use crate::{
    broadcast::{broadcast_with_fallback, BroadcastReport, Relay},
    config::{Config, ContractMode},
    error::EngineError,
    key,
    oracle::OracleClient,
    protocol::contract,
    wallet::UtxoSource,
};

#[derive(Debug, Clone)]
pub struct ClaimKeys {
    pub fact_id: String,
    pub yes_pubkey: PublicKey,
    pub no_pubkey: PublicKey,
    pub mode: ContractMode,
}

#[derive(Debug)]
pub enum ClaimReport {
    /// The oracle hasn't decided this fact yet, or hasn't published the winning key.
    Undecided,
    /// The fact is decided but nothing is left to spend at the contract address.
    NothingToSpend,
    Claimed { broadcast: BroadcastReport },
}

fn winner_side_pubkey<'a>(winner: &str, keys: &'a ClaimKeys) -> Result<&'a PublicKey, EngineError> {
    match winner {
        "Yes" => Ok(&keys.yes_pubkey),
        "No" => Ok(&keys.no_pubkey),
        other => Err(EngineError::Protocol(format!(
            "oracle reported an unrecognised winner '{}'",
            other
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_claim(
    config: &Config,
    keys: &ClaimKeys,
    seed: &str,
    destination: Option<Address>,
    utxo_source: &dyn UtxoSource,
    oracle: &dyn OracleClient,
    relays: &[&dyn Relay],
) -> Result<ClaimReport, EngineError> {
    let fact = oracle.fetch_fact(&keys.fact_id)?;
    let (winner, winner_privkey) = match (fact.winner(), fact.winner_privkey()?) {
        (Some(winner), Some(privkey)) => (winner.to_string(), privkey),
        _ => return Ok(ClaimReport::Undecided),
    };

    let local = key::derive(seed, config.network);
    let expected_pubkey = winner_side_pubkey(&winner, keys)?;
    if local.pubkey != *expected_pubkey {
        return Err(EngineError::Protocol(
            "the seed in use doesn't match the winning side's public key -- are you sure you won?"
                .to_string(),
        ));
    }

    let oracle_yes = fact.yes_pubkey()?;
    let oracle_no = fact.no_pubkey()?;

    let combined_yes = contract::add_pubkeys(&keys.yes_pubkey, &oracle_yes)?;
    let combined_no = contract::add_pubkeys(&keys.no_pubkey, &oracle_no)?;

    let redeemscript = match keys.mode {
        ContractMode::EccSum => contract::create_eccsum_redeemscript(&combined_yes, &combined_no),
        ContractMode::IfElse => {
            contract::create_ifelse_redeemscript(&keys.yes_pubkey, &oracle_yes, &keys.no_pubkey, &oracle_no)
        }
    };
    let p2sh_address = contract::p2sh_address(&redeemscript, config.network)?;

    let utxo = match utxo_source.find_stake_utxo(&p2sh_address, 0, None)? {
        Some(utxo) => utxo,
        None => return Ok(ClaimReport::NothingToSpend),
    };

    if utxo.value <= config.fee {
        return Err(EngineError::Protocol(
            "funding output is too small to cover the claim fee".to_string(),
        ));
    }

    let destination = destination.unwrap_or_else(|| local.address.clone());

    let mut tx = Transaction {
        version: 1,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: utxo.outpoint,
            script_sig: bitcoin::ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: bitcoin::Amount::from_sat(utxo.value - config.fee),
            script_pubkey: destination.script_pubkey(),
        }],
    };

    match keys.mode {
        ContractMode::EccSum => {
            let combined_privkey = contract::add_privkeys(&local.privkey, &winner_privkey)?;
            let expected_combined_pub = if winner == "Yes" { &combined_yes } else { &combined_no };
            let secp = bitcoin::secp256k1::Secp256k1::new();
            let derived_combined_pub = PublicKey {
                compressed: false,
                inner: bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &combined_privkey),
            };
            if derived_combined_pub != *expected_combined_pub {
                return Err(EngineError::Protocol(
                    "reconstructed compound key doesn't match the expected one -- are you sure you won?"
                        .to_string(),
                ));
            }
            let sig = contract::sign_contract_input(&tx, 0, &redeemscript, &combined_privkey)?;
            contract::apply_eccsum_scriptsig(&mut tx.input[0], &sig, &redeemscript);
        }
        ContractMode::IfElse => {
            let user_sig = contract::sign_contract_input(&tx, 0, &redeemscript, &local.privkey)?;
            let oracle_sig = contract::sign_contract_input(&tx, 0, &redeemscript, &winner_privkey)?;
            contract::apply_ifelse_scriptsig(
                &mut tx.input[0],
                &user_sig,
                &oracle_sig,
                winner == "Yes",
                &redeemscript,
            );
        }
    }

    let broadcast = broadcast_with_fallback(relays, &tx, config.no_broadcast);
    Ok(ClaimReport::Claimed { broadcast })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::UtxoConfig,
        oracle::{FactRecord, StaticOracleClient},
        wallet::OverrideSource,
    };
    use bitcoin::Network;

    #[test]
    fn undecided_fact_stops_before_building_anything() {
        let bob = key::derive("bob-082b113a7e2a5c6c1c9c682b8b25087c", Network::Testnet);
        let alice = key::derive("alice-7d267a6b6b7bd0460fcd4a37208dea46", Network::Testnet);

        let keys = ClaimKeys {
            fact_id: "3".to_string(),
            yes_pubkey: bob.pubkey,
            no_pubkey: alice.pubkey,
            mode: ContractMode::IfElse,
        };

        let config = Config {
            network: Network::Testnet,
            no_broadcast: true,
            fee: 10_000,
            quiet: true,
            oracle_base_url: "http://example.invalid".to_string(),
            utxo: UtxoConfig::Overrides(vec![]),
        };

        let oracle_client = StaticOracleClient(FactRecord {
            yes_pubkey: bob.pubkey.to_string(),
            no_pubkey: alice.pubkey.to_string(),
            winner: None,
            winner_privkey: None,
        });
        let utxo_source = OverrideSource::parse(Network::Testnet, &[]).unwrap();

        let report = run_claim(
            &config,
            &keys,
            "bob-082b113a7e2a5c6c1c9c682b8b25087c",
            None,
            &utxo_source,
            &oracle_client,
            &[],
        )
        .unwrap();

        assert!(matches!(report, ClaimReport::Undecided));
    }

    #[test]
    fn loser_seed_is_rejected_before_spending() {
        let bob = key::derive("bob-082b113a7e2a5c6c1c9c682b8b25087c", Network::Testnet);
        let alice = key::derive("alice-7d267a6b6b7bd0460fcd4a37208dea46", Network::Testnet);

        let keys = ClaimKeys {
            fact_id: "3".to_string(),
            yes_pubkey: bob.pubkey,
            no_pubkey: alice.pubkey,
            mode: ContractMode::EccSum,
        };

        let config = Config {
            network: Network::Testnet,
            no_broadcast: true,
            fee: 10_000,
            quiet: true,
            oracle_base_url: "http://example.invalid".to_string(),
            utxo: UtxoConfig::Overrides(vec![]),
        };

        let oracle_client = StaticOracleClient(FactRecord {
            yes_pubkey: bob.pubkey.to_string(),
            no_pubkey: alice.pubkey.to_string(),
            winner: Some("Yes".to_string()),
            winner_privkey: Some(format!("{:064x}", 1u8)),
        });
        let utxo_source = OverrideSource::parse(Network::Testnet, &[]).unwrap();

        let result = run_claim(
            &config,
            &keys,
            "carol-not-in-this-contract",
            None,
            &utxo_source,
            &oracle_client,
            &[],
        );

        assert!(result.is_err());
    }
}
