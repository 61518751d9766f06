//! Setup Engine: the two-party handshake that funds a contract.
//!
//! Both parties run this independently against the same [`ContractKeys`]. Whoever
//! runs it first gets back a single-signed transaction to hand to the other side;
//! whoever runs it second (passing the first transaction back in as `existing_tx`)
//! gets back a fully-signed, broadcastable one — provided their independently built
//! reference matches it byte-for-byte once input scripts are cleared.

use bitcoin::{
    absolute::LockTime, Address, OutPoint, PublicKey, ScriptBuf, Sequence, Transaction, TxIn,
    TxOut, Witness,
};

use crate::{
    broadcast::{broadcast_with_fallback, BroadcastReport, Relay},
    config::{Config, ContractMode},
    error::EngineError,
    key,
    oracle::OracleClient,
    protocol::contract,
    utill::pubkey_to_p2pkh_scriptpubkey,
    wallet::{Utxo, UtxoSource},
};

/// Half of the minimum/maximum total-transaction-fee budget the source program
/// allowed per side, since a two-input transaction splits the fee burden evenly.
pub const MIN_TRANSACTION_FEE: u64 = 10_000;
pub const MAX_TRANSACTION_FEE: u64 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub struct ContractKeys {
    pub yes_pubkey: PublicKey,
    pub yes_stake: u64,
    pub no_pubkey: PublicKey,
    pub no_stake: u64,
    pub fact_id: String,
    pub mode: ContractMode,
}

#[derive(Debug)]
pub enum SetupReport {
    /// One side's stake isn't funded yet; nothing was built or signed.
    NeedsFunding { address: Address, role: Role },
    /// Only one side has signed so far; hand this hex to the counterpart.
    HalfSigned { raw_hex: String },
    /// Both sides have signed.
    FullySigned { broadcast: BroadcastReport },
}

fn determine_role(local: &PublicKey, keys: &ContractKeys) -> Result<Role, EngineError> {
    if *local == keys.yes_pubkey {
        Ok(Role::Yes)
    } else if *local == keys.no_pubkey {
        Ok(Role::No)
    } else {
        Err(EngineError::Protocol(
            "local public key matches neither the yes nor the no side of this contract"
                .to_string(),
        ))
    }
}

fn redeemscript_for(
    keys: &ContractKeys,
    oracle_yes: &PublicKey,
    oracle_no: &PublicKey,
) -> Result<ScriptBuf, EngineError> {
    Ok(match keys.mode {
        ContractMode::EccSum => {
            let combined_yes = contract::add_pubkeys(&keys.yes_pubkey, oracle_yes)?;
            let combined_no = contract::add_pubkeys(&keys.no_pubkey, oracle_no)?;
            contract::create_eccsum_redeemscript(&combined_yes, &combined_no)
        }
        ContractMode::IfElse => contract::create_ifelse_redeemscript(
            &keys.yes_pubkey,
            oracle_yes,
            &keys.no_pubkey,
            oracle_no,
        ),
    })
}

/// A transaction identical to `tx` but with every input's `script_sig`/`witness`
/// cleared, for comparing two independently assembled but not-yet-fully-signed
/// transactions.
fn strip_input_scripts(tx: &Transaction) -> Transaction {
    let mut stripped = tx.clone();
    for input in stripped.input.iter_mut() {
        input.script_sig = ScriptBuf::new();
        input.witness = Witness::new();
    }
    stripped
}

fn build_funding_tx(inputs: &[(Role, Utxo)], total_stake: u64, p2sh_address: &Address) -> Transaction {
    Transaction {
        version: 1,
        lock_time: LockTime::ZERO,
        input: inputs
            .iter()
            .map(|(_, utxo)| TxIn {
                previous_output: utxo.outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output: vec![TxOut {
            value: bitcoin::Amount::from_sat(total_stake),
            script_pubkey: p2sh_address.script_pubkey(),
        }],
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_setup(
    config: &Config,
    keys: &ContractKeys,
    seed: &str,
    existing_tx: Option<&Transaction>,
    utxo_source: &dyn UtxoSource,
    oracle: &dyn OracleClient,
    relays: &[&dyn Relay],
) -> Result<SetupReport, EngineError> {
    if keys.yes_stake == 0 && keys.no_stake == 0 {
        return Err(EngineError::Protocol(
            "at least one side must stake a positive amount".to_string(),
        ));
    }

    let local = key::derive(seed, config.network);
    let role = determine_role(&local.pubkey, keys)?;

    let fact = oracle.fetch_fact(&keys.fact_id)?;
    let oracle_yes = fact.yes_pubkey()?;
    let oracle_no = fact.no_pubkey()?;

    let mut inputs: Vec<(Role, Utxo)> = Vec::new();
    for (role, pubkey, stake) in [
        (Role::Yes, &keys.yes_pubkey, keys.yes_stake),
        (Role::No, &keys.no_pubkey, keys.no_stake),
    ] {
        if stake == 0 {
            continue;
        }
        let address = Address::p2pkh(pubkey, config.network);
        let min_value = stake + MIN_TRANSACTION_FEE / 2;
        let max_value = if MAX_TRANSACTION_FEE > 0 {
            Some(stake + MAX_TRANSACTION_FEE / 2)
        } else {
            None
        };
        match utxo_source.find_stake_utxo(&address, min_value, max_value)? {
            Some(utxo) => inputs.push((role, utxo)),
            None => return Ok(SetupReport::NeedsFunding { address, role }),
        }
    }

    let redeemscript = redeemscript_for(keys, &oracle_yes, &oracle_no)?;
    let p2sh_address = contract::p2sh_address(&redeemscript, config.network)?;

    let total_stake = keys.yes_stake + keys.no_stake;
    let mut tx = build_funding_tx(&inputs, total_stake, &p2sh_address);

    if let Some(existing) = existing_tx {
        if strip_input_scripts(existing) != strip_input_scripts(&tx) {
            return Err(EngineError::Protocol(
                "counterpart's funding transaction doesn't match the locally built reference"
                    .to_string(),
            ));
        }
        tx = existing.clone();
    }

    let local_index = inputs
        .iter()
        .position(|(input_role, _)| *input_role == role)
        .expect("local role always has a corresponding input, or determine_role would have failed earlier");

    let script_code = pubkey_to_p2pkh_scriptpubkey(&local.pubkey);
    let sig = contract::sign_contract_input(&tx, local_index, &script_code, &local.privkey)?;
    contract::apply_p2pkh_scriptsig(&mut tx.input[local_index], &sig, &local.pubkey);

    let signatures_needed = inputs.len();
    let signatures_done = usize::from(existing_tx.is_some()) + 1;

    if signatures_done >= signatures_needed {
        let broadcast = broadcast_with_fallback(relays, &tx, config.no_broadcast);
        Ok(SetupReport::FullySigned { broadcast })
    } else {
        Ok(SetupReport::HalfSigned {
            raw_hex: bitcoin::consensus::encode::serialize_hex(&tx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{FactRecord, StaticOracleClient};
    use crate::wallet::OverrideSource;
    use bitcoin::Network;

    fn fact(yes_pub: &str, no_pub: &str) -> StaticOracleClient {
        StaticOracleClient(FactRecord {
            yes_pubkey: yes_pub.to_string(),
            no_pubkey: no_pub.to_string(),
            winner: None,
            winner_privkey: None,
        })
    }

    #[test]
    fn reports_needs_funding_when_no_utxo_present() {
        let bob = key::derive("bob-082b113a7e2a5c6c1c9c682b8b25087c", Network::Testnet);
        let alice = key::derive("alice-7d267a6b6b7bd0460fcd4a37208dea46", Network::Testnet);

        let keys = ContractKeys {
            yes_pubkey: bob.pubkey,
            yes_stake: 90_000,
            no_pubkey: alice.pubkey,
            no_stake: 90_000,
            fact_id: "3".to_string(),
            mode: ContractMode::IfElse,
        };

        let config = Config {
            network: Network::Testnet,
            no_broadcast: true,
            fee: 10_000,
            quiet: true,
            oracle_base_url: "http://example.invalid".to_string(),
            utxo: crate::config::UtxoConfig::Overrides(vec![]),
        };

        let utxo_source = OverrideSource::parse(Network::Testnet, &[]).unwrap();
        let oracle_client = fact(
            "032e58afe51f9ed8ad3cc7897f634d881fdbe49a81564629ded8156bebd2ffd1af",
            "039b6347398505f5ec93826dc61c19f47c66c0283ee9be980e29ce325a0f4679ef",
        );

        let report = run_setup(
            &config,
            &keys,
            "bob-082b113a7e2a5c6c1c9c682b8b25087c",
            None,
            &utxo_source,
            &oracle_client,
            &[],
        )
        .unwrap();

        assert!(matches!(report, SetupReport::NeedsFunding { role: Role::Yes, .. }));
    }

    #[test]
    fn rejects_local_key_not_party_to_contract() {
        let bob = key::derive("bob-082b113a7e2a5c6c1c9c682b8b25087c", Network::Testnet);
        let alice = key::derive("alice-7d267a6b6b7bd0460fcd4a37208dea46", Network::Testnet);
        let carol = key::derive("carol-not-in-this-contract", Network::Testnet);

        let keys = ContractKeys {
            yes_pubkey: bob.pubkey,
            yes_stake: 90_000,
            no_pubkey: alice.pubkey,
            no_stake: 90_000,
            fact_id: "3".to_string(),
            mode: ContractMode::IfElse,
        };

        assert!(determine_role(&carol.pubkey, &keys).is_err());
    }
}
