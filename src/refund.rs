//! Refund Engine: pay out of a party's own temporary address when a contract is
//! abandoned before it's funded, or never resolved. No oracle or contract script
//! involved; it's a plain one-input payment.

use bitcoin::{absolute::LockTime, Address, Sequence, Transaction, TxIn, TxOut, Witness};

use crate::{
    broadcast::{broadcast_with_fallback, BroadcastReport, Relay},
    config::Config,
    error::EngineError,
    key,
    protocol::contract,
    utill::pubkey_to_p2pkh_scriptpubkey,
    wallet::UtxoSource,
};

#[derive(Debug)]
pub enum RefundReport {
    NothingToSpend,
    Paid { broadcast: BroadcastReport },
}

pub fn run_refund(
    config: &Config,
    seed: &str,
    destination: &Address,
    amount: u64,
    utxo_source: &dyn UtxoSource,
    relays: &[&dyn Relay],
) -> Result<RefundReport, EngineError> {
    let local = key::derive(seed, config.network);

    let utxo = match utxo_source.find_stake_utxo(&local.address, amount, None)? {
        Some(utxo) => utxo,
        None => return Ok(RefundReport::NothingToSpend),
    };

    if utxo.value < amount + config.fee {
        return Err(EngineError::Protocol(
            "funded amount doesn't cover the requested payment plus fee".to_string(),
        ));
    }

    let mut outputs = vec![TxOut {
        value: bitcoin::Amount::from_sat(amount),
        script_pubkey: destination.script_pubkey(),
    }];

    let remainder = utxo.value - amount - config.fee;
    if remainder > 0 {
        outputs.push(TxOut {
            value: bitcoin::Amount::from_sat(remainder),
            script_pubkey: local.address.script_pubkey(),
        });
    }

    let mut tx = Transaction {
        version: 1,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: utxo.outpoint,
            script_sig: bitcoin::ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: outputs,
    };

    let script_code = pubkey_to_p2pkh_scriptpubkey(&local.pubkey);
    let sig = contract::sign_contract_input(&tx, 0, &script_code, &local.privkey)?;
    contract::apply_p2pkh_scriptsig(&mut tx.input[0], &sig, &local.pubkey);

    let broadcast = broadcast_with_fallback(relays, &tx, config.no_broadcast);
    Ok(RefundReport::Paid { broadcast })
}
