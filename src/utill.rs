//! Small helper functions shared across the key, contract and wallet modules.

use bitcoin::{hashes::Hash, Network, PubkeyHash, PublicKey, ScriptBuf};

pub fn str_to_bitcoin_network(net_str: &str) -> Network {
    match net_str {
        "main" => Network::Bitcoin,
        "test" => Network::Testnet,
        "signet" => Network::Signet,
        "regtest" => Network::Regtest,
        _ => panic!("unknown network: {}", net_str),
    }
}

/// A plain P2PKH scriptpubkey for an uncompressed or compressed pubkey.
pub fn pubkey_to_p2pkh_scriptpubkey(pubkey: &PublicKey) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::hash(&pubkey.to_bytes()).into())
}
