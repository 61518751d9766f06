//! Deterministic key derivation from a seed string.
//!
//! A party's private key is always `sha256(seed)` — a single round, not Bitcoin's usual
//! double-SHA256 — so that the same seed always reproduces the same key and address
//! without needing any file on disk beyond the seed itself (the seed is what gets
//! persisted, see [`crate::persistence`]).

use bitcoin::{
    hashes::{sha256, Hash},
    secp256k1::{Secp256k1, SecretKey},
    Address, Network, PublicKey,
};

/// A derived keypair plus the P2PKH address it controls on a given network.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub privkey: SecretKey,
    pub pubkey: PublicKey,
    pub address: Address,
}

/// `sha256(seed)`, read as a secp256k1 scalar.
pub fn privkey_from_seed(seed: &str) -> SecretKey {
    let digest = sha256::Hash::hash(seed.as_bytes());
    SecretKey::from_slice(digest.as_byte_array()).expect("sha256 digest is a valid scalar")
}

pub fn derive(seed: &str, network: Network) -> KeyMaterial {
    let privkey = privkey_from_seed(seed);
    let secp = Secp256k1::new();
    let pubkey = PublicKey {
        compressed: false,
        inner: bitcoin::secp256k1::PublicKey::from_secret_key(&secp, &privkey),
    };
    let address = Address::p2pkh(&pubkey, network);
    KeyMaterial {
        privkey,
        pubkey,
        address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Literal vectors: a seed, its derived uncompressed pubkey, and the P2PKH address
    // it maps to on mainnet and testnet.
    const BOB_SEED: &str = "bob-082b113a7e2a5c6c1c9c682b8b25087c";
    const BOB_PUB: &str = "0460d353f4c834bccd1a0e690dc5b7a3c0e07f1ed916f05234ea539c08c0792f3ee90b7704a329e6e0a9e4cda2eb156ac6b1721f53a308d2bda2cce56efa925ddd";
    const BOB_ADDR_MAINNET: &str = "12fai6JhCHKGdDpJCM8ej3g7RySThdMxCD";
    const BOB_ADDR_TESTNET: &str = "mhBY19Pg1JkXQLHuuv72YxtSHy3Acje1NJ";

    const ALICE_SEED: &str = "alice-7d267a6b6b7bd0460fcd4a37208dea46";
    const ALICE_PUB: &str = "04e08a571e7a61d03fb293be00a8a3e106dfc78cc47e6ef7e088850f3883b22deaa4c904b7e9e96f6ce70a2e9c7a060374f3bbf3d5b081d68d98e6e73ec0093b22";
    const ALICE_ADDR_TESTNET: &str = "mraEF8MUVhpXuXVJDNhM11n9ZbfPiPa8Kh";

    #[test]
    fn bob_pubkey_and_addresses() {
        let bob = derive(BOB_SEED, Network::Bitcoin);
        assert_eq!(bob.pubkey.to_bytes(), Vec::from_hex(BOB_PUB).unwrap());
        assert_eq!(bob.address.to_string(), BOB_ADDR_MAINNET);

        let bob_testnet = derive(BOB_SEED, Network::Testnet);
        assert_eq!(bob_testnet.address.to_string(), BOB_ADDR_TESTNET);
    }

    #[test]
    fn alice_pubkey_and_address() {
        let alice = derive(ALICE_SEED, Network::Testnet);
        assert_eq!(alice.pubkey.to_bytes(), Vec::from_hex(ALICE_PUB).unwrap());
        assert_eq!(alice.address.to_string(), ALICE_ADDR_TESTNET);
    }

    trait FromHex: Sized {
        fn from_hex(s: &str) -> Result<Self, ()>;
    }

    impl FromHex for Vec<u8> {
        fn from_hex(s: &str) -> Result<Self, ()> {
            (0..s.len())
                .step_by(2)
                .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| ()))
                .collect()
        }
    }

    #[test]
    fn privkey_is_sha256_of_seed() {
        let expected = sha256::Hash::hash(BOB_SEED.as_bytes());
        let privkey = privkey_from_seed(BOB_SEED);
        assert_eq!(&privkey[..], expected.as_byte_array());
    }
}
