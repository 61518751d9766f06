//! The UTXO source abstraction used by every engine to find a party's stake.

pub mod error;
pub mod rpc;
pub mod utxo;

pub use error::WalletError;
pub use utxo::{OverrideSource, RpcSource, Utxo, UtxoSource};
