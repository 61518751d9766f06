//! Settings shared by all three engines, assembled by `src/bin/oraclebond.rs` from the CLI
//! flags and handed down into [`crate::setup`], [`crate::claim`] and [`crate::refund`].

use bitcoin::Network;

use crate::wallet::rpc::RPCConfig;

/// Which redemption script a contract uses.
///
/// `IfElse` is the default (matches the behaviour of the program this crate grew out of
/// when no flag is given); `EccSum` is opt-in via `--ecc-voodoo` because it is the more
/// exotic of the two and relies on both parties agreeing on it out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractMode {
    EccSum,
    IfElse,
}

impl Default for ContractMode {
    fn default() -> Self {
        Self::IfElse
    }
}

/// Where a UTXO lookup is allowed to come from.
#[derive(Debug, Clone)]
pub enum UtxoConfig {
    /// Ask a Bitcoin Core node.
    Rpc(RPCConfig),
    /// A literal `address:txid:vout:value` list, supplied on the command line. Used in
    /// place of a node when one isn't reachable, and in tests.
    Overrides(Vec<String>),
}

/// Everything the three engines need that isn't specific to one invocation's arguments.
#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    /// Don't broadcast the finished transaction; print its hex instead.
    pub no_broadcast: bool,
    /// Fee budget in satoshis, subtracted from the claim/refund output.
    pub fee: u64,
    pub quiet: bool,
    pub oracle_base_url: String,
    pub utxo: UtxoConfig,
}

impl Config {
    pub fn log(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", message.as_ref());
        }
    }
}
