//! Connection parameters for a Bitcoin Core RPC, and UTXO queries against it.

use std::convert::TryFrom;

use bitcoin::{Address, Network};
use bitcoincore_rpc::{Auth, Client, RpcApi};

use crate::utill::str_to_bitcoin_network;

use super::error::WalletError;

/// Configuration parameters for connecting to a Bitcoin node via RPC.
#[derive(Debug, Clone)]
pub struct RPCConfig {
    pub url: String,
    pub auth: Auth,
    pub network: Network,
    pub wallet_name: Option<String>,
}

const RPC_HOSTPORT: &str = "localhost:8332";

impl Default for RPCConfig {
    fn default() -> Self {
        Self {
            url: RPC_HOSTPORT.to_string(),
            auth: Auth::None,
            network: Network::Bitcoin,
            wallet_name: None,
        }
    }
}

impl TryFrom<&RPCConfig> for Client {
    type Error = WalletError;
    fn try_from(config: &RPCConfig) -> Result<Self, WalletError> {
        let url = match &config.wallet_name {
            Some(wallet_name) => format!("http://{}/wallet/{}", config.url, wallet_name),
            None => format!("http://{}", config.url),
        };
        let rpc = Client::new(&url, config.auth.clone())?;
        if config.network != str_to_bitcoin_network(rpc.get_blockchain_info()?.chain.as_str()) {
            return Err(WalletError::Protocol(
                "RPC node network doesn't match configured network".to_string(),
            ));
        }
        Ok(rpc)
    }
}

/// Every unspent output the node knows about that pays to `address`, as
/// `(txid, vout, value_in_sat)`.
pub fn list_unspent_at(
    client: &Client,
    address: &Address,
) -> Result<Vec<(bitcoin::Txid, u32, u64)>, WalletError> {
    let unspent = client.list_unspent(Some(1), None, Some(&[address.clone()]), None, None)?;
    Ok(unspent
        .into_iter()
        .map(|u| (u.txid, u.vout, u.amount.to_sat()))
        .collect())
}
