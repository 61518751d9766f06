//! Errors raised while looking up or constructing UTXOs.

#[derive(Debug)]
pub enum WalletError {
    File(std::io::Error),
    Json(serde_json::Error),
    Rpc(bitcoincore_rpc::Error),
    Protocol(String),
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        Self::File(e)
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<bitcoincore_rpc::Error> for WalletError {
    fn from(value: bitcoincore_rpc::Error) -> Self {
        Self::Rpc(value)
    }
}
