//! The crate-wide error type. Each engine (`setup`, `claim`, `refund`) returns this,
//! wrapping the lower-level errors raised by its collaborators.

use std::{error::Error, fmt};

use crate::{oracle::error::OracleError, protocol::error::ContractError, wallet::error::WalletError};

/// Top-level error returned by the three engines in [`crate::setup`], [`crate::claim`]
/// and [`crate::refund`].
#[derive(Debug)]
pub enum EngineError {
    Contract(ContractError),
    Oracle(OracleError),
    Wallet(WalletError),
    IO(std::io::Error),
    /// A condition the engine can detect but refuses to proceed past, e.g. signing
    /// with a seed that doesn't own either side of the contract, or a reconstructed
    /// ECC-sum signature that doesn't verify against the expected pubkey.
    Protocol(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract(e) => write!(f, "contract error: {:?}", e),
            Self::Oracle(e) => write!(f, "oracle error: {:?}", e),
            Self::Wallet(e) => write!(f, "wallet error: {:?}", e),
            Self::IO(e) => write!(f, "io error: {}", e),
            Self::Protocol(s) => write!(f, "{}", s),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl From<ContractError> for EngineError {
    fn from(value: ContractError) -> Self {
        Self::Contract(value)
    }
}

impl From<OracleError> for EngineError {
    fn from(value: OracleError) -> Self {
        Self::Oracle(value)
    }
}

impl From<WalletError> for EngineError {
    fn from(value: WalletError) -> Self {
        Self::Wallet(value)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::IO(value)
    }
}
