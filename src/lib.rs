#![doc = include_str!("../README.md")]

extern crate bitcoin;
extern crate bitcoincore_rpc;

pub mod broadcast;
pub mod claim;
pub mod config;
pub mod error;
pub mod key;
pub mod oracle;
pub mod persistence;
pub mod protocol;
pub mod refund;
pub mod setup;
pub mod utill;
pub mod wallet;
