//! CLI for `oraclebond`, handling key generation, contract setup, claiming, and
//! returning stray coins, all driven off a single persisted seed.

use std::str::FromStr;

use bitcoin::{Address, Network, PublicKey, Transaction};
use clap::{Parser, Subcommand};

use oraclebond::{
    broadcast::{HttpRelay, Relay},
    claim::{run_claim, ClaimKeys, ClaimReport},
    config::{Config, ContractMode, UtxoConfig},
    error::EngineError,
    key,
    oracle::HttpOracleClient,
    persistence, refund,
    refund::RefundReport,
    setup::{run_setup, ContractKeys, Role, SetupReport},
    wallet::{rpc::RPCConfig, OverrideSource, RpcSource, UtxoSource},
};

const DEFAULT_ORACLE_URL: &str = "https://www.realitykeys.com/api/v1";
const DEFAULT_RELAY: &str = "https://blockstream.info/api/tx";
const ALTERNATE_RELAY: &str = "https://mempool.space/api/tx";

#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(next_line_help = true)]
struct Args {
    /// Use testnet instead of mainnet
    #[arg(long, default_value_t = false)]
    testnet: bool,

    /// Don't broadcast the finished transaction; only print its hex
    #[arg(long, default_value_t = false)]
    no_pushtx: bool,

    /// Path to the seed file; defaults to ~/.oraclebond_seed, created on first use
    #[arg(long)]
    seed_file: Option<std::path::PathBuf>,

    /// Use this literal seed instead of the seed file, which is then left untouched
    #[arg(long, conflicts_with = "seed_file")]
    seed: Option<String>,

    /// Miner fee in satoshis, subtracted from a claim or payment output
    #[arg(long, default_value_t = 10_000)]
    fee: u64,

    /// Literal address:txid:vout:value inputs to use instead of querying a node.
    /// Repeat for multiple.
    #[arg(long)]
    inputs: Vec<String>,

    /// Bitcoin Core RPC URL, e.g. 127.0.0.1:8332; ignored if --inputs is given
    #[arg(long, default_value = "127.0.0.1:8332")]
    rpc_url: String,

    /// Bitcoin Core RPC wallet name
    #[arg(long)]
    rpc_wallet: Option<String>,

    /// Bitcoin Core RPC cookie-style "user:password" auth
    #[arg(long)]
    rpc_auth: Option<String>,

    /// Base URL of the oracle HTTP API
    #[arg(long, default_value = DEFAULT_ORACLE_URL)]
    oracle_url: String,

    /// Use the ECC-sum compound-key contract instead of the default IF/ELSE script
    #[arg(long, default_value_t = false)]
    ecc_voodoo: bool,

    /// Suppress progress messages
    #[arg(long, short, default_value_t = false)]
    quiet: bool,

    #[clap(subcommand)]
    subcommand: OracleBondSubcommand,
}

#[derive(Subcommand, Debug)]
enum OracleBondSubcommand {
    /// Print the local seed's public key and address, generating a seed if none exists
    MakeKeys,

    /// Fund a contract. Run once per side; pass the counterpart's half-signed
    /// transaction hex back in once they've run it too
    Setup {
        fact_id: String,
        yes_pubkey: String,
        yes_stake: u64,
        no_pubkey: String,
        no_stake: u64,
        /// The counterpart's half-signed funding transaction, once they've sent it
        half_signed_tx: Option<String>,
    },

    /// Spend a decided contract's funding output to the winning side
    Claim {
        fact_id: String,
        yes_pubkey: String,
        no_pubkey: String,
        /// Where to send the proceeds; defaults to the local seed's own address
        destination: Option<String>,
    },

    /// Pay out of the local seed's own address, e.g. to return an unused stake
    Pay { destination: String, amount: u64 },
}

fn network(args: &Args) -> Network {
    if args.testnet {
        Network::Testnet
    } else {
        Network::Bitcoin
    }
}

fn parse_pubkey(hex: &str) -> Result<PublicKey, EngineError> {
    PublicKey::from_str(hex).map_err(|e| EngineError::Protocol(format!("bad public key: {}", e)))
}

fn parse_address(s: &str, net: Network) -> Result<Address, EngineError> {
    Address::from_str(s)
        .map_err(|e| EngineError::Protocol(format!("bad address: {}", e)))?
        .require_network(net)
        .map_err(|e| EngineError::Protocol(format!("address is for the wrong network: {}", e)))
}

fn build_config(args: &Args) -> Config {
    let utxo = if args.inputs.is_empty() {
        UtxoConfig::Rpc(RPCConfig {
            url: args.rpc_url.clone(),
            auth: match &args.rpc_auth {
                Some(auth) => match auth.split_once(':') {
                    Some((user, pass)) => {
                        bitcoincore_rpc::Auth::UserPass(user.to_string(), pass.to_string())
                    }
                    None => bitcoincore_rpc::Auth::None,
                },
                None => bitcoincore_rpc::Auth::None,
            },
            network: network(args),
            wallet_name: args.rpc_wallet.clone(),
        })
    } else {
        UtxoConfig::Overrides(args.inputs.clone())
    };

    Config {
        network: network(args),
        no_broadcast: args.no_pushtx,
        fee: args.fee,
        quiet: args.quiet,
        oracle_base_url: args.oracle_url.clone(),
        utxo,
    }
}

fn build_utxo_source(config: &Config) -> Result<Box<dyn UtxoSource>, EngineError> {
    Ok(match &config.utxo {
        UtxoConfig::Rpc(rpc_config) => Box::new(RpcSource::connect(rpc_config)?),
        UtxoConfig::Overrides(literals) => {
            Box::new(OverrideSource::parse(config.network, literals)?)
        }
    })
}

fn relays() -> Vec<HttpRelay> {
    vec![
        HttpRelay {
            name: "blockstream",
            url: DEFAULT_RELAY.to_string(),
        },
        HttpRelay {
            name: "mempool.space",
            url: ALTERNATE_RELAY.to_string(),
        },
    ]
}

/// The `--seed` literal, if given, bypasses the seed file entirely -- it's neither
/// read nor created, matching the demo this CLI is modeled on.
fn load_seed(args: &Args) -> Result<String, EngineError> {
    if let Some(seed) = &args.seed {
        return Ok(seed.clone());
    }
    let path = match &args.seed_file {
        Some(path) => path.clone(),
        None => persistence::default_seed_path()?,
    };
    persistence::load_or_create(&path)
}

fn main() -> Result<(), EngineError> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or("oraclebond=info")
            .default_write_style_or("always"),
    )
    .init();

    let args = Args::parse();
    let config = build_config(&args);
    let seed = load_seed(&args)?;
    let local = key::derive(&seed, config.network);

    let mode = if args.ecc_voodoo {
        ContractMode::EccSum
    } else {
        ContractMode::IfElse
    };

    match &args.subcommand {
        OracleBondSubcommand::MakeKeys => {
            config.log(format!("seed:    {}", seed));
            config.log(format!("pubkey:  {}", local.pubkey));
            config.log(format!("address: {}", local.address));
        }
        OracleBondSubcommand::Setup {
            fact_id,
            yes_pubkey,
            yes_stake,
            no_pubkey,
            no_stake,
            half_signed_tx,
        } => {
            let keys = ContractKeys {
                yes_pubkey: parse_pubkey(yes_pubkey)?,
                yes_stake: *yes_stake,
                no_pubkey: parse_pubkey(no_pubkey)?,
                no_stake: *no_stake,
                fact_id: fact_id.clone(),
                mode,
            };

            let existing_tx: Option<Transaction> = half_signed_tx
                .as_ref()
                .map(|hex| {
                    bitcoin::consensus::encode::deserialize_hex(hex)
                        .map_err(|e| EngineError::Protocol(format!("bad transaction hex: {}", e)))
                })
                .transpose()?;

            let utxo_source = build_utxo_source(&config)?;
            let oracle_client = HttpOracleClient::new(config.oracle_base_url.clone());
            let relays = relays();
            let relay_refs: Vec<&dyn Relay> = relays.iter().map(|r| r as &dyn Relay).collect();

            let report = run_setup(
                &config,
                &keys,
                &seed,
                existing_tx.as_ref(),
                utxo_source.as_ref(),
                &oracle_client,
                &relay_refs,
            )?;

            match report {
                SetupReport::NeedsFunding { address, role } => {
                    let side = match role {
                        Role::Yes => "Yes",
                        Role::No => "No",
                    };
                    config.log(format!(
                        "{} side isn't funded yet -- send its stake to {}",
                        side, address
                    ));
                }
                SetupReport::HalfSigned { raw_hex } => {
                    config.log("only one side has signed -- send this hex to your counterpart:");
                    config.log(raw_hex);
                }
                SetupReport::FullySigned { broadcast } => {
                    report_broadcast(&config, broadcast);
                }
            }
        }
        OracleBondSubcommand::Claim {
            fact_id,
            yes_pubkey,
            no_pubkey,
            destination,
        } => {
            let keys = ClaimKeys {
                fact_id: fact_id.clone(),
                yes_pubkey: parse_pubkey(yes_pubkey)?,
                no_pubkey: parse_pubkey(no_pubkey)?,
                mode,
            };
            let destination = destination
                .as_ref()
                .map(|s| parse_address(s, config.network))
                .transpose()?;

            let utxo_source = build_utxo_source(&config)?;
            let oracle_client = HttpOracleClient::new(config.oracle_base_url.clone());
            let relays = relays();
            let relay_refs: Vec<&dyn Relay> = relays.iter().map(|r| r as &dyn Relay).collect();

            let report = run_claim(
                &config,
                &keys,
                &seed,
                destination,
                utxo_source.as_ref(),
                &oracle_client,
                &relay_refs,
            )?;

            match report {
                ClaimReport::Undecided => {
                    config.log("the oracle hasn't decided this fact yet");
                }
                ClaimReport::NothingToSpend => {
                    config.log("nothing left to spend at the contract address");
                }
                ClaimReport::Claimed { broadcast } => {
                    report_broadcast(&config, broadcast);
                }
            }
        }
        OracleBondSubcommand::Pay {
            destination,
            amount,
        } => {
            let destination = parse_address(destination, config.network)?;
            let utxo_source = build_utxo_source(&config)?;
            let relays = relays();
            let relay_refs: Vec<&dyn Relay> = relays.iter().map(|r| r as &dyn Relay).collect();

            let report = refund::run_refund(
                &config,
                &seed,
                &destination,
                *amount,
                utxo_source.as_ref(),
                &relay_refs,
            )?;

            match report {
                RefundReport::NothingToSpend => {
                    config.log("nothing funded at the local address yet");
                }
                RefundReport::Paid { broadcast } => {
                    report_broadcast(&config, broadcast);
                }
            }
        }
    }

    Ok(())
}

fn report_broadcast(config: &Config, broadcast: oraclebond::broadcast::BroadcastReport) {
    match broadcast {
        oraclebond::broadcast::BroadcastReport::Broadcast { relay } => {
            config.log(format!("broadcast via {}", relay));
        }
        oraclebond::broadcast::BroadcastReport::Manual { raw_hex } => {
            config.log("not broadcast -- submit this hex yourself:");
            config.log(raw_hex);
        }
    }
}
