use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ledger-chain", about = "A single-node proof-of-work ledger")]
pub struct Opt {
    #[arg(
        long = "db-path",
        global = true,
        help = "Ledger directory (overrides LEDGER_DB_PATH and the config file)"
    )]
    pub db_path: Option<PathBuf>,
    #[arg(
        long = "difficulty",
        global = true,
        help = "Leading zero bits required of new blocks (1-255)"
    )]
    pub difficulty: Option<u32>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    #[command(name = "createledger", about = "Create a new ledger")]
    Createledger {
        #[arg(help = "The address to send the genesis subsidy to")]
        address: String,
    },
    #[command(name = "showchain", about = "Print all blocks, newest first")]
    Showchain,
    #[command(name = "getbalance", about = "Get the balance of the target address")]
    GetBalance {
        #[arg(help = "The address to query")]
        address: String,
    },
    #[command(name = "send", about = "Transfer coins and mine them into a block")]
    Send {
        #[arg(help = "Source address")]
        from: String,
        #[arg(help = "Destination address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: u64,
    },
    #[command(name = "verifychain", about = "Check every stored block and its proof-of-work")]
    Verifychain,
}
