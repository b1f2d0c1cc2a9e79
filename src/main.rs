// This is my entry point for the ledger CLI
// Everything below the library boundary returns typed errors; only this file exits
use clap::Parser;
use data_encoding::HEXLOWER;
use ledger_chain::{
    Blockchain, BlockchainError, Command, Config, Opt, ProofOfWork, Transaction, UTXOSet,
};
use log::{error, info, LevelFilter};
use std::process;

fn main() {
    let opt = Opt::parse();

    // I need the config before logging so the configured level applies from the start
    let config = match load_config(&opt) {
        Ok(config) => config,
        Err(e) => {
            env_logger::builder().filter_level(LevelFilter::Info).init();
            error!("Error: {e}");
            process::exit(exit_code(&e));
        }
    };
    env_logger::builder()
        .filter_level(config.get_log_level().unwrap_or(LevelFilter::Info))
        .init();

    if let Err(e) = run_command(opt.command, &config) {
        error!("Error: {e}");
        process::exit(exit_code(&e));
    }
}

// Command-line flags win over the environment and the config file
fn load_config(opt: &Opt) -> Result<Config, BlockchainError> {
    let mut config = Config::load()?;
    if let Some(db_path) = &opt.db_path {
        config.db_path = db_path.clone();
    }
    if let Some(difficulty) = opt.difficulty {
        config.difficulty = difficulty;
    }
    config.validate()?;
    Ok(config)
}

fn exit_code(err: &BlockchainError) -> i32 {
    match err {
        BlockchainError::AlreadyExists(_) => 2,
        BlockchainError::NotFound(_) => 3,
        BlockchainError::InsufficientFunds { .. } => 4,
        BlockchainError::Corrupt(_) => 5,
        BlockchainError::DifficultyUnreachable { .. } => 6,
        BlockchainError::Config(_) => 7,
        _ => 1,
    }
}

// Each command opens the ledger itself, does one thing and lets it close on drop
fn run_command(command: Command, config: &Config) -> Result<(), BlockchainError> {
    match command {
        // When I want a new ledger, the address gets the genesis subsidy
        Command::Createledger { address } => {
            let blockchain =
                Blockchain::create_with_address(&config.db_path, &address, config.difficulty)?;
            info!("Ledger created at {}", blockchain.get_db_path().display());
            println!("Done!");
        }
        // When I want to see every block, newest first
        Command::Showchain => {
            let blockchain = Blockchain::open(&config.db_path, config.difficulty)?;
            for block in blockchain.iterator() {
                let block = block?;
                println!(
                    "Prev. hash: {}",
                    HEXLOWER.encode(block.get_pre_block_hash())
                );
                println!("Index: {}", block.get_index());
                println!("Hash: {}", block.get_hash_hex());
                println!("Nonce: {}", block.get_nonce());
                println!("Timestamp: {}", block.get_timestamp());
                println!("Difficulty: {}", block.get_difficulty());
                for tx in block.get_transactions() {
                    println!("- Transaction {}", tx.get_id_hex());
                    // Coinbase inputs carry a memo instead of a real reference
                    for input in tx.get_vin() {
                        if tx.is_coinbase() {
                            println!("-- Coinbase memo = {}", input.get_script_sig());
                        } else {
                            println!(
                                "-- Input txid = {}, vout = {}, from = {}",
                                HEXLOWER.encode(input.get_txid()),
                                input.get_vout(),
                                input.get_script_sig(),
                            );
                        }
                    }
                    for output in tx.get_vout() {
                        println!(
                            "-- Output value = {}, to = {}",
                            output.get_value(),
                            output.get_script_pub_key()
                        );
                    }
                }
                println!("PoW: {}", ProofOfWork::validate(&block));
                println!();
            }
        }
        Command::GetBalance { address } => {
            let blockchain = Blockchain::open(&config.db_path, config.difficulty)?;
            let balance = UTXOSet::new(blockchain).get_balance(&address)?;
            println!("Balance of '{address}': {balance}");
        }
        // When I send coins, the transfer is mined straight into a new block
        Command::Send { from, to, amount } => {
            let blockchain = Blockchain::open(&config.db_path, config.difficulty)?;
            let utxo_set = UTXOSet::new(blockchain.clone());
            let transaction = Transaction::new_utxo_transaction(&from, &to, amount, &utxo_set)?;
            let block = blockchain.mine_block(&[transaction])?;
            info!("Transfer mined in block {}", block.get_index());
            println!("Success!");
        }
        Command::Verifychain => {
            let blockchain = Blockchain::open(&config.db_path, config.difficulty)?;
            let count = blockchain.verify_chain()?;
            println!("Chain is valid: {count} blocks checked.");
        }
    }
    Ok(())
}
