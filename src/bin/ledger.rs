#![forbid(unsafe_code)]
//! Command-line front end for the ledger: an interactive session, a sentence
//! parser and the scenario runner.

use clap::{Parser, Subcommand};
use colored::*;
use ledgerchain::blockchain::Blockchain;
use ledgerchain::cli::{
    chain_table, init_tracing, render_block, render_chain_diagram, render_report,
    render_verification,
};
use ledgerchain::config::{load_config, load_config_from, Config};
use ledgerchain::error::ChainError;
use ledgerchain::simulation::{tamper_transaction, Scenario, Simulation};
use ledgerchain::transaction::parse_transaction;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./ledger.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Menu-driven session on a fresh in-memory chain
    Interactive,
    /// Parse a transaction sentence and show its canonical form and digest
    Parse {
        /// e.g. Alice sends 50 DA to Bob
        #[arg(required = true, num_args = 1..)]
        sentence: Vec<String>,
    },
    /// Run the built-in scenarios against a fresh chain
    Scenarios {
        /// Run a single scenario: nominal, corrections, tampering or availability
        #[arg(long)]
        only: Option<Scenario>,
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    init_tracing(&config.logging.filter);

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => interactive(&config)?,
        Commands::Parse { sentence } => parse(&sentence.join(" "))?,
        Commands::Scenarios { only, json } => scenarios(&config, only, json)?,
    }

    Ok(())
}

fn parse(sentence: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tx = parse_transaction(sentence)?;
    println!("{} {}", "Canonical:".bright_cyan(), tx);
    println!("{} {}", "Leaf hash:".bright_cyan(), tx.hash());
    Ok(())
}

fn scenarios(
    config: &Config,
    only: Option<Scenario>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut simulation = Simulation::new(config.simulation.clone());
    let reports = match only {
        Some(scenario) => vec![simulation.run(scenario)?],
        None => simulation.run_all()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!("{}", render_report(report));
    }
    println!("\n{}", "=== Final Blockchain State ===".bright_cyan().bold());
    println!("{}", chain_table(simulation.chain()));

    if reports.iter().all(|r| r.passed()) {
        println!("{}", "All scenarios passed".bright_green().bold());
    } else {
        println!("{}", "Some scenarios failed".red().bold());
    }
    Ok(())
}

fn print_menu() {
    println!("\n{}", "===== LEDGER =====".bright_cyan().bold());
    println!("1. Add transaction to current block");
    println!("2. Create new block");
    println!("3. View blockchain");
    println!("4. Verify blockchain integrity");
    println!("5. Simulate attack");
    println!("6. Run scenarios");
    println!("7. Visualize blockchain");
    println!("0. Exit");
}

fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    label: &str,
) -> io::Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    lines.next().transpose()
}

fn interactive(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = Blockchain::new();
    println!("{}", "A genesis block has been created automatically.".yellow());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_menu();
        let Some(choice) = prompt(&mut lines, "Enter your choice: ")? else {
            break;
        };

        match choice.trim() {
            "1" => {
                let Some(raw) = prompt(
                    &mut lines,
                    "Enter transaction (format: 'Sender sends Amount DA to Receiver'): ",
                )?
                else {
                    break;
                };
                match chain.append_transaction(&raw) {
                    Ok(()) => println!(
                        "{}",
                        format!("Transaction added to block #{}", chain.tip().index()).green()
                    ),
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            "2" => match chain.open_block() {
                Ok(index) => println!(
                    "{}",
                    format!("New block #{} created and added to the blockchain.", index).green()
                ),
                Err(e) => println!("{}", e.to_string().red()),
            },
            "3" => {
                for block in chain.blocks() {
                    println!("{}", render_block(block));
                }
            }
            "4" => println!("{}", render_verification(&chain.verify_integrity())),
            "5" => {
                let Some(block_index) = prompt(&mut lines, "Enter block index to attack: ")? else {
                    break;
                };
                let Some(tx_index) = prompt(&mut lines, "Enter transaction index within block: ")?
                else {
                    break;
                };
                match (block_index.trim().parse::<u64>(), tx_index.trim().parse::<usize>()) {
                    (Ok(b), Ok(t)) if b > 0 => {
                        if let Err(e) = chain.get(b).ok_or(ChainError::BlockNotFound(b)) {
                            println!("{}", e.to_string().red());
                            continue;
                        }
                        match tamper_transaction(&mut chain, b, t) {
                            Some(verification) => {
                                println!("{}", render_verification(&verification));
                                println!("{}", "The modification was reverted.".yellow());
                            }
                            None => println!("{}", "No such transaction in that block.".red()),
                        }
                    }
                    _ => println!("{}", "Invalid index. Try again.".red()),
                }
            }
            "6" => scenarios(config, None, false)?,
            "7" => {
                println!("{}", render_chain_diagram(&chain));
                println!("{}", chain_table(&chain));
            }
            "0" => {
                println!("{}", "Session terminated.".bright_cyan());
                break;
            }
            _ => println!("{}", "Invalid choice. Please try again.".red()),
        }
    }

    Ok(())
}
