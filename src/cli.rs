//! Console helpers shared by the `ledger` binary: tracing setup and
//! rendering of blocks, chains and scenario reports.

use crate::blockchain::{Block, Blockchain, Verification};
use crate::simulation::ScenarioReport;
use chrono::{DateTime, Local, Utc};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A second initialisation (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Full listing of one block.
pub fn render_block(block: &Block) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", format!("=== BLOCK #{} ===", block.index()).bright_cyan().bold()));
    out.push_str(&format!("Timestamp:     {}\n", format_timestamp(block.timestamp())));
    out.push_str(&format!("Previous Hash: {}\n", block.previous_hash()));
    out.push_str(&format!("Merkle Root:   {}\n", block.merkle_root()));
    out.push_str(&format!("Current Hash:  {}\n", block.hash.to_string().bright_white()));
    out.push_str(&format!("Transactions ({}):\n", block.transactions().len()));
    for (i, tx) in block.transactions().iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, tx));
    }
    out.push_str("================");
    out
}

/// One row per block.
pub fn chain_table(chain: &Blockchain) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Block").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Date").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Txs").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Previous").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
            Cell::new("Hash").fg(TableColor::Cyan).add_attribute(Attribute::Bold),
        ]);

    for block in chain.blocks() {
        table.add_row(vec![
            Cell::new(format!("#{}", block.index())).fg(TableColor::White),
            Cell::new(format_timestamp(block.timestamp())).fg(TableColor::Grey),
            Cell::new(block.transactions().len()).fg(TableColor::Yellow),
            Cell::new(format!("{}...", block.previous_hash().short(10))).fg(TableColor::Grey),
            Cell::new(format!("{}...", block.hash.short(10))).fg(TableColor::Green),
        ]);
    }
    table
}

/// Boxes joined by arrows, one per block.
pub fn render_chain_diagram(chain: &Blockchain) -> String {
    let mut out = String::new();
    for (i, block) in chain.blocks().iter().enumerate() {
        out.push_str("┌─────────────────────┐\n");
        out.push_str(&format!("│ BLOCK #{:<12} │\n", block.index()));
        out.push_str("├─────────────────────┤\n");
        out.push_str(&format!("│ TX Count: {:<9} │\n", block.transactions().len()));
        out.push_str(&format!("│ Hash: {}...    │\n", block.hash.short(10)));
        out.push_str("└─────────────────────┘\n");
        if i + 1 < chain.len() {
            out.push_str("          ↓\n");
        }
    }
    out
}

pub fn render_verification(verification: &Verification) -> String {
    match verification {
        Verification::Valid => format!("✅ {}", verification).bright_green().to_string(),
        Verification::Invalid { .. } => format!("❌ {}", verification).red().bold().to_string(),
    }
}

pub fn render_report(report: &ScenarioReport) -> String {
    let status = if report.passed() {
        "PASSED".bright_green().bold()
    } else {
        "FAILED".red().bold()
    };
    let mut out = format!("\n=== {} === {}\n", report.scenario().name().to_uppercase(), status);

    match report {
        ScenarioReport::Nominal(r) | ScenarioReport::Corrections(r) => {
            out.push_str(&format!(
                "Wrote {} transactions and {} block(s)\n",
                r.transactions_written, r.blocks_added
            ));
            out.push_str(&format!(
                "Ledger: {} blocks, {} transactions, {} DA moved\n",
                r.stats.blocks, r.stats.transactions, r.stats.total_value
            ));
            out.push_str(&render_verification(&r.verification));
        }
        ScenarioReport::Tampering(r) => {
            let describe = |v: &Option<Verification>| match v {
                Some(v) => render_verification(v),
                None => "skipped (chain too short)".yellow().to_string(),
            };
            out.push_str(&format!("Modified transaction: {}\n", describe(&r.transaction_tamper)));
            out.push_str(&format!("Forged block link:    {}\n", describe(&r.link_tamper)));
            out.push_str(&format!("After restore:        {}\n", render_verification(&r.after_restore)));
            out.push_str(&format!("Double-spend fork diverged: {}", r.fork_diverged));
        }
        ScenarioReport::Availability(r) => {
            out.push_str(&format!(
                "Replica {} failed and was recovered from replica {}\n",
                r.failed_replica, r.recovered_from
            ));
            for replica in &r.replicas {
                out.push_str(&format!(
                    "Replica {}: {} blocks, fingerprint {}...\n",
                    replica.id,
                    replica.blocks,
                    replica.fingerprint.short(10)
                ));
            }
            out.push_str(&format!("Consistent: {}", r.consistent));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_block_lists_transactions() {
        colored::control::set_override(false);
        let mut chain = Blockchain::new();
        chain.append_transaction("Alice sends 50 DA to Bob").unwrap();
        let rendered = render_block(chain.tip());
        assert!(rendered.contains("=== BLOCK #0 ==="));
        assert!(rendered.contains("1. Alice sends 50 DA to Bob"));
        assert!(rendered.contains(&chain.tip().hash.to_hex()));
    }

    #[test]
    fn test_diagram_has_one_box_per_block() {
        let mut chain = Blockchain::new();
        chain.append_transaction("Alice sends 50 DA to Bob").unwrap();
        chain.open_block().unwrap();
        let diagram = render_chain_diagram(&chain);
        assert_eq!(diagram.matches("BLOCK #").count(), 2);
        assert_eq!(diagram.matches('↓').count(), 1);
    }

    #[test]
    fn test_format_timestamp_out_of_range_falls_back() {
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }
}
