//! Scenario runner exercising the ledger end to end.
//!
//! Each scenario drives a [`Blockchain`] through the public engine API and
//! returns a typed report:
//! - `nominal`: write transactions into the open block and a new block, then
//!   read back totals and verify
//! - `corrections`: record corrective and refund transactions instead of
//!   editing history
//! - `tampering`: edit a stored transaction and a block link without
//!   resealing, confirm verification catches both, then restore; also fork a
//!   block to show two diverging histories
//! - `availability`: run independent replicas (deep copies), take one down,
//!   grow the others, recover the failed one from a peer and compare
//!   fingerprints

use crate::blockchain::{Block, Blockchain, LedgerStats, Verification};
use crate::config::SimulationConfig;
use crate::crypto::Digest;
use crate::error::ChainError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Forged predecessor written by the link-tampering step.
pub const FORGED_PREVIOUS_HASH: &str =
    "000000000000000000000000000000000000000000000000000000000000abcd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Nominal,
    Corrections,
    Tampering,
    Availability,
}

impl Scenario {
    /// Every scenario, in the order `run_all` executes them.
    pub const ALL: [Scenario; 4] = [
        Scenario::Nominal,
        Scenario::Corrections,
        Scenario::Tampering,
        Scenario::Availability,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Nominal => "nominal",
            Scenario::Corrections => "corrections",
            Scenario::Tampering => "tampering",
            Scenario::Availability => "availability",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ChainError::ConfigError(format!(
                    "Unknown scenario '{}' (expected one of: nominal, corrections, tampering, availability)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub transactions_written: usize,
    pub blocks_added: usize,
    pub stats: LedgerStats,
    pub verification: Verification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TamperingReport {
    /// Verification after changing an amount in block 1; `None` when the
    /// chain had no block 1 to attack.
    pub transaction_tamper: Option<Verification>,
    /// Verification after forging block 2's predecessor; `None` when the
    /// chain had no block 2.
    pub link_tamper: Option<Verification>,
    /// Verification once every edit was undone.
    pub after_restore: Verification,
    /// Whether the main block and its fork ended up with different digests.
    pub fork_diverged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaStatus {
    pub id: usize,
    pub blocks: usize,
    pub fingerprint: Digest,
    pub verification: Verification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    pub failed_replica: usize,
    pub recovered_from: usize,
    pub replicas: Vec<ReplicaStatus>,
    /// All replicas share one fingerprint.
    pub consistent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum ScenarioReport {
    Nominal(WriteReport),
    Corrections(WriteReport),
    Tampering(TamperingReport),
    Availability(AvailabilityReport),
}

impl ScenarioReport {
    pub fn scenario(&self) -> Scenario {
        match self {
            ScenarioReport::Nominal(_) => Scenario::Nominal,
            ScenarioReport::Corrections(_) => Scenario::Corrections,
            ScenarioReport::Tampering(_) => Scenario::Tampering,
            ScenarioReport::Availability(_) => Scenario::Availability,
        }
    }

    /// Whether the scenario observed what it set out to demonstrate.
    pub fn passed(&self) -> bool {
        match self {
            ScenarioReport::Nominal(r) | ScenarioReport::Corrections(r) => {
                r.verification.is_valid()
            }
            ScenarioReport::Tampering(r) => {
                r.transaction_tamper.map_or(true, |v| !v.is_valid())
                    && r.link_tamper.map_or(true, |v| !v.is_valid())
                    && r.after_restore.is_valid()
                    && r.fork_diverged
            }
            ScenarioReport::Availability(r) => {
                r.consistent && r.replicas.iter().all(|s| s.verification.is_valid())
            }
        }
    }
}

/// Runs scenarios against one chain, which accumulates their writes.
pub struct Simulation {
    chain: Blockchain,
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_chain(Blockchain::new(), config)
    }

    pub fn with_chain(chain: Blockchain, config: SimulationConfig) -> Self {
        Simulation { chain, config }
    }

    pub fn chain(&self) -> &Blockchain {
        &self.chain
    }

    pub fn into_chain(self) -> Blockchain {
        self.chain
    }

    pub fn run(&mut self, scenario: Scenario) -> Result<ScenarioReport, ChainError> {
        info!(%scenario, "Running scenario");
        let report = match scenario {
            Scenario::Nominal => ScenarioReport::Nominal(self.run_nominal()?),
            Scenario::Corrections => ScenarioReport::Corrections(self.run_corrections()?),
            Scenario::Tampering => ScenarioReport::Tampering(self.run_tampering()?),
            Scenario::Availability => ScenarioReport::Availability(self.run_availability()?),
        };
        if report.passed() {
            info!(%scenario, "Scenario passed");
        } else {
            warn!(%scenario, "Scenario did not behave as expected");
        }
        Ok(report)
    }

    pub fn run_all(&mut self) -> Result<Vec<ScenarioReport>, ChainError> {
        Scenario::ALL.into_iter().map(|s| self.run(s)).collect()
    }

    /// Three transactions into the open block, then a new block with two more.
    pub fn run_nominal(&mut self) -> Result<WriteReport, ChainError> {
        self.write_two_rounds(
            &[
                "Alice sends 50 DA to Bob",
                "Charlie sends 75 DA to Dave",
                "Eve sends 25 DA to Frank",
            ],
            &["Grace sends 100 DA to Heidi", "Ivan sends 150 DA to Judy"],
        )
    }

    /// History is never edited: a mistaken transfer is followed by a
    /// corrective one, and a sale by its refund.
    pub fn run_corrections(&mut self) -> Result<WriteReport, ChainError> {
        self.write_two_rounds(
            &[
                "Alice sends 100 DA to Wrong_Address",
                "Wrong_Address sends 100 DA to Correct_Address",
            ],
            &[
                "Merchant sends 200 DA to Customer",
                "Customer sends 200 DA to Merchant",
            ],
        )
    }

    fn write_two_rounds(
        &mut self,
        open_block: &[&str],
        new_block: &[&str],
    ) -> Result<WriteReport, ChainError> {
        for raw in open_block {
            self.chain.append_transaction(raw)?;
        }
        info!(
            block = self.chain.tip().index(),
            count = open_block.len(),
            "Added transactions to the current block"
        );

        let mut block = self.chain.next_block();
        for raw in new_block {
            block.append_transaction(raw)?;
        }
        self.chain.append_block(block)?;
        info!(block = self.chain.tip().index(), "New block added to the chain");

        let stats = self.chain.stats();
        info!(
            blocks = stats.blocks,
            transactions = stats.transactions,
            total_value = %stats.total_value,
            "Read back ledger totals"
        );

        Ok(WriteReport {
            transactions_written: open_block.len() + new_block.len(),
            blocks_added: 1,
            stats,
            verification: self.chain.verify_integrity(),
        })
    }

    pub fn run_tampering(&mut self) -> Result<TamperingReport, ChainError> {
        let transaction_tamper = tamper_transaction(&mut self.chain, 1, 0);
        let link_tamper = tamper_link(&mut self.chain, 2)?;
        let after_restore = self.chain.verify_integrity();

        // Same open block, two conflicting spends.
        let mut fork: Block = self.chain.tip().clone();
        self.chain
            .append_transaction("Attacker sends 1000 DA to Merchant1")?;
        fork.append_transaction("Attacker sends 1000 DA to Merchant2")?;
        let fork_diverged = fork.hash != self.chain.tip().hash;
        info!(
            main = %self.chain.tip().hash.short(10),
            fork = %fork.hash.short(10),
            "Double spend produced two competing block digests"
        );

        Ok(TamperingReport {
            transaction_tamper,
            link_tamper,
            after_restore,
            fork_diverged,
        })
    }

    /// Replicas are deep copies of the chain; the chain itself is untouched.
    pub fn run_availability(&mut self) -> Result<AvailabilityReport, ChainError> {
        let SimulationConfig {
            replicas: replica_count,
            failed_replica,
        } = self.config;

        let mut replicas: Vec<Option<Blockchain>> =
            (0..replica_count).map(|_| Some(self.chain.clone())).collect();
        info!(replicas = replica_count, blocks = self.chain.len(), "Replicas hold a full copy");

        let failed = replicas
            .get_mut(failed_replica)
            .ok_or_else(|| {
                ChainError::ConfigError(format!("No replica {} to take down", failed_replica))
            })?;
        *failed = None;
        warn!(replica = failed_replica, "Replica went down");

        // One timestamp for the round so every live replica seals the same block.
        let timestamp = chrono::Utc::now().timestamp();
        for (id, replica) in replicas.iter_mut().enumerate() {
            let Some(chain) = replica.as_mut() else {
                continue;
            };
            let tip = chain.tip();
            let mut block = Block::with_timestamp(tip.index() + 1, tip.hash, timestamp);
            block.append_transaction("Alice sends 100 DA to Bob")?;
            block.append_transaction("Charlie sends 50 DA to Dave")?;
            chain.append_block(block)?;
            info!(replica = id, blocks = chain.len(), "Replica added a block");
        }

        let recovered_from = replicas
            .iter()
            .position(Option::is_some)
            .ok_or_else(|| ChainError::ConfigError("No live replica to recover from".to_string()))?;
        let donor = replicas[recovered_from].clone();
        replicas[failed_replica] = donor;
        info!(replica = failed_replica, from = recovered_from, "Replica recovered from peer");

        let statuses: Vec<ReplicaStatus> = replicas
            .iter()
            .enumerate()
            .filter_map(|(id, replica)| replica.as_ref().map(|chain| (id, chain)))
            .map(|(id, chain)| ReplicaStatus {
                id,
                blocks: chain.len(),
                fingerprint: chain.fingerprint(),
                verification: chain.verify_integrity(),
            })
            .collect();

        let consistent = statuses.len() == replica_count
            && statuses
                .windows(2)
                .all(|pair| pair[0].fingerprint == pair[1].fingerprint);
        if consistent {
            info!("All replicas are consistent");
        } else {
            warn!("Inconsistency detected between replicas");
        }

        Ok(AvailabilityReport {
            failed_replica,
            recovered_from,
            replicas: statuses,
            consistent,
        })
    }
}

/// Shift the amount of one stored transaction by one without resealing,
/// verify, then put the amount back. `None` when the block or transaction
/// does not exist.
pub fn tamper_transaction(
    chain: &mut Blockchain,
    block_index: u64,
    tx_index: usize,
) -> Option<Verification> {
    let original = {
        let tx = chain.block_mut(block_index)?.transactions.get_mut(tx_index)?;
        let original = tx.amount;
        tx.amount = if original == u64::MAX { original - 1 } else { original + 1 };
        info!(block = block_index, tx = tx_index, from = original, to = tx.amount, "Modified transaction");
        original
    };

    let verification = chain.verify_integrity();
    if !verification.is_valid() {
        info!(%verification, "Attack detected, modification rejected");
    }

    if let Some(tx) = chain
        .block_mut(block_index)
        .and_then(|b| b.transactions.get_mut(tx_index))
    {
        tx.amount = original;
    }
    Some(verification)
}

/// Forge a block's predecessor digest, verify, then put it back. `None` when
/// the block does not exist.
pub fn tamper_link(chain: &mut Blockchain, block_index: u64) -> Result<Option<Verification>, ChainError> {
    let forged = Digest::from_hex(FORGED_PREVIOUS_HASH)?;
    let original = match chain.block_mut(block_index) {
        Some(block) => std::mem::replace(&mut block.header.previous_hash, forged),
        None => return Ok(None),
    };

    let verification = chain.verify_integrity();
    if !verification.is_valid() {
        info!(%verification, "Attack detected, broken link rejected");
    }

    if let Some(block) = chain.block_mut(block_index) {
        block.header.previous_hash = original;
    }
    Ok(Some(verification))
}
