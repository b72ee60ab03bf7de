use super::chain::Block;

/// Read-side aggregates over a chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LedgerStats {
    pub blocks: usize,
    pub transactions: usize,
    /// Sum of every transaction amount, in DA.
    pub total_value: u128,
}

impl LedgerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: &[Block]) -> Self {
        blocks.iter().fold(Self::new(), |mut stats, block| {
            stats.record_block(block);
            stats
        })
    }

    pub fn record_block(&mut self, block: &Block) {
        self.blocks += 1;
        self.transactions += block.transactions.len();
        self.total_value += block.total_value();
    }
}
