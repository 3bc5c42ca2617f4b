//! Undo journal
//!
//! Every ledger mutation records the value it overwrote. Reverting to a
//! checkpoint replays those records backwards.

use alloy::primitives::{Address, B256, U256};

use crate::types::Asset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JournalEntry {
    Balance {
        asset: Asset,
        account: Address,
        previous: U256,
    },
    Allowance {
        token: Address,
        owner: Address,
        spender: Address,
        previous: U256,
    },
    Nonce {
        signer: Address,
        key: B256,
    },
    Reserves {
        pair: Address,
        reserve0: U256,
        reserve1: U256,
    },
    PairAdded {
        pair: Address,
    },
}

/// Position in the journal returned by `Ledger::checkpoint`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(pub(crate) usize);

#[derive(Debug, Clone, Default)]
pub(crate) struct Journal {
    entries: Vec<JournalEntry>,
    depth: usize,
}

impl Journal {
    pub fn open(&mut self) -> Checkpoint {
        self.depth += 1;
        Checkpoint(self.entries.len())
    }

    pub fn is_recording(&self) -> bool {
        self.depth > 0
    }

    pub fn record(&mut self, entry: JournalEntry) {
        if self.is_recording() {
            self.entries.push(entry);
        }
    }

    /// Entries written after `checkpoint`, newest first
    pub fn unwind(&mut self, checkpoint: Checkpoint) -> Vec<JournalEntry> {
        let mut undone = self.entries.split_off(checkpoint.0.min(self.entries.len()));
        undone.reverse();
        self.close();
        undone
    }

    pub fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.entries.clear();
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
