// src/engine/id_generator.rs - ClOrdID Generation
//! Correlation identifiers for outbound orders and cancels
//!
//! The generator is injected into the registry rather than held as global
//! state, so tests can substitute a deterministic source.

use parking_lot::Mutex;

use crate::core::types::ClOrdId;

/// Source of ClOrdIDs
pub trait ClOrdIdGenerator: Send + Sync {
    /// Next identifier; never repeats within the generator's lifetime
    fn next(&self) -> ClOrdId;
}

/// Decimal rendering of a counter starting at 1
#[derive(Debug, Default)]
pub struct SequentialClOrdIdGenerator {
    last: Mutex<u64>,
}

impl SequentialClOrdIdGenerator {
    /// Generator whose first value is `"1"`
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClOrdIdGenerator for SequentialClOrdIdGenerator {
    fn next(&self) -> ClOrdId {
        let mut last = self.last.lock();
        *last += 1;
        last.to_string()
    }
}
