//! Identifier allocation for ledger rows.
//!
//! Services never let the store pick UUIDs; they ask an `IdGenerator`, so tests
//! can substitute a deterministic sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub trait IdGenerator {
    fn next_id(&self) -> Uuid;
}

/// Random v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic identifiers `00000000-0000-4000-8000-{counter}`, starting at 1.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        // Low 48 bits carry the counter; version/variant nibbles stay valid v4.
        Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0000 | u128::from(n & 0xFFFF_FFFF_FFFF))
    }
}

impl<T: IdGenerator + ?Sized> IdGenerator for &T {
    fn next_id(&self) -> Uuid {
        (**self).next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::{IdGenerator, SequentialIds};

    #[test]
    fn sequential_ids_are_stable_and_increasing() {
        let ids = SequentialIds::new();
        assert_eq!(
            ids.next_id().to_string(),
            "00000000-0000-4000-8000-000000000001"
        );
        assert_eq!(
            ids.next_id().to_string(),
            "00000000-0000-4000-8000-000000000002"
        );
    }
}
