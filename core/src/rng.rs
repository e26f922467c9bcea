//! Deterministic random number generation.
//!
//! RULE: Nothing in the dashboard may call a platform RNG.
//! All randomness flows through TableRng instances derived from the
//! single master seed in the config.
//!
//! Each generated table and each fitted model gets its own stream,
//! seeded from (master_seed XOR slot_index * golden ratio). Adding a
//! new table never shifts the streams of existing ones.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single table or model.
pub struct TableRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl TableRng {
    /// Create a stream from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an index into a slice of length `len`.
    pub fn index(&mut self, len: usize) -> usize {
        self.next_u64_below(len as u64) as usize
    }

    /// Roll an integer in [lo, hi).
    pub fn int_range(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(hi > lo, "empty range {lo}..{hi}");
        lo + self.next_u64_below(hi - lo)
    }

    /// Roll a float in [lo, hi).
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.index(items.len())]
    }

    /// Sample from a simplified Pareto distribution.
    /// x_min: minimum value, alpha: shape parameter (higher = less skewed).
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }
}

/// All streams for one process, indexed by stable slot.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_slot(&self, slot: StreamSlot) -> TableRng {
        TableRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// Append only. Reordering or removing entries changes every stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    StakeholderTransactions = 0,
    Sites = 1,
    Financials = 2,
    Officials = 3,
    Transactions = 4,
    Connections = 5,
    Classifier = 6,
    IsolationForest = 7,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StakeholderTransactions => "stakeholder_transactions",
            Self::Sites => "sites",
            Self::Financials => "financials",
            Self::Officials => "officials",
            Self::Transactions => "transactions",
            Self::Connections => "connections",
            Self::Classifier => "classifier",
            Self::IsolationForest => "isolation_forest",
        }
    }
}
