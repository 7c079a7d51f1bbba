//! Budget - Named counters with caps and atomic charging.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

/// Counter name the engine charges before each tool invocation.
pub const TOOL_CALLS: &str = "tool_calls";

/// Errors from budget operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BudgetError {
    /// Charging would exceed the counter's cap; the counter is unchanged.
    #[error("budget exhausted for counter '{counter}' (cap {cap})")]
    Exhausted { counter: String, cap: u64 },

    /// The counter does not exist.
    #[error("unknown budget counter '{counter}'")]
    UnknownCounter { counter: String },
}

/// Point-in-time view of one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Amount charged so far.
    pub count: u64,
    /// Maximum amount that may be charged.
    pub cap: u64,
}

impl CounterSnapshot {
    /// Remaining headroom before the cap.
    pub fn remaining(&self) -> u64 {
        self.cap.saturating_sub(self.count)
    }

    /// True if the counter is at its cap.
    pub fn is_exhausted(&self) -> bool {
        self.count >= self.cap
    }
}

/// Atomic view of all counters, ordered by name for determinism.
pub type BudgetSnapshot = BTreeMap<String, CounterSnapshot>;

#[derive(Debug, Clone)]
struct Counter {
    count: u64,
    cap: u64,
}

/// Named counters, each with a non-negative cap and a current count.
///
/// Charges are atomic: either the counter advances by the full amount or it
/// is left unchanged and the charge fails. Safe for concurrent charging.
#[derive(Debug, Default)]
pub struct Budget {
    counters: Mutex<BTreeMap<String, Counter>>,
}

impl Budget {
    /// Creates a budget with no counters; `is_exhausted` is false and any
    /// charge fails with an unknown-counter error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a budget from `(name, cap)` pairs.
    pub fn with_caps<I, S>(caps: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let counters = caps
            .into_iter()
            .map(|(name, cap)| (name.into(), Counter { count: 0, cap }))
            .collect();
        Self {
            counters: Mutex::new(counters),
        }
    }

    /// Adds a counter with the given cap, replacing any existing counter of
    /// the same name.
    pub fn set_cap(&self, name: impl Into<String>, cap: u64) {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counters.insert(name.into(), Counter { count: 0, cap });
    }

    /// Returns true if a counter with the given name exists.
    pub fn has_counter(&self, name: &str) -> bool {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(name)
    }

    /// Charges a counter by `amount`.
    ///
    /// Fails without mutating if the counter is unknown or the charge would
    /// exceed the cap.
    pub fn charge(&self, name: &str, amount: u64) -> Result<(), BudgetError> {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let counter = counters
            .get_mut(name)
            .ok_or_else(|| BudgetError::UnknownCounter {
                counter: name.to_string(),
            })?;
        let charged = counter.count.checked_add(amount);
        match charged {
            Some(total) if total <= counter.cap => counter.count = total,
            _ => {
                return Err(BudgetError::Exhausted {
                    counter: name.to_string(),
                    cap: counter.cap,
                })
            }
        }
        Ok(())
    }

    /// Returns an atomic snapshot of all counters.
    pub fn snapshot(&self) -> BudgetSnapshot {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(name, counter)| {
                (
                    name.clone(),
                    CounterSnapshot {
                        count: counter.count,
                        cap: counter.cap,
                    },
                )
            })
            .collect()
    }

    /// Returns true if any counter is at its cap.
    pub fn is_exhausted(&self) -> bool {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .any(|counter| counter.count >= counter.cap)
    }
}
