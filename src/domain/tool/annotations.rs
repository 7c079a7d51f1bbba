//! Tool annotations - Behavioral metadata that drives policy and execution.
//!
//! Annotations are not advisory: the engine uses them to confine side effects
//! to the act state, to demand approval for risky tools, to decide whether a
//! failed invocation may be retried, and to cache results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk classification for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// No meaningful risk.
    #[default]
    None,
    /// Minor, easily reversed effects.
    Low,
    /// Effects that require some care to reverse.
    Medium,
    /// Effects that are hard to reverse.
    High,
    /// Effects that may be irreversible.
    Critical,
}

impl RiskLevel {
    /// Returns true if this risk level alone requires human approval.
    pub fn requires_approval(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Behavioral metadata attached to every tool.
///
/// The five fields are orthogonal: a tool can be read-only yet high risk
/// (e.g. exporting sensitive data), or destructive yet idempotent
/// (e.g. deleting a specific record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Annotations {
    /// The tool observes but never mutates external state.
    pub read_only: bool,
    /// The tool's effect is not trivially reversible.
    pub destructive: bool,
    /// Repeated execution with identical input is safe; enables retry.
    pub idempotent: bool,
    /// Results for identical input may be served from cache.
    pub cacheable: bool,
    /// Risk classification.
    pub risk_level: RiskLevel,
}

impl Annotations {
    /// Annotations for a safe, repeatable observation tool.
    pub fn read_only_idempotent() -> Self {
        Self {
            read_only: true,
            idempotent: true,
            ..Self::default()
        }
    }

    /// Sets the destructive flag.
    pub fn with_destructive(mut self, destructive: bool) -> Self {
        self.destructive = destructive;
        self
    }

    /// Sets the cacheable flag.
    pub fn with_cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Sets the risk level.
    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    /// Returns true if invoking a tool with these annotations requires
    /// human approval: destructive, or risk high/critical.
    pub fn requires_approval(&self) -> bool {
        self.destructive || self.risk_level.requires_approval()
    }

    /// Returns true if the tool may execute outside the act state.
    pub fn is_side_effect_free(&self) -> bool {
        self.read_only
    }
}
