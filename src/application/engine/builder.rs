//! Engine builder - Wires the engine's collaborators.
//!
//! Required collaborators are validated at `build()`. Wiring mistakes like
//! a missing planner surface here, so `run()` itself never has to report a
//! configuration error.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::policy::{StateTransitions, ToolEligibility, TOOL_CALLS};
use crate::domain::tool::ToolRegistry;
use crate::ports::{Approver, EventStore, Planner, RunStore};

use super::{Engine, EngineHook};
use crate::application::execution::{ExecutorConfig, ResilientExecutor};

/// Configuration errors detected at engine construction.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// No planner was configured.
    #[error("engine requires a planner")]
    MissingPlanner,

    /// A configuration value is unusable.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Fluent builder for [`Engine`].
pub struct EngineBuilder {
    registry: Arc<ToolRegistry>,
    planner: Option<Arc<dyn Planner>>,
    eligibility: ToolEligibility,
    transitions: StateTransitions,
    budgets: Vec<(String, u64)>,
    executor: Option<Arc<ResilientExecutor>>,
    executor_config: ExecutorConfig,
    approver: Option<Arc<dyn Approver>>,
    run_store: Option<Arc<dyn RunStore>>,
    event_store: Option<Arc<dyn EventStore>>,
    hooks: Vec<Arc<dyn EngineHook>>,
    max_steps: u32,
    vars: HashMap<String, JsonValue>,
}

impl EngineBuilder {
    /// Creates a builder with an empty registry, the canonical transition
    /// map, and default executor limits.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new()),
            planner: None,
            eligibility: ToolEligibility::new(),
            transitions: StateTransitions::default(),
            budgets: Vec::new(),
            executor: None,
            executor_config: ExecutorConfig::default(),
            approver: None,
            run_store: None,
            event_store: None,
            hooks: Vec::new(),
            max_steps: 50,
            vars: HashMap::new(),
        }
    }

    /// Sets the shared, read-only tool registry.
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the planner.
    pub fn with_planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Sets the tool eligibility map.
    pub fn with_eligibility(mut self, eligibility: ToolEligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// Replaces the canonical transition map.
    pub fn with_transitions(mut self, transitions: StateTransitions) -> Self {
        self.transitions = transitions;
        self
    }

    /// Adds a budget counter with a cap.
    pub fn with_budget(mut self, counter: impl Into<String>, cap: u64) -> Self {
        self.budgets.push((counter.into(), cap));
        self
    }

    /// Sets the executor configuration; ignored when a shared executor is
    /// supplied via [`with_executor`](Self::with_executor).
    pub fn with_executor_config(mut self, config: ExecutorConfig) -> Self {
        self.executor_config = config;
        self
    }

    /// Shares an existing executor (and its limits) with this engine.
    pub fn with_executor(mut self, executor: Arc<ResilientExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the approver for destructive and high-risk tools.
    pub fn with_approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = Some(approver);
        self
    }

    /// Persists finished runs to the given store.
    pub fn with_run_store(mut self, run_store: Arc<dyn RunStore>) -> Self {
        self.run_store = Some(run_store);
        self
    }

    /// Projects finished ledgers into the given event store.
    pub fn with_event_store(mut self, event_store: Arc<dyn EventStore>) -> Self {
        self.event_store = Some(event_store);
        self
    }

    /// Adds an observer hook.
    pub fn with_hook(mut self, hook: Arc<dyn EngineHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Caps the number of steps per run.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Adds a run variable visible to the planner and to tools.
    pub fn with_var(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.vars.insert(key.into(), value);
        self
    }

    /// Validates the configuration and builds the engine.
    pub fn build(self) -> Result<Engine, BuildError> {
        let planner = self.planner.ok_or(BuildError::MissingPlanner)?;
        if self.max_steps == 0 {
            return Err(BuildError::InvalidConfig(
                "max_steps must be at least 1".to_string(),
            ));
        }
        let mut budgets = self.budgets;
        // The engine always charges tool_calls; uncapped unless configured.
        if !budgets.iter().any(|(name, _)| name == TOOL_CALLS) {
            budgets.push((TOOL_CALLS.to_string(), u64::MAX));
        }
        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(ResilientExecutor::new(self.executor_config)));
        Ok(Engine::from_parts(
            self.registry,
            planner,
            self.eligibility,
            self.transitions,
            budgets,
            executor,
            self.approver,
            self.run_store,
            self.event_store,
            self.hooks,
            self.max_steps,
            self.vars,
        ))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
