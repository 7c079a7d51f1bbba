//! End-to-end scenarios for the engine step loop.
//!
//! These tests drive full runs through scripted planners and in-memory
//! collaborators: happy path, budget stops, approval denial, side-effect
//! confinement, retry, and circuit breaking across runs.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use waypoint::adapters::approvers::StaticApprover;
use waypoint::adapters::planners::ScriptedPlanner;
use waypoint::adapters::storage::{InMemoryEventStore, InMemoryRunStore};
use waypoint::application::execution::{BreakerState, ExecutorConfig, ResilientExecutor};
use waypoint::domain::policy::ToolEligibility;
use waypoint::domain::run::{EvidenceKind, LedgerKind, RunStatus};
use waypoint::domain::tool::{Annotations, RiskLevel, Tool, ToolRegistry};
use waypoint::domain::{AgentState, Decision};
use waypoint::ports::{
    EventStore, RunStore, ToolContext, ToolError, ToolHandler, ToolOutput,
};
use waypoint::{EngineBuilder, RunOutcome};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Echoes `{"m": ...}` back as `{"echoed": ...}`.
struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    async fn handle(&self, _ctx: &ToolContext, input: JsonValue) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::new(json!({ "echoed": input["m"] })))
    }
}

/// Fails a configured number of calls, then succeeds; counts invocations.
struct FlakyTool {
    failures_left: AtomicUsize,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolHandler for FlakyTool {
    async fn handle(&self, _ctx: &ToolContext, _input: JsonValue) -> Result<ToolOutput, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(ToolError::execution_failed("flaky", "transient outage"));
        }
        Ok(ToolOutput::new(json!({ "recovered": true })))
    }
}

/// Always errors; counts invocations.
struct BrokenTool {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ToolHandler for BrokenTool {
    async fn handle(&self, _ctx: &ToolContext, _input: JsonValue) -> Result<ToolOutput, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ToolError::execution_failed("broken", "permanent outage"))
    }
}

fn echo_registry() -> Arc<ToolRegistry> {
    let registry = ToolRegistry::new();
    registry
        .register(
            Tool::new("echo", "echoes its input", Arc::new(EchoTool))
                .unwrap()
                .with_annotations(Annotations::read_only_idempotent()),
        )
        .unwrap();
    Arc::new(registry)
}

fn explore_eligibility(tool: &str) -> ToolEligibility {
    ToolEligibility::new().with_allowed(AgentState::Explore, tool)
}

fn ledger_kinds(outcome: &RunOutcome) -> Vec<LedgerKind> {
    outcome.ledger.entries().iter().map(|e| e.kind).collect()
}

fn tool_outputs(outcome: &RunOutcome) -> Vec<JsonValue> {
    outcome
        .run
        .evidence()
        .iter()
        .filter(|record| record.kind == EvidenceKind::ToolOutput)
        .map(|record| record.content.clone())
        .collect()
}

fn fast_executor() -> ExecutorConfig {
    ExecutorConfig {
        retry_initial_delay: Duration::from_millis(1),
        ..ExecutorConfig::default()
    }
}

/// Run with `RUST_LOG=waypoint=debug` to watch the step loop.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn happy_path_with_one_tool() {
    init_tracing();
    let engine = EngineBuilder::new()
        .with_registry(echo_registry())
        .with_eligibility(explore_eligibility("echo"))
        .with_planner(Arc::new(ScriptedPlanner::from_pairs([
            (
                AgentState::Intake,
                Decision::transition(AgentState::Explore, "normalized goal"),
            ),
            (
                AgentState::Explore,
                Decision::call_tool("echo", json!({"m": "hi"}), "probe"),
            ),
            (
                AgentState::Explore,
                Decision::finish("gathered enough", json!({"ok": true})),
            ),
        ])))
        .build()
        .unwrap();

    let outcome = engine.run("say hi").await;

    assert_eq!(outcome.run.status(), RunStatus::Completed);
    assert_eq!(outcome.run.state(), AgentState::Done);
    assert_eq!(outcome.run.result(), Some(&json!({"ok": true})));

    let outputs = tool_outputs(&outcome);
    assert_eq!(outputs, vec![json!({"echoed": "hi"})]);

    let last = outcome.ledger.entries().last().unwrap();
    assert_eq!(last.kind, LedgerKind::RunFinished);
    assert_eq!(last.payload["status"], "completed");

    let charges = outcome.ledger.entries_of_kind(LedgerKind::BudgetCharged);
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].payload["counter"], "tool_calls");
    assert_eq!(charges[0].payload["count"], 1);
}

#[tokio::test]
async fn budget_stops_the_fourth_call() {
    let mut script = vec![(
        AgentState::Intake,
        Decision::transition(AgentState::Explore, "start"),
    )];
    for _ in 0..5 {
        script.push((
            AgentState::Explore,
            Decision::call_tool("echo", json!({"m": "again"}), "probe"),
        ));
    }

    let engine = EngineBuilder::new()
        .with_registry(echo_registry())
        .with_eligibility(explore_eligibility("echo"))
        .with_budget("tool_calls", 3)
        .with_planner(Arc::new(ScriptedPlanner::from_pairs(script)))
        .build()
        .unwrap();

    let outcome = engine.run("probe repeatedly").await;

    assert_eq!(outcome.run.status(), RunStatus::Failed);
    assert!(outcome.run.error().unwrap().contains("tool_calls"));
    assert_eq!(tool_outputs(&outcome).len(), 3);

    let kinds = ledger_kinds(&outcome);
    let exhausted = kinds
        .iter()
        .filter(|kind| **kind == LedgerKind::BudgetExhausted)
        .count();
    assert_eq!(exhausted, 1);

    // No tool starts after the exhaustion entry.
    let exhausted_at = kinds
        .iter()
        .position(|kind| *kind == LedgerKind::BudgetExhausted)
        .unwrap();
    assert!(!kinds[exhausted_at..].contains(&LedgerKind::ToolStarted));
}

#[tokio::test]
async fn destructive_tool_requires_approval_and_denial_fails() {
    let registry = ToolRegistry::new();
    registry
        .register(
            Tool::new("delete", "removes a record", Arc::new(EchoTool))
                .unwrap()
                .with_annotations(
                    Annotations::default()
                        .with_destructive(true)
                        .with_risk_level(RiskLevel::High),
                ),
        )
        .unwrap();

    let engine = EngineBuilder::new()
        .with_registry(Arc::new(registry))
        .with_eligibility(ToolEligibility::new().with_allowed(AgentState::Act, "delete"))
        .with_approver(Arc::new(StaticApprover::deny_all()))
        .with_planner(Arc::new(ScriptedPlanner::from_pairs([
            (
                AgentState::Intake,
                Decision::transition(AgentState::Explore, ""),
            ),
            (
                AgentState::Explore,
                Decision::transition(AgentState::Decide, ""),
            ),
            (AgentState::Decide, Decision::transition(AgentState::Act, "")),
            (
                AgentState::Act,
                Decision::call_tool("delete", json!({}), "cleanup"),
            ),
        ])))
        .build()
        .unwrap();

    let outcome = engine.run("clean up").await;

    assert_eq!(outcome.run.status(), RunStatus::Failed);
    assert_eq!(outcome.run.error(), Some("approval denied for tool: delete"));

    let kinds = ledger_kinds(&outcome);
    let requested_at = kinds
        .iter()
        .position(|kind| *kind == LedgerKind::ApprovalRequested)
        .unwrap();
    let denied_at = kinds
        .iter()
        .position(|kind| *kind == LedgerKind::ApprovalDenied)
        .unwrap();
    assert!(requested_at < denied_at);
    assert!(!kinds.contains(&LedgerKind::ToolStarted));
}

#[tokio::test]
async fn side_effecting_tool_outside_act_is_rejected() {
    let registry = ToolRegistry::new();
    registry
        .register(Tool::new("write", "mutates state", Arc::new(EchoTool)).unwrap())
        .unwrap();

    // Eligibility mistakenly allows the side-effecting tool in explore.
    let engine = EngineBuilder::new()
        .with_registry(Arc::new(registry))
        .with_eligibility(explore_eligibility("write"))
        .with_planner(Arc::new(ScriptedPlanner::from_pairs([
            (
                AgentState::Intake,
                Decision::transition(AgentState::Explore, ""),
            ),
            (
                AgentState::Explore,
                Decision::call_tool("write", json!({}), "mutate early"),
            ),
        ])))
        .build()
        .unwrap();

    let outcome = engine.run("misconfigured").await;

    assert_eq!(outcome.run.status(), RunStatus::Failed);
    assert!(outcome.run.error().unwrap().contains("side-effecting"));
    assert!(!ledger_kinds(&outcome).contains(&LedgerKind::ToolStarted));
}

#[tokio::test]
async fn idempotent_tool_retries_and_the_run_completes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ToolRegistry::new();
    registry
        .register(
            Tool::new(
                "flaky",
                "fails once then recovers",
                Arc::new(FlakyTool {
                    failures_left: AtomicUsize::new(1),
                    calls: Arc::clone(&calls),
                }),
            )
            .unwrap()
            .with_annotations(Annotations::read_only_idempotent()),
        )
        .unwrap();

    let engine = EngineBuilder::new()
        .with_registry(Arc::new(registry))
        .with_eligibility(explore_eligibility("flaky"))
        .with_executor_config(ExecutorConfig {
            retry_max_attempts: 2,
            ..fast_executor()
        })
        .with_planner(Arc::new(ScriptedPlanner::from_pairs([
            (
                AgentState::Intake,
                Decision::transition(AgentState::Explore, ""),
            ),
            (
                AgentState::Explore,
                Decision::call_tool("flaky", json!({}), "fetch"),
            ),
            (
                AgentState::Explore,
                Decision::finish("fetched", json!({"done": true})),
            ),
        ])))
        .build()
        .unwrap();

    let outcome = engine.run("fetch with retry").await;

    assert_eq!(outcome.run.status(), RunStatus::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(tool_outputs(&outcome).len(), 1);

    let tool_kinds: Vec<LedgerKind> = ledger_kinds(&outcome)
        .into_iter()
        .filter(|kind| {
            matches!(
                kind,
                LedgerKind::ToolStarted | LedgerKind::ToolFailed | LedgerKind::ToolSucceeded
            )
        })
        .collect();
    assert_eq!(
        tool_kinds,
        vec![
            LedgerKind::ToolStarted,
            LedgerKind::ToolFailed,
            LedgerKind::ToolStarted,
            LedgerKind::ToolSucceeded,
        ]
    );
}

#[tokio::test]
async fn circuit_opens_after_three_failing_runs_and_fails_fast() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ToolRegistry::new();
    registry
        .register(
            Tool::new(
                "broken",
                "always errors",
                Arc::new(BrokenTool {
                    calls: Arc::clone(&calls),
                }),
            )
            .unwrap()
            .with_annotations(Annotations {
                read_only: true,
                ..Annotations::default()
            }),
        )
        .unwrap();
    let registry = Arc::new(registry);

    let script = || {
        ScriptedPlanner::from_pairs([
            (
                AgentState::Intake,
                Decision::transition(AgentState::Explore, ""),
            ),
            (
                AgentState::Explore,
                Decision::call_tool("broken", json!({}), "doomed"),
            ),
        ])
    };

    // One executor shared by five engines: the breaker table spans runs.
    let executor = Arc::new(ResilientExecutor::new(ExecutorConfig {
        circuit_breaker_threshold: 3,
        retry_max_attempts: 1,
        ..fast_executor()
    }));

    let run_once = |n: usize| {
        let engine = EngineBuilder::new()
            .with_registry(Arc::clone(&registry))
            .with_eligibility(explore_eligibility("broken"))
            .with_planner(Arc::new(script()))
            .with_executor(Arc::clone(&executor))
            .build()
            .unwrap();
        async move { engine.run(format!("run {}", n)).await }
    };

    for n in 1..=3 {
        let outcome = run_once(n).await;
        assert!(outcome.run.error().unwrap().contains("tool_error:broken"));
    }

    assert_eq!(executor.breaker_state("broken"), BreakerState::Open);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    for n in 4..=5 {
        let outcome = run_once(n).await;
        assert!(outcome.run.error().unwrap().contains("circuit open"));
    }

    // Fail-fast runs never reached the handler.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(executor.breaker_state("broken"), BreakerState::Open);
}

// =============================================================================
// Lifecycle and persistence
// =============================================================================

#[tokio::test]
async fn finished_runs_are_persisted_to_configured_stores() {
    let run_store = Arc::new(InMemoryRunStore::new());
    let event_store = Arc::new(InMemoryEventStore::new());
    let engine = EngineBuilder::new()
        .with_registry(echo_registry())
        .with_eligibility(explore_eligibility("echo"))
        .with_run_store(Arc::clone(&run_store) as Arc<dyn RunStore>)
        .with_event_store(Arc::clone(&event_store) as Arc<dyn EventStore>)
        .with_planner(Arc::new(ScriptedPlanner::from_pairs([
            (
                AgentState::Intake,
                Decision::transition(AgentState::Explore, ""),
            ),
            (
                AgentState::Explore,
                Decision::finish("quick", json!(null)),
            ),
        ])))
        .build()
        .unwrap();

    let outcome = engine.run("persist me").await;

    let loaded = run_store.load(outcome.run.id()).await.unwrap();
    assert_eq!(loaded.status(), RunStatus::Completed);

    let events = event_store.load(outcome.run.id()).await.unwrap();
    assert_eq!(events.len(), outcome.ledger.len());
    let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
    let expected: Vec<u64> = (0..events.len() as u64).collect();
    assert_eq!(sequences, expected);
}

#[tokio::test]
async fn ledger_sequences_are_contiguous_and_timestamps_monotonic() {
    let engine = EngineBuilder::new()
        .with_registry(echo_registry())
        .with_eligibility(explore_eligibility("echo"))
        .with_planner(Arc::new(ScriptedPlanner::from_pairs([
            (
                AgentState::Intake,
                Decision::transition(AgentState::Explore, ""),
            ),
            (
                AgentState::Explore,
                Decision::call_tool("echo", json!({"m": "a"}), ""),
            ),
            (
                AgentState::Explore,
                Decision::call_tool("echo", json!({"m": "b"}), ""),
            ),
            (
                AgentState::Explore,
                Decision::finish("done", json!(null)),
            ),
        ])))
        .build()
        .unwrap();

    let outcome = engine.run("check ordering").await;
    let entries = outcome.ledger.entries();
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.sequence, i as u64);
    }
    for pair in entries.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    for pair in outcome.run.evidence().windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
        assert_eq!(pair[1].sequence, pair[0].sequence + 1);
    }
}

#[tokio::test]
async fn replaying_the_same_script_reproduces_the_terminal_state() {
    let script = || {
        ScriptedPlanner::from_pairs([
            (
                AgentState::Intake,
                Decision::transition(AgentState::Explore, ""),
            ),
            (
                AgentState::Explore,
                Decision::call_tool("echo", json!({"m": "same"}), ""),
            ),
            (
                AgentState::Explore,
                Decision::finish("done", json!({"n": 7})),
            ),
        ])
    };
    let registry = echo_registry();
    let run_once = |planner| async {
        EngineBuilder::new()
            .with_registry(Arc::clone(&registry))
            .with_eligibility(explore_eligibility("echo"))
            .with_planner(Arc::new(planner))
            .build()
            .unwrap()
            .run("replay")
            .await
    };

    let first = run_once(script()).await;
    let second = run_once(script()).await;

    assert_eq!(first.run.status(), second.run.status());
    assert_eq!(first.run.state(), second.run.state());
    assert_eq!(first.run.result(), second.run.result());
    assert_eq!(tool_outputs(&first), tool_outputs(&second));
    assert_eq!(ledger_kinds(&first), ledger_kinds(&second));
}
