//! Engine - The synchronous step loop driving one run at a time.
//!
//! Each step asks the planner for a decision, validates it against policy
//! in the current state, dispatches it, and records the outcome in the
//! ledger and (for planner-visible observations) the run's evidence. The
//! loop exits on a terminal state, the step cap, or cancellation.
//!
//! The engine is safe to call concurrently from multiple tasks; every
//! `run()` call owns a fresh Run, Budget, and Ledger. The registry and the
//! executor (with its bulkhead and breaker table) are shared.

use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::application::execution::{ExecutionObserver, ExecutorError, ResilientExecutor};
use crate::domain::foundation::{EventId, Lifecycle};
use crate::domain::policy::{Budget, StateTransitions, ToolEligibility, TOOL_CALLS};
use crate::domain::run::{EvidenceKind, EvidenceSource, Ledger, LedgerKind, Run};
use crate::domain::tool::{Tool, ToolRegistry};
use crate::domain::{AgentState, Decision};
use crate::ports::{
    ApprovalRequest, Approver, EventStore, PlanRequest, Planner, RunStore, StoredEvent,
    ToolContext,
};

use super::EngineHook;

/// A finished run together with its full ledger.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The run aggregate, terminal on return.
    pub run: Run,
    /// Every engine-internal event, ending with run-finished.
    pub ledger: Ledger,
}

/// Whether the step loop continues after a dispatch.
enum StepFlow {
    Continue,
    Exit,
}

/// The state-driven agent execution engine.
pub struct Engine {
    registry: Arc<ToolRegistry>,
    planner: Arc<dyn Planner>,
    eligibility: ToolEligibility,
    transitions: StateTransitions,
    budgets: Vec<(String, u64)>,
    executor: Arc<ResilientExecutor>,
    approver: Option<Arc<dyn Approver>>,
    run_store: Option<Arc<dyn RunStore>>,
    event_store: Option<Arc<dyn EventStore>>,
    hooks: Vec<Arc<dyn EngineHook>>,
    max_steps: u32,
    vars: HashMap<String, JsonValue>,
}

/// Shared ledger handle; appends are serialised behind the lock so the
/// executor's attempt observer can interleave with the engine's appends.
type SharedLedger = Arc<Mutex<Ledger>>;

fn append(ledger: &SharedLedger, kind: LedgerKind, payload: JsonValue) {
    let mut guard = ledger
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Err(error) = guard.append(kind, payload) {
        tracing::warn!(%error, ?kind, "ledger rejected append");
    }
}

/// Observer that turns retry attempts into ledger entries.
struct LedgerObserver {
    ledger: SharedLedger,
}

impl ExecutionObserver for LedgerObserver {
    fn on_retry(&self, tool: &str, next_attempt: u32, error: &ExecutorError) {
        append(
            &self.ledger,
            LedgerKind::ToolFailed,
            json!({
                "tool": tool,
                "attempt": next_attempt - 1,
                "error": error.to_string(),
                "retrying": true,
            }),
        );
        append(
            &self.ledger,
            LedgerKind::ToolStarted,
            json!({ "tool": tool, "attempt": next_attempt }),
        );
    }
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        registry: Arc<ToolRegistry>,
        planner: Arc<dyn Planner>,
        eligibility: ToolEligibility,
        transitions: StateTransitions,
        budgets: Vec<(String, u64)>,
        executor: Arc<ResilientExecutor>,
        approver: Option<Arc<dyn Approver>>,
        run_store: Option<Arc<dyn RunStore>>,
        event_store: Option<Arc<dyn EventStore>>,
        hooks: Vec<Arc<dyn EngineHook>>,
        max_steps: u32,
        vars: HashMap<String, JsonValue>,
    ) -> Self {
        Self {
            registry,
            planner,
            eligibility,
            transitions,
            budgets,
            executor,
            approver,
            run_store,
            event_store,
            hooks,
            max_steps,
            vars,
        }
    }

    /// Returns the shared tool registry.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Returns the shared executor (breaker table, bulkhead).
    pub fn executor(&self) -> &Arc<ResilientExecutor> {
        &self.executor
    }

    /// Executes a run for a goal with a fresh cancellation token.
    pub async fn run(&self, goal: impl Into<String>) -> RunOutcome {
        self.run_with_token(goal, CancellationToken::new()).await
    }

    /// Executes a run for a goal; the token cancels the run cooperatively
    /// at every suspension point and between steps.
    pub async fn run_with_token(
        &self,
        goal: impl Into<String>,
        cancellation: CancellationToken,
    ) -> RunOutcome {
        let mut run = Run::new(goal);
        let budget = Budget::with_caps(self.budgets.iter().cloned());
        let ledger: SharedLedger = Arc::new(Mutex::new(Ledger::new()));

        tracing::info!(run_id = %run.id(), goal = run.goal(), "run started");
        append(
            &ledger,
            LedgerKind::RunStarted,
            json!({ "run_id": run.id(), "goal": run.goal() }),
        );

        let mut steps: u32 = 0;
        while run.is_running() {
            if cancellation.is_cancelled() {
                self.cancel_run(&mut run, &ledger);
                break;
            }
            if steps == self.max_steps {
                self.fail_run(
                    &mut run,
                    &ledger,
                    format!("max steps exceeded ({})", self.max_steps),
                );
                break;
            }
            steps += 1;

            for hook in &self.hooks {
                hook.on_step_started(run.id(), run.state(), steps);
            }

            let request = self.plan_request(&run, &budget);
            let planned = tokio::select! {
                _ = cancellation.cancelled() => {
                    self.cancel_run(&mut run, &ledger);
                    break;
                }
                planned = self.planner.plan(request) => planned,
            };

            let decision = match planned {
                Ok(decision) => decision,
                Err(error) => {
                    append(
                        &ledger,
                        LedgerKind::DecisionMade,
                        json!({ "state": run.state(), "error": error.to_string() }),
                    );
                    self.fail_run(&mut run, &ledger, format!("planner_error: {}", error));
                    break;
                }
            };

            append(
                &ledger,
                LedgerKind::DecisionMade,
                json!({ "state": run.state(), "decision": decision }),
            );
            for hook in &self.hooks {
                hook.on_decision(run.id(), &decision);
            }
            tracing::debug!(run_id = %run.id(), state = %run.state(), decision = %decision, "dispatching");

            let flow = self
                .dispatch(decision, &mut run, &budget, &ledger, &cancellation)
                .await;
            if matches!(flow, StepFlow::Exit) {
                break;
            }
        }

        let ledger = ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        self.persist(&run, &ledger).await;
        for hook in &self.hooks {
            hook.on_run_finished(&run);
        }
        tracing::info!(run_id = %run.id(), status = %run.status(), "run finished");
        RunOutcome { run, ledger }
    }

    /// Names of tools allowed in a state after registry filtering; a tool
    /// not in the registry is never allowed regardless of eligibility.
    pub fn allowed_tools_in(&self, state: AgentState) -> Vec<String> {
        self.eligibility
            .allowed_in(state)
            .into_iter()
            .filter(|name| self.registry.contains(name))
            .collect()
    }

    fn plan_request(&self, run: &Run, budget: &Budget) -> PlanRequest {
        PlanRequest {
            run_id: run.id(),
            current_state: run.state(),
            evidence: run.evidence().to_vec(),
            allowed_tools: self.allowed_tools_in(run.state()),
            budgets: budget.snapshot(),
            vars: self.vars.clone(),
        }
    }

    async fn dispatch(
        &self,
        decision: Decision,
        run: &mut Run,
        budget: &Budget,
        ledger: &SharedLedger,
        cancellation: &CancellationToken,
    ) -> StepFlow {
        match decision {
            Decision::CallTool {
                name,
                input,
                reason,
            } => {
                self.dispatch_call_tool(name, input, reason, run, budget, ledger, cancellation)
                    .await
            }
            Decision::Transition {
                target_state,
                reason,
            } => self.dispatch_transition(target_state, reason, run, budget, ledger),
            Decision::AskHuman { question } => {
                tracing::warn!(run_id = %run.id(), %question, "no human-input collaborator");
                self.fail_run(run, ledger, "human_input_required".to_string());
                StepFlow::Exit
            }
            Decision::Finish { reason, result } => {
                self.dispatch_finish(reason, result, run, ledger)
            }
            Decision::Fail { reason } => {
                self.fail_run(run, ledger, reason);
                StepFlow::Exit
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch_call_tool(
        &self,
        name: String,
        input: JsonValue,
        reason: String,
        run: &mut Run,
        budget: &Budget,
        ledger: &SharedLedger,
        cancellation: &CancellationToken,
    ) -> StepFlow {
        let tool = match self.registry.lookup(&name) {
            Ok(tool) => tool,
            Err(error) => {
                self.fail_run(run, ledger, error.to_string());
                return StepFlow::Exit;
            }
        };

        if !self.eligibility.is_allowed(run.state(), &name) {
            self.fail_run(
                run,
                ledger,
                format!("tool '{}' is not eligible in state {}", name, run.state()),
            );
            return StepFlow::Exit;
        }

        if !tool.annotations().read_only && !run.state().allows_side_effects() {
            self.fail_run(
                run,
                ledger,
                format!(
                    "side-effecting tool '{}' may not run in state {}",
                    name,
                    run.state()
                ),
            );
            return StepFlow::Exit;
        }

        if tool.annotations().requires_approval() {
            match self
                .seek_approval(&tool, &input, &reason, run, ledger, cancellation)
                .await
            {
                ApprovalFlow::Granted => {}
                ApprovalFlow::Stop => return StepFlow::Exit,
            }
        }

        match budget.charge(TOOL_CALLS, 1) {
            Ok(()) => {
                let count = budget
                    .snapshot()
                    .get(TOOL_CALLS)
                    .map(|counter| counter.count)
                    .unwrap_or(0);
                append(
                    ledger,
                    LedgerKind::BudgetCharged,
                    json!({ "counter": TOOL_CALLS, "amount": 1, "count": count }),
                );
            }
            Err(error) => {
                append(
                    ledger,
                    LedgerKind::BudgetExhausted,
                    json!({ "counter": TOOL_CALLS }),
                );
                self.fail_run(run, ledger, error.to_string());
                return StepFlow::Exit;
            }
        }

        append(
            ledger,
            LedgerKind::ToolStarted,
            json!({ "tool": name, "attempt": 1 }),
        );

        let ctx = ToolContext::new(run.id(), cancellation.clone()).with_vars(self.vars.clone());
        let observer = LedgerObserver {
            ledger: Arc::clone(ledger),
        };
        let report = self.executor.invoke(&tool, input, &ctx, &observer).await;

        for hook in &self.hooks {
            hook.on_tool_result(run.id(), &name, report.result.is_ok(), report.duration);
        }

        match report.result {
            Ok(output) => {
                append(
                    ledger,
                    LedgerKind::ToolSucceeded,
                    json!({
                        "tool": name,
                        "duration_ms": report.duration.as_millis() as u64,
                        "attempts": report.attempts,
                        "retried": report.retried,
                        "cache_hit": report.cache_hit,
                    }),
                );
                let content = match &output.artifact {
                    Some(artifact) => json!({
                        "output": output.content,
                        "artifact": artifact,
                    }),
                    None => output.content.clone(),
                };
                if let Err(error) = run.append_evidence(
                    EvidenceSource::tool(&name),
                    EvidenceKind::ToolOutput,
                    content,
                ) {
                    tracing::warn!(run_id = %run.id(), %error, "evidence append rejected");
                }
                StepFlow::Continue
            }
            Err(ExecutorError::Cancelled) => {
                append(
                    ledger,
                    LedgerKind::ToolFailed,
                    json!({ "tool": name, "error": "cancelled" }),
                );
                self.cancel_run(run, ledger);
                StepFlow::Exit
            }
            Err(error) => {
                append(
                    ledger,
                    LedgerKind::ToolFailed,
                    json!({
                        "tool": name,
                        "error": error.to_string(),
                        "duration_ms": report.duration.as_millis() as u64,
                    }),
                );
                self.fail_run(run, ledger, format!("tool_error:{}:{}", name, error));
                StepFlow::Exit
            }
        }
    }

    fn dispatch_transition(
        &self,
        target: AgentState,
        reason: String,
        run: &mut Run,
        budget: &Budget,
        ledger: &SharedLedger,
    ) -> StepFlow {
        let from = run.state();
        if let Err(error) = self
            .transitions
            .validate(from, target, budget.is_exhausted())
        {
            self.fail_run(run, ledger, format!("invalid_transition: {}", error));
            return StepFlow::Exit;
        }

        append(
            ledger,
            LedgerKind::Transition,
            json!({ "from": from, "to": target, "reason": reason }),
        );
        if let Err(error) = run.append_evidence(
            EvidenceSource::Engine,
            EvidenceKind::Transition,
            json!({ "from": from, "to": target, "reason": reason }),
        ) {
            tracing::warn!(run_id = %run.id(), %error, "evidence append rejected");
        }

        if target == AgentState::Failed {
            self.fail_run(run, ledger, reason);
            return StepFlow::Exit;
        }
        if let Err(error) = run.transition_to(target) {
            tracing::warn!(run_id = %run.id(), %error, "transition rejected by run");
            return StepFlow::Exit;
        }
        if target.is_terminal() {
            append(
                ledger,
                LedgerKind::RunFinished,
                json!({ "status": run.status(), "reason": reason }),
            );
            return StepFlow::Exit;
        }
        StepFlow::Continue
    }

    fn dispatch_finish(
        &self,
        reason: String,
        result: JsonValue,
        run: &mut Run,
        ledger: &SharedLedger,
    ) -> StepFlow {
        if !self.transitions.is_reachable(run.state(), AgentState::Done) {
            self.fail_run(
                run,
                ledger,
                format!("cannot finish: done is unreachable from {}", run.state()),
            );
            return StepFlow::Exit;
        }
        if let Err(error) = run.set_result(result) {
            tracing::warn!(run_id = %run.id(), %error, "result rejected");
        }
        if let Err(error) = run.transition_to(AgentState::Done) {
            tracing::warn!(run_id = %run.id(), %error, "finish transition rejected");
            return StepFlow::Exit;
        }
        append(
            ledger,
            LedgerKind::RunFinished,
            json!({ "status": run.status(), "reason": reason }),
        );
        StepFlow::Exit
    }

    async fn seek_approval(
        &self,
        tool: &Tool,
        input: &JsonValue,
        reason: &str,
        run: &mut Run,
        ledger: &SharedLedger,
        cancellation: &CancellationToken,
    ) -> ApprovalFlow {
        let name = tool.name().to_string();
        append(
            ledger,
            LedgerKind::ApprovalRequested,
            json!({
                "tool": name,
                "risk_level": tool.annotations().risk_level,
                "destructive": tool.annotations().destructive,
                "reason": reason,
            }),
        );

        let Some(approver) = self.approver.as_ref() else {
            self.fail_run(run, ledger, format!("approval required for tool: {}", name));
            return ApprovalFlow::Stop;
        };

        let request = ApprovalRequest {
            run_id: run.id(),
            tool_name: name.clone(),
            tool_input: input.clone(),
            risk_level: tool.annotations().risk_level,
            destructive: tool.annotations().destructive,
            reason: reason.to_string(),
        };
        let verdict = tokio::select! {
            _ = cancellation.cancelled() => {
                self.cancel_run(run, ledger);
                return ApprovalFlow::Stop;
            }
            verdict = approver.approve(request) => verdict,
        };

        match verdict {
            Ok(true) => {
                append(ledger, LedgerKind::ApprovalGranted, json!({ "tool": name }));
                ApprovalFlow::Granted
            }
            Ok(false) => {
                append(ledger, LedgerKind::ApprovalDenied, json!({ "tool": name }));
                self.fail_run(run, ledger, format!("approval denied for tool: {}", name));
                ApprovalFlow::Stop
            }
            Err(error) => {
                self.fail_run(
                    run,
                    ledger,
                    format!("approver unavailable for tool: {}: {}", name, error),
                );
                ApprovalFlow::Stop
            }
        }
    }

    fn fail_run(&self, run: &mut Run, ledger: &SharedLedger, reason: String) {
        tracing::warn!(run_id = %run.id(), %reason, "run failed");
        if let Err(error) = run.fail(reason.clone()) {
            tracing::warn!(run_id = %run.id(), %error, "failure on terminal run ignored");
            return;
        }
        append(
            ledger,
            LedgerKind::RunFinished,
            json!({ "status": run.status(), "reason": reason }),
        );
    }

    fn cancel_run(&self, run: &mut Run, ledger: &SharedLedger) {
        if let Err(error) = run.cancel("context cancelled") {
            tracing::warn!(run_id = %run.id(), %error, "cancel on terminal run ignored");
            return;
        }
        append(
            ledger,
            LedgerKind::RunFinished,
            json!({ "status": run.status(), "reason": "context cancelled" }),
        );
    }

    async fn persist(&self, run: &Run, ledger: &Ledger) {
        if let Some(run_store) = self.run_store.as_ref() {
            if let Err(error) = run_store.save(run).await {
                tracing::warn!(run_id = %run.id(), %error, "run store save failed");
            }
        }
        if let Some(event_store) = self.event_store.as_ref() {
            let events: Vec<StoredEvent> = ledger
                .entries()
                .iter()
                .map(|entry| StoredEvent {
                    event_id: EventId::new(),
                    run_id: run.id(),
                    sequence: entry.sequence,
                    kind: entry.kind,
                    occurred_at: entry.timestamp,
                    payload: entry.payload.clone(),
                })
                .collect();
            if let Err(error) = event_store.append(events).await {
                tracing::warn!(run_id = %run.id(), %error, "event store append failed");
            }
        }
    }
}

enum ApprovalFlow {
    Granted,
    Stop,
}
