//! Waypoint - State-driven agent execution engine
//!
//! This crate orchestrates tool-using agents through a fixed state machine:
//! a planner proposes decisions, policy validates them (eligibility,
//! budgets, approvals), a resilient executor carries out tool calls, and an
//! append-only ledger records every operation until the run terminates.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{Engine, EngineBuilder, RunOutcome};
