//! Core tabular reinforcement learning types
//!
//! This crate provides the building blocks shared by tabular agents: the
//! environment contract for finite MDPs, the dense action-value table, action
//! selection policies, and the history of real transitions.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod environment;
pub mod error;
pub mod policy;
pub mod reward;
pub mod trajectory;
pub mod value;

// Re-export core traits and types
pub use agent::{AgentConfig, AgentMetrics, SimulationOptions, TabularAgent};
pub use environment::{TabularEnvironment, TabularMdp, PROBABILITY_TOLERANCE};
pub use error::{RLError, Result};
pub use policy::{Policy, TieBreakGreedy};
pub use reward::Reward;
pub use trajectory::{History, Transition};
pub use value::QTable;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AgentConfig, History, Policy, QTable, Result, Reward, SimulationOptions, TabularAgent,
        TabularEnvironment, TabularMdp, Transition,
    };
}
