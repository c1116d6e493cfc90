//! Dyna-style tabular agent
//!
//! The agent learns action values from real transitions and replays
//! synthetic transitions drawn from a learned one-step model:
//! - [`ExperienceModel`] remembers the last outcome of every `(state, action)`
//! - [`RecencyCounter`] tracks steps since each pair was last chosen and feeds
//!   the exploration bonus used by planning updates
//! - [`DynaAgent`] runs the act / learn / plan loop
//! - [`RandomAgent`] is a non-learning baseline

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dyna;
pub mod model;
pub mod random;
pub mod recency;

// Re-export agents
pub use dyna::{BonusMode, DynaAgent, DynaConfig};
pub use random::RandomAgent;

// Re-export model components
pub use model::ExperienceModel;
pub use recency::RecencyCounter;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BonusMode, DynaAgent, DynaConfig, RandomAgent};
    pub use dyna_rl_core::prelude::*;
}
