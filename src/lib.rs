//! # cleaning_robots
//!
//! A grid simulation of cleaning robots.
//! Cleaners wander a wrap-around grid at random, removing the dirt in every
//! cell they step into, until the grid is clean or the tick budget runs out.

pub mod config;
pub mod entities;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod simulation;

mod render;
mod replay;

#[cfg(feature = "python")]
mod python;

pub use config::SimConfig;
pub use entities::{Cleaner, EntityId, EntityKind};
pub use error::{Result, SimulationError};
pub use grid::{Grid, Occupant, Position};
pub use metrics::{AgentSnapshot, EntityView, ModelSnapshot, RunSummary, TickSnapshot};
pub use simulation::{FinishedReason, Simulation};
