use crate::entities::{EntityId, EntityKind};
use crate::grid::Position;
use crate::simulation::FinishedReason;
use serde::{Deserialize, Serialize};

/// Model-level metrics after a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub tick: usize,
    /// Sum of the moves made by every cleaner.
    pub total_moves: usize,
    /// Share of the grid area, in `[0, 100]`, not covered by dirt.
    pub cleaned_percentage: f64,
    pub dirt_remaining: usize,
}

/// Per-cleaner metrics after a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: EntityId,
    pub position: Position,
    pub moves_made: usize,
    pub cells_cleaned: usize,
}

/// Everything a metrics consumer records for one tick.
///
/// Agents are listed in the order the cleaners were created, not the order
/// they acted in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub model: ModelSnapshot,
    pub agents: Vec<AgentSnapshot>,
}

/// A live entity as seen by a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Position,
}

/// The outcome of a whole run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub ticks: usize,
    pub finished: bool,
    pub finished_reason: Option<FinishedReason>,
    pub total_moves: usize,
    pub cleaned_percentage: f64,
    pub dirt_remaining: usize,
}

/// Stacked dirt markers can outnumber the cells, which counts as 0% clean.
pub fn cleaned_percentage(total_cells: usize, dirt_remaining: usize) -> f64 {
    total_cells.saturating_sub(dirt_remaining) as f64 * 100.0 / total_cells as f64
}
