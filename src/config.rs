use crate::error::{Result, SimulationError};
use crate::grid::Position;
use serde::{Deserialize, Serialize};

/// Parameters for a cleaning simulation run.
///
/// Missing fields fall back to their defaults when deserializing, so a config
/// file only needs to list what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of cleaners, all starting at `origin`.
    pub num_cleaners: usize,
    /// Number of columns in the grid.
    pub grid_width: usize,
    /// Number of rows in the grid.
    pub grid_height: usize,
    /// Tick budget. The run stops once this many ticks have elapsed.
    pub max_ticks: usize,
    /// Share of the grid area, in `[0, 100]`, that starts out as dirt markers.
    pub dirty_percentage: f64,
    /// Seed for the simulation's random source. A random one is drawn when unset.
    pub seed: Option<u64>,
    /// Whether the grid edges wrap around.
    pub wrap: bool,
    /// The cell every cleaner starts in.
    pub origin: Position,
    /// Where to write the JSON replay of the run, if anywhere.
    pub replay_filename: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_cleaners: 12,
            grid_width: 7,
            grid_height: 20,
            max_ticks: 120,
            dirty_percentage: 30.0,
            seed: None,
            wrap: true,
            origin: Position::new(1, 1),
            replay_filename: None,
        }
    }
}

impl SimConfig {
    pub fn from_json(contents: &str) -> Result<SimConfig> {
        let config: SimConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_cleaners == 0 {
            return Err(invalid("num_cleaners must be positive"));
        }

        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(invalid(&format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }

        if self.max_ticks == 0 {
            return Err(invalid("max_ticks must be positive"));
        }

        if !self.dirty_percentage.is_finite() || !(0.0..=100.0).contains(&self.dirty_percentage) {
            return Err(invalid(&format!(
                "dirty_percentage must be within [0, 100], got {}",
                self.dirty_percentage
            )));
        }

        Ok(())
    }

    /// Number of dirt markers to scatter, rounded down.
    pub fn dirt_count(&self) -> usize {
        let area = (self.grid_width * self.grid_height) as f64;
        (area * (self.dirty_percentage / 100.0)).floor() as usize
    }
}

fn invalid(message: &str) -> SimulationError {
    SimulationError::Configuration(message.to_string())
}
