use crate::config::SimConfig;
use crate::error::SimulationError;
use crate::metrics::{EntityView, RunSummary, TickSnapshot};
use crate::simulation::Simulation;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

impl From<SimulationError> for PyErr {
    fn from(error: SimulationError) -> PyErr {
        PyValueError::new_err(error.to_string())
    }
}

/// The cleaning simulation.
/// Main entry point for driving a run from Python.
#[pyclass(name = "Simulation", module = "cleaning_robots")]
pub struct PySimulation {
    inner: Simulation,
}

/// The metrics of a cleaner after a tick.
#[derive(Clone)]
#[pyclass(name = "AgentSnapshot", module = "cleaning_robots", get_all)]
pub struct PyAgentSnapshot {
    /// The unique identifier of the cleaner.
    pub id: String,
    pub x: usize,
    pub y: usize,
    pub moves_made: usize,
    pub cells_cleaned: usize,
}

/// The metrics of the whole simulation after a tick.
#[derive(Clone)]
#[pyclass(name = "TickSnapshot", module = "cleaning_robots", get_all)]
pub struct PyTickSnapshot {
    pub tick: usize,
    /// The moves made by all cleaners combined.
    pub total_moves: usize,
    /// The share of the grid, between 0 and 100, that is clean.
    pub cleaned_percentage: f64,
    pub dirt_remaining: usize,
    /// The cleaners, in the order they were created.
    pub agents: Vec<PyAgentSnapshot>,
}

/// A live entity on the grid, for rendering.
#[derive(Clone)]
#[pyclass(name = "Entity", module = "cleaning_robots", get_all)]
pub struct PyEntity {
    pub id: String,
    /// Either `"Dirt"` or `"Cleaner"`.
    pub kind: String,
    pub x: usize,
    pub y: usize,
}

/// The outcome of a run.
#[derive(Clone)]
#[pyclass(name = "RunSummary", module = "cleaning_robots", get_all)]
pub struct PyRunSummary {
    pub seed: u64,
    pub ticks: usize,
    pub finished: bool,
    /// `"DirtExhausted"`, `"TickLimitReached"` or `None` while still running.
    pub finished_reason: Option<String>,
    pub total_moves: usize,
    pub cleaned_percentage: f64,
    pub dirt_remaining: usize,
}

#[pymethods]
impl PySimulation {
    /// Creates a new simulation.
    ///
    /// # Arguments
    /// * `num_cleaners` - The number of cleaners, all starting in the same cell.
    /// * `grid_width` - The number of columns.
    /// * `grid_height` - The number of rows.
    /// * `max_ticks` - The maximum number of ticks before the run ends.
    /// * `dirty_percentage` - The share of the grid, between 0 and 100, that starts dirty.
    /// * `seed` - The seed for the random number generator. A random one is used if `None`.
    /// * `replay_filename` - The file to save the replay to. If `None`, no replay is recorded.
    #[new]
    #[pyo3(signature = (num_cleaners, grid_width, grid_height, max_ticks, dirty_percentage, seed=None, replay_filename=None))]
    pub fn new(
        num_cleaners: usize,
        grid_width: usize,
        grid_height: usize,
        max_ticks: usize,
        dirty_percentage: f64,
        seed: Option<u64>,
        replay_filename: Option<String>,
    ) -> PyResult<PySimulation> {
        let config = SimConfig {
            num_cleaners,
            grid_width,
            grid_height,
            max_ticks,
            dirty_percentage,
            seed,
            replay_filename,
            ..Default::default()
        };

        Ok(PySimulation {
            inner: Simulation::new(&config)?,
        })
    }

    /// Advances the simulation by one tick and returns its metrics.
    pub fn step(&mut self) -> PyResult<PyTickSnapshot> {
        Ok(self.inner.step()?.into())
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    pub fn tick(&self) -> usize {
        self.inner.tick()
    }

    pub fn dirt_remaining(&self) -> usize {
        self.inner.dirt_remaining()
    }

    pub fn snapshot(&self) -> PyTickSnapshot {
        self.inner.snapshot().into()
    }

    /// Every live entity with its kind and position.
    pub fn entities(&self) -> Vec<PyEntity> {
        self.inner.entities().into_iter().map(Into::into).collect()
    }

    pub fn summary(&self) -> PyRunSummary {
        self.inner.summary().into()
    }

    /// Draws the simulation to the console.
    pub fn draw(&self) -> PyResult<()> {
        Ok(self.inner.draw()?)
    }

    /// Writes the replay file, if one was requested.
    pub fn save_replay(&self) -> PyResult<()> {
        Ok(self.inner.save_replay()?)
    }
}

impl From<TickSnapshot> for PyTickSnapshot {
    fn from(snapshot: TickSnapshot) -> Self {
        PyTickSnapshot {
            tick: snapshot.model.tick,
            total_moves: snapshot.model.total_moves,
            cleaned_percentage: snapshot.model.cleaned_percentage,
            dirt_remaining: snapshot.model.dirt_remaining,
            agents: snapshot
                .agents
                .into_iter()
                .map(|agent| PyAgentSnapshot {
                    id: agent.id.to_string(),
                    x: agent.position.x,
                    y: agent.position.y,
                    moves_made: agent.moves_made,
                    cells_cleaned: agent.cells_cleaned,
                })
                .collect(),
        }
    }
}

impl From<EntityView> for PyEntity {
    fn from(entity: EntityView) -> Self {
        PyEntity {
            id: entity.id.to_string(),
            kind: entity.kind.name().to_string(),
            x: entity.position.x,
            y: entity.position.y,
        }
    }
}

impl From<RunSummary> for PyRunSummary {
    fn from(summary: RunSummary) -> Self {
        PyRunSummary {
            seed: summary.seed,
            ticks: summary.ticks,
            finished: summary.finished,
            finished_reason: summary
                .finished_reason
                .map(|reason| format!("{:?}", reason)),
            total_moves: summary.total_moves,
            cleaned_percentage: summary.cleaned_percentage,
            dirt_remaining: summary.dirt_remaining,
        }
    }
}

#[pymodule]
fn cleaning_robots(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySimulation>()?;
    m.add_class::<PyTickSnapshot>()?;
    m.add_class::<PyAgentSnapshot>()?;
    m.add_class::<PyEntity>()?;
    m.add_class::<PyRunSummary>()?;
    Ok(())
}
