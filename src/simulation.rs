use crate::config::SimConfig;
use crate::entities::{new_entity_id, Cleaner, EntityId, EntityKind};
use crate::error::{Result, SimulationError};
use crate::grid::{Grid, Occupant, Position};
use crate::metrics::{
    cleaned_percentage, AgentSnapshot, EntityView, ModelSnapshot, RunSummary, TickSnapshot,
};
use crate::render;
use crate::replay::{create_replay_logger, ReplayLogger};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Represents the reason the simulation finished.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum FinishedReason {
    /// Every dirt marker was removed.
    DirtExhausted,
    /// The tick budget ran out before the grid was clean.
    TickLimitReached,
}

/// A simulation of cleaners wandering a grid and removing the dirt they find.
///
/// The simulation owns the grid, every entity on it and the single random
/// source all randomness is drawn from, so two simulations built from the
/// same configuration and seed evolve identically.
pub struct Simulation {
    grid: Grid,
    cleaners: Vec<Cleaner>,
    dirt: HashSet<EntityId>,
    tick: usize,
    max_ticks: usize,
    finished_reason: Option<FinishedReason>,
    seed: u64,
    rng: StdRng,
    replay_logger: Box<dyn ReplayLogger>,
}

impl Simulation {
    /// Creates a new simulation.
    ///
    /// Every cleaner starts at `config.origin`, dirt markers are scattered
    /// uniformly at random (a cell may get more than one).
    ///
    /// # Arguments
    /// * `config` - The simulation parameters, validated before anything is built.
    pub fn new(config: &SimConfig) -> Result<Simulation> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = Grid::new(config.grid_width, config.grid_height, config.wrap)?;

        let mut cleaners = Vec::with_capacity(config.num_cleaners);
        for _ in 0..config.num_cleaners {
            let cleaner = Cleaner::new(new_entity_id(&mut rng));
            grid.place(cleaner.occupant(), config.origin)?;
            cleaners.push(cleaner);
        }

        let mut dirt = HashSet::with_capacity(config.dirt_count());
        for _ in 0..config.dirt_count() {
            let x = rng.gen_range(0..grid.width());
            let y = rng.gen_range(0..grid.height());
            let id = new_entity_id(&mut rng);
            grid.place(dirt_occupant(id), Position::new(x, y))?;
            dirt.insert(id);
        }

        let replay_logger = create_replay_logger(
            config.replay_filename.clone(),
            grid.width(),
            grid.height(),
            grid.wrap(),
            seed,
        );

        Ok(Simulation::assemble(
            grid,
            cleaners,
            dirt,
            config.max_ticks,
            seed,
            rng,
            replay_logger,
        ))
    }

    /// Creates a simulation from a text layout instead of random placement.
    ///
    /// The layout lists the grid size followed by one `m` line per row:
    /// `.` is a clean cell, `c` a cleaner, `C` a cleaner on a dirty cell, `*` a
    /// dirty cell and `1`-`9` that many dirt markers in the same cell. An
    /// optional `wrap false` line makes the grid bounded.
    ///
    /// # Arguments
    /// * `layout` - The layout text.
    /// * `max_ticks` - The tick budget.
    /// * `seed` - The seed for the random source used by the cleaners.
    pub fn from_layout(layout: &str, max_ticks: usize, seed: u64) -> Result<Simulation> {
        if max_ticks == 0 {
            return Err(SimulationError::Configuration(
                "max_ticks must be positive".to_string(),
            ));
        }

        let (width, height, wrap) = parse_header(layout)?;
        let rows = parse_rows(layout)?;

        if rows.len() != height {
            return Err(SimulationError::Layout(format!(
                "expected {} rows but found {}",
                height,
                rows.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = Grid::new(width, height, wrap)?;
        let mut cleaners = Vec::new();
        let mut dirt = HashSet::new();

        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(SimulationError::Layout(format!(
                    "row {} should have {} cells: {:?}",
                    y, width, row
                )));
            }

            for (x, value) in row.chars().enumerate() {
                let pos = Position::new(x, y);
                let (has_cleaner, dirt_markers) = match value {
                    '.' => (false, 0),
                    'c' => (true, 0),
                    'C' => (true, 1),
                    '*' => (false, 1),
                    '1'..='9' => (false, value as usize - '0' as usize),
                    _ => {
                        return Err(SimulationError::Layout(format!(
                            "invalid cell value {:?} at ({}, {})",
                            value, x, y
                        )))
                    }
                };

                if has_cleaner {
                    let cleaner = Cleaner::new(new_entity_id(&mut rng));
                    grid.place(cleaner.occupant(), pos)?;
                    cleaners.push(cleaner);
                }

                for _ in 0..dirt_markers {
                    let id = new_entity_id(&mut rng);
                    grid.place(dirt_occupant(id), pos)?;
                    dirt.insert(id);
                }
            }
        }

        if cleaners.is_empty() {
            return Err(SimulationError::Layout(
                "the layout has no cleaners".to_string(),
            ));
        }

        let replay_logger = create_replay_logger(None, width, height, wrap, seed);

        Ok(Simulation::assemble(
            grid,
            cleaners,
            dirt,
            max_ticks,
            seed,
            rng,
            replay_logger,
        ))
    }

    /// Advances the simulation by one tick.
    ///
    /// Every cleaner acts once, in an order shuffled anew each tick, and each
    /// one sees the moves of those that acted before it. Once the simulation
    /// has finished this is a no-op that returns the current snapshot.
    pub fn step(&mut self) -> Result<TickSnapshot> {
        if !self.is_running() {
            return Ok(self.snapshot());
        }

        self.tick += 1;

        let mut order: Vec<usize> = (0..self.cleaners.len()).collect();
        order.shuffle(&mut self.rng);

        for index in order {
            let cleaner = &mut self.cleaners[index];
            let activity = cleaner.act(&mut self.grid, &mut self.rng)?;

            if let Some((from, to)) = activity.moved {
                self.replay_logger
                    .log_move(self.tick, cleaner.id(), from, to);
            }

            for id in activity.cleaned {
                self.dirt.remove(&id);
                if let Some(pos) = self.grid.position_of(&cleaner.id()) {
                    self.replay_logger
                        .log_clean(self.tick, cleaner.id(), id, pos);
                }
            }
        }

        let snapshot = self.snapshot();
        self.replay_logger.log_tick(&snapshot);
        debug!(
            tick = self.tick,
            total_moves = snapshot.model.total_moves,
            dirt_remaining = snapshot.model.dirt_remaining,
            cleaned_percentage = snapshot.model.cleaned_percentage,
            "tick completed"
        );

        self.check_for_end();

        Ok(snapshot)
    }

    pub fn is_running(&self) -> bool {
        self.finished_reason.is_none()
    }

    pub fn finished_reason(&self) -> Option<FinishedReason> {
        self.finished_reason
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn max_ticks(&self) -> usize {
        self.max_ticks
    }

    pub fn dirt_remaining(&self) -> usize {
        self.dirt.len()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The cleaners, in the order they were created.
    pub fn cleaners(&self) -> &[Cleaner] {
        &self.cleaners
    }

    pub fn total_moves(&self) -> usize {
        self.cleaners.iter().map(|cleaner| cleaner.moves_made()).sum()
    }

    pub fn cleaned_percentage(&self) -> f64 {
        cleaned_percentage(self.grid.area(), self.dirt_remaining())
    }

    /// The metrics for the current state.
    pub fn snapshot(&self) -> TickSnapshot {
        let agents = self
            .cleaners
            .iter()
            .map(|cleaner| AgentSnapshot {
                id: cleaner.id(),
                position: self.grid.position_of(&cleaner.id()).unwrap_or_default(),
                moves_made: cleaner.moves_made(),
                cells_cleaned: cleaner.cells_cleaned(),
            })
            .collect();

        TickSnapshot {
            model: ModelSnapshot {
                tick: self.tick,
                total_moves: self.total_moves(),
                cleaned_percentage: self.cleaned_percentage(),
                dirt_remaining: self.dirt_remaining(),
            },
            agents,
        }
    }

    /// Every live entity with its kind and position, row by row.
    pub fn entities(&self) -> Vec<EntityView> {
        self.grid
            .occupants()
            .map(|(position, occupant)| EntityView {
                id: occupant.id,
                kind: occupant.kind,
                position,
            })
            .collect()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.seed,
            ticks: self.tick,
            finished: !self.is_running(),
            finished_reason: self.finished_reason,
            total_moves: self.total_moves(),
            cleaned_percentage: self.cleaned_percentage(),
            dirt_remaining: self.dirt_remaining(),
        }
    }

    /// Draws the simulation to the console.
    pub fn draw(&self) -> Result<()> {
        render::draw(self)
    }

    /// Writes the replay collected so far, if a replay file was configured.
    pub fn save_replay(&self) -> Result<()> {
        self.replay_logger.save()
    }
}

impl Simulation {
    fn assemble(
        grid: Grid,
        cleaners: Vec<Cleaner>,
        dirt: HashSet<EntityId>,
        max_ticks: usize,
        seed: u64,
        rng: StdRng,
        replay_logger: Box<dyn ReplayLogger>,
    ) -> Simulation {
        info!(
            seed,
            width = grid.width(),
            height = grid.height(),
            cleaners = cleaners.len(),
            dirt = dirt.len(),
            max_ticks,
            "simulation created"
        );

        let mut simulation = Simulation {
            grid,
            cleaners,
            dirt,
            tick: 0,
            max_ticks,
            finished_reason: None,
            seed,
            rng,
            replay_logger,
        };

        // A grid that starts clean has nothing left to do
        simulation.check_for_end();
        simulation
    }

    fn check_for_end(&mut self) {
        if self.dirt.is_empty() {
            self.finish(FinishedReason::DirtExhausted);
            return;
        }

        if self.tick >= self.max_ticks {
            self.finish(FinishedReason::TickLimitReached);
        }
    }

    fn finish(&mut self, reason: FinishedReason) {
        self.finished_reason = Some(reason);
        self.replay_logger.log_end(reason);

        info!(
            tick = self.tick,
            reason = ?reason,
            dirt_remaining = self.dirt_remaining(),
            total_moves = self.total_moves(),
            "simulation finished"
        );
    }
}

fn dirt_occupant(id: EntityId) -> Occupant {
    Occupant {
        id,
        kind: EntityKind::Dirt,
    }
}

fn parse_header(layout: &str) -> Result<(usize, usize, bool)> {
    let size = Regex::new(r"rows (\d+)\s+cols (\d+)")
        .map_err(|e| SimulationError::Layout(e.to_string()))?
        .captures(layout)
        .ok_or_else(|| SimulationError::Layout("missing `rows`/`cols` header".to_string()))?;

    let height = parse_dimension(size.get(1).map(|m| m.as_str()))?;
    let width = parse_dimension(size.get(2).map(|m| m.as_str()))?;

    let wrap = Regex::new(r"wrap (true|false)")
        .map_err(|e| SimulationError::Layout(e.to_string()))?
        .captures(layout)
        .and_then(|captures| captures.get(1))
        .map_or(true, |value| value.as_str() == "true");

    Ok((width, height, wrap))
}

fn parse_dimension(value: Option<&str>) -> Result<usize> {
    value
        .ok_or_else(|| SimulationError::Layout("missing dimension".to_string()))?
        .parse()
        .map_err(|e| SimulationError::Layout(format!("invalid dimension: {}", e)))
}

fn parse_rows(layout: &str) -> Result<Vec<String>> {
    Ok(Regex::new(r"m (.*)")
        .map_err(|e| SimulationError::Layout(e.to_string()))?
        .captures_iter(layout)
        .filter_map(|captures| captures.get(1))
        .map(|row| row.as_str().trim().to_string())
        .collect())
}
