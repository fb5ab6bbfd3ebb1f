use crate::error::{Result, SimulationError};
use crate::grid::{Grid, Occupant, Position};
use crossterm::style::Color;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::{Builder, Uuid};

pub type EntityId = Uuid;

/// Generates a v4 uuid from the simulation's random source so ids are
/// reproducible under a fixed seed.
pub fn new_entity_id<R: Rng + ?Sized>(rng: &mut R) -> EntityId {
    Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// The kinds of entities that can occupy a grid cell.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Inert marker; its presence makes a cell dirty.
    Dirt,
    /// Moves around the grid cleaning the cells it lands on.
    Cleaner,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Dirt => "Dirt",
            EntityKind::Cleaner => "Cleaner",
        }
    }

    pub fn char(&self) -> char {
        match self {
            EntityKind::Dirt => '*',
            EntityKind::Cleaner => 'C',
        }
    }

    pub fn color(&self) -> Color {
        match self {
            EntityKind::Dirt => Color::DarkYellow,
            EntityKind::Cleaner => Color::Green,
        }
    }
}

/// What a cleaner did during its turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Activity {
    /// The cells the cleaner moved between, if it moved at all.
    pub moved: Option<(Position, Position)>,
    /// The dirt markers removed from the cell the cleaner ended up in.
    pub cleaned: Vec<EntityId>,
}

/// A cleaning agent.
///
/// Its position lives in the [`Grid`] index, the agent itself only keeps its
/// counters. Both counters only ever grow.
#[derive(Clone, Debug, PartialEq)]
pub struct Cleaner {
    id: EntityId,
    moves_made: usize,
    cells_cleaned: usize,
}

impl Cleaner {
    pub fn new(id: EntityId) -> Cleaner {
        Cleaner {
            id,
            moves_made: 0,
            cells_cleaned: 0,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn moves_made(&self) -> usize {
        self.moves_made
    }

    pub fn cells_cleaned(&self) -> usize {
        self.cells_cleaned
    }

    pub fn occupant(&self) -> Occupant {
        Occupant {
            id: self.id,
            kind: EntityKind::Cleaner,
        }
    }

    /// Runs one turn of the cleaner: move first, then clean wherever it ended up.
    pub fn act<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> Result<Activity> {
        let moved = self.move_randomly(grid, rng)?;
        let cleaned = self.clean(grid)?;

        Ok(Activity { moved, cleaned })
    }

    /// Moves to a random neighboring cell that no other cleaner is in.
    ///
    /// If every neighbor is taken by a cleaner the agent stays where it is and
    /// the move is not counted.
    fn move_randomly<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Result<Option<(Position, Position)>> {
        let from = grid
            .position_of(&self.id)
            .ok_or(SimulationError::UnknownEntity(self.id))?;

        let mut candidates = Vec::new();
        for neighbor in grid.neighborhood(from, false)? {
            let blocked = grid
                .occupants_at(neighbor)?
                .iter()
                .any(|occupant| occupant.kind == EntityKind::Cleaner && occupant.id != self.id);

            if !blocked {
                candidates.push(neighbor);
            }
        }

        let Some(&to) = candidates.choose(rng) else {
            trace!(cleaner = %self.id, x = from.x, y = from.y, "cleaner is boxed in");
            return Ok(None);
        };

        let to = grid.move_entity(&self.id, to)?;
        self.moves_made += 1;
        trace!(cleaner = %self.id, from = ?from, to = ?to, "cleaner moved");

        Ok(Some((from, to)))
    }

    /// Removes every dirt marker in the cleaner's current cell.
    fn clean(&mut self, grid: &mut Grid) -> Result<Vec<EntityId>> {
        let pos = grid
            .position_of(&self.id)
            .ok_or(SimulationError::UnknownEntity(self.id))?;

        let dirt: Vec<EntityId> = grid
            .occupants_at(pos)?
            .iter()
            .filter(|occupant| occupant.kind == EntityKind::Dirt)
            .map(|occupant| occupant.id)
            .collect();

        for id in &dirt {
            grid.remove(id)?;
            self.cells_cleaned += 1;
        }

        if !dirt.is_empty() {
            trace!(cleaner = %self.id, x = pos.x, y = pos.y, removed = dirt.len(), "cleaner cleaned");
        }

        Ok(dirt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dirt(n: u128) -> Occupant {
        Occupant {
            id: Uuid::from_u128(n),
            kind: EntityKind::Dirt,
        }
    }

    #[test]
    fn when_generating_ids_with_the_same_seed_the_ids_are_the_same() {
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);

        let id = new_entity_id(&mut a);
        assert_eq!(id, new_entity_id(&mut b));
        assert_eq!(id.get_version_num(), 4);
        assert_ne!(id, new_entity_id(&mut a));
    }

    #[test]
    fn when_a_cleaner_acts_with_free_neighbors_it_moves_to_one_of_them() {
        let mut grid = Grid::new(5, 5, true).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut cleaner = Cleaner::new(Uuid::from_u128(1));
        grid.place(cleaner.occupant(), Position::new(2, 2)).unwrap();

        let activity = cleaner.act(&mut grid, &mut rng).unwrap();

        let (from, to) = activity.moved.unwrap();
        assert_eq!(from, Position::new(2, 2));
        assert!(grid
            .neighborhood(Position::new(2, 2), false)
            .unwrap()
            .contains(&to));
        assert_eq!(grid.position_of(&cleaner.id()), Some(to));
        assert_eq!(cleaner.moves_made(), 1);
        assert_eq!(cleaner.cells_cleaned(), 0);
    }

    #[test]
    fn when_a_cleaner_acts_it_never_moves_into_a_cell_with_another_cleaner() {
        let mut grid = Grid::new(3, 3, true).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut cleaner = Cleaner::new(Uuid::from_u128(1));
        grid.place(cleaner.occupant(), Position::new(1, 1)).unwrap();

        // Leave only (2, 2) free
        let mut n = 100;
        for neighbor in grid.neighborhood(Position::new(1, 1), false).unwrap() {
            if neighbor != Position::new(2, 2) {
                grid.place(Cleaner::new(Uuid::from_u128(n)).occupant(), neighbor)
                    .unwrap();
                n += 1;
            }
        }

        for _ in 0..5 {
            grid.move_entity(&cleaner.id(), Position::new(1, 1)).unwrap();
            let activity = cleaner.act(&mut grid, &mut rng).unwrap();
            assert_eq!(activity.moved.unwrap().1, Position::new(2, 2));
        }
    }

    #[test]
    fn when_a_cleaner_is_surrounded_by_cleaners_it_stays_and_still_cleans() {
        let mut grid = Grid::new(3, 3, true).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut cleaner = Cleaner::new(Uuid::from_u128(1));
        grid.place(cleaner.occupant(), Position::new(1, 1)).unwrap();
        grid.place(dirt(50), Position::new(1, 1)).unwrap();

        let mut n = 100;
        for neighbor in grid.neighborhood(Position::new(1, 1), false).unwrap() {
            grid.place(Cleaner::new(Uuid::from_u128(n)).occupant(), neighbor)
                .unwrap();
            n += 1;
        }

        let activity = cleaner.act(&mut grid, &mut rng).unwrap();

        assert_eq!(activity.moved, None);
        assert_eq!(activity.cleaned, vec![Uuid::from_u128(50)]);
        assert_eq!(cleaner.moves_made(), 0);
        assert_eq!(cleaner.cells_cleaned(), 1);
        assert_eq!(grid.position_of(&cleaner.id()), Some(Position::new(1, 1)));
    }

    #[test]
    fn when_a_cleaner_lands_on_a_cell_with_several_dirt_markers_it_removes_all_of_them() {
        // A 2x1 wrapping grid leaves a single neighbor to move to
        let mut grid = Grid::new(2, 1, true).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut cleaner = Cleaner::new(Uuid::from_u128(1));
        grid.place(cleaner.occupant(), Position::new(0, 0)).unwrap();
        grid.place(dirt(10), Position::new(1, 0)).unwrap();
        grid.place(dirt(11), Position::new(1, 0)).unwrap();
        grid.place(dirt(12), Position::new(1, 0)).unwrap();

        let activity = cleaner.act(&mut grid, &mut rng).unwrap();

        assert_eq!(activity.cleaned.len(), 3);
        assert_eq!(cleaner.cells_cleaned(), 3);
        assert_eq!(grid.count(EntityKind::Dirt), 0);
    }

    #[test]
    fn when_a_cleaner_leaves_a_dirty_cell_the_dirt_it_left_behind_stays() {
        let mut grid = Grid::new(2, 1, true).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut cleaner = Cleaner::new(Uuid::from_u128(1));
        grid.place(cleaner.occupant(), Position::new(0, 0)).unwrap();
        grid.place(dirt(10), Position::new(0, 0)).unwrap();

        let activity = cleaner.act(&mut grid, &mut rng).unwrap();

        assert!(activity.cleaned.is_empty());
        assert_eq!(grid.count(EntityKind::Dirt), 1);
        assert_eq!(grid.occupants_at(Position::new(0, 0)).unwrap(), &[dirt(10)]);
    }

    #[test]
    fn when_a_cleaner_is_not_on_the_grid_acting_fails() {
        let mut grid = Grid::new(3, 3, true).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut cleaner = Cleaner::new(Uuid::from_u128(1));

        assert!(cleaner.act(&mut grid, &mut rng).is_err());
    }
}
