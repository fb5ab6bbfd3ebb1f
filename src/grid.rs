use crate::entities::{EntityId, EntityKind};
use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cell coordinate where `x` is the column and `y` is the row.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Position {
        Position { x, y }
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Position { x, y }
    }
}

/// An entity indexed by the grid, tagged with its kind so cell contents can be
/// inspected without looking the entity up elsewhere.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Occupant {
    pub id: EntityId,
    pub kind: EntityKind,
}

/// A bounded 2D lattice where every cell may hold any number of occupants.
///
/// The grid does not own entities, it only indexes where they are. When `wrap`
/// is enabled both axes are joined at their edges (a torus) and every
/// coordinate is normalized modulo the dimensions. Otherwise, positions
/// outside the grid are rejected with [`SimulationError::OutOfBounds`].
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    wrap: bool,
    cells: Vec<Vec<Occupant>>,
    locations: HashMap<EntityId, Position>,
}

impl Grid {
    pub fn new(width: usize, height: usize, wrap: bool) -> Result<Grid> {
        if width == 0 || height == 0 {
            return Err(SimulationError::Configuration(format!(
                "grid dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let mut cells = Vec::with_capacity(width * height);
        cells.resize_with(width * height, Vec::new);

        Ok(Grid {
            width,
            height,
            wrap,
            cells,
            locations: HashMap::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Maps signed coordinates onto the grid.
    ///
    /// Wrapping grids fold the coordinates modulo their dimensions, bounded
    /// grids fail for anything outside `[0, width) x [0, height)`.
    pub fn normalize(&self, x: i64, y: i64) -> Result<Position> {
        let (width, height) = (self.width as i64, self.height as i64);

        if self.wrap {
            return Ok(Position::new(
                x.rem_euclid(width) as usize,
                y.rem_euclid(height) as usize,
            ));
        }

        if x < 0 || x >= width || y < 0 || y >= height {
            return Err(SimulationError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        Ok(Position::new(x as usize, y as usize))
    }

    /// Returns the Moore neighborhood (the 8 surrounding cells) of `pos`.
    ///
    /// On small wrapping grids several offsets land on the same cell, those are
    /// only reported once. The center is only part of the result when
    /// `include_center` is set, even if a wrapped offset lands back on it.
    pub fn neighborhood(&self, pos: Position, include_center: bool) -> Result<Vec<Position>> {
        let center = self.normalize(pos.x as i64, pos.y as i64)?;
        let mut neighbors = Vec::with_capacity(9);

        for dy in -1..=1 {
            for dx in -1..=1 {
                let neighbor = match self.normalize(center.x as i64 + dx, center.y as i64 + dy) {
                    Ok(neighbor) => neighbor,
                    // Off-grid neighbors of a bounded grid simply don't exist
                    Err(SimulationError::OutOfBounds { .. }) => continue,
                    Err(e) => return Err(e),
                };

                if neighbor == center && !include_center {
                    continue;
                }

                if !neighbors.contains(&neighbor) {
                    neighbors.push(neighbor);
                }
            }
        }

        Ok(neighbors)
    }

    /// All occupants currently indexed at `pos`, in the order they arrived.
    pub fn occupants_at(&self, pos: Position) -> Result<&[Occupant]> {
        let pos = self.normalize(pos.x as i64, pos.y as i64)?;
        Ok(&self.cells[self.index(pos)])
    }

    pub fn position_of(&self, id: &EntityId) -> Option<Position> {
        self.locations.get(id).copied()
    }

    /// Indexes an entity at `pos`. An entity that is already on the grid is
    /// relocated instead, so it is never indexed in two cells.
    pub fn place(&mut self, occupant: Occupant, pos: Position) -> Result<Position> {
        let pos = self.normalize(pos.x as i64, pos.y as i64)?;

        if self.locations.contains_key(&occupant.id) {
            self.remove(&occupant.id)?;
        }

        let index = self.index(pos);
        self.cells[index].push(occupant);
        self.locations.insert(occupant.id, pos);

        Ok(pos)
    }

    /// Removes an entity from the grid, returning the cell it was in.
    pub fn remove(&mut self, id: &EntityId) -> Result<Position> {
        let pos = self
            .locations
            .remove(id)
            .ok_or(SimulationError::UnknownEntity(*id))?;

        let index = self.index(pos);
        self.cells[index].retain(|occupant| occupant.id != *id);

        Ok(pos)
    }

    /// Moves an entity to `to`, returning the normalized destination.
    ///
    /// The destination is validated before the entity leaves its current cell,
    /// so a failed move leaves the index untouched.
    pub fn move_entity(&mut self, id: &EntityId, to: Position) -> Result<Position> {
        let to = self.normalize(to.x as i64, to.y as i64)?;
        let from = self
            .position_of(id)
            .ok_or(SimulationError::UnknownEntity(*id))?;

        let from_index = self.index(from);
        let slot = self.cells[from_index]
            .iter()
            .position(|occupant| occupant.id == *id)
            .ok_or(SimulationError::UnknownEntity(*id))?;
        let occupant = self.cells[from_index].remove(slot);

        let to_index = self.index(to);
        self.cells[to_index].push(occupant);
        self.locations.insert(*id, to);

        Ok(to)
    }

    /// Counts the occupants of the given kind across the whole grid.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|occupant| occupant.kind == kind)
            .count()
    }

    /// Iterates over every occupant along with its cell, row by row.
    pub fn occupants(&self) -> impl Iterator<Item = (Position, &Occupant)> {
        self.cells.iter().enumerate().flat_map(move |(index, cell)| {
            let pos = Position::new(index % self.width, index / self.width);
            cell.iter().map(move |occupant| (pos, occupant))
        })
    }

    fn index(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn occupant(n: u128, kind: EntityKind) -> Occupant {
        Occupant {
            id: Uuid::from_u128(n),
            kind,
        }
    }

    #[test]
    fn when_creating_a_grid_with_zero_width_or_height_it_is_rejected() {
        assert!(matches!(
            Grid::new(0, 3, true),
            Err(SimulationError::Configuration(_))
        ));
        assert!(matches!(
            Grid::new(3, 0, false),
            Err(SimulationError::Configuration(_))
        ));
    }

    #[test]
    fn when_computing_the_neighborhood_in_the_middle_all_eight_cells_are_returned() {
        let grid = Grid::new(5, 5, true).unwrap();
        let neighbors = grid.neighborhood(Position::new(2, 2), false).unwrap();

        assert_eq!(neighbors.len(), 8);
        assert!(!neighbors.contains(&Position::new(2, 2)));
        assert!(neighbors.contains(&Position::new(1, 1)));
        assert!(neighbors.contains(&Position::new(3, 3)));
    }

    #[test]
    fn when_computing_the_neighborhood_with_the_center_the_center_is_included() {
        let grid = Grid::new(5, 5, true).unwrap();
        let neighbors = grid.neighborhood(Position::new(2, 2), true).unwrap();

        assert_eq!(neighbors.len(), 9);
        assert!(neighbors.contains(&Position::new(2, 2)));
    }

    #[test]
    fn when_computing_the_neighborhood_at_a_corner_of_a_wrapping_grid_it_wraps_around() {
        let grid = Grid::new(4, 3, true).unwrap();
        let neighbors = grid.neighborhood(Position::new(0, 0), false).unwrap();

        assert_eq!(neighbors.len(), 8);
        assert!(neighbors.contains(&Position::new(3, 2)));
        assert!(neighbors.contains(&Position::new(3, 0)));
        assert!(neighbors.contains(&Position::new(0, 2)));
        assert!(neighbors.contains(&Position::new(1, 1)));
    }

    #[test]
    fn when_computing_the_neighborhood_at_a_corner_of_a_bounded_grid_off_grid_cells_are_skipped() {
        let grid = Grid::new(4, 3, false).unwrap();
        let neighbors = grid.neighborhood(Position::new(0, 0), false).unwrap();

        assert_eq!(
            neighbors,
            vec![
                Position::new(1, 0),
                Position::new(0, 1),
                Position::new(1, 1)
            ]
        );
    }

    #[test]
    fn when_computing_the_neighborhood_on_a_tiny_wrapping_grid_cells_are_not_repeated() {
        let grid = Grid::new(2, 2, true).unwrap();
        let neighbors = grid.neighborhood(Position::new(0, 0), false).unwrap();

        assert_eq!(neighbors.len(), 3);
        assert!(!neighbors.contains(&Position::new(0, 0)));

        let grid = Grid::new(1, 1, true).unwrap();
        assert!(grid
            .neighborhood(Position::new(0, 0), false)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn when_normalizing_out_of_range_coordinates_wrapping_grids_fold_them() {
        let grid = Grid::new(4, 3, true).unwrap();

        assert_eq!(grid.normalize(-1, -1).unwrap(), Position::new(3, 2));
        assert_eq!(grid.normalize(4, 7).unwrap(), Position::new(0, 1));
    }

    #[test]
    fn when_normalizing_out_of_range_coordinates_bounded_grids_fail() {
        let grid = Grid::new(4, 3, false).unwrap();

        assert!(matches!(
            grid.normalize(4, 0),
            Err(SimulationError::OutOfBounds { x: 4, y: 0, .. })
        ));
        assert!(matches!(
            grid.normalize(0, -1),
            Err(SimulationError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn when_placing_entities_in_the_same_cell_they_all_occupy_it() {
        let mut grid = Grid::new(3, 3, true).unwrap();
        grid.place(occupant(1, EntityKind::Cleaner), Position::new(1, 1))
            .unwrap();
        grid.place(occupant(2, EntityKind::Dirt), Position::new(1, 1))
            .unwrap();
        grid.place(occupant(3, EntityKind::Dirt), Position::new(1, 1))
            .unwrap();

        let occupants = grid.occupants_at(Position::new(1, 1)).unwrap();
        assert_eq!(occupants.len(), 3);
        assert_eq!(grid.count(EntityKind::Dirt), 2);
        assert_eq!(grid.count(EntityKind::Cleaner), 1);
    }

    #[test]
    fn when_placing_an_entity_twice_it_is_only_indexed_once() {
        let mut grid = Grid::new(3, 3, true).unwrap();
        let cleaner = occupant(1, EntityKind::Cleaner);
        grid.place(cleaner, Position::new(0, 0)).unwrap();
        grid.place(cleaner, Position::new(2, 2)).unwrap();

        assert!(grid.occupants_at(Position::new(0, 0)).unwrap().is_empty());
        assert_eq!(grid.occupants_at(Position::new(2, 2)).unwrap().len(), 1);
        assert_eq!(grid.position_of(&cleaner.id), Some(Position::new(2, 2)));
    }

    #[test]
    fn when_placing_outside_a_bounded_grid_the_placement_fails() {
        let mut grid = Grid::new(3, 3, false).unwrap();
        let result = grid.place(occupant(1, EntityKind::Dirt), Position::new(3, 1));

        assert!(matches!(result, Err(SimulationError::OutOfBounds { .. })));
        assert_eq!(grid.count(EntityKind::Dirt), 0);
    }

    #[test]
    fn when_removing_an_entity_its_cell_no_longer_holds_it() {
        let mut grid = Grid::new(3, 3, true).unwrap();
        let dirt = occupant(1, EntityKind::Dirt);
        grid.place(dirt, Position::new(2, 1)).unwrap();

        assert_eq!(grid.remove(&dirt.id).unwrap(), Position::new(2, 1));
        assert!(grid.occupants_at(Position::new(2, 1)).unwrap().is_empty());
        assert_eq!(grid.position_of(&dirt.id), None);
    }

    #[test]
    fn when_removing_an_unknown_entity_an_error_is_returned() {
        let mut grid = Grid::new(3, 3, true).unwrap();

        assert!(matches!(
            grid.remove(&Uuid::from_u128(9)),
            Err(SimulationError::UnknownEntity(_))
        ));
    }

    #[test]
    fn when_moving_an_entity_it_leaves_its_old_cell_and_joins_the_new_one() {
        let mut grid = Grid::new(3, 3, true).unwrap();
        let cleaner = occupant(1, EntityKind::Cleaner);
        let dirt = occupant(2, EntityKind::Dirt);
        grid.place(cleaner, Position::new(0, 0)).unwrap();
        grid.place(dirt, Position::new(0, 0)).unwrap();

        grid.move_entity(&cleaner.id, Position::new(1, 0)).unwrap();

        assert_eq!(grid.occupants_at(Position::new(0, 0)).unwrap(), &[dirt]);
        assert_eq!(grid.occupants_at(Position::new(1, 0)).unwrap(), &[cleaner]);
        assert_eq!(grid.position_of(&cleaner.id), Some(Position::new(1, 0)));
    }

    #[test]
    fn when_moving_outside_a_bounded_grid_the_entity_stays_in_place() {
        let mut grid = Grid::new(3, 3, false).unwrap();
        let cleaner = occupant(1, EntityKind::Cleaner);
        grid.place(cleaner, Position::new(2, 2)).unwrap();

        assert!(grid.move_entity(&cleaner.id, Position::new(3, 2)).is_err());
        assert_eq!(grid.occupants_at(Position::new(2, 2)).unwrap(), &[cleaner]);
    }
}
