use crate::entities::EntityKind;
use crate::error::Result;
use crate::simulation::Simulation;
use crossterm::{
    cursor::Hide,
    execute,
    style::{Color, Print, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{stdout, Write};

/// Draws the current state of the simulation to the terminal.
///
/// A cell shows its cleaner if it has one, otherwise dirt if it is dirty.
pub fn draw(simulation: &Simulation) -> Result<()> {
    let mut stdout = stdout();
    let grid = simulation.grid();
    let snapshot = simulation.snapshot();

    // Display information about the run
    execute!(
        stdout,
        Clear(ClearType::All),
        Hide,
        Print("Tick: "),
        Print(format!("{}/{}", snapshot.model.tick, simulation.max_ticks())),
        Print("\nCleaners: "),
        Print(simulation.cleaners().len().to_string()),
        Print(", Moves = "),
        Print(snapshot.model.total_moves.to_string()),
        Print("\nDirt left: "),
        Print(snapshot.model.dirt_remaining.to_string()),
        Print(format!(" ({:.1}% clean)", snapshot.model.cleaned_percentage)),
        Print("\n\n")
    )?;

    let mut cells: Vec<Option<EntityKind>> = vec![None; grid.area()];
    for entity in simulation.entities() {
        let cell = &mut cells[entity.position.y * grid.width() + entity.position.x];
        if *cell != Some(EntityKind::Cleaner) {
            *cell = Some(entity.kind);
        }
    }

    // Display the grid
    for row in cells.chunks(grid.width()) {
        for kind in row {
            execute!(
                stdout,
                SetForegroundColor(kind.map_or(Color::Reset, |kind| kind.color())),
                Print(kind.map_or('.', |kind| kind.char())),
                SetForegroundColor(Color::Reset)
            )?;
        }
        execute!(stdout, Print("\n"))?;
    }

    stdout.flush()?;

    Ok(())
}
