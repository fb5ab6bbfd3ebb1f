use crate::entities::EntityId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Errors raised by the cleaning simulation.
///
/// None of these are transient: the model has no I/O of its own besides
/// replay saving and rendering, so callers should treat any of them as fatal
/// to the run.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The simulation was configured with values outside their valid ranges.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A position fell outside a grid that does not wrap around.
    #[error("position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("entity {0} is not on the grid")]
    UnknownEntity(EntityId),

    /// The text layout could not be parsed.
    #[error("invalid layout: {0}")]
    Layout(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
