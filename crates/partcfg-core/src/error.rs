use thiserror::Error;

/// Rejected edits to a part configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("unknown hole id: {0}")]
    UnknownHole(String),

    #[error("custom shape editing requires the custom polygon form")]
    NotCustomForm,

    #[error("quantity must be between 1 and 1000, got {0}")]
    Quantity(u32),

    #[error(transparent)]
    Drawing(#[from] DrawingError),
}

/// Illegal transitions of the custom-shape drawing state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawingError {
    #[error("shape is finalized; edit it before changing points")]
    Finalized,

    #[error("shape is not finalized")]
    NotFinalized,

    #[error("a closed shape needs at least 3 points, have {count}")]
    NotEnoughPoints { count: usize },

    #[error("point index {index} out of range ({len} points)")]
    PointOutOfRange { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtrudeError {
    #[error("profile has no outline")]
    NoOutline,

    #[error("profile outline is open")]
    OpenOutline,

    #[error("holes remove the whole profile")]
    NoMaterial,

    #[error("thickness must be positive, got {0}")]
    InvalidThickness(f64),

    #[error("cap triangulation failed")]
    Triangulation,
}
