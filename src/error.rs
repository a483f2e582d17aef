use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Normalizing requires positive, finite total mass.
    #[error("cannot normalize grid with total mass {mass}")]
    DegenerateMass { mass: f64 },

    #[error("grid of {width}x{height} cannot hold {len} values")]
    ShapeMismatch {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
