use derive_more::Display;

pub type Result<T> = core::result::Result<T, MetaballError>;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum MetaballError {
    /// The field has no balls, so there is nothing to bound.
    #[display("metaball field has no balls")]
    EmptyField,
    #[display("ball radius must be finite and non-negative, got {_0}")]
    InvalidRadius(f32),
    #[display("lattice resolution must be at least 1")]
    ZeroResolution,
    /// The append buffer of the parallel dispatch ran out of slots.
    #[display("output buffer overflow: {requested} records requested, capacity is {capacity}")]
    BufferOverflow { capacity: usize, requested: usize },
    /// Mesh buffers violate the sink contract.
    #[display("invalid mesh: {_0}")]
    InvalidMesh(String),
}

impl std::error::Error for MetaballError {}
