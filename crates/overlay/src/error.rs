use coverage::CoverageError;
use foundation::shape::ShapeError;

use crate::engine::InstanceId;
use crate::surface::Capability;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// Fatal: the engine was constructed without a usable render context.
    MissingRenderContext,
    /// The next descriptor's geometry is unusable; prior state is intact.
    DegenerateShape(ShapeError),
    /// Precision outside 1..=12; prior state is intact.
    InvalidPrecision(u8),
    /// A capability module failed to load.
    CapabilityLoadFailure(Capability),
    UnknownInstance(InstanceId),
}

impl std::fmt::Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayError::MissingRenderContext => {
                write!(f, "overlay engine needs a live render context")
            }
            OverlayError::DegenerateShape(err) => write!(f, "degenerate shape: {err}"),
            OverlayError::InvalidPrecision(p) => {
                write!(f, "precision must be in 1..={}, got {p}", geohash::MAX_PRECISION)
            }
            OverlayError::CapabilityLoadFailure(cap) => {
                write!(f, "capability failed to load: {cap:?}")
            }
            OverlayError::UnknownInstance(id) => write!(f, "unknown instance: {}", id.0),
        }
    }
}

impl std::error::Error for OverlayError {}

impl From<CoverageError> for OverlayError {
    fn from(err: CoverageError) -> Self {
        match err {
            CoverageError::DegenerateShape(shape) => OverlayError::DegenerateShape(shape),
            CoverageError::InvalidPrecision(p) => OverlayError::InvalidPrecision(p),
            // Codes the engine feeds the expander always come from `cover`,
            // so a bad code can only mean a degenerate input slipped through.
            CoverageError::InvalidCode(_) => {
                OverlayError::DegenerateShape(ShapeError::EmptyBounds)
            }
        }
    }
}

impl From<ShapeError> for OverlayError {
    fn from(err: ShapeError) -> Self {
        OverlayError::DegenerateShape(err)
    }
}
