pub mod geo;
pub mod math;
pub mod shape;

// Foundation crate: small, well-tested primitives only.
pub use geo::*;
pub use shape::*;
