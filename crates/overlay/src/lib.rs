//! Declarative geohash overlays.
//!
//! Callers mount `ShapeDescriptor`s; the `OverlayEngine` reconciles each
//! descriptor update into the minimal set of operations against an injected
//! `RenderSurface`, caching geohash coverage per instance and invalidating
//! it only on geometry or precision changes.

pub mod capability;
pub mod descriptor;
pub mod diff;
pub mod engine;
pub mod error;
pub mod events;
pub mod surface;

pub use descriptor::*;
pub use diff::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use surface::*;
