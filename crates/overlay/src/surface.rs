use foundation::geo::GeoPoint;

use crate::descriptor::{LabelStyle, OverlayStyle};

/// Opaque handle to one native overlay owned by the render surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(pub u64);

/// Opaque handle to a native overlay group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlayKind {
    Polygon,
    Circle,
    Text,
}

/// Capability modules the surface loads lazily, once per process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Polygon,
    Circle,
    Text,
    OverlayGroup,
}

impl Capability {
    pub fn for_kind(kind: OverlayKind) -> Self {
        match kind {
            OverlayKind::Polygon => Capability::Polygon,
            OverlayKind::Circle => Capability::Circle,
            OverlayKind::Text => Capability::Text,
        }
    }
}

/// Geometry payload handed to the surface when creating or mutating an
/// overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayGeometry {
    Path(Vec<GeoPoint>),
    CenterRadius { center: GeoPoint, radius_m: f64 },
    Label { position: GeoPoint, text: String },
}

/// Style payload for `set_options`/`group_set_options`.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOptions {
    Shape(OverlayStyle),
    Label(LabelStyle),
}

/// The rendering collaborator. The engine is the sole owner of the ids it
/// receives and is responsible for destroying them; the surface owns the
/// actual drawing primitives.
///
/// `request_capability` must be idempotent on the surface side; the engine
/// additionally coalesces requests so each capability is asked for at most
/// once.
pub trait RenderSurface {
    fn has_render_context(&self) -> bool;

    fn request_capability(&mut self, cap: Capability);

    fn create_overlay(
        &mut self,
        kind: OverlayKind,
        options: &OverlayOptions,
        geometry: &OverlayGeometry,
    ) -> OverlayId;
    fn set_geometry(&mut self, id: OverlayId, geometry: &OverlayGeometry);
    fn set_options(&mut self, id: OverlayId, options: &OverlayOptions);
    fn bind_event(&mut self, id: OverlayId, name: &str);
    fn unbind_events(&mut self, id: OverlayId);
    fn show(&mut self, id: OverlayId);
    fn hide(&mut self, id: OverlayId);
    fn destroy_overlay(&mut self, id: OverlayId);

    fn create_group(&mut self, members: &[OverlayId]) -> GroupId;
    fn group_set_options(&mut self, id: GroupId, options: &OverlayOptions);
    fn group_show(&mut self, id: GroupId);
    fn group_hide(&mut self, id: GroupId);
    fn destroy_group(&mut self, id: GroupId);
}
