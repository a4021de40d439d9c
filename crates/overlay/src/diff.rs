use crate::descriptor::ShapeDescriptor;

/// What changed between two descriptors. Each flag is independent so the
/// reconciler's invalidation rules stay auditable in isolation.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub geometry: bool,
    pub precision: bool,
    pub primary_style: bool,
    pub cover_style: bool,
    pub label_style: bool,
    pub cover_visibility: bool,
    pub label_visibility: bool,
    pub primary_events: bool,
    pub cover_events: bool,
    pub label_events: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when the cached coverage result can no longer be reused.
    pub fn invalidates_coverage(&self) -> bool {
        self.geometry || self.precision
    }
}

/// Structural diff between two descriptors. Geometry equality is
/// point-by-point and order-sensitive; styles and event sets compare by
/// deep value equality.
pub fn diff(prev: &ShapeDescriptor, next: &ShapeDescriptor) -> ChangeSet {
    ChangeSet {
        geometry: prev.geometry != next.geometry,
        precision: prev.precision != next.precision,
        primary_style: prev.style != next.style || prev.draggable != next.draggable,
        cover_style: prev.cover_style != next.cover_style,
        label_style: prev.label_style != next.label_style,
        cover_visibility: prev.show_cover_cells != next.show_cover_cells,
        label_visibility: prev.show_labels != next.show_labels,
        primary_events: prev.events != next.events,
        cover_events: prev.cover_events != next.cover_events,
        label_events: prev.label_events != next.label_events,
    }
}
