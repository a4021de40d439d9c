use crate::descriptor::ShapeGeometry;
use crate::engine::InstanceId;
use crate::surface::{Capability, GroupId, OverlayId};

/// Which overlay an interaction landed on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InteractionTarget {
    Primary,
    CoverCell(OverlayId),
    Label(OverlayId),
}

/// Notifications the engine records for the caller to drain.
///
/// The `*Ready` events fire exactly once per created overlay/group; an
/// `Interaction` fires only when the instance's descriptor subscribes to
/// the event name for that group.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    PrimaryReady {
        instance: InstanceId,
        overlay: OverlayId,
        geometry: ShapeGeometry,
    },
    CoverReady {
        instance: InstanceId,
        group: GroupId,
        overlays: Vec<OverlayId>,
        codes: Vec<String>,
    },
    LabelReady {
        instance: InstanceId,
        group: GroupId,
        overlays: Vec<OverlayId>,
        codes: Vec<String>,
    },
    CapabilityFailed {
        instance: InstanceId,
        capability: Capability,
    },
    Interaction {
        instance: InstanceId,
        target: InteractionTarget,
        name: String,
        geometry: ShapeGeometry,
    },
}
