use std::collections::{BTreeMap, VecDeque};

use coverage::CoverageResult;
use foundation::shape::Shape;

use crate::capability::CapabilityTracker;
use crate::descriptor::ShapeDescriptor;
use crate::diff::diff;
use crate::error::OverlayError;
use crate::events::{InteractionTarget, OverlayEvent};
use crate::surface::{
    Capability, GroupId, OverlayGeometry, OverlayId, OverlayKind, OverlayOptions, RenderSurface,
};

/// Identifies one mounted shape instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum InitStage {
    Primary,
    Cover,
    Label,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct PendingInit {
    instance: InstanceId,
    stage: InitStage,
}

#[derive(Debug, Clone)]
struct GroupHandles {
    group: GroupId,
    members: Vec<OverlayId>,
}

#[derive(Debug)]
struct Instance {
    descriptor: ShapeDescriptor,
    coverage: Option<CoverageResult>,
    compute_count: u64,
    primary: Option<OverlayId>,
    cover: Option<GroupHandles>,
    label: Option<GroupHandles>,
}

impl Instance {
    fn new(descriptor: ShapeDescriptor) -> Self {
        Self {
            descriptor,
            coverage: None,
            compute_count: 0,
            primary: None,
            cover: None,
            label: None,
        }
    }
}

fn stage_capabilities(stage: InitStage, kind: OverlayKind) -> Vec<Capability> {
    match stage {
        InitStage::Primary => vec![Capability::for_kind(kind)],
        InitStage::Cover => vec![Capability::Polygon, Capability::OverlayGroup],
        InitStage::Label => vec![Capability::Text, Capability::OverlayGroup],
    }
}

fn primary_geometry(descriptor: &ShapeDescriptor) -> OverlayGeometry {
    match descriptor.geometry.to_shape() {
        Shape::Polygon(points) => OverlayGeometry::Path(points),
        Shape::Circle { center, radius_m } => OverlayGeometry::CenterRadius { center, radius_m },
    }
}

/// Reconciles declarative shape descriptors into operations on a render
/// surface.
///
/// Each instance owns a primary overlay plus lazily created cover-cell and
/// label groups. Coverage is cached per instance and recomputed wholesale
/// only when geometry or precision changes. Work that needs an unloaded
/// surface capability is parked in a FIFO and resumed, in arrival order,
/// when the host signals `capability_ready`; entries for unmounted
/// instances are dropped on resume.
#[derive(Debug)]
pub struct OverlayEngine<S: RenderSurface> {
    surface: S,
    caps: CapabilityTracker,
    pending: VecDeque<PendingInit>,
    instances: BTreeMap<InstanceId, Instance>,
    next_instance: u64,
    events: Vec<OverlayEvent>,
}

impl<S: RenderSurface> OverlayEngine<S> {
    /// Fails with `MissingRenderContext` if the surface is not attached to
    /// a live rendering context; the engine is unusable without one.
    pub fn new(surface: S) -> Result<Self, OverlayError> {
        if !surface.has_render_context() {
            return Err(OverlayError::MissingRenderContext);
        }
        Ok(Self {
            surface,
            caps: CapabilityTracker::new(),
            pending: VecDeque::new(),
            instances: BTreeMap::new(),
            next_instance: 0,
            events: Vec::new(),
        })
    }

    pub fn mount(&mut self, descriptor: ShapeDescriptor) -> Result<InstanceId, OverlayError> {
        descriptor.validate()?;
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        self.instances.insert(id, Instance::new(descriptor));
        self.schedule(id, InitStage::Primary);
        self.drain_pending()?;
        Ok(id)
    }

    pub fn update(&mut self, id: InstanceId, next: ShapeDescriptor) -> Result<(), OverlayError> {
        next.validate()?;
        let Some(inst) = self.instances.get(&id) else {
            return Err(OverlayError::UnknownInstance(id));
        };

        let changes = diff(&inst.descriptor, &next);
        if changes.is_empty() {
            return Ok(());
        }

        let primary = inst.primary;
        let cover = inst.cover.clone();
        let label = inst.label.clone();

        let Some(primary) = primary else {
            // The shape capability has not loaded yet; the parked init will
            // pick up the latest descriptor when it resumes.
            if let Some(inst) = self.instances.get_mut(&id) {
                if changes.invalidates_coverage() {
                    inst.coverage = None;
                }
                inst.descriptor = next;
            }
            return Ok(());
        };

        // The primary overlay is mutated in place, never recreated, so its
        // event listener identity survives geometry changes.
        self.surface
            .set_options(primary, &OverlayOptions::Shape(next.style.clone()));
        if changes.geometry {
            self.surface.set_geometry(primary, &primary_geometry(&next));
        }
        if changes.primary_events {
            self.surface.unbind_events(primary);
            for name in &next.events {
                self.surface.bind_event(primary, name);
            }
        }

        if changes.invalidates_coverage() {
            if let Some(h) = cover {
                self.destroy_group(h);
            }
            if let Some(h) = label {
                self.destroy_group(h);
            }
            if let Some(inst) = self.instances.get_mut(&id) {
                inst.coverage = None;
                inst.cover = None;
                inst.label = None;
                inst.descriptor = next.clone();
            }
            if next.show_cover_cells {
                self.schedule(id, InitStage::Cover);
            }
            if next.show_labels {
                self.schedule(id, InitStage::Label);
            }
            return self.drain_pending();
        }

        match &cover {
            Some(h) => {
                if changes.cover_visibility {
                    if next.show_cover_cells {
                        self.surface.group_show(h.group);
                    } else {
                        self.surface.group_hide(h.group);
                    }
                }
                if changes.cover_style {
                    self.surface
                        .group_set_options(h.group, &OverlayOptions::Shape(next.cover_style.clone()));
                }
                if changes.cover_events {
                    self.rebind_members(&h.members, &next.cover_events);
                }
            }
            None => {
                if changes.cover_visibility && next.show_cover_cells {
                    self.schedule(id, InitStage::Cover);
                }
            }
        }

        match &label {
            Some(h) => {
                if changes.label_visibility {
                    if next.show_labels {
                        self.surface.group_show(h.group);
                    } else {
                        self.surface.group_hide(h.group);
                    }
                }
                if changes.label_style {
                    self.surface
                        .group_set_options(h.group, &OverlayOptions::Label(next.label_style.clone()));
                }
                if changes.label_events {
                    self.rebind_members(&h.members, &next.label_events);
                }
            }
            None => {
                if changes.label_visibility && next.show_labels {
                    self.schedule(id, InitStage::Label);
                }
            }
        }

        if let Some(inst) = self.instances.get_mut(&id) {
            inst.descriptor = next;
        }
        self.drain_pending()
    }

    /// Destroys everything the instance owns. Parked capability work for it
    /// is dropped, so a load completing later creates nothing.
    pub fn unmount(&mut self, id: InstanceId) -> Result<(), OverlayError> {
        let Some(inst) = self.instances.remove(&id) else {
            return Err(OverlayError::UnknownInstance(id));
        };
        self.pending.retain(|p| p.instance != id);
        if let Some(primary) = inst.primary {
            self.surface.unbind_events(primary);
            self.surface.destroy_overlay(primary);
        }
        if let Some(h) = inst.cover {
            self.destroy_group(h);
        }
        if let Some(h) = inst.label {
            self.destroy_group(h);
        }
        Ok(())
    }

    /// Host signal: a requested capability finished loading.
    pub fn capability_ready(&mut self, cap: Capability) -> Result<(), OverlayError> {
        self.caps.mark_ready(cap);
        self.drain_pending()
    }

    /// Host signal: a requested capability failed to load. Affected parked
    /// work is dropped and reported; nothing is left half-attached.
    pub fn capability_failed(&mut self, cap: Capability) -> Result<(), OverlayError> {
        self.caps.mark_failed(cap);
        self.drain_pending()
    }

    /// Host signal: a native event fired on an overlay. Forwarded as an
    /// `Interaction` event when the owning instance subscribes to `name`
    /// for that overlay's group, carrying the current geometry.
    pub fn notify_interaction(&mut self, overlay: OverlayId, name: &str) {
        let mut hit = None;
        for (id, inst) in &self.instances {
            if inst.primary == Some(overlay) {
                if inst.descriptor.events.contains(name) {
                    hit = Some((*id, InteractionTarget::Primary, inst.descriptor.geometry.clone()));
                }
                break;
            }
            if let Some(h) = &inst.cover
                && h.members.contains(&overlay)
            {
                if inst.descriptor.cover_events.contains(name) {
                    hit = Some((
                        *id,
                        InteractionTarget::CoverCell(overlay),
                        inst.descriptor.geometry.clone(),
                    ));
                }
                break;
            }
            if let Some(h) = &inst.label
                && h.members.contains(&overlay)
            {
                if inst.descriptor.label_events.contains(name) {
                    hit = Some((
                        *id,
                        InteractionTarget::Label(overlay),
                        inst.descriptor.geometry.clone(),
                    ));
                }
                break;
            }
        }
        if let Some((instance, target, geometry)) = hit {
            self.events.push(OverlayEvent::Interaction {
                instance,
                target,
                name: name.to_string(),
                geometry,
            });
        }
    }

    pub fn drain_events(&mut self) -> Vec<OverlayEvent> {
        std::mem::take(&mut self.events)
    }

    /// How often coverage has been computed for the instance. Diagnostic;
    /// lets hosts and tests verify the cache is doing its job.
    pub fn coverage_computations(&self, id: InstanceId) -> Option<u64> {
        self.instances.get(&id).map(|i| i.compute_count)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn schedule(&mut self, id: InstanceId, stage: InitStage) {
        if self
            .pending
            .iter()
            .any(|p| p.instance == id && p.stage == stage)
        {
            return;
        }
        let Some(inst) = self.instances.get(&id) else {
            return;
        };
        let kind = inst.descriptor.geometry.kind();
        for cap in stage_capabilities(stage, kind) {
            if self.caps.note_requested(cap) {
                self.surface.request_capability(cap);
            }
        }
        self.pending.push_back(PendingInit {
            instance: id,
            stage,
        });
    }

    fn drain_pending(&mut self) -> Result<(), OverlayError> {
        let mut progressed = true;
        while progressed {
            progressed = false;
            let queue = std::mem::take(&mut self.pending);
            let mut deferred: VecDeque<PendingInit> = VecDeque::new();
            for p in queue {
                // An unmounted instance is the disposal flag: its parked
                // work is dropped on resume.
                let Some(inst) = self.instances.get(&p.instance) else {
                    continue;
                };
                let caps = stage_capabilities(p.stage, inst.descriptor.geometry.kind());
                if let Some(failed) = self.caps.first_failed(&caps) {
                    self.events.push(OverlayEvent::CapabilityFailed {
                        instance: p.instance,
                        capability: failed,
                    });
                    progressed = true;
                    continue;
                }
                if !self.caps.all_ready(&caps) {
                    deferred.push_back(p);
                    continue;
                }
                match p.stage {
                    InitStage::Primary => self.init_primary(p.instance)?,
                    InitStage::Cover => self.init_cover(p.instance)?,
                    InitStage::Label => self.init_label(p.instance)?,
                }
                progressed = true;
            }
            // Inits may have scheduled new stages; retry them next round.
            for p in self.pending.drain(..).collect::<Vec<_>>() {
                if !deferred.contains(&p) {
                    deferred.push_back(p);
                }
            }
            self.pending = deferred;
        }
        Ok(())
    }

    fn init_primary(&mut self, id: InstanceId) -> Result<(), OverlayError> {
        let Some(inst) = self.instances.get(&id) else {
            return Ok(());
        };
        let descriptor = inst.descriptor.clone();

        let overlay = self.surface.create_overlay(
            descriptor.geometry.kind(),
            &OverlayOptions::Shape(descriptor.style.clone()),
            &primary_geometry(&descriptor),
        );
        for name in &descriptor.events {
            self.surface.bind_event(overlay, name);
        }

        if let Some(inst) = self.instances.get_mut(&id) {
            inst.primary = Some(overlay);
        }
        self.events.push(OverlayEvent::PrimaryReady {
            instance: id,
            overlay,
            geometry: descriptor.geometry.clone(),
        });

        if descriptor.show_cover_cells {
            self.schedule(id, InitStage::Cover);
        }
        if descriptor.show_labels {
            self.schedule(id, InitStage::Label);
        }
        Ok(())
    }

    fn init_cover(&mut self, id: InstanceId) -> Result<(), OverlayError> {
        if self
            .instances
            .get(&id)
            .is_none_or(|inst| inst.cover.is_some())
        {
            return Ok(());
        }
        let coverage = self.ensure_coverage(id)?;
        let Some(inst) = self.instances.get(&id) else {
            return Ok(());
        };
        let descriptor = inst.descriptor.clone();

        let mut members = Vec::with_capacity(coverage.len());
        for cell in &coverage.cells {
            let overlay = self.surface.create_overlay(
                OverlayKind::Polygon,
                &OverlayOptions::Shape(descriptor.cover_style.clone()),
                &OverlayGeometry::Path(cell.path().to_vec()),
            );
            for name in &descriptor.cover_events {
                self.surface.bind_event(overlay, name);
            }
            members.push(overlay);
        }
        let group = self.surface.create_group(&members);
        self.surface
            .group_set_options(group, &OverlayOptions::Shape(descriptor.cover_style.clone()));
        if descriptor.show_cover_cells {
            self.surface.group_show(group);
        } else {
            self.surface.group_hide(group);
        }

        if let Some(inst) = self.instances.get_mut(&id) {
            inst.cover = Some(GroupHandles {
                group,
                members: members.clone(),
            });
        }
        self.events.push(OverlayEvent::CoverReady {
            instance: id,
            group,
            overlays: members,
            codes: coverage.codes(),
        });
        Ok(())
    }

    fn init_label(&mut self, id: InstanceId) -> Result<(), OverlayError> {
        if self
            .instances
            .get(&id)
            .is_none_or(|inst| inst.label.is_some())
        {
            return Ok(());
        }
        let coverage = self.ensure_coverage(id)?;
        let Some(inst) = self.instances.get(&id) else {
            return Ok(());
        };
        let descriptor = inst.descriptor.clone();

        let mut members = Vec::with_capacity(coverage.len());
        for cell in &coverage.cells {
            let overlay = self.surface.create_overlay(
                OverlayKind::Text,
                &OverlayOptions::Label(descriptor.label_style.clone()),
                &OverlayGeometry::Label {
                    position: cell.center,
                    text: cell.code.clone(),
                },
            );
            for name in &descriptor.label_events {
                self.surface.bind_event(overlay, name);
            }
            members.push(overlay);
        }
        let group = self.surface.create_group(&members);
        self.surface
            .group_set_options(group, &OverlayOptions::Label(descriptor.label_style.clone()));
        if descriptor.show_labels {
            self.surface.group_show(group);
        } else {
            self.surface.group_hide(group);
        }

        if let Some(inst) = self.instances.get_mut(&id) {
            inst.label = Some(GroupHandles {
                group,
                members: members.clone(),
            });
        }
        self.events.push(OverlayEvent::LabelReady {
            instance: id,
            group,
            overlays: members,
            codes: coverage.codes(),
        });
        Ok(())
    }

    fn ensure_coverage(&mut self, id: InstanceId) -> Result<CoverageResult, OverlayError> {
        let Some(inst) = self.instances.get_mut(&id) else {
            return Err(OverlayError::UnknownInstance(id));
        };
        if let Some(cached) = &inst.coverage {
            return Ok(cached.clone());
        }
        let shape = inst.descriptor.geometry.to_shape();
        let result = coverage::cover_cells(&shape, inst.descriptor.precision)?;
        inst.compute_count += 1;
        inst.coverage = Some(result.clone());
        Ok(result)
    }

    fn rebind_members(&mut self, members: &[OverlayId], events: &crate::descriptor::EventSet) {
        for member in members {
            self.surface.unbind_events(*member);
            for name in events {
                self.surface.bind_event(*member, name);
            }
        }
    }

    fn destroy_group(&mut self, handles: GroupHandles) {
        for member in &handles.members {
            self.surface.unbind_events(*member);
            self.surface.destroy_overlay(*member);
        }
        self.surface.destroy_group(handles.group);
    }
}

#[cfg(test)]
mod tests {
    use super::{InstanceId, OverlayEngine};
    use crate::descriptor::ShapeDescriptor;
    use crate::error::OverlayError;
    use crate::events::{InteractionTarget, OverlayEvent};
    use crate::surface::{
        Capability, GroupId, OverlayGeometry, OverlayId, OverlayKind, OverlayOptions,
        RenderSurface,
    };
    use foundation::shape::ShapeError;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        RequestCapability(Capability),
        CreateOverlay(OverlayKind),
        SetGeometry(OverlayId),
        SetOptions(OverlayId),
        Bind(OverlayId, String),
        Unbind(OverlayId),
        Show(OverlayId),
        Hide(OverlayId),
        DestroyOverlay(OverlayId),
        CreateGroup(usize),
        GroupSetOptions(GroupId),
        GroupShow(GroupId),
        GroupHide(GroupId),
        DestroyGroup(GroupId),
    }

    #[derive(Debug)]
    struct FakeSurface {
        has_context: bool,
        next_id: u64,
        ops: Vec<Op>,
    }

    impl FakeSurface {
        fn new() -> Self {
            Self {
                has_context: true,
                next_id: 1,
                ops: Vec::new(),
            }
        }

        fn detached() -> Self {
            Self {
                has_context: false,
                ..Self::new()
            }
        }

        fn count(&self, matcher: impl Fn(&Op) -> bool) -> usize {
            self.ops.iter().filter(|op| matcher(op)).count()
        }

        fn alloc(&mut self) -> u64 {
            let id = self.next_id;
            self.next_id += 1;
            id
        }
    }

    impl RenderSurface for FakeSurface {
        fn has_render_context(&self) -> bool {
            self.has_context
        }

        fn request_capability(&mut self, cap: Capability) {
            self.ops.push(Op::RequestCapability(cap));
        }

        fn create_overlay(
            &mut self,
            kind: OverlayKind,
            _options: &OverlayOptions,
            _geometry: &OverlayGeometry,
        ) -> OverlayId {
            self.ops.push(Op::CreateOverlay(kind));
            OverlayId(self.alloc())
        }

        fn set_geometry(&mut self, id: OverlayId, _geometry: &OverlayGeometry) {
            self.ops.push(Op::SetGeometry(id));
        }

        fn set_options(&mut self, id: OverlayId, _options: &OverlayOptions) {
            self.ops.push(Op::SetOptions(id));
        }

        fn bind_event(&mut self, id: OverlayId, name: &str) {
            self.ops.push(Op::Bind(id, name.to_string()));
        }

        fn unbind_events(&mut self, id: OverlayId) {
            self.ops.push(Op::Unbind(id));
        }

        fn show(&mut self, id: OverlayId) {
            self.ops.push(Op::Show(id));
        }

        fn hide(&mut self, id: OverlayId) {
            self.ops.push(Op::Hide(id));
        }

        fn destroy_overlay(&mut self, id: OverlayId) {
            self.ops.push(Op::DestroyOverlay(id));
        }

        fn create_group(&mut self, members: &[OverlayId]) -> GroupId {
            self.ops.push(Op::CreateGroup(members.len()));
            GroupId(self.alloc())
        }

        fn group_set_options(&mut self, id: GroupId, _options: &OverlayOptions) {
            self.ops.push(Op::GroupSetOptions(id));
        }

        fn group_show(&mut self, id: GroupId) {
            self.ops.push(Op::GroupShow(id));
        }

        fn group_hide(&mut self, id: GroupId) {
            self.ops.push(Op::GroupHide(id));
        }

        fn destroy_group(&mut self, id: GroupId) {
            self.ops.push(Op::DestroyGroup(id));
        }
    }

    fn square() -> ShapeDescriptor {
        // ~1 km square in central Paris.
        ShapeDescriptor::polygon(vec![
            [2.35, 48.85],
            [2.36, 48.85],
            [2.36, 48.86],
            [2.35, 48.86],
        ])
    }

    fn engine() -> OverlayEngine<FakeSurface> {
        OverlayEngine::new(FakeSurface::new()).unwrap()
    }

    fn ready_engine_with(descriptor: ShapeDescriptor) -> (OverlayEngine<FakeSurface>, InstanceId) {
        let mut e = engine();
        let id = e.mount(descriptor).unwrap();
        e.capability_ready(Capability::Polygon).unwrap();
        e.capability_ready(Capability::Circle).unwrap();
        e.capability_ready(Capability::OverlayGroup).unwrap();
        e.capability_ready(Capability::Text).unwrap();
        (e, id)
    }

    fn cover_ready_events(events: &[OverlayEvent]) -> Vec<&OverlayEvent> {
        events
            .iter()
            .filter(|e| matches!(e, OverlayEvent::CoverReady { .. }))
            .collect()
    }

    #[test]
    fn missing_render_context_is_fatal() {
        let err = OverlayEngine::new(FakeSurface::detached()).unwrap_err();
        assert_eq!(err, OverlayError::MissingRenderContext);
    }

    #[test]
    fn primary_waits_for_its_capability() {
        let mut e = engine();
        let id = e.mount(square()).unwrap();
        assert_eq!(e.pending_len(), 1);
        assert_eq!(
            e.surface().count(|op| matches!(op, Op::CreateOverlay(_))),
            0
        );

        e.capability_ready(Capability::Polygon).unwrap();
        assert_eq!(e.pending_len(), 0);
        assert_eq!(
            e.surface()
                .count(|op| matches!(op, Op::CreateOverlay(OverlayKind::Polygon))),
            1
        );

        let events = e.drain_events();
        assert!(matches!(
            events.as_slice(),
            [OverlayEvent::PrimaryReady { instance, .. }] if *instance == id
        ));
    }

    #[test]
    fn capability_requests_are_coalesced_across_instances() {
        let mut e = engine();
        e.mount(square()).unwrap();
        e.mount(square()).unwrap();
        assert_eq!(
            e.surface()
                .count(|op| matches!(op, Op::RequestCapability(Capability::Polygon))),
            1
        );

        e.capability_ready(Capability::Polygon).unwrap();
        assert_eq!(
            e.surface().count(|op| matches!(op, Op::CreateOverlay(_))),
            2
        );
    }

    #[test]
    fn unmount_before_capability_ready_creates_nothing() {
        let mut e = engine();
        let id = e.mount(square()).unwrap();
        e.unmount(id).unwrap();
        e.capability_ready(Capability::Polygon).unwrap();

        assert_eq!(
            e.surface().count(|op| matches!(op, Op::CreateOverlay(_))),
            0
        );
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn identical_update_is_a_true_noop() {
        let (mut e, id) = ready_engine_with(square());
        e.drain_events();
        let ops_before = e.surface().ops.len();

        e.update(id, square()).unwrap();

        assert_eq!(e.surface().ops.len(), ops_before);
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn cover_cells_are_created_lazily_on_first_show() {
        let (mut e, id) = ready_engine_with(square());
        assert_eq!(e.coverage_computations(id), Some(0));
        e.drain_events();

        let mut next = square();
        next.show_cover_cells = true;
        e.update(id, next).unwrap();

        assert_eq!(e.coverage_computations(id), Some(1));
        let events = e.drain_events();
        let covers = cover_ready_events(&events);
        assert_eq!(covers.len(), 1);
        assert_eq!(
            e.surface().count(|op| matches!(op, Op::GroupShow(_))),
            1
        );
    }

    #[test]
    fn visibility_toggles_reuse_the_cached_coverage() {
        let mut shown = square();
        shown.show_cover_cells = true;
        let (mut e, id) = ready_engine_with(shown.clone());
        assert_eq!(e.coverage_computations(id), Some(1));
        e.drain_events();

        let mut hidden = shown.clone();
        hidden.show_cover_cells = false;
        e.update(id, hidden.clone()).unwrap();
        assert_eq!(e.surface().count(|op| matches!(op, Op::GroupHide(_))), 1);

        e.update(id, shown.clone()).unwrap();
        assert_eq!(e.coverage_computations(id), Some(1));
        assert!(cover_ready_events(&e.drain_events()).is_empty());

        // Labels reuse the same cache instead of recomputing.
        let mut with_labels = shown;
        with_labels.show_labels = true;
        e.update(id, with_labels).unwrap();
        assert_eq!(e.coverage_computations(id), Some(1));
        let events = e.drain_events();
        assert!(
            events
                .iter()
                .any(|ev| matches!(ev, OverlayEvent::LabelReady { .. }))
        );
    }

    #[test]
    fn cover_style_change_does_not_recompute() {
        let mut shown = square();
        shown.show_cover_cells = true;
        let (mut e, id) = ready_engine_with(shown.clone());
        e.drain_events();
        let creates_before = e.surface().count(|op| matches!(op, Op::CreateOverlay(_)));

        let mut restyled = shown;
        restyled.cover_style.fill_color = "grey".to_string();
        e.update(id, restyled).unwrap();

        assert_eq!(e.coverage_computations(id), Some(1));
        assert_eq!(
            e.surface().count(|op| matches!(op, Op::CreateOverlay(_))),
            creates_before
        );
        assert!(
            e.surface()
                .count(|op| matches!(op, Op::GroupSetOptions(_)))
                >= 2
        );
        assert!(cover_ready_events(&e.drain_events()).is_empty());
    }

    #[test]
    fn precision_change_destroys_and_rebuilds_the_cover_group() {
        let mut shown = square();
        shown.show_cover_cells = true;
        let (mut e, id) = ready_engine_with(shown.clone());
        e.drain_events();

        let mut finer = shown;
        finer.precision = 6;
        e.update(id, finer).unwrap();

        assert_eq!(e.coverage_computations(id), Some(2));
        assert_eq!(e.surface().count(|op| matches!(op, Op::DestroyGroup(_))), 1);
        let events = e.drain_events();
        let covers = cover_ready_events(&events);
        assert_eq!(covers.len(), 1);
        match covers[0] {
            OverlayEvent::CoverReady { codes, .. } => {
                assert!(!codes.is_empty());
                assert!(codes.iter().all(|c| c.len() == 6));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn geometry_change_mutates_the_primary_in_place() {
        let (mut e, id) = ready_engine_with(square());
        e.drain_events();
        let creates_before = e.surface().count(|op| matches!(op, Op::CreateOverlay(_)));

        let mut moved = square();
        moved.geometry = crate::descriptor::ShapeGeometry::Polygon {
            path: vec![[2.40, 48.85], [2.41, 48.85], [2.41, 48.86], [2.40, 48.86]],
        };
        e.update(id, moved).unwrap();

        assert_eq!(e.surface().count(|op| matches!(op, Op::SetGeometry(_))), 1);
        assert_eq!(
            e.surface().count(|op| matches!(op, Op::CreateOverlay(_))),
            creates_before
        );
        assert_eq!(
            e.surface()
                .count(|op| matches!(op, Op::DestroyOverlay(_))),
            0
        );
    }

    #[test]
    fn changing_event_sets_rebinds_without_leftovers() {
        let mut with_click = square();
        with_click.events.insert("click".to_string());
        let (mut e, id) = ready_engine_with(with_click.clone());

        let primary = match e.drain_events().as_slice() {
            [OverlayEvent::PrimaryReady { overlay, .. }] => *overlay,
            other => panic!("unexpected events: {other:?}"),
        };
        assert_eq!(
            e.surface()
                .count(|op| *op == Op::Bind(primary, "click".to_string())),
            1
        );

        let mut with_dblclick = square();
        with_dblclick.events.insert("dblclick".to_string());
        e.update(id, with_dblclick).unwrap();

        assert_eq!(e.surface().count(|op| *op == Op::Unbind(primary)), 1);
        assert_eq!(
            e.surface()
                .count(|op| *op == Op::Bind(primary, "dblclick".to_string())),
            1
        );
        // The stale binding was not re-added after the unbind.
        assert_eq!(
            e.surface()
                .count(|op| *op == Op::Bind(primary, "click".to_string())),
            1
        );
    }

    #[test]
    fn degenerate_update_is_rejected_before_any_mutation() {
        let (mut e, id) = ready_engine_with(square());
        e.drain_events();
        let ops_before = e.surface().ops.len();

        let mut bad = square();
        bad.geometry = crate::descriptor::ShapeGeometry::Polygon {
            path: vec![[0.0, 0.0], [1.0, 1.0]],
        };
        let err = e.update(id, bad).unwrap_err();
        assert_eq!(err, OverlayError::DegenerateShape(ShapeError::TooFewPoints(2)));
        assert_eq!(e.surface().ops.len(), ops_before);

        // The stored descriptor is untouched: the original is still a no-op.
        e.update(id, square()).unwrap();
        assert_eq!(e.surface().ops.len(), ops_before);
    }

    #[test]
    fn invalid_precision_is_rejected_at_mount() {
        let mut e = engine();
        let mut d = square();
        d.precision = 0;
        assert_eq!(e.mount(d).unwrap_err(), OverlayError::InvalidPrecision(0));
        let mut d = square();
        d.precision = 13;
        assert_eq!(e.mount(d).unwrap_err(), OverlayError::InvalidPrecision(13));
    }

    #[test]
    fn capability_failure_is_reported_and_parked_work_dropped() {
        let mut e = engine();
        let id = e.mount(ShapeDescriptor::circle([2.35, 48.85], 800.0)).unwrap();

        e.capability_failed(Capability::Circle).unwrap();

        assert_eq!(e.pending_len(), 0);
        assert_eq!(
            e.surface().count(|op| matches!(op, Op::CreateOverlay(_))),
            0
        );
        let events = e.drain_events();
        assert!(matches!(
            events.as_slice(),
            [OverlayEvent::CapabilityFailed { instance, capability }]
                if *instance == id && *capability == Capability::Circle
        ));
    }

    #[test]
    fn interactions_are_forwarded_only_when_subscribed() {
        let mut shown = square();
        shown.show_cover_cells = true;
        shown.cover_events.insert("mouseover".to_string());
        let (mut e, id) = ready_engine_with(shown);

        let events = e.drain_events();
        let member = events
            .iter()
            .find_map(|ev| match ev {
                OverlayEvent::CoverReady { overlays, .. } => overlays.first().copied(),
                _ => None,
            })
            .expect("cover group was created");

        e.notify_interaction(member, "mouseover");
        e.notify_interaction(member, "click");

        let events = e.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            OverlayEvent::Interaction { instance, target, name, .. }
                if *instance == id
                    && *target == InteractionTarget::CoverCell(member)
                    && name == "mouseover"
        ));
    }

    #[test]
    fn unmount_releases_every_owned_handle() {
        let mut shown = square();
        shown.show_cover_cells = true;
        shown.show_labels = true;
        let (mut e, id) = ready_engine_with(shown);
        let creates = e.surface().count(|op| matches!(op, Op::CreateOverlay(_)));
        assert!(creates > 1);

        e.unmount(id).unwrap();

        assert_eq!(
            e.surface().count(|op| matches!(op, Op::DestroyOverlay(_))),
            creates
        );
        assert_eq!(e.surface().count(|op| matches!(op, Op::DestroyGroup(_))), 2);
        assert_eq!(
            e.unmount(id).unwrap_err(),
            OverlayError::UnknownInstance(id)
        );
    }
}
