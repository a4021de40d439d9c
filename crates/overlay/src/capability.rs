use std::collections::BTreeMap;

use crate::surface::Capability;

/// Load state of one capability module.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CapabilityState {
    Requested,
    Ready,
    Failed,
}

/// Tracks capability load states so each capability is requested from the
/// surface at most once, regardless of how many instances need it.
#[derive(Debug, Default)]
pub struct CapabilityTracker {
    states: BTreeMap<Capability, CapabilityState>,
}

impl CapabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `cap` is needed. Returns `true` the first time, in
    /// which case the caller must forward the request to the surface.
    pub fn note_requested(&mut self, cap: Capability) -> bool {
        if self.states.contains_key(&cap) {
            return false;
        }
        self.states.insert(cap, CapabilityState::Requested);
        true
    }

    pub fn mark_ready(&mut self, cap: Capability) {
        self.states.insert(cap, CapabilityState::Ready);
    }

    pub fn mark_failed(&mut self, cap: Capability) {
        self.states.insert(cap, CapabilityState::Failed);
    }

    pub fn state(&self, cap: Capability) -> Option<CapabilityState> {
        self.states.get(&cap).copied()
    }

    pub fn all_ready(&self, caps: &[Capability]) -> bool {
        caps.iter()
            .all(|c| self.state(*c) == Some(CapabilityState::Ready))
    }

    pub fn first_failed(&self, caps: &[Capability]) -> Option<Capability> {
        caps.iter()
            .copied()
            .find(|c| self.state(*c) == Some(CapabilityState::Failed))
    }
}
