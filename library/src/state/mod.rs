//! Ephemeral per-node state.
//!
//! Scratch data that nodes carry from one evaluation tick to the next
//! (previous values, stopwatches, animation progress, pending media). It lives
//! in an arena keyed by `NodeId` and is never persisted.

pub mod media;

use log::debug;
use std::collections::{HashMap, VecDeque};

use crate::animation::{AnimationKind, AnimationState};
use crate::model::node::NodeId;
use crate::model::value::{DataType, MediaId, PortValue};
pub use media::{MediaRequest, MediaResolution, MediaSlot};

/// A value waiting in a delay queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedValue {
    pub value: PortValue,
    pub release_at: f64,
}

/// Range captured by a sample-range node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaRangeState {
    pub start: Option<f64>,
    pub media_id: Option<MediaId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EphemeralNodeState {
    pub previous_value: Option<PortValue>,
    /// Last value seen per declared type, restored when the node's type is switched back.
    pub preserved_values_by_type: HashMap<DataType, PortValue>,
    pub stopwatch_running: bool,
    pub stopwatch_start_time: Option<f64>,
    pub queue: Option<VecDeque<QueuedValue>>,
    pub animation: Option<AnimationState>,
    pub media_range_state: Option<MediaRangeState>,
    pub media_slot: Option<MediaSlot>,
    /// Timestamp of the last pulse acted on, per input port.
    pub consumed_pulses: HashMap<usize, f64>,
}

impl EphemeralNodeState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Installs `next` as the node's animation, replacing any other variant.
    pub fn set_animation(&mut self, next: AnimationState) {
        if let Some(current) = &self.animation {
            if current.kind() != next.kind() {
                debug!(
                    "Replacing {:?} animation state with {:?}",
                    current.kind(),
                    next.kind()
                );
            }
        }
        self.animation = Some(next);
    }

    pub fn clear_animation(&mut self, kind: AnimationKind) {
        if self.animation.as_ref().map(AnimationState::kind) == Some(kind) {
            self.animation = None;
        }
    }

    pub fn queue_mut(&mut self) -> &mut VecDeque<QueuedValue> {
        self.queue.get_or_insert_with(VecDeque::new)
    }
}

/// Arena of ephemeral state, one record per node, created lazily.
#[derive(Debug, Default)]
pub struct EphemeralStateStore {
    states: HashMap<NodeId, EphemeralNodeState>,
}

impl EphemeralStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node_id: NodeId) -> Option<&EphemeralNodeState> {
        self.states.get(&node_id)
    }

    pub fn get_or_create(&mut self, node_id: NodeId) -> &mut EphemeralNodeState {
        self.states.entry(node_id).or_default()
    }

    /// Clears every field but keeps the record.
    pub fn reset(&mut self, node_id: NodeId) {
        if let Some(state) = self.states.get_mut(&node_id) {
            state.reset();
        }
    }

    pub fn reset_all(&mut self) {
        for state in self.states.values_mut() {
            state.reset();
        }
    }

    pub fn remove(&mut self, node_id: NodeId) -> Option<EphemeralNodeState> {
        self.states.remove(&node_id)
    }

    /// Drops the `reset` animation sub-state after a type change, leaving
    /// every other field alone. Returns whether anything was cleared.
    pub fn on_type_changed(
        &mut self,
        node_id: NodeId,
        old_type: DataType,
        new_type: DataType,
        reset: Option<AnimationKind>,
    ) -> bool {
        if old_type == new_type {
            return false;
        }
        let Some(kind) = reset else {
            return false;
        };
        let Some(state) = self.states.get_mut(&node_id) else {
            return false;
        };
        let had = state.animation.as_ref().map(AnimationState::kind) == Some(kind);
        state.clear_animation(kind);
        if had {
            debug!("Cleared {:?} state of {} after type change", kind, node_id);
        }
        had
    }

    /// Stores a media resolution if it answers the node's current request.
    /// Returns false for stale or unknown resolutions.
    pub fn apply_media_resolution(&mut self, resolution: &MediaResolution) -> bool {
        let Some(slot) = self
            .states
            .get_mut(&resolution.node_id)
            .and_then(|s| s.media_slot.as_mut())
        else {
            return false;
        };
        slot.resolve(resolution)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
