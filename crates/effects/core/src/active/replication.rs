//! Hook points for an external replication layer.
//!
//! The authority owns handle allocation. A replica receives whole effects
//! and timing changes and must end up wired exactly as if the effects had
//! been applied locally.

use tracing::{debug, warn};

use super::effect::ActiveEffect;
use super::{ActiveEffectHandle, ActiveEffectsContainer};
use crate::aggregator::AggregatorArena;
use crate::attribute::AttributeHolder;
use crate::spec::{EffectSpec, ModifierQualifier};

impl ActiveEffectsContainer {
    /// Removal received from the authority. Performs the same unwiring as
    /// [`ActiveEffectsContainer::remove_active_effect`].
    pub fn pre_replicated_remove(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        handle: ActiveEffectHandle,
    ) -> bool {
        debug!(%handle, "replicated remove");
        self.remove_active_effect(arena, holder, handle)
    }

    /// Effect received from the authority under `handle`. It is inserted in
    /// handle order and wired like a local application. Returns `false`, and
    /// releases `spec`, when the handle is invalid or already present.
    pub fn post_replicated_add(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        handle: ActiveEffectHandle,
        spec: EffectSpec,
        start_time: f64,
    ) -> bool {
        if !handle.is_valid() || self.index_of(handle).is_some() {
            warn!(%handle, "replicated add rejected");
            spec.release(arena);
            return false;
        }
        let effect = ActiveEffect::new(arena, self.owner_of(handle), spec, start_time);
        let index = self.effects.partition_point(|existing| existing.handle < handle);
        self.effects.insert(index, effect);
        if handle > self.last_handle {
            self.last_handle = handle;
        }
        let wired = self.activate_effect(arena, holder, handle, ModifierQualifier::new());
        debug!(%handle, wired, "replicated add");
        true
    }

    /// Timing update received from the authority. The effect's aggregators
    /// are re-evaluated and changed totals written back.
    pub fn post_replicated_change(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        handle: ActiveEffectHandle,
        start_time: f64,
        next_execute_time: f64,
    ) -> bool {
        let Some(index) = self.index_of(handle) else {
            warn!(%handle, "replicated change for an unknown handle");
            return false;
        };
        let effect = &mut self.effects[index];
        effect.start_time = start_time;
        effect.next_execute_time = next_execute_time;
        for id in effect.spec.aggregator_ids(arena) {
            arena.mark_dirty(id);
        }
        self.flush(arena, holder);
        true
    }
}
