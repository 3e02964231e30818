use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::{AggregatorBase, AggregatorId, AggregatorRef, EvaluatedResult, RefMode};
use crate::active::{ActiveEffectHandle, EffectOwner};
use crate::extension::ExtensionRegistry;
use crate::level::{LevelSpec, SharedLevel};
use crate::modifier::ModOp;
use crate::name::AttributeId;
use crate::scalable::{CurveRegistry, CurveSource};

/// Attribute aggregator watched by a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WatchKey {
    pub container: u32,
    pub attribute: AttributeId,
}

/// Counters exposed for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregatorStats {
    pub created: u64,
    pub freed: u64,
    /// Evaluations that actually recomputed a node.
    pub evaluations: u64,
    /// Evaluations answered from the cache.
    pub cache_hits: u64,
    /// Dependent edges followed while marking dirty.
    pub dependents_updated: u64,
    pub copies_made: u64,
}

pub(super) struct Aggregator {
    pub(super) base: AggregatorBase,
    pub(super) level: SharedLevel,
    pub(super) mods: [Vec<AggregatorRef>; ModOp::COUNT],
    pub(super) dependents: Vec<AggregatorId>,
    pub(super) cache: Option<EvaluatedResult>,
    pub(super) owner: EffectOwner,
    pub(super) watch: Option<WatchKey>,
    pub(super) dirty_epoch: u64,
    pub(super) evaluating: bool,
}

struct Slot {
    generation: u32,
    strong: u32,
    node: Option<Aggregator>,
}

/// Owner of every aggregator in a simulation.
///
/// One arena is shared by all targets, since specs and their aggregators
/// travel between them. Refs handed out by the arena must be given back with
/// [`AggregatorArena::release`]; a hard ref that is never released keeps its
/// node alive.
pub struct AggregatorArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    pub(super) curves: Rc<dyn CurveSource>,
    pub(super) extensions: ExtensionRegistry,
    pub(super) stats: AggregatorStats,
    dirty_watched: Vec<(AggregatorId, WatchKey)>,
    epoch: u64,
    next_container: u32,
}

impl AggregatorArena {
    pub fn new() -> Self {
        Self::with_curves(CurveRegistry::new())
    }

    pub fn with_curves(curves: impl CurveSource + 'static) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            curves: Rc::new(curves),
            extensions: ExtensionRegistry::new(),
            stats: AggregatorStats::default(),
            dirty_watched: Vec::new(),
            epoch: 0,
            next_container: 0,
        }
    }

    /// Swaps the curve source and invalidates every curve-driven node.
    pub fn set_curves(&mut self, curves: impl CurveSource + 'static) {
        self.curves = Rc::new(curves);
        let curve_driven: Vec<AggregatorId> = self
            .live()
            .filter(|(_, node)| !node.base.magnitude.is_static())
            .map(|(id, _)| id)
            .collect();
        for id in curve_driven {
            self.mark_dirty(id);
        }
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.extensions
    }

    pub fn stats(&self) -> AggregatorStats {
        self.stats
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    // ===== allocation =====

    /// Allocates a node and returns the hard ref that owns it.
    pub fn create(&mut self, base: AggregatorBase, level: SharedLevel) -> AggregatorRef {
        self.insert(base, level, EffectOwner::NONE)
    }

    pub fn create_constant(&mut self, value: f64) -> AggregatorRef {
        self.create(AggregatorBase::constant(value), LevelSpec::invalid())
    }

    pub(super) fn insert(
        &mut self,
        base: AggregatorBase,
        level: SharedLevel,
        owner: EffectOwner,
    ) -> AggregatorRef {
        let node = Aggregator {
            base,
            level,
            mods: Default::default(),
            dependents: Vec::new(),
            cache: None,
            owner,
            watch: None,
            dirty_epoch: 0,
            evaluating: false,
        };
        self.stats.created += 1;

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.strong = 1;
                slot.node = Some(node);
                AggregatorId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    strong: 1,
                    node: Some(node),
                });
                AggregatorId::new(index, 0)
            }
        };
        trace!(aggregator = %id, "created");
        AggregatorRef::new(id, RefMode::Hard)
    }

    pub(super) fn retain(&mut self, id: AggregatorId) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.strong += 1;
                true
            }
            None => false,
        }
    }

    pub(super) fn release_strong(&mut self, id: AggregatorId) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        slot.strong = slot.strong.saturating_sub(1);
        if slot.strong == 0 {
            self.free_node(id);
        }
    }

    /// Frees `id` and everything only it kept alive, then dirties whatever
    /// depended on the freed nodes.
    fn free_node(&mut self, id: AggregatorId) {
        let mut pending = vec![id];
        let mut orphaned = Vec::new();

        while let Some(id) = pending.pop() {
            let Some(slot) = self.slot_mut(id) else {
                continue;
            };
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            slot.strong = 0;
            self.free.push(id.index());
            self.stats.freed += 1;
            trace!(aggregator = %id, label = %node.base.label, "freed");

            orphaned.extend(node.dependents);
            for modifier in node.mods.into_iter().flatten() {
                if modifier.mode() != RefMode::Hard {
                    continue;
                }
                if let Some(child) = self.slot_mut(modifier.id()) {
                    child.strong = child.strong.saturating_sub(1);
                    if child.strong == 0 {
                        pending.push(modifier.id());
                    }
                }
            }
        }

        for dependent in orphaned {
            if self.contains(dependent) {
                self.mark_dirty(dependent);
            }
        }
    }

    // ===== lookup =====

    fn slot_mut(&mut self, id: AggregatorId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation() && slot.node.is_some())
    }

    pub(super) fn node(&self, id: AggregatorId) -> Option<&Aggregator> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    pub(super) fn node_mut(&mut self, id: AggregatorId) -> Option<&mut Aggregator> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    fn live(&self) -> impl Iterator<Item = (AggregatorId, &Aggregator)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|node| (AggregatorId::new(index as u32, slot.generation), node))
        })
    }

    pub fn contains(&self, id: AggregatorId) -> bool {
        self.node(id).is_some()
    }

    pub fn base(&self, id: AggregatorId) -> Option<&AggregatorBase> {
        self.node(id).map(|node| &node.base)
    }

    pub fn level(&self, id: AggregatorId) -> Option<&SharedLevel> {
        self.node(id).map(|node| &node.level)
    }

    /// Number of strong (hard) refs keeping `id` alive.
    pub fn strong_count(&self, id: AggregatorId) -> u32 {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation() && slot.node.is_some())
            .map_or(0, |slot| slot.strong)
    }

    /// Handle of the effect `id` belongs to, within that effect's container.
    pub fn owner(&self, id: AggregatorId) -> Option<ActiveEffectHandle> {
        self.node(id).map(|node| node.owner.handle())
    }

    pub fn effect_owner(&self, id: AggregatorId) -> Option<EffectOwner> {
        self.node(id).map(|node| node.owner)
    }

    pub fn set_owner(&mut self, id: AggregatorId, owner: EffectOwner) {
        if let Some(node) = self.node_mut(id) {
            node.owner = owner;
        }
    }

    /// Whether `id` currently holds a memoized result.
    pub fn is_cached(&self, id: AggregatorId) -> bool {
        self.node(id).is_some_and(|node| node.cache.is_some())
    }

    /// Live refs in one modifier list.
    pub fn num_mods(&self, id: AggregatorId, op: ModOp) -> usize {
        self.node(id).map_or(0, |node| {
            node.mods[op.index()]
                .iter()
                .filter(|modifier| self.contains(modifier.id()))
                .count()
        })
    }

    pub fn dependents(&self, id: AggregatorId) -> Vec<AggregatorId> {
        self.node(id).map_or_else(Vec::new, |node| {
            node.dependents
                .iter()
                .copied()
                .filter(|dependent| self.contains(*dependent))
                .collect()
        })
    }

    // ===== graph mutation =====

    /// Registers `dependent` to be dirtied whenever `id` is.
    pub fn add_dependent(&mut self, id: AggregatorId, dependent: AggregatorId) {
        if let Some(node) = self.node_mut(id) {
            if !node.dependents.contains(&dependent) {
                node.dependents.push(dependent);
            }
        }
    }

    pub fn clear_dependents(&mut self, id: AggregatorId) {
        if let Some(node) = self.node_mut(id) {
            node.dependents.clear();
        }
    }

    /// Clears the cache of `id` and of everything that transitively depends
    /// on it. Dead dependents are pruned on the way.
    pub fn mark_dirty(&mut self, id: AggregatorId) {
        self.epoch += 1;
        let epoch = self.epoch;
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let Some(node) = self.node_mut(current) else {
                continue;
            };
            if node.dirty_epoch == epoch {
                continue;
            }
            node.dirty_epoch = epoch;
            node.cache = None;
            let watch = node.watch;
            let dependents = std::mem::take(&mut node.dependents);

            if let Some(key) = watch {
                self.dirty_watched.push((current, key));
            }

            let live: Vec<AggregatorId> = dependents
                .into_iter()
                .filter(|dependent| self.contains(*dependent))
                .collect();
            self.stats.dependents_updated += live.len() as u64;
            stack.extend(live.iter().rev().copied());

            if let Some(node) = self.node_mut(current) {
                node.dependents = live;
            }
        }
    }

    /// Appends `modifier` to the `op` list of `id`.
    ///
    /// With `take_snapshot` the ref is replaced by a private deep copy first.
    /// Otherwise a soft ref stays a live link and a hard ref is handed over
    /// to the list.
    pub fn apply_mod(
        &mut self,
        id: AggregatorId,
        op: ModOp,
        mut modifier: AggregatorRef,
        take_snapshot: bool,
    ) {
        if !self.contains(id) {
            warn!(aggregator = %id, "apply_mod on a freed aggregator");
            self.release(modifier);
            return;
        }
        if take_snapshot {
            self.make_unique_deep(&mut modifier);
        }
        if let Some(target) = self.get(&modifier) {
            self.add_dependent(target, id);
        }
        debug!(
            aggregator = %id,
            %op,
            modifier = %modifier.id(),
            mode = %modifier.mode(),
            "modifier applied"
        );
        match self.node_mut(id) {
            Some(node) => node.mods[op.index()].push(modifier),
            None => self.release(modifier),
        }
        self.mark_dirty(id);
    }

    /// Folds an evaluated value permanently into the base of `id`.
    ///
    /// A curve-driven base cannot absorb a constant, so the value is attached
    /// as a new leaf modifier instead. Custom writes are attached the same way
    /// so their extensions keep transforming. Executed leaves belong to no
    /// active effect and survive its removal.
    pub fn execute_mod(&mut self, id: AggregatorId, op: ModOp, evaluated: &EvaluatedResult) {
        let Some(node) = self.node(id) else {
            warn!(aggregator = %id, "execute_mod on a freed aggregator");
            return;
        };
        if !node.base.magnitude.is_static() || op == ModOp::Custom {
            let leaf = self.create(AggregatorBase::from_evaluated(evaluated), LevelSpec::invalid());
            self.apply_mod(id, op, leaf, false);
            return;
        }

        if let Some(node) = self.node_mut(id) {
            let base = &mut node.base;
            let value = op.fold(base.magnitude.value, evaluated.magnitude);
            base.magnitude.set_value(value);
            if op == ModOp::Override {
                base.tags = evaluated.tags.clone();
            } else {
                base.tags.append(&evaluated.tags);
            }
            debug!(aggregator = %id, %op, value, "modifier executed into base");
        }
        self.mark_dirty(id);
    }

    /// Evaluates `source` and executes it into `id`.
    pub fn execute_mod_from(&mut self, id: AggregatorId, op: ModOp, source: &AggregatorRef) {
        let Some(source) = self.get(source) else {
            return;
        };
        let evaluated = self.evaluate(source);
        self.execute_mod(id, op, &evaluated);
    }

    /// Detaches every modifier of `id` whose node belongs to `owner`.
    /// Unowned modifiers are never detached.
    pub fn remove_mods_owned_by(&mut self, id: AggregatorId, owner: EffectOwner) -> usize {
        if owner.is_none() {
            return 0;
        }
        let Some(node) = self.node_mut(id) else {
            return 0;
        };
        let lists = std::mem::take(&mut node.mods);

        let mut kept: [Vec<AggregatorRef>; ModOp::COUNT] = Default::default();
        let mut removed = Vec::new();
        for (index, list) in lists.into_iter().enumerate() {
            for modifier in list {
                let owned = self
                    .node(modifier.id())
                    .is_some_and(|child| child.owner == owner);
                if owned {
                    removed.push(modifier);
                } else {
                    kept[index].push(modifier);
                }
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.mods = kept;
        }

        let count = removed.len();
        for modifier in removed {
            self.release(modifier);
        }
        if count > 0 {
            self.mark_dirty(id);
        }
        count
    }

    /// Changes a shared level and dirties every curve-driven node bound to it.
    pub fn set_level(&mut self, level: &SharedLevel, value: f64) {
        level.set(value);
        let bound: Vec<AggregatorId> = self
            .live()
            .filter(|(_, node)| Rc::ptr_eq(&node.level, level) && !node.base.magnitude.is_static())
            .map(|(id, _)| id)
            .collect();
        for id in bound {
            self.mark_dirty(id);
        }
    }

    // ===== container support =====

    pub(crate) fn allocate_container_id(&mut self) -> u32 {
        let container = self.next_container;
        self.next_container = self.next_container.wrapping_add(1);
        container
    }

    pub(crate) fn watch(&mut self, id: AggregatorId, key: WatchKey) {
        if let Some(node) = self.node_mut(id) {
            node.watch = Some(key);
        }
    }

    pub(crate) fn unwatch(&mut self, id: AggregatorId) {
        if let Some(node) = self.node_mut(id) {
            node.watch = None;
        }
    }

    /// Whether a watched node of `container` was dirtied and not yet
    /// written back.
    pub fn has_pending_writes(&self, container: u32) -> bool {
        self.dirty_watched
            .iter()
            .any(|(_, key)| key.container == container)
    }

    /// Containers with pending write-backs, in the order they were dirtied.
    pub fn pending_containers(&self) -> Vec<u32> {
        let mut containers = Vec::new();
        for (_, key) in &self.dirty_watched {
            if !containers.contains(&key.container) {
                containers.push(key.container);
            }
        }
        containers
    }

    /// Drops every pending write-back of `container`.
    pub(crate) fn forget_container(&mut self, container: u32) {
        self.dirty_watched.retain(|(_, key)| key.container != container);
    }

    /// Drains the watched nodes of `container` dirtied since the last call,
    /// in the order they were dirtied.
    pub(crate) fn take_dirty_watched(&mut self, container: u32) -> Vec<(AggregatorId, AttributeId)> {
        let mut taken = Vec::new();
        self.dirty_watched.retain(|(id, key)| {
            if key.container == container {
                taken.push((*id, key.attribute));
                false
            } else {
                true
            }
        });
        taken
    }

    /// One-line description for logs.
    pub fn describe(&self, id: AggregatorId) -> String {
        let Some(node) = self.node(id) else {
            return format!("{id} (freed)");
        };
        let counts: Vec<String> = ModOp::ALL
            .iter()
            .filter_map(|op| {
                let n = self.num_mods(id, *op);
                (n > 0).then(|| format!("{op}: {n}"))
            })
            .collect();
        format!(
            "{id} '{}' base {} {} [{}]",
            node.base.label,
            node.base.magnitude.value,
            node.base.tags,
            counts.join(", ")
        )
    }
}

impl Default for AggregatorArena {
    fn default() -> Self {
        Self::new()
    }
}
