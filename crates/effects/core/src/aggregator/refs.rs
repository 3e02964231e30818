use std::collections::HashMap;
use std::rc::Rc;

use tracing::warn;

use super::{AggregatorArena, AggregatorBase, AggregatorId};
use crate::active::EffectOwner;
use crate::error::{EffectsError, ErrorSeverity};
use crate::level::LevelSpec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RefMode {
    /// Live link; does not keep the node alive.
    Soft,
    /// Owning link; the node lives at least as long as this ref.
    Hard,
}

/// Reference to an aggregator in an [`AggregatorArena`].
///
/// Not `Clone`: hard refs carry a strong count, so duplicating one goes
/// through [`AggregatorArena::clone_ref`] and dropping one through
/// [`AggregatorArena::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "aggregator refs must be released back into their arena"]
pub struct AggregatorRef {
    id: AggregatorId,
    mode: RefMode,
}

impl AggregatorRef {
    pub(crate) const fn new(id: AggregatorId, mode: RefMode) -> Self {
        Self { id, mode }
    }

    pub const fn id(&self) -> AggregatorId {
        self.id
    }

    pub const fn mode(&self) -> RefMode {
        self.mode
    }

    pub const fn is_hard(&self) -> bool {
        matches!(self.mode, RefMode::Hard)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RefError {
    #[error("aggregator {id} no longer exists")]
    Unresolvable { id: AggregatorId },

    #[error("ref to aggregator {id} does not hold a strong handle")]
    NotHard { id: AggregatorId },
}

impl EffectsError for RefError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unresolvable { .. } => "REF_UNRESOLVABLE",
            Self::NotHard { .. } => "REF_NOT_HARD",
        }
    }
}

impl AggregatorArena {
    /// Resolves `aggregator` if its node is still alive.
    pub fn get(&self, aggregator: &AggregatorRef) -> Option<AggregatorId> {
        self.contains(aggregator.id).then_some(aggregator.id)
    }

    /// Soft alias of the same node.
    pub fn share(&self, aggregator: &AggregatorRef) -> AggregatorRef {
        AggregatorRef::new(aggregator.id, RefMode::Soft)
    }

    /// Copy of the ref in the same mode. A hard ref to a freed node comes
    /// back soft.
    pub fn clone_ref(&mut self, aggregator: &AggregatorRef) -> AggregatorRef {
        if aggregator.is_hard() && self.retain(aggregator.id) {
            AggregatorRef::new(aggregator.id, RefMode::Hard)
        } else {
            self.share(aggregator)
        }
    }

    /// Gives a ref back. Hard refs drop their strong count.
    pub fn release(&mut self, aggregator: AggregatorRef) {
        if aggregator.is_hard() {
            self.release_strong(aggregator.id);
        }
    }

    /// Promotes the ref to own the node it points at. The node is not
    /// copied: it now lives at least as long as this ref.
    pub fn make_hard_ref(&mut self, aggregator: &mut AggregatorRef) -> Result<(), RefError> {
        if !self.contains(aggregator.id) {
            return Err(RefError::Unresolvable { id: aggregator.id });
        }
        if !aggregator.is_hard() {
            self.retain(aggregator.id);
            aggregator.mode = RefMode::Hard;
        }
        Ok(())
    }

    /// Demotes an owning ref to a live link. The node is freed if this was
    /// its last owner.
    pub fn make_soft_ref(&mut self, aggregator: &mut AggregatorRef) -> Result<(), RefError> {
        if !aggregator.is_hard() {
            return Err(RefError::NotHard { id: aggregator.id });
        }
        if !self.contains(aggregator.id) {
            return Err(RefError::Unresolvable { id: aggregator.id });
        }
        aggregator.mode = RefMode::Soft;
        self.release_strong(aggregator.id);
        Ok(())
    }

    /// Replaces the ref with an owning leaf frozen at the node's current
    /// evaluated magnitude and tags. The leaf belongs to no effect.
    pub fn make_unique(&mut self, aggregator: &mut AggregatorRef) {
        let Some(id) = self.get(aggregator) else {
            warn!(aggregator = %aggregator.id, "make_unique on a freed aggregator");
            return;
        };
        let evaluated = self.evaluate(id);
        let Some(label) = self.node(id).map(|node| format!("copy of {}", node.base.label)) else {
            return;
        };
        let copy = self.insert(
            AggregatorBase::from_evaluated(&evaluated).with_label(label),
            LevelSpec::invalid(),
            EffectOwner::NONE,
        );
        self.stats.copies_made += 1;
        let previous = std::mem::replace(aggregator, copy);
        self.release(previous);
    }

    /// Replaces the ref with an owning private copy of the node and of
    /// everything reachable through its modifier lists. Levels are frozen, so
    /// later changes at the source never reach the copy, and no copy belongs
    /// to an effect, so removing the source's effect never detaches it.
    pub fn make_unique_deep(&mut self, aggregator: &mut AggregatorRef) {
        let Some(id) = self.get(aggregator) else {
            warn!(aggregator = %aggregator.id, "make_unique_deep on a freed aggregator");
            return;
        };
        let mut copies = HashMap::new();
        let Some(copy) = self.copy_node(id, true, &mut copies) else {
            return;
        };
        let previous = std::mem::replace(aggregator, copy);
        self.release(previous);
    }

    /// Snapshot of `aggregator` as a new owning ref whose root belongs to
    /// `owner`. Pass the effect the snapshot is wired on behalf of when its
    /// removal should detach the copy.
    pub fn snapshot(&mut self, aggregator: &AggregatorRef, owner: EffectOwner) -> AggregatorRef {
        let mut copy = self.share(aggregator);
        self.make_unique_deep(&mut copy);
        if copy.is_hard() {
            self.set_owner(copy.id, owner);
        }
        copy
    }

    /// Owning structural copy of one node: hard modifiers are copied, soft
    /// modifiers stay live links to the same nodes, the level stays shared.
    pub fn duplicate(&mut self, aggregator: &AggregatorRef) -> AggregatorRef {
        let Some(id) = self.get(aggregator) else {
            return self.share(aggregator);
        };
        let mut copies = HashMap::new();
        match self.copy_node(id, false, &mut copies) {
            Some(copy) => copy,
            None => self.share(aggregator),
        }
    }

    /// Copies `id`. In `deep` mode soft children are copied too and levels
    /// are snapshotted. A node reached twice is copied once; later visits get
    /// a soft link to that copy, which also closes cycles. Copies are unowned.
    fn copy_node(
        &mut self,
        id: AggregatorId,
        deep: bool,
        copies: &mut HashMap<AggregatorId, AggregatorId>,
    ) -> Option<AggregatorRef> {
        if let Some(&copy) = copies.get(&id) {
            return Some(AggregatorRef::new(copy, RefMode::Soft));
        }
        let node = self.node(id)?;
        let base = node.base.clone();
        let level = if deep {
            node.level.snapshot()
        } else {
            Rc::clone(&node.level)
        };
        let children: Vec<(usize, AggregatorId, RefMode)> = node
            .mods
            .iter()
            .enumerate()
            .flat_map(|(index, list)| list.iter().map(move |child| (index, child.id, child.mode)))
            .collect();

        let copy = self.insert(base, level, EffectOwner::NONE);
        copies.insert(id, copy.id);
        self.stats.copies_made += 1;

        for (index, child, mode) in children {
            if !self.contains(child) {
                continue;
            }
            let child_ref = if deep || mode == RefMode::Hard {
                self.copy_node(child, deep, copies)
            } else {
                Some(AggregatorRef::new(child, RefMode::Soft))
            };
            let Some(child_ref) = child_ref else {
                continue;
            };
            self.add_dependent(child_ref.id, copy.id);
            match self.node_mut(copy.id) {
                Some(node) => node.mods[index].push(child_ref),
                None => self.release(child_ref),
            }
        }
        Some(copy)
    }
}
