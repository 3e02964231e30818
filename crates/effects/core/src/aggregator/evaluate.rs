use tracing::{error, warn};

use super::{AggregatorArena, AggregatorId, EvaluatedResult};
use crate::error::{EffectsError, ErrorSeverity};
use crate::extension::ModCallbackData;
use crate::modifier::ModOp;
use crate::scalable::CurveError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvaluateError {
    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error("aggregator {id} depends on itself")]
    Cycle { id: AggregatorId },

    #[error("aggregator {id} no longer exists")]
    Stale { id: AggregatorId },
}

impl EffectsError for EvaluateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Curve(err) => err.severity(),
            Self::Cycle { .. } => ErrorSeverity::Content,
            Self::Stale { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Curve(err) => err.error_code(),
            Self::Cycle { .. } => "EVALUATE_CYCLE",
            Self::Stale { .. } => "EVALUATE_STALE",
        }
    }
}

impl AggregatorArena {
    /// Evaluates `id`, reusing the cached result when nothing changed.
    ///
    /// Curve failures evaluate the failing base as `0.0` and cyclic edges are
    /// skipped, both logged at error level. A freed id yields an invalid
    /// result.
    pub fn evaluate(&mut self, id: AggregatorId) -> EvaluatedResult {
        match self.evaluate_node(id, false) {
            Ok(result) => result,
            Err(err) => {
                warn!(aggregator = %id, %err, "evaluation failed");
                EvaluatedResult::invalid()
            }
        }
    }

    /// Like [`AggregatorArena::evaluate`], but curve failures and cycles are
    /// returned instead of degraded. Only recomputation can fail; a cached
    /// result is returned as is.
    pub fn try_evaluate(&mut self, id: AggregatorId) -> Result<EvaluatedResult, EvaluateError> {
        self.evaluate_node(id, true)
    }

    pub fn magnitude(&mut self, id: AggregatorId) -> f64 {
        self.evaluate(id).magnitude
    }

    fn evaluate_node(&mut self, id: AggregatorId, strict: bool) -> Result<EvaluatedResult, EvaluateError> {
        let node = self.node(id).ok_or(EvaluateError::Stale { id })?;
        let (cached, evaluating) = (node.cache.clone(), node.evaluating);
        if let Some(cached) = cached {
            self.stats.cache_hits += 1;
            return Ok(cached);
        }
        if evaluating {
            return Err(EvaluateError::Cycle { id });
        }

        if let Some(node) = self.node_mut(id) {
            node.evaluating = true;
        }
        let result = self.compute(id, strict);
        if let Some(node) = self.node_mut(id) {
            node.evaluating = false;
            if let Ok(result) = &result {
                node.cache = Some(result.clone());
            }
        }
        result
    }

    fn compute(&mut self, id: AggregatorId, strict: bool) -> Result<EvaluatedResult, EvaluateError> {
        let node = self.node(id).ok_or(EvaluateError::Stale { id })?;
        let base = node.base.clone();
        let level = node.level.level();
        let owner = node.owner;
        let children: [Vec<AggregatorId>; ModOp::COUNT] =
            std::array::from_fn(|index| node.mods[index].iter().map(|m| m.id()).collect());
        self.stats.evaluations += 1;

        let mut magnitude = match base.magnitude.evaluate(level, self.curves.as_ref()) {
            Ok(value) => value,
            Err(err) if strict => return Err(err.into()),
            Err(err) => {
                error!(aggregator = %id, label = %base.label, %err, "curve lookup failed, using 0");
                0.0
            }
        };
        let mut tags = base.tags;

        for &child in &children[ModOp::Override.index()] {
            if let Some(result) = self.child_result(id, child, strict)? {
                magnitude = result.magnitude;
                tags.append(&result.tags);
            }
        }

        let mut sum = 0.0;
        for &child in &children[ModOp::Additive.index()] {
            if let Some(result) = self.child_result(id, child, strict)? {
                sum += result.magnitude;
                tags.append(&result.tags);
            }
        }

        let mut product = 1.0;
        for &child in &children[ModOp::Multiplicative.index()] {
            if let Some(result) = self.child_result(id, child, strict)? {
                product *= result.magnitude;
                tags.append(&result.tags);
            }
        }

        magnitude = (magnitude + sum) * product;

        for &child in &children[ModOp::Custom.index()] {
            if let Some(result) = self.child_result(id, child, strict)? {
                magnitude = self.extensions.transform(&result.callbacks, magnitude, &tags);
                tags.append(&result.tags);
            }
        }

        Ok(EvaluatedResult {
            magnitude,
            tags,
            callbacks: base.callbacks,
            source_handle: owner.handle(),
            valid: true,
        })
    }

    /// Result of one modifier including the tags it passes on. `None` for
    /// freed children and, in lenient mode, for cyclic edges.
    fn child_result(
        &mut self,
        parent: AggregatorId,
        child: AggregatorId,
        strict: bool,
    ) -> Result<Option<EvaluatedResult>, EvaluateError> {
        if !self.contains(child) {
            return Ok(None);
        }
        match self.evaluate_node(child, strict) {
            Ok(mut result) => {
                if let Some(node) = self.node(child) {
                    result.tags.append(&node.base.passed_tags);
                }
                Ok(Some(result))
            }
            Err(EvaluateError::Cycle { .. }) if !strict => {
                error!(aggregator = %parent, dependency = %child, "dependency cycle, skipping edge");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Runs the pre-execute hooks of `id` and of its custom modifiers.
    pub fn pre_execute(&mut self, id: AggregatorId, data: &mut ModCallbackData) {
        let modifier = self.evaluate(id);
        self.extensions.pre_execute(&modifier, data);
        for child in self.custom_children(id) {
            let custom = self.evaluate(child);
            self.extensions.pre_execute(&custom, data);
        }
    }

    /// Runs the post-execute hooks of `id` and of its custom modifiers.
    pub fn post_execute(&mut self, id: AggregatorId, data: &ModCallbackData) {
        let modifier = self.evaluate(id);
        self.extensions.post_execute(&modifier, data);
        for child in self.custom_children(id) {
            let custom = self.evaluate(child);
            self.extensions.post_execute(&custom, data);
        }
    }

    fn custom_children(&self, id: AggregatorId) -> Vec<AggregatorId> {
        self.node(id).map_or_else(Vec::new, |node| {
            node.mods[ModOp::Custom.index()]
                .iter()
                .map(|m| m.id())
                .filter(|child| self.contains(*child))
                .collect()
        })
    }
}
