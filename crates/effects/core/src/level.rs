use std::cell::Cell;
use std::rc::Rc;

use crate::config::EffectsConfig;

/// Level shared by a spec and every aggregator built for it.
///
/// Curve-driven magnitudes sample their curve at this level. Changing it goes
/// through [`crate::AggregatorArena::set_level`] so bound aggregators are
/// invalidated.
#[derive(Debug)]
pub struct LevelSpec {
    level: Cell<f64>,
}

pub type SharedLevel = Rc<LevelSpec>;

impl LevelSpec {
    pub fn new(level: f64) -> SharedLevel {
        Rc::new(Self {
            level: Cell::new(level),
        })
    }

    /// A level that curve lookups cannot use.
    pub fn invalid() -> SharedLevel {
        Self::new(EffectsConfig::INVALID_LEVEL)
    }

    pub fn is_valid(&self) -> bool {
        self.level.get() != EffectsConfig::INVALID_LEVEL
    }

    pub fn level(&self) -> Option<f64> {
        self.is_valid().then(|| self.level.get())
    }

    /// Detached copy frozen at the current level.
    pub fn snapshot(&self) -> SharedLevel {
        Self::new(self.level.get())
    }

    pub(crate) fn set(&self, level: f64) {
        self.level.set(level);
    }
}
