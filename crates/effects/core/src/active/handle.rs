use std::fmt;

/// Stable address of one applied effect instance.
///
/// Handles increase monotonically per container and are never reused, so a
/// stale handle simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ActiveEffectHandle(i32);

impl ActiveEffectHandle {
    pub const INVALID: Self = Self(-1);

    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> i32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    /// Next handle in sequence, `None` once the counter is exhausted.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl Default for ActiveEffectHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for ActiveEffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "effect#{}", self.0)
        } else {
            f.write_str("effect#invalid")
        }
    }
}

/// Handle qualified by the container that issued it.
///
/// Handles repeat across containers, so aggregators record the pair to tell
/// which effect they belong to. [`EffectOwner::NONE`] marks aggregators no
/// removal can detach: executed leaves and snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectOwner {
    container: u32,
    handle: ActiveEffectHandle,
}

impl EffectOwner {
    pub const NONE: Self = Self {
        container: u32::MAX,
        handle: ActiveEffectHandle::INVALID,
    };

    pub const fn new(container: u32, handle: ActiveEffectHandle) -> Self {
        Self { container, handle }
    }

    pub const fn container(self) -> u32 {
        self.container
    }

    pub const fn handle(self) -> ActiveEffectHandle {
        self.handle
    }

    pub const fn is_none(self) -> bool {
        !self.handle.is_valid()
    }
}

impl Default for EffectOwner {
    fn default() -> Self {
        Self::NONE
    }
}
