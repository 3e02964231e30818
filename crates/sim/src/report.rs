//! Serializable outcome of a scenario run.
use std::collections::BTreeMap;

use effects_core::AggregatorStats;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scenario: String,
    pub seed: u64,
    pub snapshots: Vec<Snapshot>,
    pub log: Vec<Event>,
    pub stats: AggregatorStats,
    /// Nodes still allocated after every target was released.
    pub leaked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub note: String,
    pub time: f64,
    pub targets: Vec<TargetState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetState {
    pub name: String,
    pub attributes: BTreeMap<String, f64>,
    pub active_effects: Vec<ActiveState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveState {
    pub handle: i32,
    pub effect: String,
    /// `None` for effects without an end.
    pub expires_at: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Applied {
        step: usize,
        target: String,
        effect: String,
        handle: Option<i32>,
    },
    Ticked {
        step: usize,
        time: f64,
        executions: u32,
        expired: Vec<i32>,
    },
    Removed {
        step: usize,
        label: String,
        was_active: bool,
    },
}
