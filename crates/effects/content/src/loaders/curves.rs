//! Curve table loader.

use std::path::Path;

use effects_core::CurveRegistry;

use crate::loaders::{LoadResult, read_file};

/// Loader for curve tables from RON files.
///
/// RON format: `{ table: { row: [(level: f64, value: f64), ...] } }`.
pub struct CurveLoader;

impl CurveLoader {
    pub fn load(path: &Path) -> LoadResult<CurveRegistry> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parses a registry and rejects rows without keys.
    pub fn parse(content: &str) -> LoadResult<CurveRegistry> {
        let registry: CurveRegistry = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse curve tables RON: {}", e))?;

        for (table_name, table) in registry.tables() {
            for (row_name, curve) in table.rows() {
                if curve.keys().is_empty() {
                    anyhow::bail!("Curve '{}' in table '{}' has no keys", row_name, table_name);
                }
            }
        }
        Ok(registry)
    }
}
