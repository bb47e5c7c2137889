//! Nozzle tool pool and the descending working list derived from it.

use std::collections::BTreeMap;

use crate::config::{round_to, DEFAULT_DIAMETER_DECIMALS};
use crate::error::{PlanError, ToolTableError};

/// Identifier of a nozzle tool.
pub type ToolId = u32;

/// One entry of the planner's working list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingTool {
    /// Representative tool id for this diameter.
    pub id: ToolId,
    /// Diameter rounded to the configured precision.
    pub diameter: f64,
}

impl WorkingTool {
    /// Half the diameter: the clearance kept from the pad edge.
    pub fn offset(&self) -> f64 {
        self.diameter / 2.0
    }
}

/// Builds the working list: distinct positive diameters, largest first.
///
/// Ids are visited in ascending order, so the lowest id wins when two tools
/// round to the same diameter. Non-finite and non-positive diameters are
/// dropped.
pub fn working_tools(tools: &BTreeMap<ToolId, f64>, decimals: u32) -> Vec<WorkingTool> {
    let mut seen: Vec<i64> = Vec::new();
    let mut list = Vec::new();

    for (&id, &raw) in tools {
        if !raw.is_finite() {
            continue;
        }
        let diameter = round_to(raw, decimals);
        if diameter <= 0.0 {
            continue;
        }
        let key = diameter_key(diameter, decimals);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        list.push(WorkingTool { id, diameter });
    }

    list.sort_by(|a, b| b.diameter.total_cmp(&a.diameter));
    list
}

#[allow(clippy::cast_possible_truncation)]
fn diameter_key(diameter: f64, decimals: u32) -> i64 {
    let scale = 10_f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    (diameter * scale).round() as i64
}

/// The nozzle tool table: ids mapped to diameters, no duplicate diameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NozzleTable {
    tools: BTreeMap<ToolId, f64>,
}

impl NozzleTable {
    /// Creates an empty table.
    pub const fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Builds a table from a comma-separated diameter list such as `"1.0, 0.5"`.
    ///
    /// Ids are assigned from 1 in list order.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidToolList`] when an entry is not a number or
    /// the list contains no entries.
    pub fn from_defaults(list: &str) -> Result<Self, PlanError> {
        let mut table = Self::new();
        let mut next_id: ToolId = 1;

        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let diameter: f64 = entry.parse().map_err(|_| {
                PlanError::InvalidToolList(format!("`{entry}` is not a nozzle diameter"))
            })?;
            table
                .tools
                .insert(next_id, round_to(diameter, DEFAULT_DIAMETER_DECIMALS));
            next_id = next_id.saturating_add(1);
        }

        if table.tools.is_empty() {
            return Err(PlanError::InvalidToolList(
                "at least one nozzle diameter is needed".to_string(),
            ));
        }

        Ok(table)
    }

    /// Adds a nozzle and returns its id (highest existing id + 1).
    ///
    /// # Errors
    ///
    /// Rejects non-finite or zero diameters and diameters already in the table.
    pub fn add(&mut self, diameter: f64) -> Result<ToolId, ToolTableError> {
        let diameter = self.check_new_diameter(diameter, None)?;
        let id = self
            .tools
            .keys()
            .next_back()
            .map_or(1, |max| max.saturating_add(1));
        self.tools.insert(id, diameter);
        Ok(id)
    }

    /// Changes the diameter of an existing nozzle.
    ///
    /// # Errors
    ///
    /// Rejects unknown ids, non-finite or zero diameters, and diameters held by
    /// another nozzle.
    pub fn edit(&mut self, id: ToolId, diameter: f64) -> Result<(), ToolTableError> {
        if !self.tools.contains_key(&id) {
            return Err(ToolTableError::UnknownTool(id));
        }
        let diameter = self.check_new_diameter(diameter, Some(id))?;
        self.tools.insert(id, diameter);
        Ok(())
    }

    /// Removes the given nozzles and returns how many were present.
    pub fn remove(&mut self, ids: &[ToolId]) -> usize {
        ids.iter()
            .filter(|id| self.tools.remove(id).is_some())
            .count()
    }

    /// Removes every nozzle.
    pub fn clear(&mut self) {
        self.tools.clear();
    }

    /// Diameter of a nozzle.
    pub fn get(&self, id: ToolId) -> Option<f64> {
        self.tools.get(&id).copied()
    }

    /// Number of nozzles.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when the table holds no nozzle.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Id to diameter mapping, as consumed by the planner.
    pub const fn diameters(&self) -> &BTreeMap<ToolId, f64> {
        &self.tools
    }

    fn check_new_diameter(
        &self,
        diameter: f64,
        editing: Option<ToolId>,
    ) -> Result<f64, ToolTableError> {
        if !diameter.is_finite() {
            return Err(ToolTableError::NonFiniteDiameter);
        }
        let rounded = round_to(diameter, DEFAULT_DIAMETER_DECIMALS);
        if rounded.abs() < f64::EPSILON {
            return Err(ToolTableError::ZeroDiameter);
        }

        let key = diameter_key(rounded, DEFAULT_DIAMETER_DECIMALS);
        let taken = self.tools.iter().any(|(&id, &existing)| {
            Some(id) != editing && diameter_key(existing, DEFAULT_DIAMETER_DECIMALS) == key
        });
        if taken {
            return Err(ToolTableError::Duplicate(rounded));
        }

        Ok(rounded)
    }
}

impl FromIterator<(ToolId, f64)> for NozzleTable {
    fn from_iter<I: IntoIterator<Item = (ToolId, f64)>>(iter: I) -> Self {
        Self {
            tools: iter.into_iter().collect(),
        }
    }
}
