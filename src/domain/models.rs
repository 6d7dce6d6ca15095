use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const MIN_BLOCK_MINUTES: u32 = 15;
pub const MAX_BLOCK_MINUTES: u32 = 240;
pub const DEFAULT_BLOCK_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_START_TIME: &str = "09:00";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub id: String,
    pub title: String,
    pub course: String,
    pub due_date: String,
    pub total_effort_minutes: u32,
    pub allow_work_on_due_date: bool,
    pub source_url: Option<String>,
    pub description: String,
}

impl Assignment {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "assignment.id")?;
        validate_non_empty(&self.title, "assignment.title")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkBlock {
    pub id: String,
    pub assignment_id: String,
    pub date: String,
    pub start_time: String,
    pub duration_minutes: u32,
    pub label: String,
    pub is_anchored: bool,
    pub original_duration_minutes: u32,
}

impl WorkBlock {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "block.id")?;
        validate_non_empty(&self.assignment_id, "block.assignment_id")?;
        validate_date(&self.date, "block.date")?;
        validate_hhmm(&self.start_time, "block.start_time")?;
        if self.duration_minutes < MIN_BLOCK_MINUTES || self.duration_minutes > MAX_BLOCK_MINUTES {
            return Err(format!(
                "block.duration_minutes must be within {MIN_BLOCK_MINUTES}..={MAX_BLOCK_MINUTES}"
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanSettings {
    pub horizon: u32,
    pub soft_cap: u32,
    pub hard_cap: u32,
    pub skip_weekends: bool,
    pub busy_weight: f64,
    pub min_block_minutes: u32,
    pub max_block_minutes: u32,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            horizon: 30,
            soft_cap: 4,
            hard_cap: 5,
            skip_weekends: false,
            busy_weight: 1.0,
            min_block_minutes: MIN_BLOCK_MINUTES,
            max_block_minutes: MAX_BLOCK_MINUTES,
        }
    }
}

impl PlanSettings {
    // Block duration bounds are not caller-tunable; the preview always
    // carries the fixed pair regardless of what was submitted.
    pub fn with_fixed_bounds(&self) -> Self {
        Self {
            min_block_minutes: MIN_BLOCK_MINUTES,
            max_block_minutes: MAX_BLOCK_MINUTES,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewState {
    pub generated_at: DateTime<Utc>,
    pub settings: PlanSettings,
    pub assignments: Vec<Assignment>,
    pub work_blocks: Vec<WorkBlock>,
    pub busy_times: Vec<serde_json::Value>,
}

impl PreviewState {
    pub fn find_assignment(&self, assignment_id: &str) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.id == assignment_id)
    }

    pub fn find_block(&self, block_id: &str) -> Option<&WorkBlock> {
        self.work_blocks.iter().find(|block| block.id == block_id)
    }

    pub fn next_block_id(&self) -> String {
        let highest = self
            .work_blocks
            .iter()
            .filter_map(|block| block.id.strip_prefix("block-"))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("block-{:03}", highest + 1)
    }

    pub fn recalculate_assignment_effort(&mut self) {
        let mut effort_by_assignment: HashMap<&str, u32> = HashMap::new();
        for block in &self.work_blocks {
            *effort_by_assignment
                .entry(block.assignment_id.as_str())
                .or_insert(0) += block.duration_minutes;
        }

        for assignment in &mut self.assignments {
            assignment.total_effort_minutes = effort_by_assignment
                .get(assignment.id.as_str())
                .copied()
                .unwrap_or(0);
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut assignment_ids = HashSet::new();
        for assignment in &self.assignments {
            assignment.validate()?;
            if !assignment_ids.insert(assignment.id.as_str()) {
                return Err(format!("duplicate assignment id {}", assignment.id));
            }
        }

        let mut block_ids = HashSet::new();
        let mut effort_by_assignment: HashMap<&str, u32> = HashMap::new();
        for block in &self.work_blocks {
            block.validate()?;
            if !block_ids.insert(block.id.as_str()) {
                return Err(format!("duplicate block id {}", block.id));
            }
            if !assignment_ids.contains(block.assignment_id.as_str()) {
                return Err(format!(
                    "block {} references unknown assignment {}",
                    block.id, block.assignment_id
                ));
            }
            *effort_by_assignment
                .entry(block.assignment_id.as_str())
                .or_insert(0) += block.duration_minutes;
        }

        for assignment in &self.assignments {
            let expected = effort_by_assignment
                .get(assignment.id.as_str())
                .copied()
                .unwrap_or(0);
            if assignment.total_effort_minutes != expected {
                return Err(format!(
                    "assignment {} total_effort_minutes is {} but its blocks sum to {expected}",
                    assignment.id, assignment.total_effort_minutes
                ));
            }
        }

        Ok(())
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    parse_hhmm(value)
        .map(|_| ())
        .ok_or_else(|| format!("{field_name} must be HH:MM"))
}

fn validate_date(value: &str, field_name: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("{field_name} must be YYYY-MM-DD"))?;
    Ok(())
}

pub(crate) fn parse_hhmm(value: &str) -> Option<(u32, u32)> {
    let (hour_str, minute_str) = value.split_once(':')?;
    if minute_str.contains(':') {
        return None;
    }
    let hour = hour_str.parse::<u32>().ok()?;
    let minute = minute_str.parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}
