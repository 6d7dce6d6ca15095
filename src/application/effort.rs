use crate::domain::models::{
    PreviewState, WorkBlock, DEFAULT_BLOCK_DURATION_MINUTES, MAX_BLOCK_MINUTES, MIN_BLOCK_MINUTES,
};
use crate::infrastructure::error::PlanError;
use serde::Deserialize;

const CREATED_BLOCK_LABEL: &str = "[added]";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct BlockUpdate {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewBlockRequest {
    pub date: String,
    pub start_time: String,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AssignmentSettingsUpdate {
    pub allow_work_on_due_date: Option<bool>,
}

// Any direct edit anchors the block: the user has taken manual control
// of its timing and size. The rest of the assignment's blocks are then
// rebalanced against the original baseline.
pub fn after_block_update(
    state: &PreviewState,
    block_id: &str,
    update: &BlockUpdate,
) -> PreviewState {
    let mut next = state.clone();

    let Some(position) = next.work_blocks.iter().position(|block| block.id == block_id) else {
        return next;
    };

    {
        let block = &mut next.work_blocks[position];
        if let Some(date) = &update.date {
            block.date = date.clone();
        }
        if let Some(start_time) = &update.start_time {
            block.start_time = start_time.clone();
        }
        if let Some(duration) = update.duration_minutes {
            block.duration_minutes = clamp_duration(duration);
        }
        block.is_anchored = true;
    }

    let assignment_id = next.work_blocks[position].assignment_id.clone();
    redistribute_for_assignment(&mut next.work_blocks, &assignment_id);
    next.recalculate_assignment_effort();

    next
}

// The deleted block's effort moves to its flexible siblings; with no
// sibling left to absorb it, the effort is dropped.
pub fn after_block_delete(state: &PreviewState, block_id: &str) -> PreviewState {
    let mut next = state.clone();

    let Some(position) = next.work_blocks.iter().position(|block| block.id == block_id) else {
        return next;
    };
    let deleted = next.work_blocks.remove(position);

    let flexible: Vec<usize> = next
        .work_blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| {
            block.assignment_id == deleted.assignment_id && !block.is_anchored
        })
        .map(|(index, _)| index)
        .collect();

    if flexible.is_empty() {
        tracing::warn!(
            block_id = %deleted.id,
            assignment_id = %deleted.assignment_id,
            dropped_minutes = deleted.duration_minutes,
            "no flexible blocks left to absorb freed effort"
        );
    } else {
        let share = deleted.duration_minutes / flexible.len() as u32;
        let remainder = deleted.duration_minutes % flexible.len() as u32;
        for (position, &index) in flexible.iter().enumerate() {
            let extra = share + if position == 0 { remainder } else { 0 };
            let block = &mut next.work_blocks[index];
            block.duration_minutes = clamp_duration(block.duration_minutes + extra);
        }
    }

    next.recalculate_assignment_effort();
    next
}

pub fn create_block(
    state: &PreviewState,
    assignment_id: &str,
    request: &NewBlockRequest,
) -> Result<PreviewState, PlanError> {
    let mut next = state.clone();

    if next.find_assignment(assignment_id).is_none() {
        return Err(PlanError::AssignmentNotFound(assignment_id.to_string()));
    }

    let duration = clamp_duration(
        request
            .duration_minutes
            .unwrap_or(DEFAULT_BLOCK_DURATION_MINUTES),
    );
    next.work_blocks.push(WorkBlock {
        id: next.next_block_id(),
        assignment_id: assignment_id.to_string(),
        date: request.date.clone(),
        start_time: request.start_time.clone(),
        duration_minutes: duration,
        label: CREATED_BLOCK_LABEL.to_string(),
        is_anchored: true,
        original_duration_minutes: duration,
    });

    // Created blocks add new effort rather than reallocating existing
    // effort, so no redistribution here.
    next.recalculate_assignment_effort();
    Ok(next)
}

pub fn update_assignment_settings(
    state: &PreviewState,
    assignment_id: &str,
    update: &AssignmentSettingsUpdate,
) -> PreviewState {
    let mut next = state.clone();

    if let Some(assignment) = next
        .assignments
        .iter_mut()
        .find(|assignment| assignment.id == assignment_id)
    {
        if let Some(allow) = update.allow_work_on_due_date {
            assignment.allow_work_on_due_date = allow;
        }
    }

    next
}

// Rebalances one assignment's flexible blocks so the assignment's total
// tracks the baseline fixed at creation time. Anchored durations are
// taken as-is; whatever baseline remains is split across flexible
// blocks, remainder to the first. A baseline fully claimed by anchored
// blocks collapses flexible blocks to the floor instead of growing the
// total.
fn redistribute_for_assignment(blocks: &mut [WorkBlock], assignment_id: &str) {
    let mut target_total = 0u32;
    let mut anchored_total = 0u32;
    let mut flexible: Vec<usize> = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        if block.assignment_id != assignment_id {
            continue;
        }
        target_total += block.original_duration_minutes;
        if block.is_anchored {
            anchored_total += block.duration_minutes;
        } else {
            flexible.push(index);
        }
    }

    if flexible.is_empty() {
        return;
    }

    let remaining = target_total.saturating_sub(anchored_total);
    if remaining == 0 {
        for &index in &flexible {
            blocks[index].duration_minutes = MIN_BLOCK_MINUTES;
        }
        return;
    }

    let share = remaining / flexible.len() as u32;
    let remainder = remaining % flexible.len() as u32;
    for (position, &index) in flexible.iter().enumerate() {
        let duration = share + if position == 0 { remainder } else { 0 };
        blocks[index].duration_minutes = clamp_duration(duration);
    }
}

fn clamp_duration(minutes: u32) -> u32 {
    minutes.clamp(MIN_BLOCK_MINUTES, MAX_BLOCK_MINUTES)
}
