use crate::domain::models::{
    Assignment, PlanSettings, PreviewState, WorkBlock, DEFAULT_BLOCK_DURATION_MINUTES,
    DEFAULT_START_TIME,
};
use crate::infrastructure::event_extract::{
    extract_assignments, extract_engine_blocks, EngineBlock, SourceAssignment,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct PreviewStateBuilder {
    now_provider: NowProvider,
}

impl Default for PreviewStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewStateBuilder {
    pub fn new() -> Self {
        Self {
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    // Fuses the source assignment calendar and the engine's work-block
    // calendar into one editable preview. Never fails: unusable input
    // degrades to an empty state.
    pub fn build(
        &self,
        source_ics: &str,
        engine_ics: &str,
        settings: &PlanSettings,
    ) -> PreviewState {
        let source_assignments = extract_assignments(source_ics);
        let engine_blocks = extract_engine_blocks(engine_ics);

        let (assignments, index_by_title) =
            seed_assignments(&source_assignments, &engine_blocks);
        let work_blocks = seed_work_blocks(&engine_blocks, &assignments, &index_by_title);

        let mut state = PreviewState {
            generated_at: (self.now_provider)(),
            settings: settings.with_fixed_bounds(),
            assignments,
            work_blocks,
            busy_times: Vec::new(),
        };
        state.recalculate_assignment_effort();

        tracing::debug!(
            assignments = state.assignments.len(),
            work_blocks = state.work_blocks.len(),
            "built preview state"
        );

        state
    }
}

// One assignment per normalized title across both calendars. Source
// entries win on descriptive fields; engine-only titles get a minimal
// placeholder so every block can resolve its assignment.
fn seed_assignments(
    source_assignments: &[SourceAssignment],
    engine_blocks: &[EngineBlock],
) -> (Vec<Assignment>, HashMap<String, usize>) {
    let mut assignments: Vec<Assignment> = Vec::new();
    let mut index_by_title: HashMap<String, usize> = HashMap::new();

    for entry in source_assignments {
        let key = normalize_title(&entry.title);
        match index_by_title.get(&key).copied() {
            Some(index) => {
                // Duplicate titles in the source feed: latest fields win,
                // the id stays stable.
                let id = assignments[index].id.clone();
                assignments[index] = source_assignment_record(id, entry);
            }
            None => {
                let id = next_assignment_id(assignments.len());
                index_by_title.insert(key, assignments.len());
                assignments.push(source_assignment_record(id, entry));
            }
        }
    }

    for block in engine_blocks {
        let key = normalize_title(&block.assignment_title);
        if index_by_title.contains_key(&key) {
            continue;
        }
        let id = next_assignment_id(assignments.len());
        index_by_title.insert(key, assignments.len());
        assignments.push(Assignment {
            id,
            title: block.assignment_title.clone(),
            course: block.course.clone(),
            due_date: String::new(),
            total_effort_minutes: 0,
            allow_work_on_due_date: true,
            source_url: None,
            description: String::new(),
        });
    }

    (assignments, index_by_title)
}

fn source_assignment_record(id: String, entry: &SourceAssignment) -> Assignment {
    Assignment {
        id,
        title: entry.title.clone(),
        course: entry.course.clone(),
        due_date: entry.due_date.clone(),
        total_effort_minutes: 0,
        allow_work_on_due_date: true,
        source_url: (!entry.url.is_empty()).then(|| entry.url.clone()),
        description: entry.description.clone(),
    }
}

// The engine calendar carries no per-block duration or start time yet;
// every block starts from the fixed defaults until the engine output
// format grows richer.
fn seed_work_blocks(
    engine_blocks: &[EngineBlock],
    assignments: &[Assignment],
    index_by_title: &HashMap<String, usize>,
) -> Vec<WorkBlock> {
    engine_blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            let assignment_id = index_by_title
                .get(&normalize_title(&block.assignment_title))
                .map(|&position| assignments[position].id.clone())
                .unwrap_or_default();

            WorkBlock {
                id: format!("block-{:03}", index + 1),
                assignment_id,
                date: block.date.clone(),
                start_time: DEFAULT_START_TIME.to_string(),
                duration_minutes: DEFAULT_BLOCK_DURATION_MINUTES,
                label: block.label.clone(),
                is_anchored: false,
                original_duration_minutes: DEFAULT_BLOCK_DURATION_MINUTES,
            }
        })
        .collect()
}

fn next_assignment_id(count: usize) -> String {
    format!("assignment-{:03}", count + 1)
}

fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE_ICS: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VEVENT\nUID:canvas-1\nDTSTART;VALUE=DATE:20260126\nSUMMARY:Android CRUD Client [CIS218]\nDESCRIPTION:Build a CRUD client\nURL:https://lms.example.edu/assignments/456\nEND:VEVENT\nBEGIN:VEVENT\nUID:canvas-2\nDTSTART;VALUE=DATE:20260130\nSUMMARY:Essay Assignment [ENG101]\nEND:VEVENT\nEND:VCALENDAR\n";

    const ENGINE_ICS: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VEVENT\nUID:out-1\nDTSTART:20260122\nSUMMARY:[requirements] Android CRUD Client [CIS218]\nEND:VEVENT\nBEGIN:VEVENT\nUID:out-2\nDTSTART:20260123\nSUMMARY:[implementation] Android CRUD Client [CIS218]\nEND:VEVENT\nBEGIN:VEVENT\nUID:out-3\nDTSTART:20260124\nSUMMARY:[research] Lab Report [BIO150]\nEND:VEVENT\nEND:VCALENDAR\n";

    fn fixed_now() -> NowProvider {
        Arc::new(|| {
            DateTime::parse_from_rfc3339("2026-01-21T08:00:00Z")
                .expect("valid datetime")
                .with_timezone(&Utc)
        })
    }

    fn build_sample() -> PreviewState {
        PreviewStateBuilder::new()
            .with_now_provider(fixed_now())
            .build(SOURCE_ICS, ENGINE_ICS, &PlanSettings::default())
    }

    #[test]
    fn seeds_assignments_from_source_calendar_first() {
        let state = build_sample();

        assert_eq!(state.assignments.len(), 3);
        assert_eq!(state.assignments[0].id, "assignment-001");
        assert_eq!(state.assignments[0].title, "Android CRUD Client");
        assert_eq!(state.assignments[0].course, "CIS218");
        assert_eq!(state.assignments[0].due_date, "2026-01-26");
        assert_eq!(
            state.assignments[0].source_url.as_deref(),
            Some("https://lms.example.edu/assignments/456")
        );
        assert_eq!(state.assignments[1].title, "Essay Assignment");
    }

    #[test]
    fn creates_placeholder_assignment_for_engine_only_titles() {
        let state = build_sample();

        let placeholder = &state.assignments[2];
        assert_eq!(placeholder.title, "Lab Report");
        assert_eq!(placeholder.course, "BIO150");
        assert_eq!(placeholder.due_date, "");
        assert_eq!(placeholder.source_url, None);
        assert_eq!(placeholder.description, "");
    }

    #[test]
    fn every_block_resolves_to_an_existing_assignment() {
        let state = build_sample();

        for block in &state.work_blocks {
            assert!(
                state.find_assignment(&block.assignment_id).is_some(),
                "block {} should resolve its assignment",
                block.id
            );
        }
    }

    #[test]
    fn blocks_keep_engine_order_with_sequential_ids_and_defaults() {
        let state = build_sample();

        assert_eq!(state.work_blocks.len(), 3);
        assert_eq!(state.work_blocks[0].id, "block-001");
        assert_eq!(state.work_blocks[1].id, "block-002");
        assert_eq!(state.work_blocks[2].id, "block-003");
        for block in &state.work_blocks {
            assert_eq!(block.start_time, DEFAULT_START_TIME);
            assert_eq!(block.duration_minutes, DEFAULT_BLOCK_DURATION_MINUTES);
            assert_eq!(
                block.original_duration_minutes,
                DEFAULT_BLOCK_DURATION_MINUTES
            );
            assert!(!block.is_anchored);
        }
        assert_eq!(state.work_blocks[0].date, "2026-01-22");
        assert_eq!(state.work_blocks[0].label, "[requirements]");
    }

    #[test]
    fn totals_are_recomputed_from_blocks() {
        let state = build_sample();

        assert_eq!(state.assignments[0].total_effort_minutes, 120);
        assert_eq!(state.assignments[1].total_effort_minutes, 0);
        assert_eq!(state.assignments[2].total_effort_minutes, 60);
    }

    #[test]
    fn titles_match_case_and_whitespace_insensitively() {
        let engine = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:out-1\nDTSTART:20260122\nSUMMARY:[phase] android   crud CLIENT [CIS218]\nEND:VEVENT\nEND:VCALENDAR\n";

        let state = PreviewStateBuilder::new().build(SOURCE_ICS, engine, &PlanSettings::default());

        assert_eq!(state.assignments.len(), 2);
        assert_eq!(state.work_blocks[0].assignment_id, state.assignments[0].id);
        assert_eq!(state.assignments[0].title, "Android CRUD Client");
    }

    #[test]
    fn settings_pass_through_with_pinned_bounds() {
        let settings = PlanSettings {
            horizon: 14,
            soft_cap: 3,
            hard_cap: 6,
            skip_weekends: true,
            busy_weight: 0.5,
            min_block_minutes: 5,
            max_block_minutes: 999,
        };

        let state = PreviewStateBuilder::new().build(SOURCE_ICS, ENGINE_ICS, &settings);

        assert_eq!(state.settings.horizon, 14);
        assert!(state.settings.skip_weekends);
        assert_eq!(state.settings.min_block_minutes, 15);
        assert_eq!(state.settings.max_block_minutes, 240);
    }

    #[test]
    fn empty_inputs_yield_a_valid_empty_state() {
        let state =
            PreviewStateBuilder::new().build("", "not a calendar at all", &PlanSettings::default());

        assert!(state.assignments.is_empty());
        assert!(state.work_blocks.is_empty());
        assert!(state.busy_times.is_empty());
        assert!(state.validate().is_ok());
    }

    #[test]
    fn generated_at_comes_from_the_injected_clock() {
        let state = build_sample();

        assert_eq!(state.generated_at.to_rfc3339(), "2026-01-21T08:00:00+00:00");
    }

    #[test]
    fn duplicate_source_titles_keep_one_entry_with_latest_fields() {
        let source = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:a\nDTSTART;VALUE=DATE:20260126\nSUMMARY:Essay [ENG101]\nEND:VEVENT\nBEGIN:VEVENT\nUID:b\nDTSTART;VALUE=DATE:20260128\nSUMMARY:essay [ENG102]\nEND:VEVENT\nEND:VCALENDAR\n";

        let state = PreviewStateBuilder::new().build(source, "", &PlanSettings::default());

        assert_eq!(state.assignments.len(), 1);
        assert_eq!(state.assignments[0].id, "assignment-001");
        assert_eq!(state.assignments[0].course, "ENG102");
        assert_eq!(state.assignments[0].due_date, "2026-01-28");
    }

    #[test]
    fn normalize_title_collapses_whitespace_and_case() {
        assert_eq!(normalize_title("  Android   CRUD\tClient "), "android crud client");
    }
}
