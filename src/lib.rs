pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::effort::{
    after_block_delete, after_block_update, create_block, update_assignment_settings,
    AssignmentSettingsUpdate, BlockUpdate, NewBlockRequest,
};
pub use application::preview_builder::PreviewStateBuilder;
pub use domain::models::{
    Assignment, PlanSettings, PreviewState, WorkBlock, DEFAULT_BLOCK_DURATION_MINUTES,
    DEFAULT_START_TIME, MAX_BLOCK_MINUTES, MIN_BLOCK_MINUTES,
};
pub use infrastructure::error::PlanError;
pub use infrastructure::event_extract::{
    extract_assignments, extract_engine_blocks, EngineBlock, SourceAssignment,
};
pub use infrastructure::ics_generator::generate_ics;
pub use infrastructure::ics_parser::{parse_events, ParsedEvent};
