use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("assignment not found: {0}")]
    AssignmentNotFound(String),
}
