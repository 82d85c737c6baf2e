use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("prerequisite cycle between: {}", ids.join(", "))]
    CycleDetected { ids: Vec<String> },
    #[error("`{first}` and `{second}` both occupy column {column}, lane {lane}")]
    Conflict {
        column: usize,
        lane: usize,
        first: String,
        second: String,
    },
    #[error("no free lane for `{id}` within {cap} rows of lane {start}")]
    BumpLimit { id: String, start: usize, cap: usize },
    #[error("`{id}` was never assigned a lane")]
    Unplaced { id: String },
}

impl LayoutError {
    /// Conflicts are internal faults rather than bad input.
    pub fn is_internal(&self) -> bool {
        !matches!(self, LayoutError::CycleDetected { .. })
    }
}
