mod commands;
mod queries;
mod types;

pub(crate) use commands::{attach_task_id, create, transition_status};
pub(crate) use queries::find_by_id;
pub(crate) use types::NewSubmission;
