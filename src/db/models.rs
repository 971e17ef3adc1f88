use std::path::Path;

use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::SubmissionStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct Submission {
    pub(crate) id: i64,
    pub(crate) student_name: String,
    /// Path of the stored upload, relative to the media root.
    pub(crate) uploaded_file: String,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) status: SubmissionStatus,
    pub(crate) task_id: Option<String>,
}

impl Submission {
    pub(crate) fn file_name(&self) -> Option<&str> {
        Path::new(&self.uploaded_file).file_name().and_then(|name| name.to_str())
    }
}
