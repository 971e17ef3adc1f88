use time::PrimitiveDateTime;

pub(crate) const COLUMNS: &str = "id, student_name, uploaded_file, submitted_at, status, task_id";

pub(crate) struct NewSubmission<'a> {
    pub(crate) student_name: &'a str,
    pub(crate) uploaded_file: &'a str,
    pub(crate) submitted_at: PrimitiveDateTime,
}
