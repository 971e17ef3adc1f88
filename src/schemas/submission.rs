use std::collections::BTreeMap;

use serde::Serialize;
use validator::{Validate, ValidationErrors};

use crate::api::validation::validate_pdf_upload;
use crate::core::time::format_primitive;
use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

/// A file part received in the submission form.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UploadedFile {
    pub(crate) file_name: String,
    pub(crate) content_type: Option<String>,
    #[serde(skip_serializing)]
    pub(crate) bytes: Vec<u8>,
}

#[derive(Debug, Default, Validate)]
pub(crate) struct SubmissionForm {
    #[validate(
        required(message = "This field is required."),
        length(
            max = 100,
            code = "max_length",
            message = "Ensure this value has at most 100 characters."
        )
    )]
    pub(crate) student_name: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub(crate) uploaded_file: Option<UploadedFile>,
}

/// A form that passed every field check.
#[derive(Debug)]
pub(crate) struct ValidSubmission {
    pub(crate) student_name: String,
    pub(crate) uploaded_file: UploadedFile,
}

impl SubmissionForm {
    /// Runs the field validators and the upload validator, collecting every
    /// failure instead of stopping at the first one.
    pub(crate) fn into_valid(self) -> Result<ValidSubmission, ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let Some(file) = &self.uploaded_file {
            if let Err(err) = validate_pdf_upload(file) {
                errors.add("uploaded_file", err);
            }
        }

        match (errors.is_empty(), self.student_name, self.uploaded_file) {
            (true, Some(student_name), Some(uploaded_file)) => {
                Ok(ValidSubmission { student_name, uploaded_file })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct FieldError {
    pub(crate) message: String,
    pub(crate) code: String,
}

pub(crate) type FieldErrors = BTreeMap<String, Vec<FieldError>>;

pub(crate) fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let errs = errs
                .iter()
                .map(|err| FieldError {
                    message: err
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                    code: err.code.to_string(),
                })
                .collect();
            (field.to_string(), errs)
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) status: &'static str,
    pub(crate) message: String,
    pub(crate) submission_id: i64,
    pub(crate) task_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SubmissionStatusResponse {
    pub(crate) id: i64,
    pub(crate) student_name: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) file_name: Option<String>,
    pub(crate) submitted_at: String,
}

impl From<&Submission> for SubmissionStatusResponse {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id,
            student_name: submission.student_name.clone(),
            status: submission.status,
            file_name: submission.file_name().map(str::to_string),
            submitted_at: format_primitive(submission.submitted_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[test]
    fn valid_form_passes() {
        let form = SubmissionForm {
            student_name: Some("Jane Doe".to_string()),
            uploaded_file: Some(pdf("essay.pdf")),
        };

        let valid = form.into_valid().expect("valid form");
        assert_eq!(valid.student_name, "Jane Doe");
        assert_eq!(valid.uploaded_file.file_name, "essay.pdf");
    }

    #[test]
    fn missing_fields_are_reported_per_field() {
        let errors = SubmissionForm::default().into_valid().unwrap_err();
        let errors = field_errors(&errors);

        assert_eq!(errors["student_name"][0].message, "This field is required.");
        assert_eq!(errors["student_name"][0].code, "required");
        assert_eq!(errors["uploaded_file"][0].message, "This field is required.");
    }

    #[test]
    fn long_name_and_bad_extension_are_both_reported() {
        let form = SubmissionForm {
            student_name: Some("x".repeat(101)),
            uploaded_file: Some(pdf("essay.docx")),
        };

        let errors = field_errors(&form.into_valid().unwrap_err());
        assert_eq!(errors["student_name"][0].code, "max_length");
        assert_eq!(
            errors["uploaded_file"][0].message,
            "Unsupported file type. Only PDF files are allowed."
        );
    }

    #[test]
    fn name_of_exactly_max_length_is_accepted() {
        let form = SubmissionForm {
            student_name: Some("x".repeat(100)),
            uploaded_file: Some(pdf("essay.pdf")),
        };
        assert!(form.into_valid().is_ok());
    }
}
