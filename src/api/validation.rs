use std::path::Path;

use validator::ValidationError;

use crate::schemas::submission::UploadedFile;

pub(crate) const ALLOWED_EXTENSIONS: &[&str] = &["pdf"];
pub(crate) const MAX_FILENAME_CHARS: usize = 100;

/// Accepts an upload only when its name ends in `.pdf` (any case). The
/// content itself is not inspected beyond being non-empty.
pub(crate) fn validate_pdf_upload(file: &UploadedFile) -> Result<(), ValidationError> {
    if file.file_name.trim().is_empty() {
        return Err(ValidationError::new("invalid").with_message("No file was submitted.".into()));
    }

    let name_chars = file.file_name.chars().count();
    if name_chars > MAX_FILENAME_CHARS {
        let mut err = ValidationError::new("max_length").with_message(
            format!(
                "Ensure this filename has at most {MAX_FILENAME_CHARS} characters (it has {name_chars})."
            )
            .into(),
        );
        err.add_param("max".into(), &MAX_FILENAME_CHARS);
        err.add_param("length".into(), &name_chars);
        return Err(err);
    }

    if file.bytes.is_empty() {
        return Err(
            ValidationError::new("empty").with_message("The submitted file is empty.".into())
        );
    }

    let extension = Path::new(&file.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ValidationError::new("invalid")
            .with_message("Unsupported file type. Only PDF files are allowed.".into())),
    }
}
