use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::core::config::Settings;

pub(crate) const UPLOAD_PREFIX: &str = "submissions";
const UNKNOWN_STUDENT_SEGMENT: &str = "unknown-student";
const FALLBACK_FILENAME: &str = "upload";
const MAX_NAME_ATTEMPTS: usize = 100;

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no free file name left for {0}")]
    NameExhausted(String),
}

/// Uploaded files on the local filesystem, laid out as
/// `<media_root>/submissions/<student-segment>/<file-name>`.
#[derive(Debug, Clone)]
pub(crate) struct MediaStorage {
    root: PathBuf,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredFile {
    /// Relative to the media root, always `/`-separated.
    pub(crate) relative_path: String,
    pub(crate) absolute_path: PathBuf,
    pub(crate) size: u64,
    pub(crate) sha256: String,
}

impl MediaStorage {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// A relative `MEDIA_ROOT` is anchored at the current working directory so
    /// paths handed to the worker stay valid regardless of its own cwd.
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        let root = &settings.storage().media_root;
        if root.is_absolute() {
            return Self::new(root.clone());
        }
        match std::env::current_dir() {
            Ok(cwd) => Self::new(cwd.join(root)),
            Err(err) => {
                tracing::warn!(error = %err, "Could not resolve working directory for media root");
                Self::new(root.clone())
            }
        }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn resolve(&self, relative_path: &str) -> PathBuf {
        relative_path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    pub(crate) async fn exists(&self, relative_path: &str) -> bool {
        tokio::fs::try_exists(self.resolve(relative_path)).await.unwrap_or(false)
    }

    /// Writes `bytes` under the student's directory. An existing file is never
    /// overwritten; a random suffix is added to the stem instead.
    pub(crate) async fn save(
        &self,
        student_name: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let directory = format!("{UPLOAD_PREFIX}/{}", student_segment(student_name));
        let absolute_dir = self.resolve(&directory);
        tokio::fs::create_dir_all(&absolute_dir)
            .await
            .map_err(|source| StorageError::Io { path: absolute_dir.clone(), source })?;

        let file_name = sanitized_filename(original_name);
        let mut candidate = file_name.clone();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let absolute_path = absolute_dir.join(&candidate);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&absolute_path)
                .await;

            let mut file = match opened {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    candidate = with_random_suffix(&file_name);
                    continue;
                }
                Err(source) => return Err(StorageError::Io { path: absolute_path, source }),
            };

            file.write_all(bytes)
                .await
                .map_err(|source| StorageError::Io { path: absolute_path.clone(), source })?;
            file.flush()
                .await
                .map_err(|source| StorageError::Io { path: absolute_path.clone(), source })?;

            return Ok(StoredFile {
                relative_path: format!("{directory}/{candidate}"),
                absolute_path,
                size: bytes.len() as u64,
                sha256: hex::encode(Sha256::digest(bytes)),
            });
        }

        Err(StorageError::NameExhausted(format!("{directory}/{file_name}")))
    }

    /// Best-effort removal used when the record for a freshly written file
    /// could not be created.
    pub(crate) async fn discard(&self, relative_path: &str) {
        let path = self.resolve(relative_path);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::warn!(error = %err, path = %path.display(), "Failed to discard stored upload");
        }
    }
}

/// Lowercase, whitespace to hyphens, everything outside `[a-z0-9_-]` dropped.
pub(crate) fn student_segment(student_name: &str) -> String {
    let mut segment = String::with_capacity(student_name.len());
    for c in student_name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' {
            if !segment.is_empty() && !segment.ends_with('-') {
                segment.push('-');
            }
        } else if c.is_ascii_alphanumeric() || c == '_' {
            segment.push(c);
        }
    }

    let segment = segment.trim_end_matches('-');
    if segment.is_empty() {
        UNKNOWN_STUDENT_SEGMENT.to_string()
    } else {
        segment.to_string()
    }
}

/// Keeps only the final path component and strips characters that are unsafe
/// in a file name. Unicode letters and digits survive; the extension is kept
/// even when nothing of the stem does.
pub(crate) fn sanitized_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
    let (stem, extension) = match base.rfind('.') {
        Some(dot) if dot > 0 => (&base[..dot], Some(&base[dot + 1..])),
        _ => (base, None),
    };

    let stem = clean_name_part(stem);
    let stem = stem.trim_start_matches('.');
    let stem = if stem.is_empty() { FALLBACK_FILENAME } else { stem };

    match extension.map(clean_name_part).filter(|ext| !ext.is_empty()) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}

fn clean_name_part(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

fn with_random_suffix(file_name: &str) -> String {
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(7).map(char::from).collect();

    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}_{suffix}{}", &file_name[..dot], &file_name[dot..]),
        _ => format!("{file_name}_{suffix}"),
    }
}
