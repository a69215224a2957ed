use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::BlogConfig;
use crate::error::{AppError, AppResult};

const MAX_NAME_ATTEMPTS: u32 = 1000;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static regex"));

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of persisting an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub file_name: String,
    pub inline: Option<Vec<u8>>,
}

/// Validates, names and writes post images into the content folder.
#[derive(Debug, Clone)]
pub struct ImageStore {
    folder: PathBuf,
    url_prefix: String,
    allowed_extensions: HashSet<String>,
    inline: bool,
}

impl ImageStore {
    pub fn new(
        folder: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
        allowed_extensions: impl IntoIterator<Item = String>,
        inline: bool,
    ) -> Self {
        Self {
            folder: folder.into(),
            url_prefix: url_prefix.into(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            inline,
        }
    }

    pub fn from_config(config: &BlogConfig) -> Self {
        Self::new(
            &config.images_folder,
            config.images_prefix.clone(),
            config.allowed_extensions.iter().cloned(),
            config.inline_images,
        )
    }

    pub fn folder(&self) -> &PathBuf {
        &self.folder
    }

    pub fn is_allowed(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => self.allowed_extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }

    /// Check an upload without touching the filesystem.
    pub fn validate(&self, upload: &ImageUpload) -> AppResult<()> {
        if upload.file_name.trim().is_empty() {
            return Err(AppError::Validation("No selected file.".to_string()));
        }
        if !self.is_allowed(&upload.file_name) {
            return Err(AppError::Validation(format!(
                "File type of '{}' is not allowed.",
                upload.file_name
            )));
        }
        if secure_filename(&upload.file_name).is_empty() {
            return Err(AppError::Validation(format!(
                "Invalid file name '{}'.",
                upload.file_name
            )));
        }
        Ok(())
    }

    /// Write the upload under a timestamped name and optionally read the
    /// stored bytes back for inline storage. Existing files are never
    /// replaced: a taken name gets a `_<n>` counter after the timestamp.
    pub async fn save(&self, upload: &ImageUpload) -> AppResult<StoredImage> {
        self.validate(upload)?;

        tokio::fs::create_dir_all(&self.folder).await?;
        let unix_seconds = chrono::Utc::now().timestamp();
        let (file_name, path) = self
            .write_new_file(&upload.file_name, unix_seconds, &upload.bytes)
            .await?;
        info!("Stored post image {} ({} bytes)", path.display(), upload.bytes.len());

        let inline = if self.inline {
            debug!("Reading back {} for inline storage", file_name);
            Some(tokio::fs::read(&path).await?)
        } else {
            None
        };

        Ok(StoredImage { file_name, inline })
    }

    async fn write_new_file(
        &self,
        name: &str,
        unix_seconds: i64,
        bytes: &[u8],
    ) -> AppResult<(String, PathBuf)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = numbered_name(name, unix_seconds, attempt);
            let path = self.folder.join(&file_name);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match opened {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    return Ok((file_name, path));
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} is taken, trying the next name", file_name);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(AppError::Internal(format!(
            "No free file name left for '{}'",
            name
        )))
    }

    /// Delete a previously stored image. Missing files and names that are
    /// not plain file names are ignored.
    pub async fn remove(&self, file_name: &str) -> AppResult<()> {
        if file_name.is_empty() || secure_filename(file_name) != file_name {
            warn!("Refusing to remove image with unsafe name {:?}", file_name);
            return Ok(());
        }
        match tokio::fs::remove_file(self.folder.join(file_name)).await {
            Ok(()) => {
                info!("Removed post image {}", file_name);
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("/{}/{}", self.url_prefix.trim_matches('/'), file_name)
    }
}

/// Reduce a client supplied name to a safe ASCII file name: path separators
/// become spaces, whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_.-]` is removed and leading/trailing `.`/`_` are stripped.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    UNSAFE_FILENAME_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

/// Insert `_<unix seconds>` before the extension of the sanitized name.
pub fn timestamped_name(name: &str, unix_seconds: i64) -> String {
    numbered_name(name, unix_seconds, 0)
}

/// `timestamped_name` with a `_<attempt>` counter once the first pick is taken.
fn numbered_name(name: &str, unix_seconds: i64, attempt: u32) -> String {
    let safe = secure_filename(name);
    let suffix = match attempt {
        0 => unix_seconds.to_string(),
        n => format!("{}_{}", unix_seconds, n),
    };
    match safe.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", safe, suffix),
    }
}
