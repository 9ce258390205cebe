use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::AppError;

lazy_static! {
    // Names this store hands out: a UUID with an optional short extension.
    static ref STORED_NAME_REGEX: Regex =
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}(\.[a-z0-9]{1,10})?$")
            .unwrap();
}

/// Public path prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Flat directory of uploaded files, each stored under a fresh random name.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saves `bytes` and returns the generated file name. Only the (lowercased,
    /// alphanumeric) extension of `original_name` is kept.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }

        let filename = stored_name(original_name);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&filename), bytes).await?;
        log::info!("stored upload {} ({} bytes)", filename, bytes.len());
        Ok(filename)
    }

    /// Reads back a file previously returned by `save`. Any other name, including
    /// anything that could escape the directory, is `NotFound`.
    pub async fn open(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        if !STORED_NAME_REGEX.is_match(filename) {
            return Err(AppError::NotFound("File not found".into()));
        }
        match tokio::fs::read(self.root.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn public_url(filename: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, filename)
    }
}

fn extension_of(original_name: &str) -> Option<String> {
    let extension = Path::new(original_name).extension()?.to_str()?.to_lowercase();
    let valid = !extension.is_empty()
        && extension.len() <= 10
        && extension.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(extension)
}

fn stored_name(original_name: &str) -> String {
    match extension_of(original_name) {
        Some(extension) => format!("{}.{}", Uuid::new_v4(), extension),
        None => Uuid::new_v4().to_string(),
    }
}

/// Best-effort content type for serving a stored file.
/// Markup that a browser would execute (SVG, HTML) is served as opaque bytes.
pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("txt") | Some("md") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
