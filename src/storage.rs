use actix_web::{HttpResponse, http::header, web};
use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::error::AppError;
use tracing::warn;

pub const SELFIE_BUCKET: &str = "employee-selfies";
pub const DOCUMENT_BUCKET: &str = "employee-documents";

const BUCKETS: &[&str] = &[SELFIE_BUCKET, DOCUMENT_BUCKET];

/// Public-read object storage on the local filesystem.
#[derive(Clone)]
pub struct Storage {
    root: PathBuf,
    public_base_url: String,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Writes the object and returns its public URL.
    pub async fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<String> {
        let path = self
            .object_path(bucket, key)
            .with_context(|| format!("Invalid object key {}/{}", bucket, key))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(self.public_url(bucket, key))
    }

    /// Drops an object whose database row never got written.
    pub async fn remove(&self, bucket: &str, key: &str) {
        let Some(path) = self.object_path(bucket, key) else {
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(error = %e, path = %path.display(), "Failed to remove orphaned object");
        }
    }

    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, key)
    }

    /// Resolves a bucket/key pair under the storage root; `None` for anything
    /// that could escape it.
    pub fn object_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        if !BUCKETS.contains(&bucket) || key.is_empty() {
            return None;
        }
        let key_path = Path::new(key);
        let clean = key_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return None;
        }
        Some(self.root.join(bucket).join(key_path))
    }
}

/// Keeps uploaded file names to a safe subset of characters.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.chars().take(100).collect()
    }
}

fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

/// GET /files/{bucket}/{key:.*}
pub async fn serve_file(
    storage: web::Data<Storage>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (bucket, key) = path.into_inner();

    let file_path = storage
        .object_path(&bucket, &key)
        .ok_or_else(|| AppError::not_found("File not found"))?;

    let bytes = match tokio::fs::read(&file_path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::not_found("File not found"));
        }
        Err(e) => {
            tracing::error!(error = %e, path = %file_path.display(), "Failed to read stored file");
            return Err(AppError::Internal(e.to_string()));
        }
    };

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type_for(&file_path)))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> Storage {
        Storage::new("/srv/vtc-storage", "http://localhost:8080/files/")
    }

    #[test]
    fn public_urls_join_bucket_and_key() {
        assert_eq!(
            storage().public_url(SELFIE_BUCKET, "attendance-selfies/7/1700000000000.png"),
            "http://localhost:8080/files/employee-selfies/attendance-selfies/7/1700000000000.png"
        );
    }

    #[test]
    fn object_paths_stay_inside_the_root() {
        let s = storage();
        assert_eq!(
            s.object_path(DOCUMENT_BUCKET, "leave-docs/1-note.pdf"),
            Some(PathBuf::from("/srv/vtc-storage/employee-documents/leave-docs/1-note.pdf"))
        );
        assert_eq!(s.object_path(DOCUMENT_BUCKET, "../secrets"), None);
        assert_eq!(s.object_path(DOCUMENT_BUCKET, "/etc/passwd"), None);
        assert_eq!(s.object_path("other-bucket", "a.png"), None);
        assert_eq!(s.object_path(SELFIE_BUCKET, ""), None);
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("medical note (1).pdf"), "medical_note__1_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\scan.png"), "scan.png");
        assert_eq!(sanitize_file_name("..."), "document");
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("a/b.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("a/b.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a/b.pdf")), "application/pdf");
        assert_eq!(content_type_for(Path::new("a/b")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("a/b.unknownext")), "application/octet-stream");
    }

    #[actix_web::test]
    async fn put_writes_under_the_bucket() {
        let root = std::env::temp_dir().join(format!("vtc-storage-{}", uuid::Uuid::new_v4()));
        let s = Storage::new(&root, "http://files.test");

        let url = s.put(SELFIE_BUCKET, "attendance-selfies/7/1.png", b"img").await.unwrap();
        assert_eq!(url, "http://files.test/employee-selfies/attendance-selfies/7/1.png");

        let written = std::fs::read(root.join(SELFIE_BUCKET).join("attendance-selfies/7/1.png")).unwrap();
        assert_eq!(written, b"img");

        s.remove(SELFIE_BUCKET, "attendance-selfies/7/1.png").await;
        assert!(!root.join(SELFIE_BUCKET).join("attendance-selfies/7/1.png").exists());
        // already gone: logged, not an error
        s.remove(SELFIE_BUCKET, "attendance-selfies/7/1.png").await;

        let _ = std::fs::remove_dir_all(&root);
    }
}
