//! Stored uploads.
//!
//! Files keep a sanitized version of their original base name followed by a
//! timestamp and a random number, so repeated uploads of the same file do not
//! collide. There is no deduplication, size limit or expiry.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub original_name: String,
    pub stored_name: String,
    pub path: String,
}

/// Build the stored name: `<sanitized stem>-<millis>-<random><ext>`.
///
/// Characters outside `[A-Za-z0-9_-]` in the stem become `-`; the
/// extension is everything from the last dot of the base name.
pub fn stored_file_name(original: &str, millis: i64, random: u32) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let (stem, ext) = match base.rfind('.') {
        Some(i) if i > 0 => base.split_at(i),
        _ => (base, ""),
    };
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{stem}-{millis}-{random}{ext}")
}

fn random_suffix() -> u32 {
    (Uuid::new_v4().as_u128() % 1_000_000_000) as u32
}

#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create upload dir {}", self.root.display()))
    }

    pub fn store(&self, original_name: &str, bytes: &[u8]) -> Result<UploadedFile> {
        self.ensure()?;
        let stored_name =
            stored_file_name(original_name, Utc::now().timestamp_millis(), random_suffix());
        let target = self.root.join(&stored_name);
        fs::write(&target, bytes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        tracing::info!(
            "Stored upload {} as {} ({} bytes)",
            original_name,
            stored_name,
            bytes.len()
        );

        Ok(UploadedFile {
            original_name: original_name.to_string(),
            path: format!("{}/{}", PUBLIC_PREFIX, stored_name),
            stored_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn spaces_become_dashes() {
        assert_eq!(
            stored_file_name("my report.pdf", 1700000000000, 42),
            "my-report-1700000000000-42.pdf"
        );
    }

    #[test]
    fn only_last_extension_is_kept_verbatim() {
        assert_eq!(
            stored_file_name("build.v2.tar.gz", 1, 2),
            "build-v2-tar-1-2.gz"
        );
    }

    #[test]
    fn directories_are_stripped() {
        assert_eq!(stored_file_name("../../etc/passwd", 1, 2), "passwd-1-2");
        assert_eq!(stored_file_name("C:\\docs\\plan.txt", 1, 2), "plan-1-2.txt");
    }

    #[test]
    fn dotfiles_have_no_extension() {
        assert_eq!(stored_file_name(".env", 5, 6), "-env-5-6");
    }

    #[test]
    fn store_writes_file_and_reports_public_path() {
        let dir = TempDir::new().unwrap();
        let uploads = UploadDir::new(dir.path().join("uploads"));

        let stored = uploads.store("schema (final).svg", b"<svg/>").unwrap();

        assert_eq!(stored.original_name, "schema (final).svg");
        assert!(stored.stored_name.starts_with("schema--final--"));
        assert!(stored.stored_name.ends_with(".svg"));
        assert_eq!(stored.path, format!("/uploads/{}", stored.stored_name));
        let written = fs::read(uploads.path().join(&stored.stored_name)).unwrap();
        assert_eq!(written, b"<svg/>");
    }
}
