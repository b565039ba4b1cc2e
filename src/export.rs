//! Plain-text export artifacts for a finished summary.
//!
//! Two artifacts exist per article: `<Title>_Summary.txt`, holding the summary
//! under a short report header, and `<Title>_Raw.txt`, holding the untruncated
//! article body.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// What an artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Generated summary with report header
    Summary,
    /// Untruncated article body
    Raw,
}

impl ExportKind {
    fn suffix(self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::Raw => "Raw",
        }
    }
}

/// A named plain-text file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    kind: ExportKind,
    file_name: String,
    contents: String,
}

impl ExportArtifact {
    /// Builds the summary artifact for `title`.
    pub fn summary(title: &str, summary: &str, model: &str, generated_at: OffsetDateTime) -> Self {
        let timestamp = generated_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            kind: ExportKind::Summary,
            file_name: file_name(title, ExportKind::Summary),
            contents: format!(
                "MEDHA AI REPORT: {title}\nModel: {model}\nGenerated: {timestamp}\n\n{summary}\n"
            ),
        }
    }

    /// Builds the raw article artifact for `title`.
    pub fn raw(title: &str, body: &str) -> Self {
        Self {
            kind: ExportKind::Raw,
            file_name: file_name(title, ExportKind::Raw),
            contents: body.to_string(),
        }
    }

    /// Returns the artifact kind.
    pub fn kind(&self) -> ExportKind {
        self.kind
    }

    /// Returns the file name, e.g. `Rust_Summary.txt`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the file contents.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Writes the artifact into `dir`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)
            .with_context(|| format!("Failed to write export file: {}", path.display()))?;

        Ok(path)
    }
}

/// Returns the directory exports are written to by default.
///
/// Uses the platform download directory, falling back to the current directory.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Builds `<title>_<Kind>.txt`, replacing characters no common file system
/// accepts in a name.
fn file_name(title: &str, kind: ExportKind) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{stem}_{}.txt", kind.suffix())
}
