use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SEPARATOR: &str = "\n\n---\n\n";
const SLUG_LEN: usize = 30;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    pub headline: String,
    pub body: String,
}

impl Article {
    pub fn new(headline: String, completed_sections: &[String]) -> Self {
        Self {
            headline,
            body: synthesize(completed_sections),
        }
    }

    /// Writes the body to `<dir>/<slug>.md`, creating `dir` when missing.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.md", slug(&self.headline)));
        fs::write(&path, &self.body)?;
        info!(path = %path.display(), "article saved");
        Ok(path)
    }
}

pub fn synthesize(completed_sections: &[String]) -> String {
    completed_sections.join(SEPARATOR)
}

/// Headline with spaces as underscores, lowercased, cut to 30 characters.
pub fn slug(headline: &str) -> String {
    headline
        .replace(' ', "_")
        .to_lowercase()
        .chars()
        .take(SLUG_LEN)
        .collect()
}
