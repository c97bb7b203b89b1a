//! Plain-text multi-file archives.
//!
//! An archive is an optional leading comment followed by files, each
//! introduced by a marker line:
//!
//! ```text
//! optional comment
//! -- main.go --
//! package main
//! -- go.mod --
//! module demo
//! ```

use std::path::{Component, Path};

use crate::error::StartError;

/// One file of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub name: String,
    pub data: String,
}

/// Parsed archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    /// Text before the first marker.
    pub comment: String,
    pub files: Vec<ArchiveFile>,
}

fn marker_name(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    let name = line.strip_prefix("-- ")?.strip_suffix(" --")?.trim();
    (!name.is_empty()).then_some(name)
}

fn terminate(data: &mut String) {
    if !data.is_empty() && !data.ends_with('\n') {
        data.push('\n');
    }
}

impl Archive {
    /// Parse archive text. Never fails: text without markers is all comment.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut archive = Self::default();
        let mut current: Option<ArchiveFile> = None;

        for line in text.split_inclusive('\n') {
            if let Some(name) = marker_name(line) {
                archive.files.extend(current.take());
                current = Some(ArchiveFile {
                    name: name.to_string(),
                    data: String::new(),
                });
                continue;
            }
            match &mut current {
                Some(file) => file.data.push_str(line),
                None => archive.comment.push_str(line),
            }
        }
        archive.files.extend(current);

        terminate(&mut archive.comment);
        for file in &mut archive.files {
            terminate(&mut file.data);
        }
        archive
    }

    /// Turn a non-blank comment into a file called `name`.
    pub fn promote_comment(&mut self, name: &str) {
        if self.comment.trim().is_empty() {
            return;
        }
        let data = std::mem::take(&mut self.comment);
        self.files.push(ArchiveFile {
            name: name.to_string(),
            data,
        });
    }

    /// Whether a file called `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    /// Whether any Go source file declares `package main`.
    #[must_use]
    pub fn declares_main(&self) -> bool {
        self.files
            .iter()
            .filter(|f| f.name.ends_with(".go"))
            .any(|f| package_clause(&f.data) == Some("main"))
    }

    /// Write every file below `dir`, creating parent directories.
    ///
    /// # Errors
    /// Returns error for absolute or escaping names, or if a write fails.
    pub async fn write_to(&self, dir: &Path) -> Result<(), StartError> {
        for file in &self.files {
            let relative = Path::new(&file.name);
            let safe = relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
            if !safe {
                return Err(StartError::InvalidFileName(file.name.clone()));
            }
            let target = dir.join(relative);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, &file.data).await?;
        }
        Ok(())
    }

    /// Whether `body` should be built as a program rather than run as a script.
    ///
    /// True when the first significant line is a `package` clause or the body
    /// contains archive markers.
    #[must_use]
    pub fn looks_like_program(body: &str) -> bool {
        if body.trim_start().starts_with("#!") {
            return false;
        }
        package_clause(body).is_some() || body.lines().any(|l| marker_name(l).is_some())
    }
}

/// Name declared by the leading `package` clause of Go source.
///
/// Line and block comments before the clause are skipped.
#[must_use]
pub fn package_clause(source: &str) -> Option<&str> {
    let mut in_block = false;
    for line in source.lines() {
        let mut line = line.trim();
        if in_block {
            let Some(end) = line.find("*/") else {
                continue;
            };
            line = line[end + 2..].trim();
            in_block = false;
        }
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if let Some(rest) = line.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) if rest[end + 2..].trim().is_empty() => continue,
                Some(end) => line = rest[end + 2..].trim(),
                None => {
                    in_block = true;
                    continue;
                }
            }
        }
        let name = line.strip_prefix("package")?;
        if !name.starts_with(char::is_whitespace) {
            return None;
        }
        return name.split_whitespace().next();
    }
    None
}
