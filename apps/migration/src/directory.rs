//! Scripts stored as JSON files in a directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MigrationError;
use crate::migrator::Migrator;
use crate::script::MigrationScript;

/// A directory of `NNNN_<slug>.json` scripts.
#[derive(Debug, Clone)]
pub struct ScriptDirectory {
    path: PathBuf,
}

impl ScriptDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every script in the directory, in file name order. A missing
    /// directory holds no scripts.
    pub fn load(&self) -> Result<Vec<MigrationScript>, MigrationError> {
        let files = self.script_files()?;
        files
            .iter()
            .map(|path| MigrationScript::from_json(&fs::read_to_string(path)?))
            .collect()
    }

    pub fn migrator(&self) -> Result<Migrator, MigrationError> {
        Migrator::new(self.load()?)
    }

    /// Write `script` as the next numbered file and return its path.
    pub fn write(&self, script: &MigrationScript) -> Result<PathBuf, MigrationError> {
        fs::create_dir_all(&self.path)?;
        let number = self.script_files()?.len() + 1;
        let path = self
            .path
            .join(format!("{number:04}_{}.json", slug(&script.message)));

        fs::write(&path, script.to_json()? + "\n")?;
        tracing::info!(path = %path.display(), revision = %script.revision, "Wrote migration script");
        Ok(path)
    }

    fn script_files(&self) -> Result<Vec<PathBuf>, MigrationError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// `Add posts.summary!` -> `add_posts_summary`.
fn slug(message: &str) -> String {
    let words: Vec<String> = message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();

    if words.is_empty() {
        "migration".to_string()
    } else {
        words.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autogenerate::{GenerateOptions, generate_with};
    use blog_core::schema::{SchemaSnapshot, application_schema};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "blog-migrations-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Create posts table"), "create_posts_table");
        assert_eq!(slug("Add posts.summary!"), "add_posts_summary");
        assert_eq!(slug("  "), "migration");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = ScriptDirectory::new(scratch_dir("missing"));
        assert!(dir.load().unwrap().is_empty());
        assert_eq!(dir.migrator().unwrap().head(), None);
    }

    #[test]
    fn test_write_then_load() {
        let path = scratch_dir("write");
        let dir = ScriptDirectory::new(&path);
        let options = GenerateOptions {
            message: "Create posts table".to_string(),
            ..GenerateOptions::default()
        };
        let script = generate_with(&SchemaSnapshot::empty(), &application_schema(), &options)
            .unwrap();

        let written = dir.write(&script).unwrap();

        assert_eq!(
            written.file_name().unwrap().to_str(),
            Some("0001_create_posts_table.json")
        );
        assert_eq!(dir.load().unwrap(), vec![script.clone()]);
        assert_eq!(dir.migrator().unwrap().head(), Some(script.revision.as_str()));

        fs::remove_dir_all(path).unwrap();
    }
}
