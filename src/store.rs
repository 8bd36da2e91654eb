//! Template persistence – the store contract plus in-memory and
//! JSON-directory implementations.
//!
//! Stores validate before writing and write all-or-nothing. Any backend
//! failure surfaces as [`Error::Persistence`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::document::TemplateDocument;
use crate::error::{Error, Result};

pub trait TemplateStore {
    /// Validate and persist `doc`, returning the stored copy.
    fn save(&mut self, doc: &TemplateDocument) -> Result<TemplateDocument>;

    fn load(&self, id: &str) -> Result<TemplateDocument>;

    /// All stored templates, most recently updated first.
    fn list(&self) -> Result<Vec<TemplateDocument>>;

    /// Returns whether a template was removed.
    fn delete(&mut self, id: &str) -> Result<bool>;
}

fn prepare(doc: &TemplateDocument) -> Result<TemplateDocument> {
    doc.validate_for_save()?;
    doc.check_invariants()?;
    let mut stored = doc.clone();
    stored.touch();
    Ok(stored)
}

fn newest_first(mut docs: Vec<TemplateDocument>) -> Vec<TemplateDocument> {
    docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    docs
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    templates: HashMap<String, TemplateDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateStore for MemoryStore {
    fn save(&mut self, doc: &TemplateDocument) -> Result<TemplateDocument> {
        let stored = prepare(doc)?;
        self.templates.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn load(&self, id: &str) -> Result<TemplateDocument> {
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<TemplateDocument>> {
        Ok(newest_first(self.templates.values().cloned().collect()))
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        Ok(self.templates.remove(id).is_some())
    }
}

/// One pretty-printed `<id>.json` file per template.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

fn persistence(context: &str, path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Persistence(format!("{context} {}: {e}", path.display()))
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(Error::Validation {
                field: "id",
                message: format!("invalid template id `{id}`"),
            });
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn read(path: &Path) -> Result<TemplateDocument> {
        let json = fs::read_to_string(path).map_err(|e| persistence("reading", path, e))?;
        let doc: TemplateDocument =
            serde_json::from_str(&json).map_err(|e| persistence("parsing", path, e))?;
        doc.admit()
    }
}

impl TemplateStore for JsonDirStore {
    fn save(&mut self, doc: &TemplateDocument) -> Result<TemplateDocument> {
        let stored = prepare(doc)?;
        let path = self.path_for(&stored.id)?;
        fs::create_dir_all(&self.dir).map_err(|e| persistence("creating", &self.dir, e))?;

        let json = serde_json::to_string_pretty(&stored)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", stored.id));
        if let Err(e) = fs::write(&tmp, json) {
            let _ = fs::remove_file(&tmp);
            return Err(persistence("writing", &tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(persistence("replacing", &path, e));
        }
        log::debug!("saved template {} to {}", stored.id, path.display());
        Ok(stored)
    }

    fn load(&self, id: &str) -> Result<TemplateDocument> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(Error::TemplateNotFound(id.to_string()));
        }
        Self::read(&path)
    }

    fn list(&self) -> Result<Vec<TemplateDocument>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence("listing", &self.dir, e)),
        };
        let mut docs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| persistence("listing", &self.dir, e))?.path();
            let is_template = path.extension().is_some_and(|ext| ext == "json")
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if !is_template {
                continue;
            }
            match Self::read(&path) {
                Ok(doc) => docs.push(doc),
                Err(e) => log::warn!("skipping unreadable template: {e}"),
            }
        }
        Ok(newest_first(docs))
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(persistence("deleting", &path, e)),
        }
    }
}
