//! CV data – the read-only résumé record consumed by the renderers, plus
//! the source contract used to fetch it.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Proficiency level as supplied by the data source.
///
/// Sources send numbers, floats, or numeric strings; everything is coerced
/// to an integer here and clamped to `0..=5` only at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Level(pub i64);

impl Level {
    pub const MAX: u8 = 5;

    /// The level clamped into `0..=5`.
    pub fn clamped(self) -> u8 {
        self.0.clamp(0, Self::MAX as i64) as u8
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let raw = match &value {
            serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
            serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            serde_json::Value::Bool(true) => 1.0,
            _ => 0.0,
        };
        if raw.is_finite() {
            Ok(Level(raw.round() as i64))
        } else {
            Ok(Level(0))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    /// Photo as a `data:` URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl PersonalInfo {
    /// Up to two initials for the avatar placeholder.
    pub fn initials(&self) -> String {
        self.full_name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub position: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub degree: String,
    pub field_of_study: String,
    pub institution: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    pub name: String,
    pub level: Level,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    pub name: String,
    pub level: Level,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certificate {
    pub name: String,
    pub issuer: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Localized UI strings keyed by identifier (`present`, `experience`, …).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations(pub HashMap<String, String>);

impl Translations {
    /// Look up `key`, falling back when it is missing or blank.
    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        match self.0.get(key) {
            Some(v) if !v.trim().is_empty() => v.as_str(),
            _ => fallback,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Translations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Read-only projection of one person's résumé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvData {
    pub personal_info: PersonalInfo,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<Skill>,
    pub languages: Vec<Language>,
    pub certificates: Vec<Certificate>,
    pub translations: Translations,
}

impl CvData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// Source contract
// ---------------------------------------------------------------------------

/// Supplies CV data in a given language. Re-fetched whenever the preview
/// language changes.
pub trait CvSource {
    fn fetch(&self, cv_id: &str, language: &str) -> Result<CvData>;
}

/// Reads `<dir>/<cv_id>.<language>.json`, falling back to `<dir>/<cv_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonCvSource {
    dir: PathBuf,
}

impl JsonCvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CvSource for JsonCvSource {
    fn fetch(&self, cv_id: &str, language: &str) -> Result<CvData> {
        if cv_id.contains(['/', '\\']) || cv_id.starts_with('.') {
            return Err(Error::Validation {
                field: "cvId",
                message: format!("invalid CV id `{cv_id}`"),
            });
        }
        let localized = self.dir.join(format!("{cv_id}.{language}.json"));
        let path = if localized.is_file() {
            localized
        } else {
            self.dir.join(format!("{cv_id}.json"))
        };
        log::debug!("fetching CV data from {}", path.display());
        let json = fs::read_to_string(&path)?;
        CvData::from_json(&json)
    }
}
