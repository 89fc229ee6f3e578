//! Environment support: active profiles and placeholder properties
//!
//! The environment gates profile-conditional document scopes and expands
//! `${name}` placeholders in import locations. It can be built in code or
//! loaded from a TOML file.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading an environment or expanding placeholders
#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("failed to read environment file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse environment TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unresolved placeholder '${{{name}}}' in \"{input}\"")]
    UnresolvedPlaceholder { name: String, input: String },
    #[error("unterminated placeholder in \"{input}\"")]
    UnterminatedPlaceholder { input: String },
}

/// Active profiles and properties consulted during document loading
#[derive(Debug, Clone, Default)]
pub struct Environment {
    active_profiles: HashSet<String>,
    properties: HashMap<String, String>,
}

/// TOML structure for deserializing environments
#[derive(Deserialize)]
struct TomlEnvironment {
    profiles: Option<TomlProfiles>,
    properties: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct TomlProfiles {
    active: Option<Vec<String>>,
}

impl Environment {
    /// Create an environment with no active profiles and no properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an environment with the given profiles active
    pub fn with_profiles<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            active_profiles: profiles.into_iter().map(Into::into).collect(),
            properties: HashMap::new(),
        }
    }

    /// Load an environment from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, EnvironmentError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load an environment from a TOML string
    pub fn from_str(content: &str) -> Result<Self, EnvironmentError> {
        let parsed: TomlEnvironment = toml::from_str(content)?;
        Ok(Environment {
            active_profiles: parsed
                .profiles
                .and_then(|p| p.active)
                .unwrap_or_default()
                .into_iter()
                .collect(),
            properties: parsed.properties.unwrap_or_default(),
        })
    }

    pub fn activate_profile(&mut self, profile: impl Into<String>) {
        self.active_profiles.insert(profile.into());
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|s| s.as_str())
    }

    /// True when any candidate profile is accepted. A leading `!` negates:
    /// `!prod` is accepted when `prod` is not active.
    pub fn accepts_profiles<S: AsRef<str>>(&self, profiles: &[S]) -> bool {
        profiles.iter().any(|p| {
            let p = p.as_ref();
            match p.strip_prefix('!') {
                Some(negated) => !self.active_profiles.contains(negated),
                None => self.active_profiles.contains(p),
            }
        })
    }

    /// Expand `${name}` and `${name:default}` references against the property
    /// map, falling back to process environment variables. A placeholder with
    /// no value and no default is an error. Placeholders do not nest.
    pub fn resolve_required_placeholders(&self, input: &str) -> Result<String, EnvironmentError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                return Err(EnvironmentError::UnterminatedPlaceholder {
                    input: input.to_string(),
                });
            };
            let body = &after[..end];
            let (name, default) = match body.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (body, None),
            };
            let value = self
                .properties
                .get(name)
                .cloned()
                .or_else(|| std::env::var(name).ok())
                .or_else(|| default.map(str::to_string))
                .ok_or_else(|| EnvironmentError::UnresolvedPlaceholder {
                    name: name.to_string(),
                    input: input.to_string(),
                })?;
            out.push_str(&value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
