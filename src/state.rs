use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use testvar::{ApplyOutcome, ObservedState};

// ============================================================================
// State Structures
// ============================================================================

/// Recorded state of every managed test variable
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModvarState {
    /// Layout version of the recorded instances
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    /// Last successful reconciliation per instance name
    #[serde(default)]
    pub instances: BTreeMap<String, ObservedState>,

    /// Instances whose last operation failed (instance name, error message)
    #[serde(default)]
    pub failures: BTreeMap<String, String>,
}

fn current_schema_version() -> u32 {
    testvar::SCHEMA_VERSION
}

impl ModvarState {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.schema_version > testvar::SCHEMA_VERSION {
            bail!(
                "State file {} has schema version {}, this modvar understands up to {}",
                path.display(),
                state.schema_version,
                testvar::SCHEMA_VERSION
            );
        }

        log::debug!(
            "Loaded {} instances from {}",
            state.instances.len(),
            path.display()
        );
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.schema_version = testvar::SCHEMA_VERSION;
        self.save(path)
    }

    // ========================================================================
    // Instance Helpers
    // ========================================================================

    pub fn instance(&self, name: &str) -> Option<&ObservedState> {
        self.instances.get(name)
    }

    /// Record what an operation left behind for `name`
    ///
    /// `None` state removes the instance. A failed result keeps whatever
    /// state the operation reported and remembers the error.
    pub fn record(&mut self, name: &str, outcome: &ApplyOutcome) {
        match &outcome.state {
            Some(state) => {
                self.instances.insert(name.to_string(), state.clone());
            }
            None => {
                self.instances.remove(name);
            }
        }

        match &outcome.result {
            declarative::ApplyResult::Failed { error } => {
                self.failures.insert(name.to_string(), error.clone());
            }
            _ => {
                self.failures.remove(name);
            }
        }
    }
}

impl Default for ModvarState {
    fn default() -> Self {
        Self {
            schema_version: testvar::SCHEMA_VERSION,
            last_updated: Utc::now(),
            instances: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::ApplyResult;
    use tempfile::TempDir;
    use testvar::ModuleScope;
    use varstore::Category;

    fn observed(id: &str, sensitive: bool) -> ObservedState {
        ObservedState {
            id: id.to_string(),
            key: "FOO".to_string(),
            value: "bar".to_string(),
            category: Category::Env,
            description: String::new(),
            hcl: false,
            sensitive,
            readable_value: (!sensitive).then(|| "bar".to_string()),
            scope: ModuleScope::new("acme", "vpc", "aws"),
        }
    }

    #[test]
    fn test_default_state() {
        let state = ModvarState::default();
        assert!(state.instances.is_empty());
        assert!(state.failures.is_empty());
        assert_eq!(state.schema_version, testvar::SCHEMA_VERSION);
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let state = ModvarState::load(&dir.path().join("state.toml")).unwrap();
        assert!(state.instances.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut state = ModvarState::default();
        state.instances.insert("foo".to_string(), observed("var-1", false));
        state.instances.insert("token".to_string(), observed("var-2", true));
        state.touch(&path).unwrap();

        let loaded = ModvarState::load(&path).unwrap();
        assert_eq!(loaded.instances, state.instances);
        assert_eq!(loaded.instance("token").unwrap().readable_value, None);
        assert_eq!(loaded.instance("foo").unwrap().scope.module_name, "vpc");
    }

    #[test]
    fn test_newer_schema_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.toml");
        let mut state = ModvarState::default();
        state.schema_version = testvar::SCHEMA_VERSION + 1;
        state.save(&path).unwrap();

        let err = ModvarState::load(&path).unwrap_err();
        assert!(err.to_string().contains("schema version"));
    }

    #[test]
    fn test_record_tracks_instances_and_failures() {
        let mut state = ModvarState::default();

        state.record(
            "foo",
            &ApplyOutcome {
                state: Some(observed("var-1", false)),
                result: ApplyResult::Created,
            },
        );
        assert_eq!(state.instance("foo").unwrap().id, "var-1");

        // A failed update keeps the prior state and remembers why.
        state.record(
            "foo",
            &ApplyOutcome {
                state: Some(observed("var-1", false)),
                result: ApplyResult::Failed {
                    error: "boom".to_string(),
                },
            },
        );
        assert!(state.instance("foo").is_some());
        assert_eq!(state.failures["foo"], "boom");

        state.record(
            "foo",
            &ApplyOutcome {
                state: None,
                result: ApplyResult::Removed,
            },
        );
        assert!(state.instance("foo").is_none());
        assert!(state.failures.is_empty());
    }
}
