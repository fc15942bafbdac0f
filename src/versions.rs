//! Append-only revision history for one artifact.

use crate::error::{Result, StudioError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instruction recorded on the seed version
pub const ORIGINAL_INSTRUCTION: &str = "original";

/// Instruction recorded on versions typed in by hand
pub const MANUAL_EDIT_INSTRUCTION: &str = "manual edit";

/// One revision of an artifact's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptVersion {
    /// Position in the owning history
    pub version_index: usize,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// What produced this version
    pub instruction: String,
}

/// Ordered version log plus the pointer to the displayed version.
///
/// Versions are never removed or reordered; `version_index` always equals the
/// position in the log, and the pointer is valid whenever the log is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionStore {
    versions: Vec<ScriptVersion>,
    current: usize,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose version 0 is `content`, tagged as the original
    pub fn seeded(content: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.append(content, ORIGINAL_INSTRUCTION);
        store
    }

    /// Append a version and move the pointer to it
    pub fn append(&mut self, content: impl Into<String>, instruction: impl Into<String>) -> &ScriptVersion {
        let version_index = self.versions.len();
        self.versions.push(ScriptVersion {
            version_index,
            content: content.into(),
            timestamp: Utc::now(),
            instruction: instruction.into(),
        });
        self.current = version_index;
        &self.versions[version_index]
    }

    /// Move the pointer to an existing version; the log itself is untouched
    pub fn select_version(&mut self, index: usize) -> Result<&ScriptVersion> {
        if index >= self.versions.len() {
            return Err(StudioError::IndexOutOfRange {
                index,
                len: self.versions.len(),
            });
        }
        self.current = index;
        Ok(&self.versions[index])
    }

    pub fn current(&self) -> Option<&ScriptVersion> {
        self.versions.get(self.current)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current().map(|v| v.version_index)
    }

    /// Content at the pointer, or `fallback` before any version exists
    pub fn current_content<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.current().map_or(fallback, |v| v.content.as_str())
    }

    pub fn get(&self, index: usize) -> Option<&ScriptVersion> {
        self.versions.get(index)
    }

    pub fn versions(&self) -> &[ScriptVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Instructions that produced each version after the seed, oldest first
    pub fn instruction_history(&self) -> Vec<&str> {
        self.versions
            .iter()
            .skip(1)
            .map(|v| v.instruction.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_store_returns_original() {
        let mut store = VersionStore::seeded("original text");
        let v0 = store.select_version(0).unwrap();
        assert_eq!(v0.content, "original text");
        assert_eq!(v0.instruction, ORIGINAL_INSTRUCTION);
        assert_eq!(store.current_index(), Some(0));
    }

    #[test]
    fn test_append_then_select_roundtrip() {
        let mut store = VersionStore::seeded("v0");
        store.append("v1", "shorten by half");
        store.select_version(0).unwrap();
        assert_eq!(store.select_version(1).unwrap().content, "v1");
    }

    #[test]
    fn test_indices_are_monotonic_after_navigation() {
        let mut store = VersionStore::seeded("v0");
        for i in 1..=3 {
            store.append(format!("v{}", i), "refine");
        }
        store.select_version(1).unwrap();
        let appended = store.append("v4", MANUAL_EDIT_INSTRUCTION).version_index;

        assert_eq!(appended, 4);
        assert_eq!(store.len(), 5);
        assert_eq!(store.current_index(), Some(4));
        for (position, version) in store.versions().iter().enumerate() {
            assert_eq!(version.version_index, position);
        }
    }

    #[test]
    fn test_select_out_of_range_leaves_pointer() {
        let mut store = VersionStore::seeded("v0");
        store.append("v1", "refine");
        let err = store.select_version(5).unwrap_err();
        assert!(matches!(err, StudioError::IndexOutOfRange { index: 5, len: 2 }));
        assert_eq!(store.current_index(), Some(1));
    }

    #[test]
    fn test_current_content_falls_back_when_empty() {
        let store = VersionStore::new();
        assert_eq!(store.current_content("bare content"), "bare content");
        assert_eq!(store.current_index(), None);
    }

    #[test]
    fn test_current_content_is_stable_between_reads() {
        let store = VersionStore::seeded("stable");
        assert_eq!(store.current_content(""), store.current_content(""));
    }

    #[test]
    fn test_instruction_history_skips_seed() {
        let mut store = VersionStore::seeded("v0");
        store.append("v1", "more casual");
        store.append("v2", MANUAL_EDIT_INSTRUCTION);
        assert_eq!(store.instruction_history(), vec!["more casual", "manual edit"]);
    }
}
