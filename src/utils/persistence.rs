use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::WelloError;

/// Writes `value` as pretty JSON by staging to a temporary file and renaming.
pub fn save_json_atomic<T: Serialize>(value: &T, path: &Path) -> Result<(), WelloError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, json)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Loads a JSON document from disk, returning structured errors on failure.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, WelloError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn save_then_load_preserves_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let mut doc = BTreeMap::new();
        doc.insert("age".to_string(), "42".to_string());

        save_json_atomic(&doc, &path).unwrap();
        let loaded: BTreeMap<String, String> = load_json(&path).unwrap();

        assert_eq!(loaded, doc);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<BTreeMap<String, String>, _> = load_json(&dir.path().join("none.json"));
        assert!(matches!(result, Err(WelloError::Io(_))));
    }
}
