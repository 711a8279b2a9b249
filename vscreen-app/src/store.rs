use std::fs;
use std::path::{Path, PathBuf};

use vscreen_core::{Eye, TestResult, TestType};
use vscreen_experiment::{ResultStore, StoreError, StoredResult};

/// Results persisted as a pretty-printed JSON array, rewritten on each save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<StoredResult>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let records = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn records(&self) -> &[StoredResult] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ResultStore for JsonFileStore {
    fn save_result(
        &mut self,
        test_type: TestType,
        eye: Option<Eye>,
        result: &TestResult,
    ) -> Result<(), StoreError> {
        self.records.push(StoredResult {
            test_type,
            eye,
            result: result.clone(),
        });
        if let Err(e) = self.flush() {
            self.records.pop();
            return Err(e);
        }
        tracing::debug!(path = %self.path.display(), %test_type, "result saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vscreen_core::{ResultStatus, Summary};

    fn result() -> TestResult {
        TestResult {
            test_type: TestType::AmslerGrid,
            eye: None,
            summary: Summary::AmslerGrid {
                distortions: vec![],
            },
            status: ResultStatus::Normal,
            trials: 4,
            highest_level: 4,
            completed_at: "2026-01-02T03:04:05Z".parse().unwrap(),
        }
    }

    #[test]
    fn saved_results_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("results.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.records().is_empty());
        store
            .save_result(TestType::AmslerGrid, None, &result())
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.records().len(), 1);
        assert_eq!(reopened.records()[0].result, result());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path).unwrap_err(),
            StoreError::Serialization(_)
        ));
    }
}
