use serde::{Deserialize, Serialize};
use thiserror::Error;
use vscreen_core::{Eye, TestResult, TestType};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Receives each finalized result exactly once.
pub trait ResultStore {
    fn save_result(
        &mut self,
        test_type: TestType,
        eye: Option<Eye>,
        result: &TestResult,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub test_type: TestType,
    pub eye: Option<Eye>,
    pub result: TestResult,
}

/// Keeps results in memory, newest last.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub records: Vec<StoredResult>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self, test_type: TestType, eye: Option<Eye>) -> Option<&TestResult> {
        self.records
            .iter()
            .rev()
            .find(|r| r.test_type == test_type && r.eye == eye)
            .map(|r| &r.result)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ResultStore for MemoryStore {
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
        Ok(())
    }
}
