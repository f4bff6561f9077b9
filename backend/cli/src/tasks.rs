//! Task list input: the JSON the course discovery step writes.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use coursepace_client::StudyParams;
use coursepace_core::CourseTask;

/// One course as listed in a tasks file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskEntry {
    #[serde(flatten)]
    pub task: CourseTask,
    /// Study-page parameters the endpoint needs for this course.
    #[serde(default)]
    pub params: StudyParams,
}

pub async fn load_tasks(path: &Path) -> Result<Vec<TaskEntry>> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read tasks file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse tasks file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_discovery_output() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"course_id": "c-1", "record_id": "r-1", "remaining_seconds": 150,
                  "pass_line_seconds": 2700, "title": "Lab Safety",
                  "params": {{"ref_id": "4411", "student_id": "s-9", "pass_line": "45",
                              "study_time": "42", "session_id": "abc"}}}},
                {{"course_id": "c-2", "record_id": "r-2", "remaining_seconds": 0,
                  "pass_line_seconds": 600}}
            ]"#
        )
        .unwrap();

        let entries = load_tasks(file.path()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].task.display_name(), "Lab Safety");
        assert_eq!(entries[0].params.ref_id, "4411");
        assert!(entries[1].task.is_complete());
        assert_eq!(entries[1].params, StudyParams::default());
    }

    #[tokio::test]
    async fn malformed_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = load_tasks(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse tasks file"));
    }
}
