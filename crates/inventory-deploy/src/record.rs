//! The deployment record: the only state kept between runs.
//!
//! One JSON file holding every identifier the last successful deploy
//! produced. `validate` and `subscribe` read it, `destroy` reads it and
//! deletes it before touching any cloud resource: a crash mid-teardown must
//! leave no record pointing at half-deleted resources. There is no locking;
//! the tool assumes a single operator per environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the record lives, relative to the directory the tool runs from.
pub const RECORD_PATH: &str = "deployment.json";

/// Snapshot of everything a deploy created or adopted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployment_time: String,
    pub region: String,
    pub suffix: String,
    pub bucket_uploads: String,
    pub bucket_web: String,
    pub table_name: String,
    pub lambda_load: String,
    pub lambda_api: String,
    pub lambda_notify: String,
    pub api_id: String,
    pub api_endpoint: String,
    pub web_url: Option<String>,
    pub sns_topic_arn: String,
    pub iam_role: String,
}

impl DeploymentRecord {
    /// Load the record if one exists. `Ok(None)` means "no deployment".
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(Path::new(RECORD_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = serde_json::from_str(&data)
            .with_context(|| format!("Malformed deployment record at {}", path.display()))?;
        Ok(Some(record))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new(RECORD_PATH))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let data =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment record")?;
        std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Remove the record. Returns whether a file was actually deleted.
    pub fn delete() -> Result<bool> {
        Self::delete_at(Path::new(RECORD_PATH))
    }

    pub fn delete_at(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to delete {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeploymentRecord {
        DeploymentRecord {
            deployment_time: "2026-03-01T12:00:00Z".to_string(),
            region: "us-east-1".to_string(),
            suffix: "inventory-main".to_string(),
            bucket_uploads: "inventory-uploads-inventory-main".to_string(),
            bucket_web: "inventory-web-inventory-main".to_string(),
            table_name: "Inventory".to_string(),
            lambda_load: "load_inventory".to_string(),
            lambda_api: "get_inventory_api".to_string(),
            lambda_notify: "notify_low_stock".to_string(),
            api_id: "a1b2c3".to_string(),
            api_endpoint: "https://a1b2c3.execute-api.us-east-1.amazonaws.com/prod".to_string(),
            web_url: None,
            sns_topic_arn: "arn:aws:sns:us-east-1:123456789012:low-stock-inventory-main"
                .to_string(),
            iam_role: "LabRole".to_string(),
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.json");

        let record = sample();
        record.save_to(&path).unwrap();
        let loaded = DeploymentRecord::load_from(&path).unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn absent_file_means_no_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.json");
        assert_eq!(DeploymentRecord::load_from(&path).unwrap(), None);
        assert!(!DeploymentRecord::delete_at(&path).unwrap());
    }

    #[test]
    fn delete_reports_whether_a_file_existed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.json");
        sample().save_to(&path).unwrap();
        assert!(DeploymentRecord::delete_at(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn serializes_with_the_documented_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        for field in [
            "deployment_time",
            "region",
            "suffix",
            "bucket_uploads",
            "bucket_web",
            "table_name",
            "lambda_load",
            "lambda_api",
            "lambda_notify",
            "api_id",
            "api_endpoint",
            "web_url",
            "sns_topic_arn",
            "iam_role",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert!(json["web_url"].is_null());
    }

    #[test]
    fn malformed_record_is_an_error_not_a_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(DeploymentRecord::load_from(&path).is_err());
    }
}
