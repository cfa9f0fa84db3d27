use std::path::PathBuf;

use async_trait::async_trait;

use crate::feed::FeedSnapshot;

pub struct UploadObject {
    pub object_name: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, object: &UploadObject) -> Result<(), String>;
}

/// Archives objects as files under a directory.
pub struct DirectoryUploader {
    dir: PathBuf,
}

impl DirectoryUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Uploader for DirectoryUploader {
    async fn upload(&self, object: &UploadObject) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("Failed to create '{}': {}", self.dir.display(), e))?;
        let path = self.dir.join(&object.object_name);
        tokio::fs::write(&path, &object.body)
            .await
            .map_err(|e| format!("Cannot upload {}: {}", object.object_name, e))?;
        log::debug!(
            "Archived {} ({}, {} bytes)",
            path.display(),
            object.content_type,
            object.body.len()
        );
        Ok(())
    }
}

/// JSON archive object for a feed, named `feedYYYYMMDD.json`.
pub fn feed_upload_object(snapshot: &FeedSnapshot) -> Result<UploadObject, String> {
    let body = serde_json::to_vec(snapshot)
        .map_err(|e| format!("Failed in converting feed into JSON: {}", e))?;
    Ok(UploadObject {
        object_name: format!("feed{}.json", snapshot.published.format("%Y%m%d")),
        content_type: "application/json".to_string(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use nb_core::record::jst;

    use super::*;

    fn sample_snapshot() -> FeedSnapshot {
        FeedSnapshot {
            title: "This is a Sample Feed!".to_string(),
            published: jst().with_ymd_and_hms(2022, 7, 1, 12, 13, 24).unwrap(),
            entries: Vec::new(),
        }
    }

    #[test]
    fn names_object_after_feed_date() {
        let object = feed_upload_object(&sample_snapshot()).unwrap();
        assert_eq!(object.object_name, "feed20220701.json");
        assert_eq!(object.content_type, "application/json");

        let json: serde_json::Value = serde_json::from_slice(&object.body).unwrap();
        assert_eq!(json["title"], "This is a Sample Feed!");
    }

    #[tokio::test]
    async fn writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = DirectoryUploader::new(dir.path().join("archive"));
        let object = feed_upload_object(&sample_snapshot()).unwrap();

        uploader.upload(&object).await.unwrap();
        let written = std::fs::read(dir.path().join("archive").join("feed20220701.json")).unwrap();
        assert_eq!(written, object.body);
    }
}
