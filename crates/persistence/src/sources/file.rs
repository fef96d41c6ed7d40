//! Zone dataset read from a local JSON file.

use std::path::PathBuf;

use crate::entities::{parse_rows, ZoneRow};
use crate::sources::{ZoneSource, ZoneSourceError, ZoneSourceKind};

#[derive(Debug, Clone)]
pub struct FileZoneSource {
    path: PathBuf,
}

impl FileZoneSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ZoneSource for FileZoneSource {
    fn kind(&self) -> ZoneSourceKind {
        ZoneSourceKind::File
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<ZoneRow>, ZoneSourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ZoneSourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(parse_rows(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("zones-{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_fetch_reads_records() {
        let path = temp_path();
        tokio::fs::write(
            &path,
            r#"[{"state":"Delhi","location":{"lat":28.6,"lng":77.2},"riskLevel":"critical","totalIncidents":10}]"#,
        )
        .await
        .unwrap();

        let rows = FileZoneSource::new(&path).fetch().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["state"], "Delhi");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let result = FileZoneSource::new(temp_path()).fetch().await;
        assert!(matches!(result, Err(ZoneSourceError::Io { .. })));
    }

    #[tokio::test]
    async fn test_fetch_keeps_rows_that_do_not_decode() {
        let path = temp_path();
        tokio::fs::write(
            &path,
            r#"[{"state":"Delhi","location":{"lat":28.6,"lng":77.2},"riskLevel":"critical"},{"state":"Bad","totalIncidents":-1}]"#,
        )
        .await
        .unwrap();

        let rows = FileZoneSource::new(&path).fetch().await.unwrap();
        assert_eq!(rows.len(), 2);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_malformed_json() {
        let path = temp_path();
        tokio::fs::write(&path, "{not json").await.unwrap();

        let result = FileZoneSource::new(&path).fetch().await;
        assert!(matches!(result, Err(ZoneSourceError::Parse(_))));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
