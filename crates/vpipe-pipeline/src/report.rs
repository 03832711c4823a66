//! Outcome of a finished job.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vpipe_models::{AccessUrl, Artifact, ArtifactKind, JobId, JobMode, JobStage, UploadResult};

/// One artifact as reported to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactReport {
    pub index: u32,
    pub kind: ArtifactKind,
    pub name: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Bucket-relative destination path
    pub destination: String,
    /// `<bucket>/<path>` once uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ArtifactReport {
    pub fn new(artifact: &Artifact, upload: Option<UploadResult>) -> Self {
        let mut report = Self {
            index: artifact.index,
            kind: artifact.kind,
            name: artifact.name.clone(),
            size_bytes: artifact.size_bytes,
            duration_secs: artifact.duration_secs,
            destination: artifact.destination.clone(),
            key: None,
            public_url: None,
            signed_url: None,
            expires_at: None,
        };

        if let Some(upload) = upload {
            report.key = Some(upload.key);
            match upload.access {
                AccessUrl::Public { url } => report.public_url = Some(url),
                AccessUrl::Signed { url, expires_at } => {
                    report.signed_url = Some(url);
                    report.expires_at = Some(expires_at);
                }
            }
        }

        report
    }

    /// Public or signed URL, when uploaded.
    pub fn url(&self) -> Option<&str> {
        self.public_url.as_deref().or(self.signed_url.as_deref())
    }
}

/// Summary of a job that reached `Done`.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub mode: JobMode,
    pub stage: JobStage,
    /// Merged file name (concat) or artifact base name (split)
    pub output_name: String,
    pub uploaded: bool,
    pub artifacts: Vec<ArtifactReport>,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    /// Access URLs in artifact order.
    pub fn urls(&self) -> Vec<String> {
        self.artifacts
            .iter()
            .filter_map(|a| a.url().map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> Artifact {
        Artifact::new(1, ArtifactKind::Video, "/w/a.mp4", 10, "p/a.mp4").with_duration(600.0)
    }

    #[test]
    fn test_local_only_report() {
        let report = ArtifactReport::new(&artifact(), None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["name"], "a.mp4");
        assert_eq!(json["duration_secs"], 600.0);
        assert!(json.get("key").is_none());
        assert!(json.get("public_url").is_none());
        assert!(report.url().is_none());
    }

    #[test]
    fn test_signed_report() {
        let expires_at = Utc::now();
        let upload = UploadResult {
            key: "videogeneral/p/a.mp4".into(),
            access: AccessUrl::Signed {
                url: "https://s.example.com/signed".into(),
                expires_at,
            },
        };
        let report = ArtifactReport::new(&artifact(), Some(upload));
        assert_eq!(report.key.as_deref(), Some("videogeneral/p/a.mp4"));
        assert_eq!(report.signed_url.as_deref(), Some("https://s.example.com/signed"));
        assert_eq!(report.expires_at, Some(expires_at));
        assert!(report.public_url.is_none());
    }
}
