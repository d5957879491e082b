use std::fmt;

use bytes::Bytes;
use ctb_api::{NewCreation, UploadExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the payload comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum PayloadSource {
    Bytes(Bytes),
    /// Fetched with a plain GET before the transfer.
    Url(String),
}

impl fmt::Debug for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            PayloadSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// Input of an upload run. Built once, then handed to an `UploadSession`,
/// which only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSpec {
    creation_id: Option<String>,
    payload: PayloadSource,
    extension: UploadExtension,
    metadata: NewCreation,
    gallery_id: Option<String>,
}

impl UploadSpec {
    pub fn new(payload: PayloadSource, extension: UploadExtension) -> Self {
        Self {
            creation_id: None,
            payload,
            extension,
            metadata: NewCreation::default(),
            gallery_id: None,
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>, extension: UploadExtension) -> Self {
        Self::new(PayloadSource::Bytes(data.into()), extension)
    }

    pub fn from_url(url: impl Into<String>, extension: UploadExtension) -> Self {
        Self::new(PayloadSource::Url(url.into()), extension)
    }

    /// Upload into an existing creation instead of creating one.
    pub fn with_creation_id<S: Into<String>>(mut self, creation_id: S) -> Self {
        self.creation_id = Some(creation_id.into());
        self
    }

    pub fn with_gallery_id<S: Into<String>>(mut self, gallery_id: S) -> Self {
        self.gallery_id = Some(gallery_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: NewCreation) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.metadata = self.metadata.with_name(name);
        self
    }

    pub fn with_reflection_text<S: Into<String>>(mut self, text: S) -> Self {
        self.metadata = self.metadata.with_reflection_text(text);
        self
    }

    pub fn with_reflection_video_url<S: Into<String>>(mut self, url: S) -> Self {
        self.metadata = self.metadata.with_reflection_video_url(url);
        self
    }

    pub fn with_creator_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata = self.metadata.with_creator_ids(ids);
        self
    }

    pub fn with_creation_date(mut self, year: i32, month: u8) -> Self {
        self.metadata = self.metadata.with_creation_date(year, month);
        self
    }

    /// Existing creation id; blank ids count as absent.
    pub fn creation_id(&self) -> Option<&str> {
        self.creation_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn payload(&self) -> &PayloadSource {
        &self.payload
    }

    pub fn extension(&self) -> UploadExtension {
        self.extension
    }

    pub fn metadata(&self) -> &NewCreation {
        &self.metadata
    }

    /// Target gallery; blank ids count as absent.
    pub fn gallery_id(&self) -> Option<&str> {
        self.gallery_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Identifier of one `upload()` run, for correlating logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(format!("run_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_absent() {
        let spec = UploadSpec::from_bytes(vec![1u8], UploadExtension::Png)
            .with_creation_id("  ")
            .with_gallery_id("");
        assert_eq!(spec.creation_id(), None);
        assert_eq!(spec.gallery_id(), None);
    }

    #[test]
    fn metadata_builders_fill_new_creation() {
        let spec = UploadSpec::from_url("https://cdn.test/a.mp4", UploadExtension::Mp4)
            .with_name("Volcano")
            .with_creator_ids(["u1"])
            .with_creation_date(2017, 3);

        assert_eq!(spec.metadata().name.as_deref(), Some("Volcano"));
        assert_eq!(spec.metadata().creator_ids, vec!["u1".to_string()]);
        assert_eq!(spec.metadata().created_at_month, Some(3));
        assert!(matches!(spec.payload(), PayloadSource::Url(url) if url.ends_with("a.mp4")));
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
        assert!(RunId::new().as_str().starts_with("run_"));
    }
}
