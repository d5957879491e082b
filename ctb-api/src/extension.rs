use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File types the backend accepts for a creation upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadExtension {
    Png,
    Jpg,
    Jpeg,
    H264,
    Mpeg4,
    Wmv,
    Webm,
    Flv,
    Ogg,
    Ogv,
    Mp4,
    M4v,
    Mov,
    Uzpb,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported upload extension '{0}'")]
pub struct UnsupportedExtension(pub String);

impl UploadExtension {
    pub const ALL: [UploadExtension; 14] = [
        UploadExtension::Png,
        UploadExtension::Jpg,
        UploadExtension::Jpeg,
        UploadExtension::H264,
        UploadExtension::Mpeg4,
        UploadExtension::Wmv,
        UploadExtension::Webm,
        UploadExtension::Flv,
        UploadExtension::Ogg,
        UploadExtension::Ogv,
        UploadExtension::Mp4,
        UploadExtension::M4v,
        UploadExtension::Mov,
        UploadExtension::Uzpb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadExtension::Png => "png",
            UploadExtension::Jpg => "jpg",
            UploadExtension::Jpeg => "jpeg",
            UploadExtension::H264 => "h264",
            UploadExtension::Mpeg4 => "mpeg4",
            UploadExtension::Wmv => "wmv",
            UploadExtension::Webm => "webm",
            UploadExtension::Flv => "flv",
            UploadExtension::Ogg => "ogg",
            UploadExtension::Ogv => "ogv",
            UploadExtension::Mp4 => "mp4",
            UploadExtension::M4v => "m4v",
            UploadExtension::Mov => "mov",
            UploadExtension::Uzpb => "uzpb",
        }
    }

    /// Extension of the last path segment, e.g. `drawing.PNG` -> `Png`.
    pub fn from_path(path: &str) -> Result<Self, UnsupportedExtension> {
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        match file_name.rsplit_once('.') {
            Some((_, extension)) => extension.parse(),
            None => Err(UnsupportedExtension(file_name.to_string())),
        }
    }
}

impl FromStr for UploadExtension {
    type Err = UnsupportedExtension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|extension| extension.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnsupportedExtension(s.to_string()))
    }
}

impl fmt::Display for UploadExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively_with_optional_dot() {
        assert_eq!("PNG".parse(), Ok(UploadExtension::Png));
        assert_eq!(".m4v".parse(), Ok(UploadExtension::M4v));
        assert_eq!(
            "gif".parse::<UploadExtension>(),
            Err(UnsupportedExtension("gif".to_string()))
        );
    }

    #[test]
    fn every_extension_round_trips_through_its_name() {
        for extension in UploadExtension::ALL {
            assert_eq!(extension.as_str().parse(), Ok(extension));
        }
    }

    #[test]
    fn detects_extension_from_path() {
        assert_eq!(
            UploadExtension::from_path("/tmp/art/drawing.final.JPEG"),
            Ok(UploadExtension::Jpeg)
        );
        assert!(UploadExtension::from_path("/tmp/art/README").is_err());
    }
}
