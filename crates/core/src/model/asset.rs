use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::AssetId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssetError {
    #[error("asset title cannot be empty")]
    EmptyTitle,

    #[error("asset file name cannot be empty")]
    EmptyFileName,

    #[error("asset payload cannot be empty")]
    EmptyPayload,

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
}

//
// ─── ASSET KIND ───────────────────────────────────────────────────────────────
//

/// The two asset families the platform serves: lesson PDFs and videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Pdf,
    Video,
}

impl AssetKind {
    /// Stable string form, used as the storage key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Pdf => "pdf",
            AssetKind::Video => "video",
        }
    }

    /// Decodes the stable string form.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::UnsupportedContentType` for unrecognised keys.
    pub fn from_key(key: &str) -> Result<Self, AssetError> {
        match key {
            "pdf" => Ok(AssetKind::Pdf),
            "video" => Ok(AssetKind::Video),
            other => Err(AssetError::UnsupportedContentType(other.to_string())),
        }
    }

    /// Classifies a MIME content type.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::UnsupportedContentType` for anything that is
    /// neither a PDF nor a `video/*` type.
    pub fn from_content_type(content_type: &str) -> Result<Self, AssetError> {
        if content_type.eq_ignore_ascii_case("application/pdf") {
            Ok(AssetKind::Pdf)
        } else if content_type
            .to_ascii_lowercase()
            .starts_with("video/")
        {
            Ok(AssetKind::Video)
        } else {
            Err(AssetError::UnsupportedContentType(content_type.to_string()))
        }
    }
}

//
// ─── ASSET ────────────────────────────────────────────────────────────────────
//

/// Metadata for a stored PDF or video asset.
///
/// The payload itself lives in an object bucket under the asset id; this
/// record is what listings and lookups return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub kind: AssetKind,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Validated input for an upload, before an id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    kind: AssetKind,
    title: String,
    file_name: String,
    content_type: String,
    size_bytes: u64,
}

impl NewAsset {
    /// Validate upload metadata.
    ///
    /// # Errors
    ///
    /// Returns `AssetError` if the title or file name is blank, the payload
    /// is empty, or the content type is neither PDF nor video.
    pub fn validate(
        title: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: u64,
    ) -> Result<Self, AssetError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(AssetError::EmptyTitle);
        }
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(AssetError::EmptyFileName);
        }
        if size_bytes == 0 {
            return Err(AssetError::EmptyPayload);
        }
        let content_type = content_type.into();
        let kind = AssetKind::from_content_type(&content_type)?;

        Ok(Self {
            kind,
            title,
            file_name,
            content_type,
            size_bytes,
        })
    }

    #[must_use]
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Finalize the upload into a stored `Asset`.
    #[must_use]
    pub fn into_asset(self, id: AssetId, uploaded_at: DateTime<Utc>) -> Asset {
        Asset {
            id,
            kind: self.kind,
            title: self.title,
            file_name: self.file_name,
            content_type: self.content_type,
            size_bytes: self.size_bytes,
            uploaded_at,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn classifies_content_types() {
        assert_eq!(
            AssetKind::from_content_type("application/pdf").unwrap(),
            AssetKind::Pdf
        );
        assert_eq!(
            AssetKind::from_content_type("video/mp4").unwrap(),
            AssetKind::Video
        );
        assert_eq!(
            AssetKind::from_content_type("VIDEO/webm").unwrap(),
            AssetKind::Video
        );
        assert!(AssetKind::from_content_type("image/png").is_err());
    }

    #[test]
    fn validates_metadata() {
        assert_eq!(
            NewAsset::validate("", "intro.pdf", "application/pdf", 10).unwrap_err(),
            AssetError::EmptyTitle
        );
        assert_eq!(
            NewAsset::validate("Intro", " ", "application/pdf", 10).unwrap_err(),
            AssetError::EmptyFileName
        );
        assert_eq!(
            NewAsset::validate("Intro", "intro.pdf", "application/pdf", 0).unwrap_err(),
            AssetError::EmptyPayload
        );
    }

    #[test]
    fn finalizes_into_asset() {
        let new_asset =
            NewAsset::validate("Intro to AI", "intro.pdf", "application/pdf", 2048).unwrap();
        let id = AssetId::generate();
        let asset = new_asset.into_asset(id, fixed_now());

        assert_eq!(asset.id, id);
        assert_eq!(asset.kind, AssetKind::Pdf);
        assert_eq!(asset.size_bytes, 2048);
        assert_eq!(asset.uploaded_at, fixed_now());
    }
}
