use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A creation as returned by `GET /creations/{id}` and `POST /creations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub approved: bool,
    pub approval_status: String,
    pub image_status: i64,
    pub bubbles_count: i64,
    pub comments_count: i64,
    pub views_count: i64,
    pub last_bubbled_at: String,
    pub last_commented_at: String,
    pub last_submitted_at: String,
    pub short_url: String,
    pub created_at: String,
    pub created_at_age: String,
    pub images: Option<CreationImageUrls>,
}

/// Rendition links of a creation's image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationImageUrls {
    pub original: String,
    pub full_view: String,
    pub list_view: String,
    pub list_view_retina: String,
    pub matrix_view: String,
    pub matrix_view_retina: String,
    pub gallery_mobile: String,
    pub explore_mobile: String,
    pub share: String,
}

/// One-time target for a binary transfer, issued by
/// `POST /creations/{id}/uploads`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDestination {
    /// Content type the stored object must carry.
    pub content_type: String,
    /// Endpoint to call once the transfer settled, whatever its result.
    pub ping_url: String,
    pub post_url: String,
    /// Form fields that authorize the post (policy, signature, key, ...).
    pub post_credentials: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingUrlDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub username: String,
    pub display_name: String,
    pub list_name: String,
    pub name: String,
    pub role: String,
    pub age: String,
    pub gender: String,
    pub country_code: String,
    pub country_name: String,
    pub avatar_url: String,
    pub short_url: String,
    pub added_bubbles_count: i64,
    pub activities_count: i64,
    pub bubbles_count: i64,
    pub creations_count: i64,
    pub comments_count: i64,
    pub creators_count: i64,
    pub galleries_count: i64,
    pub managers_count: i64,
    pub last_bubbled_at: String,
    pub last_commented_at: String,
    pub signed_up_as_instructor: bool,
    pub what_do_you_teach: String,
    pub interests: String,
    pub home_schooling: bool,
}

/// Metadata for `POST /creations`. Fields left as `None` (or an empty
/// `creator_ids`) are not sent at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCreation {
    pub name: Option<String>,
    pub reflection_text: Option<String>,
    pub reflection_video_url: Option<String>,
    pub creator_ids: Vec<String>,
    pub created_at_year: Option<i32>,
    /// 1 to 12.
    pub created_at_month: Option<u8>,
}

impl NewCreation {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_reflection_text(mut self, text: impl Into<String>) -> Self {
        self.reflection_text = Some(text.into());
        self
    }

    pub fn with_reflection_video_url(mut self, url: impl Into<String>) -> Self {
        self.reflection_video_url = Some(url.into());
        self
    }

    pub fn with_creator_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.creator_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_creation_date(mut self, year: i32, month: u8) -> Self {
        self.created_at_year = Some(year);
        self.created_at_month = Some(month);
        self
    }
}
