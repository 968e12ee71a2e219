//! Plain records exchanged with outside collaborators (image galleries,
//! post scheduling). The editor only fills them in.

use serde::{Deserialize, Serialize};

/// An image offered by a gallery or stock-photo collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
    Failed,
}

/// A post handed to the scheduling collaborator together with an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    pub content: String,
    /// RFC 3339 timestamp, passed through untouched.
    pub scheduled_at: String,
    pub platforms: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<PostMedia>,
}

/// The exported image a post carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMedia {
    pub filename: String,
    pub mime: String,
    pub data_url: String,
}

impl ScheduledPost {
    /// Attach an export and hand the post over as `Scheduled`.
    pub fn with_media(mut self, media: PostMedia) -> Self {
        self.media = Some(media);
        self.status = PostStatus::Scheduled;
        self
    }
}
