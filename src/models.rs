//! Content entities.
//!
//! Plain data structs mirroring the gallery's tables. Image fields hold
//! stored media names (relative paths under the media root), never raw
//! bytes; `None` means no file. Derivative fields (`small_image`, …) are
//! read-only outputs of the pipeline — the lifecycle regenerates them,
//! nobody edits them.
//!
//! Entities that own files implement [`FileOwner`] so the delete path can
//! ask each record for everything it must release, instead of relying on a
//! broadcast hook to fire in the right order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A record that owns media files and must release them before it goes away.
pub trait FileOwner {
    /// Stored names of every file this record owns, source first.
    fn owned_files(&self) -> Vec<&str>;
}

/// The artist behind the gallery. At most one row exists; the database
/// insert gate enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: Option<i64>,
    pub name: String,
    pub bio: String,
    /// Processed in place on upload: max-width 800, WEBP q90.
    pub photo: Option<String>,
}

impl Artist {
    pub fn new(name: impl Into<String>, bio: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            bio: bio.into(),
            photo: None,
        }
    }
}

impl FileOwner for Artist {
    fn owned_files(&self) -> Vec<&str> {
        self.photo.as_deref().into_iter().collect()
    }
}

/// A painting in the catalog.
///
/// `image` is the uploaded original; `small_image`, `medium_image` and
/// `large_image` are generated from it and exist exactly when `image` does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Painting {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub creation_date: NaiveDate,
    pub price: Option<i64>,
    pub is_featured: bool,
    /// Derived from the title on first save, immutable afterwards.
    pub slug: String,
    pub image: Option<String>,
    /// Catalog grid: 4:3 crop, 400×300, q80.
    pub small_image: Option<String>,
    /// Featured row: 4:3 crop, 800×600, q85.
    pub medium_image: Option<String>,
    /// Detail page: no crop, max-width 1920, q90.
    pub large_image: Option<String>,
}

impl Painting {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        creation_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            creation_date,
            price: None,
            is_featured: false,
            slug: String::new(),
            image: None,
            small_image: None,
            medium_image: None,
            large_image: None,
        }
    }

    /// Refs of the configured derivatives, in policy order.
    pub fn derivative_refs(&self) -> [&Option<String>; 3] {
        [&self.small_image, &self.medium_image, &self.large_image]
    }
}

impl FileOwner for Painting {
    fn owned_files(&self) -> Vec<&str> {
        [
            self.image.as_deref(),
            self.small_image.as_deref(),
            self.medium_image.as_deref(),
            self.large_image.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// A blog post. Owns zero or more [`BlogPostImage`] records whose lifetime
/// is scoped to the post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    /// Set once, when the post is first persisted.
    pub pub_date: DateTime<Utc>,
    pub slug: String,
    /// Processed in place on upload: max-width 800, WEBP q85.
    pub cover_image: Option<String>,
}

impl BlogPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            pub_date: Utc::now(),
            slug: String::new(),
            cover_image: None,
        }
    }
}

impl FileOwner for BlogPost {
    fn owned_files(&self) -> Vec<&str> {
        self.cover_image.as_deref().into_iter().collect()
    }
}

/// An additional image attached to a blog post.
///
/// Only valid on posts that have a cover image; the lifecycle checks the
/// aggregate invariant before any file is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPostImage {
    pub id: Option<i64>,
    pub post_id: i64,
    pub image: Option<String>,
}

impl BlogPostImage {
    pub fn new(post_id: i64) -> Self {
        Self {
            id: None,
            post_id,
            image: None,
        }
    }
}

impl FileOwner for BlogPostImage {
    fn owned_files(&self) -> Vec<&str> {
        self.image.as_deref().into_iter().collect()
    }
}

/// A message submitted through the public contact form. Insert-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Site-wide contact details shown on the contacts page. At most one row
/// exists; the database insert gate enforces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteContact {
    pub id: Option<i64>,
    pub phone: String,
    pub email: String,
    pub vk_link: String,
    pub instagram_link: String,
    pub telegram_link: String,
}
