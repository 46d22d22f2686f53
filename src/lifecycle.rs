//! Entity save/delete lifecycle.
//!
//! [`Gallery`] owns the database and the media store and is the only write
//! path into either: the admin surface, the public contact form, and the
//! CLI bulk commands all come through these entry points, so the
//! file-management contract cannot be bypassed.
//!
//! ## The save contract
//!
//! Every save follows the same sequence:
//!
//! 1. Fetch the previously persisted snapshot by id (new instances have none).
//! 2. If the old source reference is non-empty and differs from the new
//!    value, delete the old file and every derivative keyed off it. This is
//!    not skipped when the new value is empty — clearing a source tears its
//!    files down.
//! 3. Store the upload, if any (processed in place where the policy says so),
//!    and reconcile the derivative set.
//! 4. Assign a slug if the entity has a slug field and none is set yet.
//! 5. Insert or update the record.
//!
//! Render and write failures are fatal to the save: the record is never
//! persisted pointing at a partial derivative set. File *deletion* failures
//! are the opposite — logged at `warn` and otherwise ignored, because an
//! orphaned file on disk is a smaller problem than a record that cannot be
//! removed.
//!
//! Change detection compares stored references, not pixels, against an
//! explicit prior-state snapshot ([`source_changed`]); an [`Upload`] always
//! counts as a change. As a self-healing measure, an unchanged source whose
//! configured derivatives are not all present also triggers regeneration.

use crate::db::{Database, DbError};
use crate::derivatives::{
    ARTIST_PHOTO, BLOG_COVER, BLOG_IMAGE, DerivativeError, PAINTING_IMAGE, SourcePolicy, Upload,
    reconcile, source_changed, store_upload,
};
use crate::imaging::RenderError;
use crate::models::{
    Artist, BlogPost, BlogPostImage, ContactRequest, FileOwner, Painting, SiteContact,
};
use crate::slug::{FALLBACK_SLUG, MAX_SLUG_ATTEMPTS, numbered_slug, slugify};
use crate::storage::{MediaStore, OverwriteStore, StorageError};
use chrono::Utc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("image processing failed: {0}")]
    Render(#[from] RenderError),
    #[error("media storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("database failure: {0}")]
    Db(#[from] DbError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no free slug derived from '{base}' within the retry bound")]
    SlugExhausted { base: String },
}

impl From<DerivativeError> for LifecycleError {
    fn from(e: DerivativeError) -> Self {
        match e {
            DerivativeError::Render(e) => Self::Render(e),
            DerivativeError::Storage(e) => Self::Storage(e),
        }
    }
}

/// The save/delete façade over one database and one media store.
pub struct Gallery<S = OverwriteStore> {
    db: Database,
    store: S,
}

impl<S: MediaStore> Gallery<S> {
    pub fn new(db: Database, store: S) -> Self {
        Self { db, store }
    }

    /// Read access for the (external) view layer.
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    /// Best-effort file removal: failures are logged, never propagated.
    fn release_file(&self, name: &str) {
        if let Err(e) = self.store.delete(name) {
            warn!(file = name, error = %e, "failed to delete media file; leaving it behind");
        }
    }

    fn release_owned_files(&self, owner: &impl FileOwner) {
        for name in owner.owned_files() {
            self.release_file(name);
        }
    }

    /// Apply a save to a processed-in-place source field: tear down the old
    /// file when the reference changes, store and re-encode a new upload.
    fn apply_source_field(
        &self,
        policy: &SourcePolicy,
        old: Option<&str>,
        field: &mut Option<String>,
        upload: Option<Upload>,
    ) -> Result<(), LifecycleError> {
        if let Some(upload) = upload {
            if let Some(old) = old {
                self.release_file(old);
            }
            *field = Some(store_upload(&self.store, policy, &upload)?);
        } else if source_changed(old, field.as_deref())
            && let Some(old) = old
        {
            // Cleared or re-pointed without an upload: the old file goes.
            self.release_file(old);
        }
        Ok(())
    }

    /// First free slug for `title`, bounded by [`MAX_SLUG_ATTEMPTS`].
    fn unique_slug<F>(&self, title: &str, mut taken: F) -> Result<String, LifecycleError>
    where
        F: FnMut(&str) -> Result<bool, DbError>,
    {
        let mut base = slugify(title);
        if base.is_empty() {
            base = FALLBACK_SLUG.to_string();
        }
        for n in 0..=MAX_SLUG_ATTEMPTS {
            let candidate = numbered_slug(&base, n);
            if !taken(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(LifecycleError::SlugExhausted { base })
    }

    // =========================================================================
    // Artist (singleton)
    // =========================================================================

    pub fn save_artist(
        &self,
        artist: &mut Artist,
        upload: Option<Upload>,
    ) -> Result<(), LifecycleError> {
        // Check the singleton gate before any file is touched
        if artist.id.is_none() && self.db.artist()?.is_some() {
            return Err(DbError::SingletonExists("artist").into());
        }

        let prior = match artist.id {
            Some(id) => self.db.artist_by_id(id)?,
            None => None,
        };
        let old_photo = prior.and_then(|a| a.photo);
        self.apply_source_field(&ARTIST_PHOTO, old_photo.as_deref(), &mut artist.photo, upload)?;

        match artist.id {
            Some(_) => self.db.update_artist(artist)?,
            None => artist.id = Some(self.db.insert_artist(artist)?),
        }
        Ok(())
    }

    pub fn delete_artist(&self, artist: &Artist) -> Result<(), LifecycleError> {
        self.release_owned_files(artist);
        if let Some(id) = artist.id {
            self.db.delete_artist_row(id)?;
        }
        Ok(())
    }

    // =========================================================================
    // Painting
    // =========================================================================

    pub fn save_painting(
        &self,
        painting: &mut Painting,
        upload: Option<Upload>,
    ) -> Result<(), LifecycleError> {
        let prior = match painting.id {
            Some(id) => self.db.painting(id)?,
            None => None,
        };
        let old_source = prior.as_ref().and_then(|p| p.image.as_deref());

        let source_is_new = upload.is_some()
            || source_changed(old_source, painting.image.as_deref());

        if source_is_new {
            // Stale derivatives and the old original go before anything new
            // is written, even when the new source is empty.
            if let Some(prior) = &prior {
                for name in prior.owned_files() {
                    self.release_file(name);
                }
            }
            painting.small_image = None;
            painting.medium_image = None;
            painting.large_image = None;
        }

        if let Some(upload) = upload {
            painting.image = Some(store_upload(&self.store, &PAINTING_IMAGE, &upload)?);
        }

        // Regenerate when the source is new, and self-heal when any
        // configured derivative is absent.
        if let Some(source) = painting.image.clone() {
            let missing = painting.derivative_refs().iter().any(|r| r.is_none());
            if missing {
                let bytes = self.store.get(&source)?;
                let refs = reconcile(&self.store, &PAINTING_IMAGE, &source, &bytes)?;
                painting.small_image = refs.get("small").cloned();
                painting.medium_image = refs.get("medium").cloned();
                painting.large_image = refs.get("large").cloned();
            }
        }

        if painting.slug.is_empty() {
            let exclude = painting.id;
            painting.slug = self.unique_slug(&painting.title, |s| {
                self.db.painting_slug_taken(s, exclude)
            })?;
        }

        match painting.id {
            Some(_) => self.db.update_painting(painting)?,
            None => painting.id = Some(self.db.insert_painting(painting)?),
        }
        Ok(())
    }

    pub fn delete_painting(&self, painting: &Painting) -> Result<(), LifecycleError> {
        self.release_owned_files(painting);
        if let Some(id) = painting.id {
            self.db.delete_painting_row(id)?;
        }
        Ok(())
    }

    /// Regenerate missing or lost derivatives for every painting.
    ///
    /// Covers both records with absent derivative refs and refs whose files
    /// no longer exist in the store. Returns how many paintings were healed.
    pub fn heal_paintings(&self) -> Result<usize, LifecycleError> {
        let mut healed = 0;
        for mut painting in self.db.paintings()? {
            let Some(source) = painting.image.clone() else {
                continue;
            };
            let intact = painting
                .derivative_refs()
                .iter()
                .all(|r| matches!(r, Some(name) if self.store.exists(name)));
            if intact {
                continue;
            }
            let bytes = self.store.get(&source)?;
            let refs = reconcile(&self.store, &PAINTING_IMAGE, &source, &bytes)?;
            painting.small_image = refs.get("small").cloned();
            painting.medium_image = refs.get("medium").cloned();
            painting.large_image = refs.get("large").cloned();
            self.db.update_painting(&painting)?;
            healed += 1;
        }
        Ok(healed)
    }

    // =========================================================================
    // Blog
    // =========================================================================

    pub fn save_blog_post(
        &self,
        post: &mut BlogPost,
        upload: Option<Upload>,
    ) -> Result<(), LifecycleError> {
        let prior = match post.id {
            Some(id) => self.db.blog_post(id)?,
            None => None,
        };
        let old_cover = prior.and_then(|p| p.cover_image);
        self.apply_source_field(&BLOG_COVER, old_cover.as_deref(), &mut post.cover_image, upload)?;

        if post.slug.is_empty() {
            let exclude = post.id;
            post.slug =
                self.unique_slug(&post.title, |s| self.db.blog_post_slug_taken(s, exclude))?;
        }

        match post.id {
            Some(_) => self.db.update_blog_post(post)?,
            None => {
                post.pub_date = Utc::now();
                post.id = Some(self.db.insert_blog_post(post)?);
            }
        }
        Ok(())
    }

    /// Delete a post, cascading to every attached image first so each record
    /// releases its own file.
    pub fn delete_blog_post(&self, post: &BlogPost) -> Result<(), LifecycleError> {
        if let Some(id) = post.id {
            for image in self.db.images_for_post(id)? {
                self.delete_blog_post_image(&image)?;
            }
        }
        self.release_owned_files(post);
        if let Some(id) = post.id {
            self.db.delete_blog_post_row(id)?;
        }
        Ok(())
    }

    pub fn save_blog_post_image(
        &self,
        image: &mut BlogPostImage,
        upload: Option<Upload>,
    ) -> Result<(), LifecycleError> {
        // Aggregate invariant, checked before any file I/O: no content
        // images on a post without a cover.
        let post = self.db.blog_post(image.post_id)?.ok_or_else(|| {
            LifecycleError::Validation(format!("blog post {} does not exist", image.post_id))
        })?;
        if post.cover_image.is_none() {
            return Err(LifecycleError::Validation(
                "a post cannot have content images without a cover image".into(),
            ));
        }

        let prior = match image.id {
            Some(id) => self.db.blog_post_image(id)?,
            None => None,
        };
        let old_image = prior.and_then(|i| i.image);
        self.apply_source_field(&BLOG_IMAGE, old_image.as_deref(), &mut image.image, upload)?;

        match image.id {
            Some(_) => self.db.update_blog_post_image(image)?,
            None => image.id = Some(self.db.insert_blog_post_image(image)?),
        }
        Ok(())
    }

    pub fn delete_blog_post_image(&self, image: &BlogPostImage) -> Result<(), LifecycleError> {
        self.release_owned_files(image);
        if let Some(id) = image.id {
            self.db.delete_blog_post_image_row(id)?;
        }
        Ok(())
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// The contact form's single write path: persist a new request.
    pub fn submit_contact_request(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<ContactRequest, LifecycleError> {
        let mut request = ContactRequest::new(name, email, message);
        request.id = Some(self.db.insert_contact_request(&request)?);
        Ok(request)
    }

    pub fn delete_contact_request(&self, request: &ContactRequest) -> Result<(), LifecycleError> {
        if let Some(id) = request.id {
            self.db.delete_contact_request_row(id)?;
        }
        Ok(())
    }

    // =========================================================================
    // Site contact (singleton)
    // =========================================================================

    pub fn save_site_contact(&self, contact: &mut SiteContact) -> Result<(), LifecycleError> {
        match contact.id {
            Some(_) => self.db.update_site_contact(contact)?,
            None => contact.id = Some(self.db.insert_site_contact(contact)?),
        }
        Ok(())
    }

    pub fn delete_site_contact(&self, contact: &SiteContact) -> Result<(), LifecycleError> {
        if let Some(id) = contact.id {
            self.db.delete_site_contact_row(id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::MemoryStore;
    use chrono::NaiveDate;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn gallery() -> Gallery<MemoryStore> {
        Gallery::new(Database::open_in_memory().unwrap(), MemoryStore::new())
    }

    fn jpeg_upload(name: &str, width: u32, height: u32) -> Upload {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 200])
        }));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .unwrap();
        Upload::new(name, buf)
    }

    fn sample_painting(title: &str) -> Painting {
        Painting::new(title, "", NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    #[test]
    fn second_save_with_unchanged_source_writes_nothing() {
        let g = gallery();
        let mut p = sample_painting("Dawn");
        g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 800, 600)))
            .unwrap();
        let puts_after_create = g.store().put_count();
        let refs_after_create = p.clone();

        g.save_painting(&mut p, None).unwrap();
        assert_eq!(g.store().put_count(), puts_after_create);
        assert_eq!(p, refs_after_create);
    }

    #[test]
    fn reupload_with_same_filename_still_regenerates() {
        let g = gallery();
        let mut p = sample_painting("Dawn");
        g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 800, 600)))
            .unwrap();
        let puts_after_create = g.store().put_count();

        // Same logical names, but a fresh upload is a new reference
        g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 1600, 1200)))
            .unwrap();
        assert!(g.store().put_count() > puts_after_create);
        assert_eq!(p.image.as_deref(), Some("paintings/original/dawn.jpg"));
    }

    #[test]
    fn failed_derivative_write_aborts_the_save() {
        let g = gallery();
        g.store().fail_put_on("paintings/medium/dawn_medium.webp");

        let mut p = sample_painting("Dawn");
        let err = g
            .save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 800, 600)))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Storage(StorageError::Write { .. })));

        // The record was never persisted
        assert!(p.id.is_none());
        assert!(g.db().paintings().unwrap().is_empty());
    }

    #[test]
    fn clearing_the_source_tears_down_every_file() {
        let g = gallery();
        let mut p = sample_painting("Dawn");
        g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 800, 600)))
            .unwrap();
        assert_eq!(g.store().names().len(), 4);

        p.image = None;
        g.save_painting(&mut p, None).unwrap();

        assert!(g.store().names().is_empty());
        let stored = g.db().painting(p.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.image, None);
        assert_eq!(stored.small_image, None);
        assert_eq!(stored.medium_image, None);
        assert_eq!(stored.large_image, None);
    }

    #[test]
    fn self_heal_regenerates_a_missing_derivative_on_save() {
        let g = gallery();
        let mut p = sample_painting("Dawn");
        g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 800, 600)))
            .unwrap();

        // Simulate a record that lost one derivative ref
        p.small_image = None;
        g.db().update_painting(&p).unwrap();

        g.save_painting(&mut p, None).unwrap();
        assert_eq!(p.small_image.as_deref(), Some("paintings/small/dawn_small.webp"));
        assert!(g.store().exists("paintings/small/dawn_small.webp"));
    }

    #[test]
    fn heal_pass_restores_files_lost_from_the_store() {
        let g = gallery();
        let mut p = sample_painting("Dawn");
        g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 800, 600)))
            .unwrap();

        g.store().delete("paintings/large/dawn_large.webp").unwrap();
        assert_eq!(g.heal_paintings().unwrap(), 1);
        assert!(g.store().exists("paintings/large/dawn_large.webp"));

        // A second pass has nothing to do
        assert_eq!(g.heal_paintings().unwrap(), 0);
    }

    #[test]
    fn delete_failure_is_logged_not_fatal() {
        let g = gallery();
        let mut p = sample_painting("Dawn");
        g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 800, 600)))
            .unwrap();
        g.store().fail_delete_on("paintings/original/dawn.jpg");

        // Deletion still succeeds and the row is gone
        g.delete_painting(&p).unwrap();
        assert!(g.db().paintings().unwrap().is_empty());
    }

    #[test]
    fn blog_post_image_without_cover_is_rejected_before_file_io() {
        let g = gallery();
        let mut post = BlogPost::new("Trip", "notes");
        g.save_blog_post(&mut post, None).unwrap();

        let mut image = BlogPostImage::new(post.id.unwrap());
        let err = g
            .save_blog_post_image(&mut image, Some(jpeg_upload("pic.jpg", 300, 200)))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(g.store().put_count(), 0);
        assert!(g.db().images_for_post(post.id.unwrap()).unwrap().is_empty());
    }

    #[test]
    fn blog_cover_is_processed_in_place() {
        let g = gallery();
        let mut post = BlogPost::new("Trip", "notes");
        g.save_blog_post(&mut post, Some(jpeg_upload("venice.jpg", 1600, 800)))
            .unwrap();

        assert_eq!(post.cover_image.as_deref(), Some("blog/covers/venice.webp"));
        let bytes = g.store().get("blog/covers/venice.webp").unwrap();
        let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::WebP).unwrap();
        assert_eq!((img.width(), img.height()), (800, 400));
    }

    #[test]
    fn second_artist_is_rejected_without_touching_the_store() {
        let g = gallery();
        let mut first = Artist::new("Anna", "painter");
        g.save_artist(&mut first, None).unwrap();

        let mut second = Artist::new("Boris", "sculptor");
        let err = g
            .save_artist(&mut second, Some(jpeg_upload("boris.jpg", 100, 100)))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Db(DbError::SingletonExists("artist"))));
        assert_eq!(g.store().put_count(), 0);
    }

    #[test]
    fn slug_is_assigned_once_and_never_recomputed() {
        let g = gallery();
        let mut p = sample_painting("Dawn Over Fields");
        g.save_painting(&mut p, None).unwrap();
        assert_eq!(p.slug, "dawn-over-fields");

        p.title = "Renamed Entirely".into();
        g.save_painting(&mut p, None).unwrap();
        assert_eq!(p.slug, "dawn-over-fields");
    }

    #[test]
    fn empty_title_falls_back_to_untitled() {
        let g = gallery();
        let mut p = sample_painting("!!!");
        g.save_painting(&mut p, None).unwrap();
        assert_eq!(p.slug, "untitled");
    }
}
