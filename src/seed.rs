//! Sample data for development and demos.
//!
//! [`seed`] populates an empty-ish gallery with an artist, site contacts, a
//! paintings catalog, a handful of blog posts with images, and a few
//! contact requests. [`clear`] removes everything again. Both go through the
//! normal [`Gallery`] save/delete entry points — media files are generated,
//! tracked, and released by the same lifecycle the admin surface uses, with
//! no side door.
//!
//! Sample images are rendered in-process (a flat-color gradient per
//! subject), so seeding needs no fixture files on disk.

use crate::derivatives::Upload;
use crate::lifecycle::{Gallery, LifecycleError};
use crate::models::{Artist, BlogPost, BlogPostImage, Painting, SiteContact};
use crate::storage::MediaStore;
use chrono::{Duration, NaiveDate};
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use tracing::info;

/// What a seed or clear run touched, for CLI display.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub artists: usize,
    pub site_contacts: usize,
    pub paintings: usize,
    pub blog_posts: usize,
    pub blog_post_images: usize,
    pub contact_requests: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.artists
            + self.site_contacts
            + self.paintings
            + self.blog_posts
            + self.blog_post_images
            + self.contact_requests
    }
}

const PAINTINGS: &[(&str, &str)] = &[
    ("Sunset Over the River", "Warm evening light reflected in slow water."),
    ("Mountain Landscape", "Massive peaks against a clear blue sky."),
    ("Abstract Harmony", "A composition in blues and greens, all calm."),
    ("Portrait of a Stranger", "A mysterious face with expressive eyes."),
    ("Sea Breeze", "Waves and sails, full of fresh air."),
    ("Forest Path", "A quiet trail through dense woods, sun rays breaking in."),
    ("City Lights", "Night skyline with bright windows and silhouettes."),
    ("Flowers in a Vase", "Still life with bright blooms in glass."),
    ("Winter Forest", "Snowed-in trees covered with frost."),
    ("Summer Rain", "A wet July day in the park."),
    ("Autumn Leaves", "Falling color in an October forest."),
    ("Spring Bloom", "An orchard waking up, full of life."),
    ("Night Sky", "A starred field with the Milky Way overhead."),
    ("River Fog", "Mist over the water at first light."),
];

const BLOG_POSTS: &[(&str, &str)] = &[
    (
        "Notes From a Trip to Italy",
        "Florence and Rome, a sketchbook full of Renaissance. Some of these studies will become paintings.",
    ),
    (
        "How I Build an Abstract Painting",
        "Abstraction is freedom. I work in acrylic and oil and let the colors argue until they settle.",
    ),
    (
        "Exhibition Recap",
        "The show went well, with more visitors than expected. Thank you to everyone who came by.",
    ),
    (
        "Advice for Beginning Painters",
        "Start with fundamentals, practice daily, and study the masters before breaking their rules.",
    ),
    (
        "New Techniques in Landscape",
        "Trying new brushes and textures for skies and water. The results are promising.",
    ),
    (
        "The Story of My First Painting",
        "It was a simple landscape, painted as a child, and I still remember mixing the greens.",
    ),
    (
        "Inspiration From the North",
        "The northern countryside is an endless source of subjects for my work.",
    ),
];

const CONTACT_REQUESTS: &[(&str, &str, &str)] = &[
    (
        "Alexei",
        "alexei@example.com",
        "I am interested in buying 'Sunset Over the River'. Please get in touch.",
    ),
    ("Maria", "maria@example.com", "I would like to commission a portrait. What is the timeline?"),
    ("Dmitry", "dmitry@example.com", "Great site! Congratulations on the exhibition."),
    ("Elena", "elena@example.com", "A question about the price of 'Mountain Landscape'."),
];

/// A deterministic sample bitmap, varied per seed index so derivative files
/// are visually distinguishable.
fn sample_image(width: u32, height: u32, tint: u8) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, tint])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .expect("encoding a generated sample image cannot fail");
    buf
}

/// Populate the gallery with sample content.
///
/// Singletons are left alone when they already exist; everything else is
/// appended. Returns what was created.
pub fn seed<S: MediaStore>(gallery: &Gallery<S>) -> Result<Summary, LifecycleError> {
    let mut summary = Summary::default();

    if gallery.db().artist()?.is_none() {
        let mut artist = Artist::new(
            "Ivan Petrov",
            "Ivan Petrov is a painter from Novosibirsk working in landscape and abstraction. \
             His work has been shown in galleries in Moscow and Saint Petersburg. Born in 1980, \
             he graduated from the academy of fine arts.",
        );
        let upload = Upload::new("artist_photo.jpg", sample_image(1200, 1500, 40));
        gallery.save_artist(&mut artist, Some(upload))?;
        summary.artists += 1;
        info!("created sample artist");
    }

    if gallery.db().site_contact()?.is_none() {
        let mut contact = SiteContact {
            phone: "+7 (123) 456-78-90".into(),
            email: "info@artgallery.example".into(),
            ..SiteContact::default()
        };
        gallery.save_site_contact(&mut contact)?;
        summary.site_contacts += 1;
        info!("created sample site contact");
    }

    let base_date = NaiveDate::from_ymd_opt(2024, 11, 1).expect("valid date");
    for (i, (title, description)) in PAINTINGS.iter().enumerate() {
        let mut painting = Painting::new(*title, *description, base_date - Duration::days(i as i64 * 97));
        painting.is_featured = i % 3 == 0;
        painting.price = if i % 2 == 0 { Some(1000 + i as i64 * 650) } else { None };

        let upload = Upload::new(
            format!("painting_{:02}.jpg", i + 1),
            sample_image(2000, 1000, (i * 17 % 256) as u8),
        );
        gallery.save_painting(&mut painting, Some(upload))?;
        summary.paintings += 1;
    }
    info!(count = summary.paintings, "created sample paintings");

    for (i, (title, content)) in BLOG_POSTS.iter().enumerate() {
        let mut post = BlogPost::new(*title, *content);
        let cover = Upload::new(
            format!("cover_{:02}.jpg", i + 1),
            sample_image(1400, 900, (i * 31 % 256) as u8),
        );
        gallery.save_blog_post(&mut post, Some(cover))?;
        summary.blog_posts += 1;

        // A couple of posts get additional content images
        if i < 2 {
            let post_id = post.id.expect("post was just persisted");
            for j in 0..2 {
                let mut image = BlogPostImage::new(post_id);
                let upload = Upload::new(
                    format!("post_{:02}_image_{}.jpg", i + 1, j + 1),
                    sample_image(1000, 700, (i * 31 + j * 11) as u8),
                );
                gallery.save_blog_post_image(&mut image, Some(upload))?;
                summary.blog_post_images += 1;
            }
        }
    }
    info!(count = summary.blog_posts, "created sample blog posts");

    for (name, email, message) in CONTACT_REQUESTS {
        gallery.submit_contact_request(name, email, message)?;
        summary.contact_requests += 1;
    }
    info!(count = summary.contact_requests, "created sample contact requests");

    Ok(summary)
}

/// Delete every record through the normal delete entry points, media files
/// included. Dependent records go first.
pub fn clear<S: MediaStore>(gallery: &Gallery<S>) -> Result<Summary, LifecycleError> {
    let mut summary = Summary::default();

    // Posts cascade to their images; count the images before they go.
    for post in gallery.db().blog_posts()? {
        if let Some(id) = post.id {
            summary.blog_post_images += gallery.db().images_for_post(id)?.len();
        }
        gallery.delete_blog_post(&post)?;
        summary.blog_posts += 1;
    }

    for painting in gallery.db().paintings()? {
        gallery.delete_painting(&painting)?;
        summary.paintings += 1;
    }

    if let Some(artist) = gallery.db().artist()? {
        gallery.delete_artist(&artist)?;
        summary.artists += 1;
    }

    if let Some(contact) = gallery.db().site_contact()? {
        gallery.delete_site_contact(&contact)?;
        summary.site_contacts += 1;
    }

    for request in gallery.db().contact_requests()? {
        gallery.delete_contact_request(&request)?;
        summary.contact_requests += 1;
    }

    Ok(summary)
}
