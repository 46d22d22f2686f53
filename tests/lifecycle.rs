//! End-to-end lifecycle tests against a real media directory.
//!
//! Unit tests cover each component against the in-memory store; these run
//! the full stack — SQLite, the filesystem `OverwriteStore`, and the
//! derivative pipeline — and assert on actual files under a temp media
//! root.

use atelier::db::Database;
use atelier::derivatives::Upload;
use atelier::lifecycle::Gallery;
use atelier::models::{BlogPost, BlogPostImage, Painting};
use atelier::storage::{MediaStore, OverwriteStore};
use chrono::NaiveDate;
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn gallery() -> (Gallery, TempDir) {
    let tmp = TempDir::new().unwrap();
    let db = Database::open_in_memory().unwrap();
    let store = OverwriteStore::new(tmp.path());
    (Gallery::new(db, store), tmp)
}

fn jpeg_upload(name: &str, width: u32, height: u32) -> Upload {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    Upload::new(name, buf)
}

fn painting(title: &str) -> Painting {
    Painting::new(title, "", NaiveDate::from_ymd_opt(2023, 9, 14).unwrap())
}

fn webp_dims(media_root: &Path, name: &str) -> (u32, u32) {
    let bytes = std::fs::read(media_root.join(name)).unwrap();
    let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::WebP).unwrap();
    (img.width(), img.height())
}

#[test]
fn painting_derivatives_match_the_documented_dimensions() {
    let (g, tmp) = gallery();
    let mut p = painting("Dawn");
    g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 2000, 1000)))
        .unwrap();

    // 2000x1000 source: large max-width 1920, medium/small exact 4:3
    assert_eq!(webp_dims(tmp.path(), "paintings/large/dawn_large.webp"), (1920, 960));
    assert_eq!(webp_dims(tmp.path(), "paintings/medium/dawn_medium.webp"), (800, 600));
    assert_eq!(webp_dims(tmp.path(), "paintings/small/dawn_small.webp"), (400, 300));
}

#[test]
fn deleting_a_painting_removes_all_four_files() {
    let (g, tmp) = gallery();
    let mut p = painting("Dawn");
    g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 1600, 1200)))
        .unwrap();

    let files = [
        "paintings/original/dawn.jpg",
        "paintings/small/dawn_small.webp",
        "paintings/medium/dawn_medium.webp",
        "paintings/large/dawn_large.webp",
    ];
    for f in files {
        assert!(tmp.path().join(f).exists(), "{f} should exist before delete");
    }

    g.delete_painting(&p).unwrap();

    for f in files {
        assert!(!tmp.path().join(f).exists(), "{f} should be gone after delete");
    }
    assert!(g.db().paintings().unwrap().is_empty());
}

#[test]
fn replacing_the_source_regenerates_and_removes_stale_files() {
    let (g, tmp) = gallery();
    let mut p = painting("Dawn");
    g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 1600, 1200)))
        .unwrap();

    g.save_painting(&mut p, Some(jpeg_upload("dawn-final.jpg", 2000, 1000)))
        .unwrap();

    // Old names are gone, new names exist
    assert!(!tmp.path().join("paintings/original/dawn.jpg").exists());
    assert!(!tmp.path().join("paintings/small/dawn_small.webp").exists());
    assert!(tmp.path().join("paintings/original/dawn-final.jpg").exists());
    assert_eq!(
        webp_dims(tmp.path(), "paintings/small/dawn-final_small.webp"),
        (400, 300)
    );

    let stored = g.db().painting(p.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("paintings/original/dawn-final.jpg"));
}

#[test]
fn repeated_saves_never_accumulate_suffixed_files() {
    let (g, tmp) = gallery();
    let mut p = painting("Dawn");
    for _ in 0..3 {
        g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 1200, 900)))
            .unwrap();
    }

    let originals: Vec<_> = std::fs::read_dir(tmp.path().join("paintings/original"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(originals, ["dawn.jpg"]);

    let smalls: Vec<_> = std::fs::read_dir(tmp.path().join("paintings/small"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(smalls, ["dawn_small.webp"]);
}

#[test]
fn slug_collisions_count_up_from_the_base() {
    let (g, _tmp) = gallery();
    let mut slugs = Vec::new();
    for _ in 0..3 {
        let mut p = painting("Test Painting");
        g.save_painting(&mut p, None).unwrap();
        slugs.push(p.slug);
    }
    assert_eq!(slugs, ["test-painting", "test-painting-1", "test-painting-2"]);
}

#[test]
fn deleting_a_blog_post_cascades_to_its_images() {
    let (g, tmp) = gallery();
    let mut post = BlogPost::new("Trip", "notes");
    g.save_blog_post(&mut post, Some(jpeg_upload("trip.jpg", 1200, 800)))
        .unwrap();
    let post_id = post.id.unwrap();

    for name in ["one.jpg", "two.jpg"] {
        let mut image = BlogPostImage::new(post_id);
        g.save_blog_post_image(&mut image, Some(jpeg_upload(name, 900, 600)))
            .unwrap();
    }

    let files = [
        "blog/covers/trip.webp",
        "blog/images/one.webp",
        "blog/images/two.webp",
    ];
    for f in files {
        assert!(tmp.path().join(f).exists(), "{f} should exist before delete");
    }

    g.delete_blog_post(&post).unwrap();

    for f in files {
        assert!(!tmp.path().join(f).exists(), "{f} should be gone after delete");
    }
    assert!(g.db().images_for_post(post_id).unwrap().is_empty());
    assert!(g.db().blog_posts().unwrap().is_empty());
}

#[test]
fn cover_and_post_images_are_processed_in_place() {
    let (g, tmp) = gallery();
    let mut post = BlogPost::new("Trip", "notes");
    g.save_blog_post(&mut post, Some(jpeg_upload("venice.jpg", 2400, 1200)))
        .unwrap();

    // max-width 800, aspect preserved, re-encoded to WEBP
    assert_eq!(webp_dims(tmp.path(), "blog/covers/venice.webp"), (800, 400));

    let mut image = BlogPostImage::new(post.id.unwrap());
    g.save_blog_post_image(&mut image, Some(jpeg_upload("canal.jpg", 640, 480)))
        .unwrap();
    // Already under the limit: dimensions unchanged
    assert_eq!(webp_dims(tmp.path(), "blog/images/canal.webp"), (640, 480));
}

#[test]
fn small_source_keeps_its_size_in_the_large_derivative() {
    let (g, tmp) = gallery();
    let mut p = painting("Sketch");
    g.save_painting(&mut p, Some(jpeg_upload("sketch.jpg", 1000, 800)))
        .unwrap();

    // 1000 <= 1920: no resize, just the WEBP re-encode
    assert_eq!(webp_dims(tmp.path(), "paintings/large/sketch_large.webp"), (1000, 800));
}

#[test]
fn concurrent_edits_to_one_record_are_last_write_wins() {
    // There is no locking by design: two handlers loading the same row and
    // saving both succeed, and the later save's fields stand.
    let (g, _tmp) = gallery();
    let mut p = painting("Dawn");
    g.save_painting(&mut p, Some(jpeg_upload("dawn.jpg", 800, 600)))
        .unwrap();
    let id = p.id.unwrap();

    let mut first = g.db().painting(id).unwrap().unwrap();
    let mut second = g.db().painting(id).unwrap().unwrap();

    first.description = "from the first editor".into();
    g.save_painting(&mut first, None).unwrap();

    second.description = "from the second editor".into();
    g.save_painting(&mut second, None).unwrap();

    let stored = g.db().painting(id).unwrap().unwrap();
    assert_eq!(stored.description, "from the second editor");
}

#[test]
fn seed_then_clear_leaves_no_media_behind() {
    let (g, tmp) = gallery();
    atelier::seed::seed(&g).unwrap();
    assert!(g.store().exists("artist/artist_photo.webp"));

    atelier::seed::clear(&g).unwrap();

    // Directories may remain, files may not
    let mut leftovers = Vec::new();
    collect_files(tmp.path(), &mut leftovers);
    assert!(leftovers.is_empty(), "leftover media files: {leftovers:?}");
}

fn collect_files(dir: &Path, out: &mut Vec<String>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path.display().to_string());
        }
    }
}
