//! SQLite persistence.
//!
//! A thin synchronous wrapper around `rusqlite`: schema bootstrap at open,
//! per-entity CRUD by primary key, lookups by unique slug, and the handful
//! of ordered/filtered queries the site needs (newest-first listings,
//! featured paintings). No ORM, no query builder — the dataset is small and
//! the queries are fixed.
//!
//! Two invariants live here rather than in any UI layer:
//! - **Singletons**: inserting a second [`Artist`] or [`SiteContact`] row is
//!   rejected at the creation gate with [`DbError::SingletonExists`].
//! - **Referential cleanup**: `blog_post_image.post_id` carries
//!   `ON DELETE CASCADE` as a backstop, but the lifecycle deletes image rows
//!   explicitly first so their files are released.
//!
//! All row ids are SQLite rowids (`INTEGER PRIMARY KEY`). Dates are stored
//! as ISO-8601 text through rusqlite's `chrono` feature, which keeps the
//! `ORDER BY` clauses on date columns correct.

use crate::models::{Artist, BlogPost, BlogPostImage, ContactRequest, Painting, SiteContact};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("a {0} record already exists; at most one is allowed")]
    SingletonExists(&'static str),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS artist (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    bio        TEXT NOT NULL DEFAULT '',
    photo      TEXT
);

CREATE TABLE IF NOT EXISTS painting (
    id            INTEGER PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    creation_date TEXT NOT NULL,
    price         INTEGER,
    is_featured   INTEGER NOT NULL DEFAULT 0,
    slug          TEXT NOT NULL UNIQUE,
    image         TEXT,
    small_image   TEXT,
    medium_image  TEXT,
    large_image   TEXT
);

CREATE TABLE IF NOT EXISTS blog_post (
    id          INTEGER PRIMARY KEY,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    pub_date    TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    cover_image TEXT
);

CREATE TABLE IF NOT EXISTS blog_post_image (
    id      INTEGER PRIMARY KEY,
    post_id INTEGER NOT NULL REFERENCES blog_post(id) ON DELETE CASCADE,
    image   TEXT
);

CREATE TABLE IF NOT EXISTS contact_request (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    email      TEXT NOT NULL,
    message    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS site_contact (
    id             INTEGER PRIMARY KEY,
    phone          TEXT NOT NULL DEFAULT '',
    email          TEXT NOT NULL DEFAULT '',
    vk_link        TEXT NOT NULL DEFAULT '',
    instagram_link TEXT NOT NULL DEFAULT '',
    telegram_link  TEXT NOT NULL DEFAULT ''
);
";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory database, used by the test suite.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // =========================================================================
    // Artist (singleton)
    // =========================================================================

    pub fn insert_artist(&self, artist: &Artist) -> Result<i64, DbError> {
        if self.artist()?.is_some() {
            return Err(DbError::SingletonExists("artist"));
        }
        self.conn.execute(
            "INSERT INTO artist (name, bio, photo) VALUES (?1, ?2, ?3)",
            params![artist.name, artist.bio, artist.photo],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_artist(&self, artist: &Artist) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE artist SET name = ?1, bio = ?2, photo = ?3 WHERE id = ?4",
            params![artist.name, artist.bio, artist.photo, artist.id],
        )?;
        Ok(())
    }

    /// The artist record, if one has been created.
    pub fn artist(&self) -> Result<Option<Artist>, DbError> {
        Ok(self
            .conn
            .query_row("SELECT id, name, bio, photo FROM artist LIMIT 1", [], |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    bio: row.get(2)?,
                    photo: row.get(3)?,
                })
            })
            .optional()?)
    }

    pub fn artist_by_id(&self, id: i64) -> Result<Option<Artist>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, bio, photo FROM artist WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Artist {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        bio: row.get(2)?,
                        photo: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn delete_artist_row(&self, id: i64) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM artist WHERE id = ?1", params![id])?;
        Ok(())
    }

    // =========================================================================
    // Painting
    // =========================================================================

    fn row_to_painting(row: &Row<'_>) -> rusqlite::Result<Painting> {
        Ok(Painting {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            creation_date: row.get(3)?,
            price: row.get(4)?,
            is_featured: row.get(5)?,
            slug: row.get(6)?,
            image: row.get(7)?,
            small_image: row.get(8)?,
            medium_image: row.get(9)?,
            large_image: row.get(10)?,
        })
    }

    const PAINTING_COLS: &'static str = "id, title, description, creation_date, price, \
         is_featured, slug, image, small_image, medium_image, large_image";

    pub fn insert_painting(&self, p: &Painting) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO painting (title, description, creation_date, price, is_featured, \
             slug, image, small_image, medium_image, large_image) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                p.title,
                p.description,
                p.creation_date,
                p.price,
                p.is_featured,
                p.slug,
                p.image,
                p.small_image,
                p.medium_image,
                p.large_image,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_painting(&self, p: &Painting) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE painting SET title = ?1, description = ?2, creation_date = ?3, \
             price = ?4, is_featured = ?5, slug = ?6, image = ?7, small_image = ?8, \
             medium_image = ?9, large_image = ?10 WHERE id = ?11",
            params![
                p.title,
                p.description,
                p.creation_date,
                p.price,
                p.is_featured,
                p.slug,
                p.image,
                p.small_image,
                p.medium_image,
                p.large_image,
                p.id,
            ],
        )?;
        Ok(())
    }

    pub fn painting(&self, id: i64) -> Result<Option<Painting>, DbError> {
        let sql = format!("SELECT {} FROM painting WHERE id = ?1", Self::PAINTING_COLS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_painting)
            .optional()?)
    }

    pub fn painting_by_slug(&self, slug: &str) -> Result<Option<Painting>, DbError> {
        let sql = format!("SELECT {} FROM painting WHERE slug = ?1", Self::PAINTING_COLS);
        Ok(self
            .conn
            .query_row(&sql, params![slug], Self::row_to_painting)
            .optional()?)
    }

    /// All paintings, newest first.
    pub fn paintings(&self) -> Result<Vec<Painting>, DbError> {
        let sql = format!(
            "SELECT {} FROM painting ORDER BY creation_date DESC, id DESC",
            Self::PAINTING_COLS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_painting)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Featured paintings, newest first.
    pub fn featured_paintings(&self) -> Result<Vec<Painting>, DbError> {
        let sql = format!(
            "SELECT {} FROM painting WHERE is_featured = 1 \
             ORDER BY creation_date DESC, id DESC",
            Self::PAINTING_COLS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_painting)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Whether `slug` is taken by a painting other than `exclude`.
    pub fn painting_slug_taken(&self, slug: &str, exclude: Option<i64>) -> Result<bool, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM painting WHERE slug = ?1 AND id IS NOT ?2",
            params![slug, exclude],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn delete_painting_row(&self, id: i64) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM painting WHERE id = ?1", params![id])?;
        Ok(())
    }

    // =========================================================================
    // Blog
    // =========================================================================

    fn row_to_blog_post(row: &Row<'_>) -> rusqlite::Result<BlogPost> {
        Ok(BlogPost {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            pub_date: row.get(3)?,
            slug: row.get(4)?,
            cover_image: row.get(5)?,
        })
    }

    const BLOG_POST_COLS: &'static str = "id, title, content, pub_date, slug, cover_image";

    pub fn insert_blog_post(&self, post: &BlogPost) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO blog_post (title, content, pub_date, slug, cover_image) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![post.title, post.content, post.pub_date, post.slug, post.cover_image],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_blog_post(&self, post: &BlogPost) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE blog_post SET title = ?1, content = ?2, pub_date = ?3, slug = ?4, \
             cover_image = ?5 WHERE id = ?6",
            params![
                post.title,
                post.content,
                post.pub_date,
                post.slug,
                post.cover_image,
                post.id,
            ],
        )?;
        Ok(())
    }

    pub fn blog_post(&self, id: i64) -> Result<Option<BlogPost>, DbError> {
        let sql = format!("SELECT {} FROM blog_post WHERE id = ?1", Self::BLOG_POST_COLS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_blog_post)
            .optional()?)
    }

    pub fn blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, DbError> {
        let sql = format!(
            "SELECT {} FROM blog_post WHERE slug = ?1",
            Self::BLOG_POST_COLS
        );
        Ok(self
            .conn
            .query_row(&sql, params![slug], Self::row_to_blog_post)
            .optional()?)
    }

    /// All posts, newest first.
    pub fn blog_posts(&self) -> Result<Vec<BlogPost>, DbError> {
        let sql = format!(
            "SELECT {} FROM blog_post ORDER BY pub_date DESC, id DESC",
            Self::BLOG_POST_COLS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_blog_post)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn blog_post_slug_taken(&self, slug: &str, exclude: Option<i64>) -> Result<bool, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM blog_post WHERE slug = ?1 AND id IS NOT ?2",
            params![slug, exclude],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn delete_blog_post_row(&self, id: i64) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM blog_post WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn insert_blog_post_image(&self, img: &BlogPostImage) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO blog_post_image (post_id, image) VALUES (?1, ?2)",
            params![img.post_id, img.image],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_blog_post_image(&self, img: &BlogPostImage) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE blog_post_image SET post_id = ?1, image = ?2 WHERE id = ?3",
            params![img.post_id, img.image, img.id],
        )?;
        Ok(())
    }

    pub fn blog_post_image(&self, id: i64) -> Result<Option<BlogPostImage>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, post_id, image FROM blog_post_image WHERE id = ?1",
                params![id],
                |row| {
                    Ok(BlogPostImage {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        image: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    /// Images attached to a post, in insertion order.
    pub fn images_for_post(&self, post_id: i64) -> Result<Vec<BlogPostImage>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, image FROM blog_post_image WHERE post_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![post_id], |row| {
            Ok(BlogPostImage {
                id: row.get(0)?,
                post_id: row.get(1)?,
                image: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_blog_post_image_row(&self, id: i64) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM blog_post_image WHERE id = ?1", params![id])?;
        Ok(())
    }

    // =========================================================================
    // Contact
    // =========================================================================

    pub fn insert_contact_request(&self, req: &ContactRequest) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO contact_request (name, email, message, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![req.name, req.email, req.message, req.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All contact requests, newest first.
    pub fn contact_requests(&self) -> Result<Vec<ContactRequest>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, message, created_at FROM contact_request \
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ContactRequest {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                message: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_contact_request_row(&self, id: i64) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM contact_request WHERE id = ?1", params![id])?;
        Ok(())
    }

    // =========================================================================
    // Site contact (singleton)
    // =========================================================================

    pub fn insert_site_contact(&self, contact: &SiteContact) -> Result<i64, DbError> {
        if self.site_contact()?.is_some() {
            return Err(DbError::SingletonExists("site contact"));
        }
        self.conn.execute(
            "INSERT INTO site_contact (phone, email, vk_link, instagram_link, telegram_link) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                contact.phone,
                contact.email,
                contact.vk_link,
                contact.instagram_link,
                contact.telegram_link,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_site_contact(&self, contact: &SiteContact) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE site_contact SET phone = ?1, email = ?2, vk_link = ?3, \
             instagram_link = ?4, telegram_link = ?5 WHERE id = ?6",
            params![
                contact.phone,
                contact.email,
                contact.vk_link,
                contact.instagram_link,
                contact.telegram_link,
                contact.id,
            ],
        )?;
        Ok(())
    }

    pub fn site_contact(&self) -> Result<Option<SiteContact>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, phone, email, vk_link, instagram_link, telegram_link \
                 FROM site_contact LIMIT 1",
                [],
                |row| {
                    Ok(SiteContact {
                        id: row.get(0)?,
                        phone: row.get(1)?,
                        email: row.get(2)?,
                        vk_link: row.get(3)?,
                        instagram_link: row.get(4)?,
                        telegram_link: row.get(5)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn delete_site_contact_row(&self, id: i64) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM site_contact WHERE id = ?1", params![id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn painting(title: &str, slug: &str, date: (i32, u32, u32)) -> Painting {
        let mut p = Painting::new(
            title,
            "",
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        );
        p.slug = slug.to_string();
        p
    }

    #[test]
    fn painting_round_trips_through_sqlite() {
        let db = db();
        let mut p = painting("Dawn", "dawn", (2023, 6, 1));
        p.price = Some(4500);
        p.is_featured = true;
        p.image = Some("paintings/original/dawn.jpg".into());
        p.small_image = Some("paintings/small/dawn_small.webp".into());

        let id = db.insert_painting(&p).unwrap();
        p.id = Some(id);

        let loaded = db.painting(id).unwrap().unwrap();
        assert_eq!(loaded, p);
    }

    #[test]
    fn paintings_are_ordered_newest_first() {
        let db = db();
        db.insert_painting(&painting("Old", "old", (2020, 1, 1))).unwrap();
        db.insert_painting(&painting("New", "new", (2024, 1, 1))).unwrap();
        db.insert_painting(&painting("Mid", "mid", (2022, 1, 1))).unwrap();

        let titles: Vec<String> = db.paintings().unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, ["New", "Mid", "Old"]);
    }

    #[test]
    fn featured_filter_keeps_ordering() {
        let db = db();
        let mut a = painting("A", "a", (2020, 1, 1));
        a.is_featured = true;
        let b = painting("B", "b", (2022, 1, 1));
        let mut c = painting("C", "c", (2024, 1, 1));
        c.is_featured = true;
        for p in [&a, &b, &c] {
            db.insert_painting(p).unwrap();
        }

        let titles: Vec<String> = db
            .featured_paintings()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["C", "A"]);
    }

    #[test]
    fn slug_lookup_and_collision_probe() {
        let db = db();
        let id = db.insert_painting(&painting("Dawn", "dawn", (2023, 1, 1))).unwrap();

        assert_eq!(db.painting_by_slug("dawn").unwrap().unwrap().title, "Dawn");
        assert!(db.painting_by_slug("dusk").unwrap().is_none());

        assert!(db.painting_slug_taken("dawn", None).unwrap());
        // A record never collides with itself
        assert!(!db.painting_slug_taken("dawn", Some(id)).unwrap());
        assert!(!db.painting_slug_taken("dusk", None).unwrap());
    }

    #[test]
    fn artist_singleton_gate_rejects_second_insert() {
        let db = db();
        db.insert_artist(&Artist::new("First", "bio")).unwrap();
        let err = db.insert_artist(&Artist::new("Second", "bio")).unwrap_err();
        assert!(matches!(err, DbError::SingletonExists("artist")));
    }

    #[test]
    fn site_contact_singleton_gate_rejects_second_insert() {
        let db = db();
        db.insert_site_contact(&SiteContact::default()).unwrap();
        let err = db.insert_site_contact(&SiteContact::default()).unwrap_err();
        assert!(matches!(err, DbError::SingletonExists("site contact")));
    }

    #[test]
    fn images_for_post_returns_only_that_posts_images() {
        let db = db();
        let mut p1 = BlogPost::new("One", "content");
        p1.slug = "one".into();
        let mut p2 = BlogPost::new("Two", "content");
        p2.slug = "two".into();
        let id1 = db.insert_blog_post(&p1).unwrap();
        let id2 = db.insert_blog_post(&p2).unwrap();

        db.insert_blog_post_image(&BlogPostImage::new(id1)).unwrap();
        db.insert_blog_post_image(&BlogPostImage::new(id1)).unwrap();
        db.insert_blog_post_image(&BlogPostImage::new(id2)).unwrap();

        assert_eq!(db.images_for_post(id1).unwrap().len(), 2);
        assert_eq!(db.images_for_post(id2).unwrap().len(), 1);
    }

    #[test]
    fn contact_requests_are_newest_first() {
        let db = db();
        for name in ["first", "second"] {
            db.insert_contact_request(&ContactRequest::new(name, "a@b.c", "hello"))
                .unwrap();
        }
        let names: Vec<String> = db
            .contact_requests()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        // Identical timestamps fall back to id DESC
        assert_eq!(names, ["second", "first"]);
    }
}
