//! # Atelier
//!
//! A content-managed art gallery backend: artist profile, paintings catalog,
//! blog, and a contact form, backed by SQLite and a media directory. The
//! heart of the crate is the **image derivative pipeline** — the machinery
//! that takes one uploaded source image, deterministically produces its
//! resized/cropped/re-encoded variants, keeps them in sync with the source
//! across updates, and guarantees no orphaned file ever outlives its record.
//!
//! # Architecture: Policy-Driven Pipeline
//!
//! Every source-image field is described by a declarative policy, and one
//! generic reconcile pass keeps reality matching it:
//!
//! ```text
//! save(entity, upload?)  →  changed?  →  reconcile  →  render per slot  →  store  →  persist row
//! ```
//!
//! This shape exists for three reasons:
//!
//! - **One pipeline, not one per entity**: paintings, covers, and photos
//!   differ only in policy data, never in save logic.
//! - **Deterministic names**: derivative files are named from the source
//!   basename plus a fixed suffix, so regeneration overwrites instead of
//!   accumulating suffixed duplicates.
//! - **Testability**: crop math, rendering, storage, and lifecycle each sit
//!   behind a seam that unit tests can exercise in isolation.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pure-Rust image operations: crop-to-aspect, resize, WEBP encode |
//! | [`storage`] | Overwrite-safe media persistence under the media root |
//! | [`derivatives`] | Per-entity policy tables and the reconcile pass |
//! | [`models`] | Content entities and the [`models::FileOwner`] contract |
//! | [`db`] | SQLite persistence: CRUD, slug lookups, ordered queries, singleton gates |
//! | [`lifecycle`] | Save/delete entry points tying it all together |
//! | [`slug`] | URL slug derivation from titles |
//! | [`config`] | `atelier.toml` loading and validation |
//! | [`seed`] | Sample content for development, via the normal lifecycle |
//!
//! # Design Decisions
//!
//! ## WEBP-Only Derivatives
//!
//! Every generated image is lossy WEBP. The format has had universal browser
//! support for years and produces markedly smaller files than JPEG at
//! equivalent quality. A single output format keeps the media directory and
//! the serving layer simple.
//!
//! ## Overwrite Storage
//!
//! Derivative names are a pure function of the source filename, so the store
//! replaces on write rather than renaming. Without that, every repeated save
//! would leave `name-1`, `name-2`, … garbage behind — the classic failure
//! mode this crate exists to prevent.
//!
//! ## Synchronous, Single-Threaded Writes
//!
//! Saves and deletes run start-to-finish inside one call: decode, encode,
//! and file I/O are blocking and inline. There is no job queue and no
//! locking; the surrounding request layer serializes writes and the dataset
//! is small. Concurrent edits to the same record are an accepted
//! last-write-wins race, documented in the test suite.
//!
//! ## SQLite Without an ORM
//!
//! The query set is small and fixed (newest-first listings, featured
//! filter, slug lookups), so the persistence layer is a plain `rusqlite`
//! wrapper. Two invariants live at that gate: the singleton artist/contact
//! rows, and cascading cleanup for blog post images.

pub mod config;
pub mod db;
pub mod derivatives;
pub mod imaging;
pub mod lifecycle;
pub mod models;
pub mod seed;
pub mod slug;
pub mod storage;
