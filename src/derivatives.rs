//! Per-entity derivative policy and reconciliation.
//!
//! One generic component replaces what would otherwise be a near-identical
//! save routine per entity type. Each source-image field is described by a
//! [`SourcePolicy`]: where the source lives, whether the upload itself is
//! re-encoded before storing ("process in place"), and which derivative
//! slots are generated from it. The policies are constants — changing what a
//! painting's catalog thumbnail looks like is a data edit, not new code.
//!
//! [`reconcile`] renders and stores every slot of a policy from one decoded
//! source. Slots are independent: a failure in one does not stop the
//! attempts on the others, but any failure fails the reconcile as a whole so
//! the caller never persists a record pointing at a partial derivative set.
//!
//! Derivative names are deterministic, `basename(source) + suffix + ".webp"`
//! under the slot's directory, which is what makes the overwrite semantics
//! of [`MediaStore`] load-bearing: regenerating writes to the same names.

use crate::imaging::{DerivativeSpec, Quality, RenderError, ResizePolicy, render, render_image};
use crate::storage::{MediaStore, StorageError};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DerivativeError {
    #[error("image processing failed: {0}")]
    Render(#[from] RenderError),
    #[error("media storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// A new source image accompanying a save: the client filename plus the
/// uploaded bytes. An upload always counts as a source change — it is a new
/// reference even when the bytes happen to be identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// One generated variant of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeSlot {
    /// Key the lifecycle maps back onto an entity field (`"small"`, …).
    pub name: &'static str,
    /// Directory under the media root where this variant is stored.
    pub dir: &'static str,
    /// Filename suffix appended to the source basename.
    pub suffix: &'static str,
    pub spec: DerivativeSpec,
}

/// Everything the pipeline needs to know about one source-image field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePolicy {
    /// Directory under the media root where the source itself is stored.
    pub dir: &'static str,
    /// When set, the upload is rendered through this spec and stored as
    /// WEBP instead of keeping the original bytes.
    pub process: Option<DerivativeSpec>,
    pub derivatives: &'static [DerivativeSlot],
}

/// Artist photo: resized in place, no derivatives.
pub const ARTIST_PHOTO: SourcePolicy = SourcePolicy {
    dir: "artist",
    process: Some(DerivativeSpec {
        crop_ratio: None,
        resize: ResizePolicy::MaxWidth(800),
        quality: Quality(90),
    }),
    derivatives: &[],
};

/// Painting original: stored as uploaded, three derivatives generated.
pub const PAINTING_IMAGE: SourcePolicy = SourcePolicy {
    dir: "paintings/original",
    process: None,
    derivatives: &[
        DerivativeSlot {
            name: "small",
            dir: "paintings/small",
            suffix: "_small",
            spec: DerivativeSpec {
                crop_ratio: Some((4, 3)),
                resize: ResizePolicy::Exact(400, 300),
                quality: Quality(80),
            },
        },
        DerivativeSlot {
            name: "medium",
            dir: "paintings/medium",
            suffix: "_medium",
            spec: DerivativeSpec {
                crop_ratio: Some((4, 3)),
                resize: ResizePolicy::Exact(800, 600),
                quality: Quality(85),
            },
        },
        DerivativeSlot {
            name: "large",
            dir: "paintings/large",
            suffix: "_large",
            spec: DerivativeSpec {
                crop_ratio: None,
                resize: ResizePolicy::MaxWidth(1920),
                quality: Quality(90),
            },
        },
    ],
};

/// Blog post cover: resized in place, no derivatives.
pub const BLOG_COVER: SourcePolicy = SourcePolicy {
    dir: "blog/covers",
    process: Some(DerivativeSpec {
        crop_ratio: None,
        resize: ResizePolicy::MaxWidth(800),
        quality: Quality(85),
    }),
    derivatives: &[],
};

/// Additional blog post image: same treatment as the cover.
pub const BLOG_IMAGE: SourcePolicy = SourcePolicy {
    dir: "blog/images",
    process: Some(DerivativeSpec {
        crop_ratio: None,
        resize: ResizePolicy::MaxWidth(800),
        quality: Quality(85),
    }),
    derivatives: &[],
};

/// Whether the source field changed between the persisted prior state and
/// the in-memory value. Comparison is by stored reference, never by pixel
/// content.
pub fn source_changed(old: Option<&str>, new: Option<&str>) -> bool {
    old != new
}

/// Filename portion of a stored name, extension stripped.
fn basename_stem(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}

/// Deterministic stored name for one derivative of `source`.
pub fn derivative_name(source: &str, slot: &DerivativeSlot) -> String {
    format!("{}/{}{}.webp", slot.dir, basename_stem(source), slot.suffix)
}

/// Store a new upload according to the policy.
///
/// Process-in-place policies re-encode the bytes and store them under the
/// source basename with a `.webp` extension; otherwise the original bytes
/// are stored under the original filename. Returns the stored name.
pub fn store_upload(
    store: &impl MediaStore,
    policy: &SourcePolicy,
    upload: &Upload,
) -> Result<String, DerivativeError> {
    match &policy.process {
        Some(spec) => {
            let rendered = render(&upload.bytes, spec)?;
            let name = format!("{}/{}.webp", policy.dir, basename_stem(&upload.filename));
            Ok(store.put(&name, &rendered)?)
        }
        None => {
            let name = format!("{}/{}", policy.dir, upload.filename);
            Ok(store.put(&name, &upload.bytes)?)
        }
    }
}

/// Render and store every derivative slot of `policy` from the source.
///
/// Returns the stored name per slot, keyed by slot name. Every slot is
/// attempted even after an earlier one fails; the first error is returned
/// once all attempts are done, and the caller must not persist any of the
/// refs in that case.
pub fn reconcile(
    store: &impl MediaStore,
    policy: &SourcePolicy,
    source_name: &str,
    source_bytes: &[u8],
) -> Result<BTreeMap<&'static str, String>, DerivativeError> {
    let decoded = crate::imaging::decode(source_bytes)?;

    let mut refs = BTreeMap::new();
    let mut first_err: Option<DerivativeError> = None;

    for slot in policy.derivatives {
        let result = render_image(&decoded, &slot.spec)
            .map_err(DerivativeError::from)
            .and_then(|bytes| {
                store
                    .put(&derivative_name(source_name, slot), &bytes)
                    .map_err(DerivativeError::from)
            });
        match result {
            Ok(stored) => {
                refs.insert(slot.name, stored);
            }
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(refs),
    }
}
