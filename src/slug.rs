//! URL slug derivation.
//!
//! Paintings and blog posts get a URL slug derived from their title on first
//! save. [`slugify`] is the pure derivation; collision handling (the `-1`,
//! `-2`, … counter against the database) lives in
//! [`lifecycle`](crate::lifecycle), bounded by [`MAX_SLUG_ATTEMPTS`] so a
//! pathological title fails loudly instead of looping forever.

/// Upper bound on the `-N` collision counter before giving up.
pub const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Fallback slug for titles with no usable characters.
pub const FALLBACK_SLUG: &str = "untitled";

/// Derive a URL slug from a title: lowercase ASCII alphanumeric runs joined
/// by single dashes, everything else dropped.
///
/// - `"Test Painting"` → `"test-painting"`
/// - `"Sunset -- over the River!"` → `"sunset-over-the-river"`
/// - `"  "` → `""` (callers substitute [`FALLBACK_SLUG`])
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// The candidate for collision round `n`: the base itself for round 0,
/// `base-n` afterwards.
pub fn numbered_slug(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}
