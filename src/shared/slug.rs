/// Width of the `categories.slug` column
pub const MAX_SLUG_LENGTH: usize = 255;

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, turns every run of characters that are not ASCII
/// alphanumeric into a single hyphen and trims edge hyphens:
/// - "Electronics" -> "electronics"
/// - "Home & Garden" -> "home-garden"
/// - "  Men's Clothing " -> "men-s-clothing"
///
/// The result is empty when the name has no ASCII alphanumerics, and is cut
/// to [`MAX_SLUG_LENGTH`].
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    truncate(&slug, MAX_SLUG_LENGTH).to_string()
}

/// Candidate used for the `attempt`-th collision (`base-1`, `base-2`, ...).
///
/// `base` is shortened as needed so the candidate still fits the column.
pub fn with_suffix(base: &str, attempt: u32) -> String {
    let suffix = format!("-{}", attempt);
    let head = truncate(base, MAX_SLUG_LENGTH.saturating_sub(suffix.len()));
    format!("{}{}", head, suffix)
}

/// Whether `slug` is `base` itself or one of its collision candidates
pub fn is_variant_of(slug: &str, base: &str) -> bool {
    if slug == base {
        return true;
    }

    slug.rsplit_once('-')
        .and_then(|(_, n)| n.parse::<u32>().ok())
        .is_some_and(|attempt| attempt > 0 && with_suffix(base, attempt) == slug)
}

// Slugs are ASCII, so any byte index is a char boundary
fn truncate(slug: &str, max: usize) -> &str {
    slug[..slug.len().min(max)].trim_end_matches('-')
}
