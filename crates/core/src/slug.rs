//! Unique slug assignment.
//!
//! A slug is the transliterated, lowercased, hyphen-separated form of a
//! title. When the plain form is already taken, an 8-character random hex
//! suffix is appended to it until a free candidate turns up. Each retry
//! starts again from the plain form, so suffixes never pile up.
//!
//! The existence check and the later insert are not atomic. Two concurrent
//! writers can both see a candidate as free; the unique column then rejects
//! the second insert with a conflict.

use std::future::Future;

use quire_common::{AppError, AppResult, IdGenerator};
use tracing::debug;

/// Longest base slug that still fits a 255-character column once
/// `-` and the 8-character suffix are appended.
pub const MAX_BASE_LEN: usize = 246;

/// Derive the base slug for `source`.
///
/// Non-ASCII text is transliterated, so `"Привет, мир"` becomes
/// `"privet-mir"`. Symbol-only input yields an empty string.
#[must_use]
pub fn base_slug(source: &str) -> String {
    let mut base = ::slug::slugify(source);
    if base.len() > MAX_BASE_LEN {
        // slugify output is ASCII, any byte offset is a char boundary
        base.truncate(MAX_BASE_LEN);
        let trimmed = base.trim_end_matches('-').len();
        base.truncate(trimmed);
    }
    base
}

fn suffixed(base: &str, id_gen: &IdGenerator) -> String {
    format!("{base}-{}", id_gen.generate_slug_suffix())
}

/// Assign a slug using a synchronous existence check.
///
/// An already-set, non-empty slug is returned unchanged.
pub fn assign_slug(
    existing: Option<&str>,
    source: &str,
    mut exists: impl FnMut(&str) -> bool,
) -> String {
    if let Some(slug) = existing.filter(|s| !s.is_empty()) {
        return slug.to_string();
    }

    let base = base_slug(source);
    if !exists(&base) {
        return base;
    }

    let id_gen = IdGenerator::new();
    loop {
        let candidate = suffixed(&base, &id_gen);
        if !exists(&candidate) {
            return candidate;
        }
        debug!(candidate = %candidate, "Slug candidate taken, retrying");
    }
}

/// Assign a slug using a fallible asynchronous existence check, usually a
/// repository lookup.
///
/// Fails with [`AppError::Validation`] when `source` has no sluggable
/// characters, and with whatever error `exists` returns.
pub async fn assign_unique_slug<F, Fut>(
    existing: Option<&str>,
    source: &str,
    mut exists: F,
) -> AppResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    if let Some(slug) = existing.filter(|s| !s.is_empty()) {
        return Ok(slug.to_string());
    }

    let base = base_slug(source);
    if base.is_empty() {
        return Err(AppError::Validation(format!(
            "cannot derive a slug from {source:?}"
        )));
    }

    if !exists(base.clone()).await? {
        return Ok(base);
    }

    let id_gen = IdGenerator::new();
    loop {
        let candidate = suffixed(&base, &id_gen);
        if !exists(candidate.clone()).await? {
            debug!(base = %base, slug = %candidate, "Assigned suffixed slug");
            return Ok(candidate);
        }
        debug!(candidate = %candidate, "Slug candidate taken, retrying");
    }
}
