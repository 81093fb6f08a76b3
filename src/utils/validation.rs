//! Centralized input limits.

/// Maximum number of records accepted in a single TOC (DOS protection)
pub const MAX_RECORDS: usize = 10_000;

/// Maximum length of a `concept_id`, in bytes
pub const MAX_IDENTITY_LENGTH: usize = 256;

/// Check whether a TOC with `count` records is within [`MAX_RECORDS`].
///
/// Returns an error message if the limit is exceeded, None if safe.
///
/// # Examples
///
/// ```
/// use toc_align::utils::validation::{check_record_limit, MAX_RECORDS};
///
/// assert!(check_record_limit(10).is_none());
/// assert!(check_record_limit(MAX_RECORDS + 1).is_some());
/// ```
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count > MAX_RECORDS {
        Some(format!(
            "Too many records: {count} exceeds maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}
