//! Upload conflict detection
//!
//! Pure helper consumed after a scan: decides whether any candidate entry
//! would collide with an item already present in the target listing. For a
//! folder upload only the top-level segment matters - uploading `dir/a.txt`
//! conflicts with an existing `dir`, not with an existing `a.txt`.

use crate::scan::ScanEntry;

/// One item of an existing directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Item name (single path segment)
    pub name: String,
}

impl ListingItem {
    /// Convenience constructor
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The name a candidate competes under
///
/// The top-level path segment when the candidate carries a multi-segment
/// path (folder upload), otherwise the candidate's own name.
fn compared_name(entry: &ScanEntry) -> &str {
    let full_path = entry.full_path();
    match full_path.split_once('/') {
        Some((top, _)) => top,
        None => full_path,
    }
}

/// Check whether any candidate collides with an existing item
///
/// Exact, case-sensitive string comparison; returns on the first match.
pub fn has_conflict(candidates: &[ScanEntry], existing: &[ListingItem]) -> bool {
    candidates.iter().any(|candidate| {
        let name = compared_name(candidate);
        existing.iter().any(|item| item.name == name)
    })
}
