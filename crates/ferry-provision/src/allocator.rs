//! Destination name allocation
//!
//! Candidate names come from a pattern applied to the source base name and a
//! per-folder index. The index only ever grows, so two runs landing files in
//! the same folder never try the same index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Apply a destination name pattern to a source file name
///
/// `{0}` is replaced by the file stem and `{1}` by the index; any other
/// `{...}` text is kept as written. The source extension is re-appended to
/// the result.
///
/// # Examples
///
/// ```
/// use ferry_provision::allocator::format_candidate;
///
/// assert_eq!(format_candidate("{0}", "report.csv", 3), "report.csv");
/// assert_eq!(format_candidate("{0}_{1}", "report.csv", 0), "report_0.csv");
/// assert_eq!(format_candidate("{1}-{0}", "notes", 7), "7-notes");
/// ```
pub fn format_candidate(pattern: &str, file_name: &str, index: u64) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut formatted = String::with_capacity(pattern.len() + stem.len());
    let mut rest = pattern;
    while let Some(start) = rest.find('{') {
        formatted.push_str(&rest[..start]);
        let token = &rest[start..];
        if token.starts_with("{0}") {
            formatted.push_str(&stem);
        } else if token.starts_with("{1}") {
            formatted.push_str(&index.to_string());
        } else {
            formatted.push('{');
            rest = &token[1..];
            continue;
        }
        rest = &token[3..];
    }
    formatted.push_str(rest);

    if let Some(ext) = extension {
        formatted.push('.');
        formatted.push_str(&ext);
    }
    formatted
}

/// True when the pattern produces a different name for each index
pub fn pattern_uses_index(pattern: &str) -> bool {
    pattern.contains("{1}")
}

/// Hands out candidate destination file names, one folder index at a time
///
/// Constructed once per hosting process and shared (e.g. through an `Arc`)
/// by every provisioning run. The read-increment-write of a folder's index
/// happens under one lock, and the lock is released before the caller
/// touches the file system.
#[derive(Debug, Default)]
pub struct DestinationNameAllocator {
    last_tried: Mutex<HashMap<PathBuf, u64>>,
}

impl DestinationNameAllocator {
    /// Create an allocator with no folder history
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, u64>> {
        self.last_tried.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Produce the next untried candidate name for `folder`
    ///
    /// Returns `None` when the new candidate is identical to
    /// `previous_candidate`: the pattern does not depend on the index, so no
    /// other name will ever come out of it. The folder index is only
    /// advanced when a candidate is returned.
    pub fn next_candidate(
        &self,
        previous_candidate: Option<&str>,
        folder: &Path,
        file_name: &str,
        pattern: &str,
    ) -> Option<String> {
        let mut state = self.lock();

        let index = state.get(folder).map_or(0, |last| last + 1);
        let candidate = format_candidate(pattern, file_name, index);

        if previous_candidate == Some(candidate.as_str()) {
            tracing::debug!(
                folder = %folder.display(),
                candidate = %candidate,
                "destination names exhausted"
            );
            return None;
        }

        state.insert(folder.to_path_buf(), index);
        Some(candidate)
    }

    /// Last index handed out for a folder, if any
    pub fn last_index(&self, folder: &Path) -> Option<u64> {
        self.lock().get(folder).copied()
    }

    /// Number of folders the allocator has seen
    pub fn folder_count(&self) -> usize {
        self.lock().len()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A pattern without the index placeholder is exhausted after one name
        #[test]
        fn test_index_free_pattern_terminates(stem in "[a-z]{1,12}", ext in "[a-z]{1,4}", prefix in "[a-z_]{0,5}") {
            let allocator = DestinationNameAllocator::new();
            let folder = Path::new("/out");
            let file_name = format!("{}.{}", stem, ext);
            let pattern = format!("{}{{0}}", prefix);

            let first = allocator.next_candidate(None, folder, &file_name, &pattern);
            prop_assert!(first.is_some());
            let second = allocator.next_candidate(first.as_deref(), folder, &file_name, &pattern);
            prop_assert_eq!(second, None);
        }

        /// An indexed pattern never repeats a name for the same folder
        #[test]
        fn test_indexed_pattern_never_repeats(stem in "[a-z]{1,12}", calls in 1usize..64) {
            let allocator = DestinationNameAllocator::new();
            let folder = Path::new("/out");
            let file_name = format!("{}.csv", stem);

            let mut seen = std::collections::HashSet::new();
            let mut previous: Option<String> = None;
            for _ in 0..calls {
                let candidate = allocator.next_candidate(previous.as_deref(), folder, &file_name, "{0}_{1}");
                prop_assert!(candidate.is_some());
                let candidate = candidate.unwrap();
                prop_assert!(seen.insert(candidate.clone()));
                previous = Some(candidate);
            }
        }
    }
}
