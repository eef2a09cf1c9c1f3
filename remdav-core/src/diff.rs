//! Snapshot reconciliation.
//!
//! Everything here is pure set algebra over UID-keyed snapshots. Event
//! bodies are never inspected: a snapshot value type only tags which store
//! the snapshot came from. Both diffs are computed from immutable
//! snapshots taken before any mutation, so applying one set can never
//! perturb the other.

use std::collections::{HashMap, HashSet};

/// Changes to apply to the local store after comparing it with the remote
/// one (the download direction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDiff {
    /// Remote-only UIDs whose bodies must be fetched and appended locally.
    pub to_append: Vec<String>,
    /// Local-only UIDs to remove; empty unless deletion was allowed.
    pub to_remove: Vec<String>,
}

impl DownloadDiff {
    /// Compare the local snapshot against the remote one.
    ///
    /// `allow_delete` guards local removals: without it a partial or
    /// misconfigured remote fetch could wipe the local file.
    pub fn compute<L, R>(
        local: &HashMap<String, L>,
        remote: &HashMap<String, R>,
        allow_delete: bool,
    ) -> Self {
        let to_remove = if allow_delete {
            sorted_difference(local.keys(), remote)
        } else {
            Vec::new()
        };
        let to_append = sorted_difference(remote.keys(), local);

        DownloadDiff {
            to_append,
            to_remove,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_append.is_empty() && self.to_remove.is_empty()
    }
}

/// Changes to apply to the remote store after comparing it with the local
/// one (the upload direction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDiff {
    /// Local-only UIDs to serialize and upload.
    pub to_create: Vec<String>,
    /// Remote UIDs to delete; already restricted to the deletion-eligible
    /// set and empty unless deletion was enabled.
    pub to_delete: Vec<String>,
}

impl UploadDiff {
    /// Compare the local snapshot against the remote one, optionally
    /// scoped by a reference snapshot of the previous run's window.
    ///
    /// Supplying a reference snapshot enables deletion by itself: it is
    /// exactly the information that makes deleting safe.
    pub fn compute<L, R, O>(
        local: &HashMap<String, L>,
        remote: &HashMap<String, R>,
        reference: Option<&HashMap<String, O>>,
        allow_delete: bool,
    ) -> Self {
        let to_create = sorted_difference(local.keys(), remote);

        let to_delete = if allow_delete || reference.is_some() {
            let eligible = eligible_for_deletion(remote, reference);
            let mut uids: Vec<String> = eligible
                .into_iter()
                .filter(|uid| !local.contains_key(uid))
                .collect();
            uids.sort();
            uids
        } else {
            Vec::new()
        };

        UploadDiff {
            to_create,
            to_delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Remote UIDs that may be deleted at all.
///
/// With a reference snapshot only UIDs that were present in the previous
/// local window are eligible: an event created by another client, or one
/// that never fell inside our window, is not ours to delete. Without a
/// reference every remote UID is eligible (the caller then gates on an
/// explicit delete flag instead).
pub fn eligible_for_deletion<R, O>(
    remote: &HashMap<String, R>,
    reference: Option<&HashMap<String, O>>,
) -> HashSet<String> {
    match reference {
        Some(reference) => remote
            .keys()
            .filter(|uid| reference.contains_key(*uid))
            .cloned()
            .collect(),
        None => remote.keys().cloned().collect(),
    }
}

/// `keys − keys(other)`, sorted for deterministic apply order.
fn sorted_difference<'a, T>(
    keys: impl Iterator<Item = &'a String>,
    other: &HashMap<String, T>,
) -> Vec<String> {
    let mut uids: Vec<String> = keys.filter(|uid| !other.contains_key(*uid)).cloned().collect();
    uids.sort();
    uids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(uids: &[&str]) -> HashMap<String, ()> {
        uids.iter().map(|uid| (uid.to_string(), ())).collect()
    }

    #[test]
    fn test_download_diff_is_plain_set_difference() {
        let local = snapshot(&["a", "b"]);
        let remote = snapshot(&["b", "c"]);

        let diff = DownloadDiff::compute(&local, &remote, true);
        assert_eq!(diff.to_append, vec!["c"]);
        assert_eq!(diff.to_remove, vec!["a"]);
    }

    #[test]
    fn test_download_without_delete_never_removes() {
        let local = snapshot(&["a", "b"]);
        let remote = snapshot(&[]);

        let diff = DownloadDiff::compute(&local, &remote, false);
        assert!(diff.to_remove.is_empty());
        assert!(diff.to_append.is_empty());
    }

    #[test]
    fn test_download_is_idempotent() {
        let local = snapshot(&["a"]);
        let remote = snapshot(&["a", "b", "c"]);

        let first = DownloadDiff::compute(&local, &remote, true);
        assert_eq!(first.to_append, vec!["b", "c"]);

        // Apply the first diff to the local snapshot, nothing changes on
        // the remote, and the second run must be a no-op.
        let mut local = local;
        for uid in &first.to_append {
            local.insert(uid.clone(), ());
        }
        for uid in &first.to_remove {
            local.remove(uid);
        }

        let second = DownloadDiff::compute(&local, &remote, true);
        assert!(second.is_empty());
    }

    #[test]
    fn test_upload_diff_three_way() {
        // The canonical case: `c` lives on the server but was never in our
        // window, so it must survive even though it is not local now.
        let remote = snapshot(&["a", "b", "c"]);
        let reference = snapshot(&["a", "b"]);
        let local = snapshot(&["a"]);

        let diff = UploadDiff::compute(&local, &remote, Some(&reference), false);
        assert_eq!(diff.to_delete, vec!["b"]);
        assert!(diff.to_create.is_empty());
    }

    #[test]
    fn test_upload_diff_empty_reference_blocks_all_deletions() {
        let remote = snapshot(&["a", "b"]);
        let reference: HashMap<String, ()> = HashMap::new();
        let local = snapshot(&[]);

        let diff = UploadDiff::compute(&local, &remote, Some(&reference), true);
        assert!(diff.to_delete.is_empty());
    }

    #[test]
    fn test_upload_diff_two_way_requires_delete_flag() {
        let remote = snapshot(&["a", "stale"]);
        let local = snapshot(&["a", "new"]);

        let without = UploadDiff::compute::<_, _, ()>(&local, &remote, None, false);
        assert_eq!(without.to_create, vec!["new"]);
        assert!(without.to_delete.is_empty());

        let with = UploadDiff::compute::<_, _, ()>(&local, &remote, None, true);
        assert_eq!(with.to_create, vec!["new"]);
        assert_eq!(with.to_delete, vec!["stale"]);
    }

    #[test]
    fn test_reference_presence_enables_deletion_without_flag() {
        let remote = snapshot(&["gone"]);
        let reference = snapshot(&["gone"]);
        let local = snapshot(&[]);

        let diff = UploadDiff::compute(&local, &remote, Some(&reference), false);
        assert_eq!(diff.to_delete, vec!["gone"]);
    }

    #[test]
    fn test_eligible_for_deletion_intersects_reference() {
        let remote = snapshot(&["a", "b", "c"]);
        let reference = snapshot(&["b", "c", "d"]);

        let eligible = eligible_for_deletion(&remote, Some(&reference));
        assert_eq!(
            eligible,
            HashSet::from(["b".to_string(), "c".to_string()])
        );

        let unrestricted = eligible_for_deletion::<_, ()>(&remote, None);
        assert_eq!(unrestricted.len(), 3);
    }

    #[test]
    fn test_disjoint_snapshots() {
        let local = snapshot(&["l1", "l2"]);
        let remote = snapshot(&["r1"]);

        let diff = DownloadDiff::compute(&local, &remote, true);
        assert_eq!(diff.to_append, vec!["r1"]);
        assert_eq!(diff.to_remove, vec!["l1", "l2"]);
    }
}
