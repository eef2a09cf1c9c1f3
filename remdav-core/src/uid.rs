//! Event identity rules.
//!
//! Both stores must agree on UIDs exactly, or every diff degenerates into
//! "everything is new on both sides". Three rules cover all cases:
//!
//! - Events appended by us carry an explicit `# UID:` comment in the Remind
//!   file, so a pulled event keeps the UID it has on the server.
//! - Hand-written REM lines get a UID derived from the line text itself.
//! - Remote resources are named `<uid>.ics` with `@` escaped as `%40`;
//!   canonicalization reverses that escaping.

use sha2::{Digest, Sha256};

/// Derive the UID of a hand-written Remind line: digest of the trimmed
/// line plus the local host, `abcdef...@host`.
pub fn generate_uid(line: &str, host: &str) -> String {
    format!("{}@{}", line_digest(line), host)
}

/// The digest half of a generated UID. `remove` matches on this alone so
/// that a file written on one host can still be edited on another.
pub fn line_digest(line: &str) -> String {
    let digest = Sha256::digest(line.trim().as_bytes());
    hex::encode(&digest[..16])
}

/// Escape a UID for use as a resource name on the server.
pub fn escape_uid(uid: &str) -> String {
    uid.replace('@', "%40")
}

/// Reverse of [`escape_uid`].
pub fn unescape_uid(uid: &str) -> String {
    uid.replace("%40", "@")
}

/// Canonical UID of a remote resource: the basename of its href with the
/// final extension stripped and the `@` escaping undone.
pub fn uid_from_href(href: &str) -> String {
    let name = href
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(href);
    let stem = match name.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => name,
    };
    unescape_uid(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_roundtrip() {
        let uid = "6a5f7e6c9d8b4a3f2e1d0c9b8a7f6e5d@example.org";
        assert_eq!(unescape_uid(&escape_uid(uid)), uid);
        assert!(!escape_uid(uid).contains('@'));
    }

    #[test]
    fn test_uid_from_href_strips_path_and_extension() {
        assert_eq!(
            uid_from_href("/calendars/user/work/abc123%40host.ics"),
            "abc123@host"
        );
        assert_eq!(uid_from_href("plain.ics"), "plain");
    }

    #[test]
    fn test_uid_from_href_keeps_inner_dots() {
        // Only the final extension goes, dots inside the UID survive.
        assert_eq!(
            uid_from_href("/cal/deadbeef%40host.example.com.ics"),
            "deadbeef@host.example.com"
        );
    }

    #[test]
    fn test_generated_uid_is_stable_under_whitespace() {
        let host = "box";
        assert_eq!(
            generate_uid("REM 2026-08-07 MSG Dentist", host),
            generate_uid("  REM 2026-08-07 MSG Dentist  ", host)
        );
        assert_ne!(
            generate_uid("REM 2026-08-07 MSG Dentist", host),
            generate_uid("REM 2026-08-08 MSG Dentist", host)
        );
    }
}
