//! version::pseudo
//!
//! Pseudo-version synthesis and validation.
//!
//! A pseudo-version is a synthetic version string for a commit with no
//! exact matching tag. It encodes the major version, the nearest base tag
//! (if any), the committer timestamp in UTC at second precision, and a
//! 12-character revision prefix, in one of three forms:
//!
//! - `v0.0.0-20240131120000-abcdefabcdef` (no base tag)
//! - `v1.2.4-0.20240131120000-abcdefabcdef` (base release `v1.2.3`)
//! - `v1.2.3-rc.1.0.20240131120000-abcdefabcdef` (base prerelease)
//!
//! The encoding sorts a pseudo-version after its base tag and before the
//! next release, so pseudo-versions interleave correctly with real tags.
//! Well-formedness is checked by pattern, never assumed.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

/// Length of the revision prefix embedded in pseudo-versions.
pub const SHORT_HASH_LEN: usize = 12;

fn pseudo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^v[0-9]+\.(0\.0-|\d+\.\d+-([^+]*\.)?0\.)\d{14}-[0-9A-Fa-f]+(\+[0-9A-Za-z-]+(\.[0-9A-Za-z-]+)*)?$",
        )
        .expect("pseudo-version pattern is valid")
    })
}

/// Whether `version` is a well-formed pseudo-version.
///
/// A string qualifies only if it is a valid version tag, carries at least
/// two dashes, and decodes into the timestamp-and-revision shape above.
pub fn is_pseudo_version(version: &str) -> bool {
    version.bytes().filter(|b| *b == b'-').count() >= 2
        && super::is_valid_tag(version)
        && pseudo_pattern().is_match(version)
}

/// Extract the embedded revision prefix of a pseudo-version.
///
/// Returns `None` when the string does not end in a `-<rev>` segment.
/// Callers are expected to have checked [`is_pseudo_version`] first.
pub fn pseudo_version_rev(version: &str) -> Option<&str> {
    let base = version.split('+').next().unwrap_or(version);
    let index = base.rfind('-')?;
    if index + 1 == base.len() {
        return None;
    }
    Some(&base[index + 1..])
}

/// Synthesize a pseudo-version.
///
/// `major` is used only when `base` is empty; `base` must be a canonical
/// tag (`vX.Y.Z[-PRE]`) when present. `rev` is the pre-truncated revision
/// prefix.
pub fn pseudo_version(major: &str, base: &str, when: DateTime<Utc>, rev: &str) -> String {
    let segment = format!("{}-{}", when.format("%Y%m%d%H%M%S"), rev);

    if base.is_empty() {
        let major = if major.is_empty() { "v0" } else { major };
        return format!("{major}.0.0-{segment}");
    }

    if base.contains('-') {
        // Base is a prerelease: append to it directly.
        return format!("{base}.0.{segment}");
    }

    // Base is a release: bump the patch so the pseudo-version sorts after it.
    // A non-canonical base degrades to the prerelease form rather than panic.
    match base.rsplit_once('.') {
        Some((head, patch)) => match patch.parse::<u64>() {
            Ok(patch) => format!("{head}.{}-0.{segment}", patch + 1),
            Err(_) => format!("{base}.0.{segment}"),
        },
        None => format!("{base}.0.{segment}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn format_without_base() {
        let version = pseudo_version("", "", when(), "abcdefabcdef");
        assert_eq!(version, "v0.0.0-20240131120000-abcdefabcdef");
        assert!(is_pseudo_version(&version));
    }

    #[test]
    fn format_with_release_base_bumps_patch() {
        let version = pseudo_version("v1", "v1.2.3", when(), "abcdefabcdef");
        assert_eq!(version, "v1.2.4-0.20240131120000-abcdefabcdef");
        assert!(is_pseudo_version(&version));
    }

    #[test]
    fn format_with_prerelease_base_appends() {
        let version = pseudo_version("v1", "v1.2.3-rc.1", when(), "abcdefabcdef");
        assert_eq!(version, "v1.2.3-rc.1.0.20240131120000-abcdefabcdef");
        assert!(is_pseudo_version(&version));
    }

    #[test]
    fn detection_rejects_plain_versions_and_refs() {
        assert!(!is_pseudo_version("v1.2.3"));
        assert!(!is_pseudo_version("v1.2.3-rc.1"));
        assert!(!is_pseudo_version("main"));
        assert!(!is_pseudo_version("v0.0.0-tooshort-abcdef"));
        assert!(!is_pseudo_version(""));
    }

    #[test]
    fn rev_extraction() {
        assert_eq!(
            pseudo_version_rev("v0.0.0-20240131120000-abcdefabcdef"),
            Some("abcdefabcdef")
        );
        assert_eq!(
            pseudo_version_rev("v1.2.4-0.20240131120000-abcdefabcdef+meta"),
            Some("abcdefabcdef")
        );
        assert_eq!(pseudo_version_rev("v1"), None);
        assert_eq!(pseudo_version_rev("v1.2.3-"), None);
    }

    #[test]
    fn pseudo_sorts_between_base_and_next_release() {
        let base = crate::version::parse_tag("v1.2.3").unwrap();
        let pseudo =
            crate::version::parse_tag("v1.2.4-0.20240131120000-abcdefabcdef").unwrap();
        let next = crate::version::parse_tag("v1.2.4").unwrap();
        assert!(base < pseudo);
        assert!(pseudo < next);
    }
}
