//! version
//!
//! Version and pseudo-version resolution.
//!
//! This is the half of the core that answers "what revision does this
//! human-supplied string mean, and what version string do we report for
//! it". Tag strings follow the `vMAJOR[.MINOR[.PATCH]][-PRE][+BUILD]`
//! convention (the leading `v` is required); commits without an exact tag
//! get a synthesized [`pseudo`]-version so every commit has a total,
//! comparable, reconstructible version identity.

pub mod pseudo;
pub mod resolve;

pub use resolve::{resolve_for_ref, resolve_for_version, Resolved, ResolveError};

/// Parse a `v`-prefixed tag into a comparable version.
///
/// Accepts the short forms `v1` and `v1.2` (missing components default to
/// zero) and drops build metadata, so comparisons follow semver precedence.
/// Returns `None` for anything else.
pub fn parse_tag(tag: &str) -> Option<semver::Version> {
    let rest = tag.strip_prefix('v')?;

    let (rest, build) = match rest.split_once('+') {
        Some((head, build)) => (head, Some(build)),
        None => (rest, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let mut numbers = [0u64; 3];
    let mut count = 0;
    for part in core.split('.') {
        if count == 3 {
            return None;
        }
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if part.len() > 1 && part.starts_with('0') {
            return None;
        }
        numbers[count] = part.parse().ok()?;
        count += 1;
    }
    if count == 0 {
        return None;
    }

    if let Some(build) = build {
        semver::BuildMetadata::new(build).ok()?;
    }

    let candidate = match pre {
        Some(pre) => format!("{}.{}.{}-{}", numbers[0], numbers[1], numbers[2], pre),
        None => format!("{}.{}.{}", numbers[0], numbers[1], numbers[2]),
    };
    semver::Version::parse(&candidate).ok()
}

/// Whether `tag` is a valid `v`-prefixed version string.
pub fn is_valid_tag(tag: &str) -> bool {
    parse_tag(tag).is_some()
}

/// Canonical form of a tag: `vX.Y.Z[-PRE]`, build metadata dropped.
pub fn canonical_tag(tag: &str) -> Option<String> {
    parse_tag(tag).map(|version| format!("v{version}"))
}

/// The major component of a tag, as `vN`.
pub fn tag_major(tag: &str) -> Option<String> {
    parse_tag(tag).map(|version| format!("v{}", version.major))
}

/// The maximum of a set of tags by semver precedence, as a canonical
/// string. Invalid entries are ignored.
pub fn max_tag<I, S>(tags: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|tag| parse_tag(tag.as_ref()))
        .max()
        .map(|version| format!("v{version}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_short_forms() {
        assert_eq!(canonical_tag("v1").as_deref(), Some("v1.0.0"));
        assert_eq!(canonical_tag("v1.2").as_deref(), Some("v1.2.0"));
        assert_eq!(canonical_tag("v1.2.3").as_deref(), Some("v1.2.3"));
    }

    #[test]
    fn parse_requires_v_prefix() {
        assert!(!is_valid_tag("1.2.3"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("main"));
    }

    #[test]
    fn parse_rejects_leading_zeros_and_junk() {
        assert!(!is_valid_tag("v01.2.3"));
        assert!(!is_valid_tag("v1.2.3.4"));
        assert!(!is_valid_tag("v1..3"));
        assert!(!is_valid_tag("v1.2.x"));
    }

    #[test]
    fn canonical_drops_build_keeps_prerelease() {
        assert_eq!(canonical_tag("v1.2.3+meta").as_deref(), Some("v1.2.3"));
        assert_eq!(
            canonical_tag("v1.2.3-rc.1+meta").as_deref(),
            Some("v1.2.3-rc.1")
        );
    }

    #[test]
    fn max_follows_semver_precedence() {
        let tags = ["v1.0.0", "v1.10.0", "v1.2.0"];
        assert_eq!(max_tag(tags).as_deref(), Some("v1.10.0"));

        // Prerelease sorts below its release.
        let tags = ["v2.0.0-rc.1", "v2.0.0"];
        assert_eq!(max_tag(tags).as_deref(), Some("v2.0.0"));
    }

    #[test]
    fn major_component() {
        assert_eq!(tag_major("v2.3.4").as_deref(), Some("v2"));
        assert_eq!(tag_major("v0.1.0").as_deref(), Some("v0"));
        assert_eq!(tag_major("nope"), None);
    }
}
