//! cli::commands::add
//!
//! Add a skill and install it.
//!
//! The input is a git origin with an optional `@ref`, a GitHub tree URL,
//! or a local directory. Remote inputs are resolved through the store to
//! a pinned version; a bare origin resolves the remote HEAD. Tree URLs
//! are split into ref and subdirectory against the advertised refs, so a
//! branch name containing slashes wins over a shorter one.

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::{install_skills, Context};
use crate::core::lock::LockKey;
use crate::core::types::{is_remote_origin, Origin};
use crate::git::Repo;
use crate::manifest::{Skill, SkillKind, State};
use crate::remote::{list_remote_refs, remote_head, RefIndex};
use crate::store::Store;
use crate::ui::sanitize_origin;
use crate::version::resolve::{resolve_for_ref, Resolved};

struct AddInput {
    origin: String,
    ref_name: String,
    subdir: Option<String>,
    kind: SkillKind,
}

/// Run the add command.
pub fn add(ctx: &Context, input: &str, path_flag: Option<&str>, name_flag: Option<&str>) -> Result<()> {
    let (mut state, initialized) = State::load_or_init(&ctx.start)?;
    if initialized {
        ctx.logger
            .debug(format!("initializing project at {}", ctx.start.display()));
    }

    let spec = parse_add_input(input, path_flag)?;
    let name = skill_name(&spec, name_flag);

    let skill = match spec.kind {
        SkillKind::Git => {
            let store = Store::new(state.paths.store_dir(), ctx.logger);
            let origin = Origin::new(&spec.origin);
            let repo_path = store.ensure(&origin)?;
            let repo = Repo::open(&repo_path)?;

            let resolved = resolve_input_ref(&repo, &spec.origin, &spec.ref_name)?;
            store.checkout(&origin, &resolved.rev)?;
            ctx.logger.debug(format!(
                "{}@{} -> {}",
                sanitize_origin(origin.as_str()),
                resolved.version,
                resolved.rev
            ));

            state
                .lock
                .pin(LockKey::new(origin, &resolved.version), resolved.rev.clone());

            Skill {
                name,
                kind: SkillKind::Git,
                origin: spec.origin,
                subdir: spec.subdir,
                version: Some(resolved.version),
            }
        }
        SkillKind::Path => Skill {
            name,
            kind: SkillKind::Path,
            origin: spec.origin,
            subdir: spec.subdir,
            version: None,
        },
    };

    state.manifest.upsert_skill(skill)?;
    state.save()?;

    install_skills(ctx, true)
}

/// Classify the input and split off its ref and subdirectory.
fn parse_add_input(input: &str, path_flag: Option<&str>) -> Result<AddInput> {
    if let Some((origin, tree_path)) = github_tree_segments(input) {
        if path_flag.is_some() {
            bail!("omit --path when using a github tree url");
        }
        let refs = list_remote_refs(&origin)
            .with_context(|| format!("list refs of {}", sanitize_origin(&origin)))?;
        let (ref_name, subdir) = split_tree_path(&tree_path, &refs)?;
        return Ok(AddInput {
            origin,
            ref_name,
            subdir,
            kind: SkillKind::Git,
        });
    }

    // An existing local directory is taken literally: a repository is a
    // git dependency resolved at its head, anything else a path skill.
    if !is_remote_origin(input) && Path::new(input).is_dir() {
        let kind = if Path::new(input).join(".git").exists() {
            SkillKind::Git
        } else {
            SkillKind::Path
        };
        return Ok(AddInput {
            origin: input.to_string(),
            ref_name: String::new(),
            subdir: path_flag.map(str::to_string),
            kind,
        });
    }

    let (origin, ref_name) = parse_origin_ref(input);
    if !is_remote_origin(origin) && !Path::new(origin).is_dir() {
        bail!("local path not found: {input}");
    }

    Ok(AddInput {
        origin: origin.to_string(),
        ref_name: ref_name.to_string(),
        subdir: path_flag.map(str::to_string),
        kind: SkillKind::Git,
    })
}

/// Split a trailing `@ref`. The `@` must come after the last `/` or `:`
/// so userinfo and scp-like origins stay intact.
fn parse_origin_ref(input: &str) -> (&str, &str) {
    let Some(at) = input.rfind('@') else {
        return (input, "");
    };
    if input[at + 1..].contains(['/', ':']) {
        return (input, "");
    }
    (&input[..at], &input[at + 1..])
}

/// Recognize `https://github.com/<owner>/<repo>/tree/<...>` and return the
/// origin plus the path after `tree/`.
fn github_tree_segments(raw: &str) -> Option<(String, String)> {
    let parsed = url::Url::parse(raw).ok()?;
    if parsed.host_str() != Some("github.com") {
        return None;
    }

    let segments: Vec<&str> = parsed.path().trim_matches('/').split('/').collect();
    if segments.len() < 4 || segments[2] != "tree" {
        return None;
    }

    let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);
    let origin = format!("https://github.com/{}/{}", segments[0], repo);
    Some((origin, segments[3..].join("/")))
}

/// Split the post-`tree/` path into a known ref and a subdirectory.
fn split_tree_path(tree_path: &str, refs: &RefIndex) -> Result<(String, Option<String>)> {
    let Some((ref_name, rest)) = refs.split_ref_prefix(tree_path) else {
        bail!("unable to resolve a ref from github tree url path {tree_path:?}");
    };
    let subdir = if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    };
    Ok((ref_name.to_string(), subdir))
}

/// An empty ref means the remote HEAD; otherwise the ref resolves against
/// the mirror directly.
fn resolve_input_ref(repo: &Repo, origin: &str, ref_name: &str) -> Result<Resolved> {
    if ref_name.is_empty() {
        if let Ok(head) = remote_head(origin) {
            if let Ok(resolved) = resolve_for_ref(repo, &head) {
                return Ok(resolved);
            }
        }
    }

    resolve_for_ref(repo, ref_name).with_context(|| {
        if ref_name.is_empty() {
            format!("resolve default ref of {}", sanitize_origin(origin))
        } else {
            format!("resolve ref {ref_name:?} of {}", sanitize_origin(origin))
        }
    })
}

/// Pick the registered name: the flag, else the subdirectory's last
/// segment, else the origin's last segment.
fn skill_name(spec: &AddInput, name_flag: Option<&str>) -> String {
    if let Some(name) = name_flag {
        return name.to_string();
    }
    if let Some(subdir) = &spec.subdir {
        if let Some(last) = subdir.rsplit('/').find(|segment| !segment.is_empty()) {
            return last.to_string();
        }
    }

    let origin = Origin::new(&spec.origin);
    origin
        .as_str()
        .rsplit(['/', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("skill")
        .to_string()
}
