//! remote::gitconfig
//!
//! `url.<base>.insteadOf` rewrite rules from git configuration files.
//!
//! Rules are collected from the user-global config (`~/.gitconfig`, or the
//! single file named by `GIT_CONFIG_GLOBAL`), the XDG config
//! (`$XDG_CONFIG_HOME/git/config`), and any `include.path` files reachable
//! from them. A visited set keeps include cycles from looping. When
//! multiple rules match an origin, the longest matching prefix wins.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One `url.<base>.insteadOf = <prefix>` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRewrite {
    pub base: String,
    pub instead_of: String,
}

/// Rewrite `origin` through the configured `insteadOf` rules.
///
/// Returns the origin unchanged when no rule's prefix matches.
pub fn apply_rewrites(origin: &str) -> io::Result<String> {
    let rules = load_rewrites()?;
    Ok(rewrite_with(origin, &rules))
}

/// Apply the longest-matching-prefix rule from an explicit rule list.
pub fn rewrite_with(origin: &str, rules: &[UrlRewrite]) -> String {
    let mut best: Option<&UrlRewrite> = None;
    for rule in rules {
        if rule.instead_of.is_empty() || !origin.starts_with(&rule.instead_of) {
            continue;
        }
        match best {
            Some(current) if current.instead_of.len() >= rule.instead_of.len() => {}
            _ => best = Some(rule),
        }
    }

    match best {
        Some(rule) => format!("{}{}", rule.base, &origin[rule.instead_of.len()..]),
        None => origin.to_string(),
    }
}

fn load_rewrites() -> io::Result<Vec<UrlRewrite>> {
    let mut seen = HashSet::new();
    let mut rules = Vec::new();
    for path in config_files() {
        parse_config_file(&path, &mut seen, &mut rules)?;
    }
    Ok(rules)
}

fn config_files() -> Vec<PathBuf> {
    if let Ok(custom) = env::var("GIT_CONFIG_GLOBAL") {
        if !custom.is_empty() {
            return vec![PathBuf::from(custom)];
        }
    }

    let mut paths = Vec::new();
    let home = dirs::home_dir();
    if let Some(home) = &home {
        paths.push(home.join(".gitconfig"));
    }

    let xdg = match env::var("XDG_CONFIG_HOME") {
        Ok(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => home.map(|home| home.join(".config")),
    };
    if let Some(xdg) = xdg {
        paths.push(xdg.join("git").join("config"));
    }

    paths
}

fn parse_config_file(
    path: &Path,
    seen: &mut HashSet<PathBuf>,
    rules: &mut Vec<UrlRewrite>,
) -> io::Result<()> {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    if !seen.insert(absolute.clone()) {
        return Ok(());
    }

    let contents = match fs::read_to_string(&absolute) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    let base_dir = absolute.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut section = String::new();
    let mut subsection = String::new();

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some((parsed_section, parsed_subsection)) = parse_section_header(line) {
            section = parsed_section;
            subsection = parsed_subsection;
            continue;
        }

        let Some((key, value)) = parse_key_value(line) else {
            continue;
        };

        match section.as_str() {
            "url" => {
                if key == "insteadof" {
                    rules.push(UrlRewrite {
                        base: subsection.clone(),
                        instead_of: value,
                    });
                }
            }
            "include" => {
                if key == "path" && !value.is_empty() {
                    let include = resolve_include_path(&value, &base_dir);
                    parse_config_file(&include, seen, rules)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn parse_section_header(line: &str) -> Option<(String, String)> {
    let content = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    if content.is_empty() {
        return None;
    }

    match content.find(|c: char| c == ' ' || c == '\t') {
        None => Some((content.to_ascii_lowercase(), String::new())),
        Some(index) => {
            let section = content[..index].trim().to_ascii_lowercase();
            let rest = content[index..].trim();
            Some((section, unquote(rest)))
        }
    }
}

fn parse_key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = match line.split_once('=') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => {
            let mut fields = line.split_whitespace();
            let key = fields.next()?;
            (key, line[key.len()..].trim())
        }
    };
    if key.is_empty() {
        return None;
    }
    Some((key.to_ascii_lowercase(), unquote(value)))
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return value[1..value.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\");
    }
    value.to_string()
}

fn resolve_include_path(value: &str, base_dir: &Path) -> PathBuf {
    let value = value.trim();

    if value == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_str(contents: &str) -> Vec<UrlRewrite> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, contents).unwrap();

        let mut seen = HashSet::new();
        let mut rules = Vec::new();
        parse_config_file(&path, &mut seen, &mut rules).unwrap();
        rules
    }

    #[test]
    fn parses_instead_of_rules() {
        let rules = parse_str(
            r#"
[url "git@github.com:"]
    insteadOf = https://github.com/
[url "ssh://git@corp.example.com/"]
    insteadOf = https://corp.example.com/
"#,
        );
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].base, "git@github.com:");
        assert_eq!(rules[0].instead_of, "https://github.com/");
    }

    #[test]
    fn skips_comments_and_unrelated_sections() {
        let rules = parse_str(
            r#"
# a comment
; another comment
[user]
    name = Someone
[url "git@github.com:"]
    insteadOf = https://github.com/
"#,
        );
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn quoted_values_are_unquoted() {
        let rules = parse_str(
            r#"
[url "git@github.com:"]
    insteadOf = "https://github.com/"
"#,
        );
        assert_eq!(rules[0].instead_of, "https://github.com/");
    }

    #[test]
    fn longest_prefix_wins() {
        let rules = vec![
            UrlRewrite {
                base: "ssh://general/".to_string(),
                instead_of: "https://example.com/".to_string(),
            },
            UrlRewrite {
                base: "ssh://specific/".to_string(),
                instead_of: "https://example.com/team/".to_string(),
            },
        ];
        assert_eq!(
            rewrite_with("https://example.com/team/repo", &rules),
            "ssh://specific/repo"
        );
        assert_eq!(
            rewrite_with("https://example.com/other/repo", &rules),
            "ssh://general/other/repo"
        );
        assert_eq!(rewrite_with("https://nomatch.io/repo", &rules), "https://nomatch.io/repo");
    }

    #[test]
    fn includes_follow_and_cycles_stop() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("config");
        let extra = dir.path().join("extra");

        let mut file = std::fs::File::create(&main).unwrap();
        writeln!(file, "[include]").unwrap();
        writeln!(file, "    path = extra").unwrap();
        drop(file);

        let mut file = std::fs::File::create(&extra).unwrap();
        writeln!(file, "[include]").unwrap();
        writeln!(file, "    path = config").unwrap();
        writeln!(file, "[url \"git@github.com:\"]").unwrap();
        writeln!(file, "    insteadOf = https://github.com/").unwrap();
        drop(file);

        let mut seen = HashSet::new();
        let mut rules = Vec::new();
        parse_config_file(&main, &mut seen, &mut rules).unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn missing_file_is_empty() {
        let mut seen = HashSet::new();
        let mut rules = Vec::new();
        parse_config_file(Path::new("/nonexistent/config"), &mut seen, &mut rules).unwrap();
        assert!(rules.is_empty());
    }
}
