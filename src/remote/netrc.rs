//! remote::netrc
//!
//! Credential lookup from a netrc file.
//!
//! The file location honors the `NETRC` override variable and falls back
//! to `~/.netrc`. Tokens may be quoted; `#` starts a comment outside
//! quotes. A `default` entry is used when no machine matches the host.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Entry {
    login: String,
    password: String,
}

impl Entry {
    fn is_set(&self) -> bool {
        !self.login.is_empty() || !self.password.is_empty()
    }
}

/// Look up credentials for `host`.
///
/// Returns `Ok(None)` when no netrc file exists or no entry (including
/// the `default` fallback) matches.
pub fn credentials(host: &str) -> io::Result<Option<(String, String)>> {
    let Some(path) = netrc_path() else {
        return Ok(None);
    };

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let (entries, fallback) = parse(&contents);
    let key = host.to_ascii_lowercase();
    if let Some(entry) = entries.get(&key) {
        if entry.is_set() {
            return Ok(Some((entry.login.clone(), entry.password.clone())));
        }
    }
    if fallback.is_set() {
        return Ok(Some((fallback.login, fallback.password)));
    }

    Ok(None)
}

fn netrc_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("NETRC") {
        if !custom.is_empty() {
            return Some(PathBuf::from(custom));
        }
    }
    dirs::home_dir().map(|home| home.join(".netrc"))
}

fn parse(contents: &str) -> (HashMap<String, Entry>, Entry) {
    let mut entries: HashMap<String, Entry> = HashMap::new();
    let mut default = Entry::default();
    let mut current: Option<String> = None;

    let tokens = tokenize(contents);
    let mut index = 0;
    while index < tokens.len() {
        match tokens[index].to_ascii_lowercase().as_str() {
            "machine" => {
                if index + 1 < tokens.len() {
                    current = Some(tokens[index + 1].to_ascii_lowercase());
                    index += 1;
                }
            }
            "default" => current = Some("default".to_string()),
            "login" => {
                if index + 1 < tokens.len() {
                    let value = tokens[index + 1].clone();
                    index += 1;
                    match current.as_deref() {
                        Some("default") => default.login = value,
                        Some(machine) => {
                            entries.entry(machine.to_string()).or_default().login = value;
                        }
                        None => {}
                    }
                }
            }
            "password" => {
                if index + 1 < tokens.len() {
                    let value = tokens[index + 1].clone();
                    index += 1;
                    match current.as_deref() {
                        Some("default") => default.password = value,
                        Some(machine) => {
                            entries.entry(machine.to_string()).or_default().password = value;
                        }
                        None => {}
                    }
                }
            }
            _ => {}
        }
        index += 1;
    }

    (entries, default)
}

fn tokenize(contents: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '#' if !in_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            ' ' | '\t' | '\n' | '\r' if !in_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '"' => {
                if !current.is_empty() || in_quote {
                    tokens.push(std::mem::take(&mut current));
                }
                in_quote = !in_quote;
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
