//! Line-oriented sshd_config parser and rewriter
//!
//! Replaces regex substitution over the raw file with a small directive
//! model: each line is kept verbatim and, where it parses as a directive
//! (active or commented out), tagged with its keyword and value. Rewrites
//! work by keyword with insert-if-missing semantics, so a directive that is
//! absent, commented, or already set all converge to the same single active
//! line. Unrelated lines and comments are preserved untouched.

use std::fmt;

/// Keyword of the login allow-list directive
const ALLOW_USERS: &str = "allowusers";

/// A parsed directive found on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    /// Keyword, lowercased (sshd matches keywords case-insensitively)
    keyword: String,
    /// Everything after the keyword, whitespace-trimmed
    value: String,
    /// True when the line is commented out
    commented: bool,
}

/// One line of the configuration file: raw text plus the directive it
/// carries, if any.
#[derive(Debug, Clone)]
struct ConfigLine {
    raw: String,
    entry: Option<Entry>,
}

impl ConfigLine {
    fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            entry: parse_entry(raw),
        }
    }

    fn directive(keyword: &str, value: &str) -> Self {
        let raw = format!("{} {}", keyword, value);
        Self {
            raw: raw.clone(),
            entry: parse_entry(&raw),
        }
    }

    fn matches(&self, keyword_lower: &str) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| e.keyword == keyword_lower)
    }

    fn matches_active(&self, keyword_lower: &str) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| e.keyword == keyword_lower && !e.commented)
    }
}

/// Parse a line into a directive entry, if it carries one.
///
/// A commented line only counts as a (disabled) directive when the text
/// after the `#` still reads as `Keyword value`; prose comments do not match
/// because rewrites key on the exact keyword token.
fn parse_entry(raw: &str) -> Option<Entry> {
    let trimmed = raw.trim_start();
    let (body, commented) = match trimmed.strip_prefix('#') {
        Some(rest) => (rest.trim_start(), true),
        None => (trimmed, false),
    };

    let mut parts = body.splitn(2, char::is_whitespace);
    let keyword = parts.next()?;
    if keyword.is_empty() || !keyword.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let value = parts.next()?.trim();
    if value.is_empty() {
        return None;
    }

    Some(Entry {
        keyword: keyword.to_ascii_lowercase(),
        value: value.to_string(),
        commented,
    })
}

/// In-memory sshd configuration.
#[derive(Debug, Clone)]
pub struct SshdConfig {
    lines: Vec<ConfigLine>,
}

impl SshdConfig {
    /// Parse configuration text into line records.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(ConfigLine::parse).collect(),
        }
    }

    /// Set a directive to a fixed value regardless of its prior state.
    ///
    /// The first matching line, commented or active, is replaced in place so
    /// the directive stays where the file's author put it. Later active
    /// duplicates are dropped; the directive ends up active exactly once.
    /// When no line matches at all, the directive is appended.
    pub fn set(&mut self, keyword: &str, value: &str) {
        let target = keyword.to_ascii_lowercase();

        let first = self.lines.iter().position(|line| line.matches(&target));
        match first {
            Some(index) => {
                self.lines[index] = ConfigLine::directive(keyword, value);
                let mut seen = 0;
                self.lines.retain(|line| {
                    if line.matches_active(&target) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.lines.push(ConfigLine::directive(keyword, value)),
        }
    }

    /// Active value of a directive, if set.
    pub fn get_active(&self, keyword: &str) -> Option<&str> {
        let target = keyword.to_ascii_lowercase();
        self.lines
            .iter()
            .find(|line| line.matches_active(&target))
            .and_then(|line| line.entry.as_ref())
            .map(|e| e.value.as_str())
    }

    /// Number of active lines carrying a directive.
    pub fn active_count(&self, keyword: &str) -> usize {
        let target = keyword.to_ascii_lowercase();
        self.lines
            .iter()
            .filter(|line| line.matches_active(&target))
            .count()
    }

    /// Usernames on the active allow-list, in file order.
    pub fn allowed_users(&self) -> Vec<String> {
        let mut users = Vec::new();
        for line in &self.lines {
            if line.matches_active(ALLOW_USERS) {
                if let Some(entry) = &line.entry {
                    for user in entry.value.split_whitespace() {
                        if !users.iter().any(|u| u == user) {
                            users.push(user.to_string());
                        }
                    }
                }
            }
        }
        users
    }

    /// Add a username to the login allow-list.
    ///
    /// Semantics are additive with de-duplication: prior entries are kept,
    /// and re-running with the same username changes nothing. Multiple
    /// active `AllowUsers` lines are merged into the first.
    ///
    /// Returns true when the configuration changed.
    pub fn allow_user(&mut self, username: &str) -> bool {
        let mut users = self.allowed_users();
        let already_present = users.iter().any(|u| u == username);
        if !already_present {
            users.push(username.to_string());
        }

        let first = self
            .lines
            .iter()
            .position(|line| line.matches_active(ALLOW_USERS));
        match first {
            Some(index) => {
                let merged = self.active_count(ALLOW_USERS) > 1;
                if already_present && !merged {
                    return false;
                }
                self.lines[index] = ConfigLine::directive("AllowUsers", &users.join(" "));
                let mut seen = 0;
                self.lines.retain(|line| {
                    if line.matches_active(ALLOW_USERS) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
                true
            }
            None => {
                self.lines
                    .push(ConfigLine::directive("AllowUsers", &users.join(" ")));
                true
            }
        }
    }
}

impl fmt::Display for SshdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.raw)?;
        }
        Ok(())
    }
}
