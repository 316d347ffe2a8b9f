//! Extractors: one per output type, raw text in, candidate entries out.
//!
//! Extractors are lenient about surrounding noise and strict about what they
//! emit; anything that does not look like the requested type is dropped.

use crate::validation::is_valid_hostname;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhttps?://[^\s"'<>`]+"#).expect("valid URL pattern"));

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").expect("valid email pattern")
});

static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid IPv4 pattern")
});

/// Line prefixes treated as comments.
const COMMENT_PREFIXES: &[&str] = &["#", "//", ";"];

/// Lines containing any of these words (case-insensitive) are tool chatter, not data.
const NOISE_TOKENS: &[&str] = &["error", "timeout", "timed out", "failed", "not found"];

/// Characters stripped from both ends of a domain candidate.
const TOKEN_NOISE: &[char] = &[
    '[', ']', '(', ')', '{', '}', '<', '>', '"', '\'', '`', ',', ';', ':', '!', '|',
];

/// JSON object keys that usually hold the interesting value.
const JSON_VALUE_KEYS: &[&str] = &[
    "host", "hostname", "domain", "name", "name_value", "subdomain", "url", "input", "ip",
    "email",
];

pub(crate) fn is_comment(line: &str) -> bool {
    COMMENT_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Hostname characters stay inside a word, so `timeout.example.com` is one
/// word and never matches `timeout`.
fn is_noise(line: &str) -> bool {
    let lowered = line.to_ascii_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        .map(|word| word.trim_matches(['.', '-', '_']))
        .filter(|word| !word.is_empty())
        .collect();

    NOISE_TOKENS.iter().any(|token| {
        let phrase: Vec<&str> = token.split(' ').collect();
        words.windows(phrase.len()).any(|window| window == phrase.as_slice())
    })
}

/// Non-empty, trimmed lines.
pub fn extract_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reduce a token to a bare lowercase host candidate.
fn clean_domain_token(token: &str) -> String {
    let mut candidate = token.trim_matches(TOKEN_NOISE).to_ascii_lowercase();

    if let Some((_, rest)) = candidate.split_once("://") {
        candidate = rest.to_string();
    }
    if let Some(end) = candidate.find(['/', '?', '#']) {
        candidate.truncate(end);
    }
    if let Some((_, host)) = candidate.rsplit_once('@') {
        candidate = host.to_string();
    }
    if let Some((host, port)) = candidate.rsplit_once(':') {
        if port.chars().all(|c| c.is_ascii_digit()) {
            candidate = host.to_string();
        }
    }
    if let Some(stripped) = candidate.strip_prefix("*.") {
        candidate = stripped.to_string();
    }

    candidate.trim_matches(TOKEN_NOISE).to_string()
}

/// Domain-line extractor.
///
/// Takes, per line, the first token that contains the queried domain and
/// passes hostname syntax. Comment and noise lines are skipped entirely.
/// JSON output (crt.sh and similar sources) is unpacked first and each
/// extracted value is treated as a line.
pub fn extract_domains(raw: &str, domain: &str) -> Vec<String> {
    match extract_json(raw) {
        Some(values) => domains_in_lines(values.iter().map(String::as_str), domain),
        None => domains_in_lines(raw.lines(), domain),
    }
}

fn domains_in_lines<'a>(lines: impl Iterator<Item = &'a str>, domain: &str) -> Vec<String> {
    let target = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    let mut found = Vec::new();

    for line in lines.map(str::trim) {
        if line.is_empty() || is_comment(line) || is_noise(line) {
            continue;
        }

        let hit = line
            .split(|c: char| c.is_whitespace() || c == ',' || c == '|')
            .map(clean_domain_token)
            .find(|candidate| candidate.contains(&target) && is_valid_hostname(candidate));

        if let Some(candidate) = hit {
            found.push(candidate);
        }
    }

    found
}

/// URL regex extractor.
pub fn extract_urls(raw: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(raw)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ':', ')', ']', '}', '\'', '"'])
                .to_string()
        })
        .collect()
}

/// Email regex extractor. Addresses are lowercased.
pub fn extract_emails(raw: &str) -> Vec<String> {
    EMAIL_PATTERN
        .find_iter(raw)
        .map(|m| m.as_str().trim_matches('.').to_ascii_lowercase())
        .collect()
}

/// IPv4 line extractor. Every well-formed address on a non-comment line.
pub fn extract_ips(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment(line))
        .flat_map(|line| IPV4_PATTERN.find_iter(line))
        .filter_map(|m| m.as_str().parse::<Ipv4Addr>().ok())
        .map(|ip| ip.to_string())
        .collect()
}

/// One entry per non-empty line of a string value.
fn string_entries(s: &str) -> Vec<String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn json_value_to_entries(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::String(s) => string_entries(s),
        serde_json::Value::Object(map) => {
            let known = JSON_VALUE_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
                .map(string_entries)
                .unwrap_or_default();
            if known.is_empty() {
                vec![value.to_string()]
            } else {
                known
            }
        }
        other => vec![other.to_string()],
    }
}

fn json_values_to_entries(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items.iter().flat_map(json_value_to_entries).collect(),
        other => json_value_to_entries(&other),
    }
}

/// JSON extractor.
///
/// Accepts a single document or JSON lines. Objects contribute their first
/// well-known value field (`host`, `domain`, `url`, ...) or, failing that,
/// their compact serialization. Multi-line string values yield one entry
/// per line. Returns `None` when the input is not JSON so
/// the caller can fall back to line parsing.
pub fn extract_json(raw: &str) -> Option<Vec<String>> {
    if let Ok(document) = serde_json::from_str::<serde_json::Value>(raw) {
        return Some(json_values_to_entries(document));
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }

    let mut entries = Vec::new();
    for line in lines {
        let value = serde_json::from_str::<serde_json::Value>(line).ok()?;
        entries.extend(json_values_to_entries(value));
    }
    Some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domains_skips_comments_and_noise() {
        let raw = "www.example.com\n# mail.example.com\n// x.example.com\n; y.example.com\n\
                   [ERROR] failed to resolve api.example.com\n\nmail.example.com";
        assert_eq!(
            extract_domains(raw, "example.com"),
            vec!["www.example.com", "mail.example.com"]
        );
    }

    #[test]
    fn test_extract_domains_strips_punctuation_and_urls() {
        let raw = "[api.example.com]\n\"cdn.example.com\",\nhttps://shop.example.com:8443/cart\n*.dev.example.com";
        assert_eq!(
            extract_domains(raw, "example.com"),
            vec![
                "api.example.com",
                "cdn.example.com",
                "shop.example.com",
                "dev.example.com"
            ]
        );
    }

    #[test]
    fn test_extract_domains_picks_matching_token() {
        let raw = "93.184.216.34 www.example.com (FQDN)\nunrelated.org";
        assert_eq!(extract_domains(raw, "example.com"), vec!["www.example.com"]);
    }

    #[test]
    fn test_extract_domains_rejects_malformed() {
        let raw = "invalid..example.com\n.example.com\nexample.com.\nWWW.EXAMPLE.COM";
        assert_eq!(extract_domains(raw, "example.com"), vec!["www.example.com"]);
    }

    #[test]
    fn test_extract_urls() {
        let raw = "found: https://example.com/login, and (http://api.example.com/v1).\nftp://nope";
        assert_eq!(
            extract_urls(raw),
            vec!["https://example.com/login", "http://api.example.com/v1"]
        );
    }

    #[test]
    fn test_extract_emails() {
        let raw = "[*] Emails found:\nAdmin@Example.com\n  security@example.com.";
        assert_eq!(
            extract_emails(raw),
            vec!["admin@example.com", "security@example.com"]
        );
    }

    #[test]
    fn test_extract_ips_rejects_out_of_range() {
        let raw = "example.com has address 93.184.216.34\n999.1.1.1\n# 10.0.0.1\n1.1.1.1, 8.8.8.8";
        assert_eq!(
            extract_ips(raw),
            vec!["93.184.216.34", "1.1.1.1", "8.8.8.8"]
        );
    }

    #[test]
    fn test_extract_json_array_of_objects() {
        let raw = r#"[{"name_value": "a.example.com", "id": 1}, {"id": 2}, "b.example.com"]"#;
        assert_eq!(
            extract_json(raw).unwrap(),
            vec!["a.example.com", r#"{"id":2}"#, "b.example.com"]
        );
    }

    #[test]
    fn test_extract_json_lines() {
        let raw = "{\"host\":\"a.example.com\"}\n{\"host\":\"b.example.com\"}\n";
        assert_eq!(
            extract_json(raw).unwrap(),
            vec!["a.example.com", "b.example.com"]
        );
    }

    #[test]
    fn test_extract_json_splits_multiline_values() {
        let raw = r#"[{"name_value":"example.com\nwww.example.com"},{"name_value":"*.example.com"}]"#;
        assert_eq!(
            extract_json(raw).unwrap(),
            vec!["example.com", "www.example.com", "*.example.com"]
        );
    }

    #[test]
    fn test_extract_domains_unpacks_json() {
        let raw = r#"[{"name_value":"example.com\nwww.example.com"},{"name_value":"*.dev.example.com"},{"name_value":"other.org"}]"#;
        assert_eq!(
            extract_domains(raw, "example.com"),
            vec!["example.com", "www.example.com", "dev.example.com"]
        );
    }

    #[test]
    fn test_noise_matches_whole_words_only() {
        let raw = "timeout.example.com\nfailed-login.example.com\nerrors.example.com\n\
                   Timeout: api.example.com\nhost not found: x.example.com";
        assert_eq!(
            extract_domains(raw, "example.com"),
            vec![
                "timeout.example.com",
                "failed-login.example.com",
                "errors.example.com"
            ]
        );
    }

    #[test]
    fn test_extract_json_not_json() {
        assert!(extract_json("plain text\nmore").is_none());
        assert!(extract_json("").is_none());
    }

    #[test]
    fn test_extract_lines() {
        assert_eq!(extract_lines("  a \n\n b\n"), vec!["a", "b"]);
    }
}
