//! Input validation for domains and tool names.
//!
//! The engine expects both to be checked before a request reaches it; the
//! CLI runs these first. [`is_valid_hostname`] is also the domain-syntax rule
//! the result pipeline applies to extracted entries.

use thiserror::Error;

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;
const MAX_TOOL_NAME_LENGTH: usize = 64;

/// Characters that never belong in a domain and would matter to a shell.
const SHELL_METACHARACTERS: &[char] = &[
    ';', '&', '|', '`', '$', '(', ')', '<', '>', '\\', '"', '\'', '*', '?', '[', ']', '{', '}',
    '!', '\n', '\r', '\t', ' ',
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("domain contains forbidden character '{0}'")]
    ForbiddenCharacter(char),

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("invalid tool name: {0}")]
    InvalidToolName(String),
}

/// Check hostname syntax: dot-separated labels of `[a-z0-9_-]`, 1-63 chars
/// each, no label starting or ending with `-`, at least two labels, an
/// alphabetic (or punycode) last label, and no leading or trailing dot.
///
/// Expects lowercase input.
pub fn is_valid_hostname(host: &str) -> bool {
    if host.is_empty() || host.len() > MAX_DOMAIN_LENGTH {
        return false;
    }
    if host.starts_with('.') || host.ends_with('.') {
        return false;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    });

    let tld = labels[labels.len() - 1];
    let tld_ok = tld.len() >= 2
        && (tld.chars().all(|c| c.is_ascii_lowercase()) || tld.starts_with("xn--"));

    labels_ok && tld_ok
}

/// Validate and normalize a target domain (trimmed, lowercased).
pub fn validate_domain(domain: &str) -> Result<String, ValidationError> {
    let normalized = domain.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(ValidationError::EmptyDomain);
    }
    if let Some(c) = normalized.chars().find(|c| SHELL_METACHARACTERS.contains(c)) {
        return Err(ValidationError::ForbiddenCharacter(c));
    }
    if normalized.contains('_') || !is_valid_hostname(&normalized) {
        return Err(ValidationError::InvalidDomain(normalized));
    }
    Ok(normalized)
}

/// Validate a tool name against `[A-Za-z0-9_-]+`.
pub fn validate_tool_name(name: &str) -> Result<(), ValidationError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_TOOL_NAME_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidToolName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_hostnames() {
        assert!(is_valid_hostname("example.com"));
        assert!(is_valid_hostname("www.example.com"));
        assert!(is_valid_hostname("_dmarc.example.com"));
        assert!(is_valid_hostname("a-1.b2.example.co"));
        assert!(is_valid_hostname("example.xn--p1ai"));
    }

    #[test]
    fn test_invalid_hostnames() {
        assert!(!is_valid_hostname("invalid..example.com"));
        assert!(!is_valid_hostname(".example.com"));
        assert!(!is_valid_hostname("example.com."));
        assert!(!is_valid_hostname("localhost"));
        assert!(!is_valid_hostname("-bad.example.com"));
        assert!(!is_valid_hostname("example.c"));
        assert!(!is_valid_hostname("1.2.3.4"));
        assert!(!is_valid_hostname(&format!("{}.com", "a".repeat(64))));
    }

    #[test]
    fn test_validate_domain_normalizes() {
        assert_eq!(validate_domain("  Example.COM ").unwrap(), "example.com");
    }

    #[test]
    fn test_validate_domain_rejects_metacharacters() {
        assert_eq!(
            validate_domain("example.com;id").unwrap_err(),
            ValidationError::ForbiddenCharacter(';')
        );
        assert!(validate_domain("$(reboot).com").is_err());
        assert_eq!(validate_domain("").unwrap_err(), ValidationError::EmptyDomain);
    }

    #[test]
    fn test_validate_domain_rejects_underscore() {
        assert!(validate_domain("my_host.example.com").is_err());
    }

    #[test]
    fn test_validate_tool_name() {
        assert!(validate_tool_name("subfinder").is_ok());
        assert!(validate_tool_name("the_harvester-2").is_ok());
        assert!(validate_tool_name("sub finder").is_err());
        assert!(validate_tool_name("../bin/sh").is_err());
        assert!(validate_tool_name("").is_err());
    }
}
