//! Post-processing steps applied after extraction.
//!
//! Order is fixed: validate, deduplicate, sort, truncate. Each step is
//! independently switchable through [`ExecutionOptions`](crate::execution::ExecutionOptions).

use crate::tool::output_type::OutputType;
use crate::validation::is_valid_hostname;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

static URL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://[a-z0-9._-]+(?::\d{1,5})?(?:[/?#]\S*)?$").expect("valid URL syntax")
});

static EMAIL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("valid email syntax")
});

/// Whether one entry satisfies the syntax rules of its output type.
pub fn is_valid_entry(output_type: OutputType, entry: &str, domain: &str) -> bool {
    match output_type {
        OutputType::Domains => {
            let target = domain.trim().trim_end_matches('.').to_ascii_lowercase();
            is_valid_hostname(entry) && entry.contains(&target)
        }
        OutputType::Urls => URL_SYNTAX.is_match(entry),
        OutputType::Emails => {
            EMAIL_SYNTAX.is_match(entry)
                && entry
                    .split_once('@')
                    .is_some_and(|(local, host)| !local.contains("..") && is_valid_hostname(host))
        }
        OutputType::Ips => entry.parse::<Ipv4Addr>().is_ok(),
        OutputType::Json | OutputType::Text => !entry.trim().is_empty(),
    }
}

/// Keep only entries valid for the output type.
pub fn validate_entries(output_type: OutputType, entries: Vec<String>, domain: &str) -> Vec<String> {
    entries
        .into_iter()
        .filter(|entry| is_valid_entry(output_type, entry, domain))
        .collect()
}

/// Set semantics, keeping the first occurrence. Idempotent.
pub fn deduplicate(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

/// Domains: fewer labels first, then lexicographic.
fn compare_domains(a: &str, b: &str) -> Ordering {
    let depth = |s: &str| s.split('.').count();
    depth(a).cmp(&depth(b)).then_with(|| a.cmp(b))
}

/// IPs: numerically per octet; anything unparsable sorts last.
fn compare_ips(a: &str, b: &str) -> Ordering {
    match (a.parse::<Ipv4Addr>(), b.parse::<Ipv4Addr>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Sort in the type-specific order.
pub fn sort_entries(output_type: OutputType, mut entries: Vec<String>) -> Vec<String> {
    match output_type {
        OutputType::Domains => entries.sort_by(|a, b| compare_domains(a, b)),
        OutputType::Ips => entries.sort_by(|a, b| compare_ips(a, b)),
        _ => entries.sort(),
    }
    entries
}

/// Cap the list at `max`, returning how many entries were dropped.
pub fn truncate(entries: &mut Vec<String>, max: usize) -> usize {
    let dropped = entries.len().saturating_sub(max);
    entries.truncate(max);
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_domain_sort_by_depth_then_lexicographic() {
        let sorted = sort_entries(
            OutputType::Domains,
            strings(&["www.example.com", "a.b.example.com", "example.com", "mail.example.com"]),
        );
        assert_eq!(
            sorted,
            strings(&["example.com", "mail.example.com", "www.example.com", "a.b.example.com"])
        );
    }

    #[test]
    fn test_ip_sort_numeric() {
        let sorted = sort_entries(
            OutputType::Ips,
            strings(&["10.0.0.10", "10.0.0.9", "9.255.255.255", "junk"]),
        );
        assert_eq!(
            sorted,
            strings(&["9.255.255.255", "10.0.0.9", "10.0.0.10", "junk"])
        );
    }

    #[test]
    fn test_text_sort_lexicographic() {
        let sorted = sort_entries(OutputType::Text, strings(&["b", "a", "c"]));
        assert_eq!(sorted, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let input = strings(&["a", "b", "a", "c", "b"]);
        let once = deduplicate(input);
        let twice = deduplicate(once.clone());
        assert_eq!(once, strings(&["a", "b", "c"]));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validate_entries_per_type() {
        assert!(is_valid_entry(OutputType::Domains, "www.example.com", "example.com"));
        assert!(!is_valid_entry(OutputType::Domains, "www.other.org", "example.com"));
        assert!(is_valid_entry(OutputType::Urls, "https://example.com:8080/a?b=c", ""));
        assert!(!is_valid_entry(OutputType::Urls, "https://exa mple.com", ""));
        assert!(is_valid_entry(OutputType::Emails, "admin@example.com", ""));
        assert!(!is_valid_entry(OutputType::Emails, "a..b@example.com", ""));
        assert!(!is_valid_entry(OutputType::Ips, "256.1.1.1", ""));
        assert!(!is_valid_entry(OutputType::Text, "   ", ""));
    }

    #[test]
    fn test_truncate_reports_dropped() {
        let mut entries = strings(&["a", "b", "c"]);
        assert_eq!(truncate(&mut entries, 2), 1);
        assert_eq!(entries, strings(&["a", "b"]));
        assert_eq!(truncate(&mut entries, 10), 0);
    }
}
