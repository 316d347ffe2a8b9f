//! Summary statistics over a result list.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;

/// Length statistics, in characters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthStats {
    pub min: usize,
    pub max: usize,
    pub average: f64,
    /// Bucketed by tens: `"0-9"`, `"10-19"`, ...
    pub distribution: BTreeMap<String, usize>,
}

/// Aggregate view of a result list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultAnalysis {
    pub count: usize,
    pub unique: usize,
    pub length: LengthStats,
    /// Last label of domain-like entries
    pub tlds: BTreeMap<String, usize>,
    /// `/24` networks of IPv4 entries, as `a.b.c.0/24`
    pub subnets: BTreeMap<String, usize>,
}

fn length_bucket(len: usize) -> String {
    let low = len / 10 * 10;
    format!("{}-{}", low, low + 9)
}

fn tld_of(entry: &str) -> Option<String> {
    if entry.parse::<Ipv4Addr>().is_ok() || entry.contains(char::is_whitespace) {
        return None;
    }
    let host = entry
        .split_once("://")
        .map_or(entry, |(_, rest)| rest)
        .split(['/', ':', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
    let (_, tld) = host.rsplit_once('.')?;
    (!tld.is_empty() && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| tld.to_ascii_lowercase())
}

fn subnet_of(entry: &str) -> Option<String> {
    let ip: Ipv4Addr = entry.parse().ok()?;
    let [a, b, c, _] = ip.octets();
    Some(format!("{a}.{b}.{c}.0/24"))
}

/// Compute counts, length distribution, TLD and /24 subnet histograms.
pub fn analyze_results(results: &[String]) -> ResultAnalysis {
    if results.is_empty() {
        return ResultAnalysis::default();
    }

    let unique = results.iter().collect::<HashSet<_>>().len();
    let lengths: Vec<usize> = results.iter().map(|r| r.chars().count()).collect();

    let mut distribution = BTreeMap::new();
    for len in &lengths {
        *distribution.entry(length_bucket(*len)).or_insert(0) += 1;
    }

    let mut tlds = BTreeMap::new();
    let mut subnets = BTreeMap::new();
    for entry in results {
        if let Some(subnet) = subnet_of(entry) {
            *subnets.entry(subnet).or_insert(0) += 1;
        } else if let Some(tld) = tld_of(entry) {
            *tlds.entry(tld).or_insert(0) += 1;
        }
    }

    ResultAnalysis {
        count: results.len(),
        unique,
        length: LengthStats {
            min: lengths.iter().copied().min().unwrap_or(0),
            max: lengths.iter().copied().max().unwrap_or(0),
            average: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
            distribution,
        },
        tlds,
        subnets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(analyze_results(&[]), ResultAnalysis::default());
    }

    #[test]
    fn test_domains() {
        let analysis = analyze_results(&strings(&[
            "www.example.com",
            "mail.example.org",
            "www.example.com",
            "https://shop.example.net/cart",
        ]));
        assert_eq!(analysis.count, 4);
        assert_eq!(analysis.unique, 3);
        assert_eq!(analysis.tlds.get("com"), Some(&2));
        assert_eq!(analysis.tlds.get("org"), Some(&1));
        assert_eq!(analysis.tlds.get("net"), Some(&1));
        assert!(analysis.subnets.is_empty());
        assert_eq!(analysis.length.min, 15);
        assert_eq!(analysis.length.max, 29);
        assert_eq!(analysis.length.distribution.get("10-19"), Some(&3));
    }

    #[test]
    fn test_ip_subnets() {
        let analysis = analyze_results(&strings(&["10.0.0.1", "10.0.0.200", "10.0.1.5"]));
        assert_eq!(analysis.subnets.get("10.0.0.0/24"), Some(&2));
        assert_eq!(analysis.subnets.get("10.0.1.0/24"), Some(&1));
        assert!(analysis.tlds.is_empty());
    }
}
