//! Post filters over an already-processed result list.

use super::PipelineError;
use regex::Regex;

/// Include/exclude patterns and length bounds applied to result entries.
///
/// Every configured condition must hold for an entry to be kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFilter {
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl ResultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.include = Some(pattern.into());
        self
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none()
            && self.exclude.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>, PipelineError> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|e| PipelineError::InvalidPattern {
                pattern: p.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

/// Apply `filter` to `results`, keeping order.
///
/// Lengths are measured in characters. Fails only when a pattern does not
/// compile.
pub fn filter_results(
    results: &[String],
    filter: &ResultFilter,
) -> Result<Vec<String>, PipelineError> {
    let include = compile(filter.include.as_deref())?;
    let exclude = compile(filter.exclude.as_deref())?;

    Ok(results
        .iter()
        .filter(|entry| {
            let len = entry.chars().count();
            include.as_ref().is_none_or(|re| re.is_match(entry))
                && !exclude.as_ref().is_some_and(|re| re.is_match(entry))
                && filter.min_length.is_none_or(|min| len >= min)
                && filter.max_length.is_none_or(|max| len <= max)
        })
        .cloned()
        .collect())
}
