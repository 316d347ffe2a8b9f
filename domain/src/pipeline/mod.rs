//! Result pipeline: raw tool output in, typed result list out.
//!
//! ```text
//! RawOutput ──extract(output_type)──> candidates
//!           ──validate──> deduplicate──> sort──> truncate(max_results)
//!           ──> ToolResult
//! ```
//!
//! [`ResultPipeline::process`] never fails. Anything that goes wrong inside
//! it, including a panic in an extractor, becomes a zero-count failed
//! [`ToolResult`] carrying the message.

pub mod analysis;
pub mod extract;
pub mod filter;
pub mod postprocess;

pub use analysis::{LengthStats, ResultAnalysis, analyze_results};
pub use filter::{ResultFilter, filter_results};

use crate::execution::{ExecutionOptions, RawOutput, ToolResult, ToolResultMetadata};
use crate::tool::{OutputType, ToolSpec};
use crate::util::{clip_output, count_lines};
use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error;

/// Raw output larger than this is rejected rather than parsed.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 64 * 1024 * 1024;

/// Raw output attached to metadata is clipped to this size.
pub const MAX_RAW_OUTPUT_BYTES: usize = 256 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Output too large to process: {size} bytes (limit {limit})")]
    OutputTooLarge { size: usize, limit: usize },

    #[error("Invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Result processing panicked: {0}")]
    Panicked(String),
}

/// Extract a result list for `output_type` from raw text.
pub fn extract(output_type: OutputType, raw: &str, domain: &str) -> Vec<String> {
    match output_type {
        OutputType::Domains => extract::extract_domains(raw, domain),
        OutputType::Urls => extract::extract_urls(raw),
        OutputType::Emails => extract::extract_emails(raw),
        OutputType::Ips => extract::extract_ips(raw),
        OutputType::Json => {
            extract::extract_json(raw).unwrap_or_else(|| extract::extract_lines(raw))
        }
        OutputType::Text => extract::extract_lines(raw),
    }
}

/// Entries kept after post-processing, plus how many `max_results` dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refined {
    pub entries: Vec<String>,
    pub truncated: usize,
}

/// Converts raw tool output into [`ToolResult`]s.
#[derive(Debug, Clone)]
pub struct ResultPipeline {
    max_input_bytes: usize,
}

impl Default for ResultPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultPipeline {
    pub fn new() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }

    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }

    /// Run the extract/validate/deduplicate/sort/truncate chain.
    pub fn refine(
        &self,
        output_type: OutputType,
        raw: &str,
        domain: &str,
        options: &ExecutionOptions,
    ) -> Result<Refined, PipelineError> {
        if raw.len() > self.max_input_bytes {
            return Err(PipelineError::OutputTooLarge {
                size: raw.len(),
                limit: self.max_input_bytes,
            });
        }

        let refined = catch_unwind(AssertUnwindSafe(|| {
            let mut entries = extract(output_type, raw, domain);
            if options.validate {
                entries = postprocess::validate_entries(output_type, entries, domain);
            }
            if options.deduplicate {
                entries = postprocess::deduplicate(entries);
            }
            if options.sort {
                entries = postprocess::sort_entries(output_type, entries);
            }
            let truncated = postprocess::truncate(&mut entries, options.max_results);
            Refined { entries, truncated }
        }));

        refined.map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            PipelineError::Panicked(message)
        })
    }

    /// Turn one tool's raw output into its [`ToolResult`].
    pub fn process(
        &self,
        spec: &ToolSpec,
        raw: &RawOutput,
        domain: &str,
        options: &ExecutionOptions,
    ) -> ToolResult {
        let mut metadata = ToolResultMetadata {
            output_type: Some(spec.output_type),
            raw_line_count: Some(count_lines(&raw.content)),
            exit_code: raw.exit_code,
            output_source: Some(raw.source),
            used_fallback: raw.used_fallback,
            ..Default::default()
        };
        if options.include_raw {
            metadata.raw_output = Some(clip_output(&raw.content, MAX_RAW_OUTPUT_BYTES));
        }

        match self.refine(spec.output_type, &raw.content, domain, options) {
            Ok(refined) => {
                if refined.truncated > 0 {
                    metadata.truncated = Some(refined.truncated);
                }
                ToolResult::success(&spec.name, domain, refined.entries, raw.duration)
                    .with_metadata(metadata)
            }
            Err(e) => {
                metadata.error_kind = Some("pipeline".to_string());
                ToolResult::failure(&spec.name, domain, e.to_string(), raw.duration)
                    .with_metadata(metadata)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::CommandTemplate;

    fn spec(name: &str, output_type: OutputType) -> ToolSpec {
        ToolSpec::new(name, CommandTemplate::parse(name, ["{domain}"]).unwrap())
            .with_output_type(output_type)
    }

    #[test]
    fn test_text_output_is_kept_verbatim() {
        let raw = RawOutput::from_stdout("example.com. 300 IN A 93.184.216.34");
        let result = ResultPipeline::new().process(
            &spec("dig", OutputType::Text),
            &raw,
            "example.com",
            &ExecutionOptions::default(),
        );
        assert!(result.success);
        assert_eq!(result.results, vec!["example.com. 300 IN A 93.184.216.34"]);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_domain_output_filtered_and_sorted() {
        let raw =
            RawOutput::from_stdout("www.example.com\nmail.example.com\n#comment\ninvalid..example.com");
        let result = ResultPipeline::new().process(
            &spec("subfinder", OutputType::Domains),
            &raw,
            "example.com",
            &ExecutionOptions::default(),
        );
        assert!(result.success);
        assert_eq!(result.results, vec!["mail.example.com", "www.example.com"]);
        assert_eq!(result.count, 2);
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.raw_line_count, Some(4));
        assert!(metadata.raw_output.is_none());
    }

    #[test]
    fn test_toggles_disable_steps() {
        let raw = RawOutput::from_stdout("b.example.com\na.example.com\nb.example.com");
        let options = ExecutionOptions::default()
            .with_deduplicate(false)
            .with_sort(false);
        let result = ResultPipeline::new().process(
            &spec("subfinder", OutputType::Domains),
            &raw,
            "example.com",
            &options,
        );
        assert_eq!(
            result.results,
            vec!["b.example.com", "a.example.com", "b.example.com"]
        );
    }

    #[test]
    fn test_truncates_to_max_results() {
        let raw = RawOutput::from_stdout("c\nb\na\nd");
        let options = ExecutionOptions::default().with_max_results(2);
        let result = ResultPipeline::new().process(
            &spec("echo", OutputType::Text),
            &raw,
            "example.com",
            &options,
        );
        assert_eq!(result.results, vec!["a", "b"]);
        assert_eq!(result.count, 2);
        assert_eq!(result.metadata.unwrap().truncated, Some(2));
    }

    #[test]
    fn test_json_falls_back_to_lines() {
        let raw = RawOutput::from_stdout("not json\nat all");
        let result = ResultPipeline::new().process(
            &spec("jsontool", OutputType::Json),
            &raw,
            "example.com",
            &ExecutionOptions::default(),
        );
        assert!(result.success);
        assert_eq!(result.results, vec!["at all", "not json"]);
    }

    #[test]
    fn test_certificate_json_as_domains() {
        let raw = RawOutput::from_stdout(
            r#"[{"name_value":"example.com\nwww.example.com"},{"name_value":"*.example.com"},{"name_value":"mail.example.com"}]"#,
        );
        let result = ResultPipeline::new().process(
            &spec("crtsh", OutputType::Domains),
            &raw,
            "example.com",
            &ExecutionOptions::default(),
        );
        assert!(result.success);
        assert_eq!(
            result.results,
            vec!["example.com", "mail.example.com", "www.example.com"]
        );
        assert!(result.results.iter().all(|r| !r.contains('\n') && !r.starts_with("*.")));
    }

    #[test]
    fn test_malformed_output_never_fails_and_count_matches() {
        let garbage = "\u{0}\u{fffd}[[[\n{\"host\":\n....\n@@@\n999.999.999.999\n";
        for output_type in [
            OutputType::Domains,
            OutputType::Urls,
            OutputType::Emails,
            OutputType::Ips,
            OutputType::Json,
            OutputType::Text,
        ] {
            let result = ResultPipeline::new().process(
                &spec("t", output_type),
                &RawOutput::from_stdout(garbage),
                "example.com",
                &ExecutionOptions::default(),
            );
            assert_eq!(result.count, result.results.len());
        }
    }

    #[test]
    fn test_oversized_output_becomes_failed_result() {
        let raw = RawOutput::from_stdout("a".repeat(64));
        let result = ResultPipeline::new().with_max_input_bytes(16).process(
            &spec("t", OutputType::Text),
            &raw,
            "example.com",
            &ExecutionOptions::default(),
        );
        assert!(!result.success);
        assert_eq!(result.count, 0);
        assert!(result.error.unwrap().contains("too large"));
        assert_eq!(
            result.metadata.unwrap().error_kind.as_deref(),
            Some("pipeline")
        );
    }

    #[test]
    fn test_include_raw_attaches_output() {
        let raw = RawOutput::from_stdout("line");
        let options = ExecutionOptions::default().with_raw_output(true);
        let result = ResultPipeline::new().process(
            &spec("t", OutputType::Text),
            &raw,
            "example.com",
            &options,
        );
        assert_eq!(result.metadata.unwrap().raw_output.as_deref(), Some("line"));
    }
}
