//! Typed command templates
//!
//! A [`CommandTemplate`] is parsed once, when the catalog is built, into a
//! program name plus argument segments. Rendering substitutes the three
//! known placeholders and always yields an argument vector; nothing here
//! ever produces a shell string.
//!
//! ```text
//! "subfinder" ["-d", "{domain}", "-o", "{outputFile}"]
//!      │               │                   │
//!      ▼               ▼                   ▼
//!  program     Placeholder::Domain  Placeholder::OutputFile
//! ```
//!
//! Unknown placeholders (`{target}`) are rejected at parse time, and a
//! placeholder whose value is missing at render time is an error as well,
//! so a literal `{...}` can never reach the spawned process.

use std::path::Path;
use thiserror::Error;

/// Errors raised while parsing or rendering a command template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("command program cannot be empty")]
    EmptyProgram,

    #[error("placeholders are not allowed in the program name: {0}")]
    PlaceholderInProgram(String),

    #[error("unknown placeholder '{{{placeholder}}}' in argument '{argument}'")]
    UnknownPlaceholder {
        placeholder: String,
        argument: String,
    },

    #[error("unterminated placeholder in argument '{0}'")]
    Unterminated(String),

    #[error("no value supplied for placeholder '{{{0}}}'")]
    MissingValue(&'static str),
}

/// The closed set of substitutable values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Domain,
    OutputFile,
    ExecutionId,
}

impl Placeholder {
    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::Domain => "domain",
            Placeholder::OutputFile => "outputFile",
            Placeholder::ExecutionId => "executionId",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "domain" => Some(Placeholder::Domain),
            "outputFile" => Some(Placeholder::OutputFile),
            "executionId" => Some(Placeholder::ExecutionId),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Value(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ArgTemplate {
    segments: Vec<Segment>,
}

impl ArgTemplate {
    fn parse(argument: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = argument;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| TemplateError::Unterminated(argument.to_string()))?;
            let name = &after[..close];
            let placeholder =
                Placeholder::from_name(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
                    placeholder: name.to_string(),
                    argument: argument.to_string(),
                })?;

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Value(placeholder));
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() || segments.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    fn render(&self, context: &TemplateContext<'_>) -> Result<String, TemplateError> {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Value(placeholder) => rendered.push_str(&context.value(*placeholder)?),
            }
        }
        Ok(rendered)
    }

    fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Value(p) if *p == placeholder))
    }

    fn source(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Value(placeholder) => format!("{{{}}}", placeholder.name()),
            })
            .collect()
    }
}

/// Values available for substitution during one attempt.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub domain: &'a str,
    pub execution_id: &'a str,
    pub output_file: Option<&'a Path>,
}

impl TemplateContext<'_> {
    fn value(&self, placeholder: Placeholder) -> Result<String, TemplateError> {
        match placeholder {
            Placeholder::Domain => Ok(self.domain.to_string()),
            Placeholder::ExecutionId => Ok(self.execution_id.to_string()),
            Placeholder::OutputFile => self
                .output_file
                .map(|path| path.to_string_lossy().into_owned())
                .ok_or(TemplateError::MissingValue(placeholder.name())),
        }
    }
}

/// A fully rendered invocation: program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl std::fmt::Display for RenderedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Parsed command template of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<ArgTemplate>,
}

impl CommandTemplate {
    /// Parse a program name and raw argument tokens.
    pub fn parse<I, S>(program: impl Into<String>, args: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(TemplateError::EmptyProgram);
        }
        if program.contains('{') || program.contains('}') {
            return Err(TemplateError::PlaceholderInProgram(program));
        }

        let args = args
            .into_iter()
            .map(|arg| ArgTemplate::parse(arg.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { program, args })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether any argument references `{outputFile}`.
    pub fn uses_output_file(&self) -> bool {
        self.args.iter().any(|arg| arg.uses(Placeholder::OutputFile))
    }

    /// The argument tokens as originally written.
    pub fn raw_args(&self) -> Vec<String> {
        self.args.iter().map(ArgTemplate::source).collect()
    }

    /// Substitute placeholders, producing an argument vector.
    pub fn render(&self, context: &TemplateContext<'_>) -> Result<RenderedCommand, TemplateError> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.render(context))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RenderedCommand {
            program: self.program.clone(),
            args,
        })
    }
}

impl std::fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.source())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context<'a>(output: Option<&'a Path>) -> TemplateContext<'a> {
        TemplateContext {
            domain: "example.com",
            execution_id: "exec-1",
            output_file: output,
        }
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let template =
            CommandTemplate::parse("subfinder", ["-d", "{domain}", "-o", "{outputFile}"]).unwrap();
        let path = PathBuf::from("/tmp/out.txt");
        let rendered = template.render(&context(Some(path.as_path()))).unwrap();

        assert_eq!(rendered.program, "subfinder");
        assert_eq!(rendered.args, vec!["-d", "example.com", "-o", "/tmp/out.txt"]);
        assert!(template.uses_output_file());
    }

    #[test]
    fn test_render_embedded_placeholder() {
        let template =
            CommandTemplate::parse("curl", ["https://crt.sh/?q=%25.{domain}&output=json"]).unwrap();
        let rendered = template.render(&context(None)).unwrap();
        assert_eq!(rendered.args, vec!["https://crt.sh/?q=%25.example.com&output=json"]);
        assert!(!template.uses_output_file());
    }

    #[test]
    fn test_domain_stays_single_argument() {
        let template = CommandTemplate::parse("dig", ["{domain}"]).unwrap();
        let ctx = TemplateContext {
            domain: "example.com; rm -rf /",
            execution_id: "x",
            output_file: None,
        };
        let rendered = template.render(&ctx).unwrap();
        assert_eq!(rendered.args.len(), 1);
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = CommandTemplate::parse("tool", ["--target={target}"]).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPlaceholder { ref placeholder, .. } if placeholder == "target"));
    }

    #[test]
    fn test_unterminated_placeholder_rejected() {
        let err = CommandTemplate::parse("tool", ["{domain"]).unwrap_err();
        assert!(matches!(err, TemplateError::Unterminated(_)));
    }

    #[test]
    fn test_missing_output_file_value() {
        let template = CommandTemplate::parse("tool", ["-o", "{outputFile}"]).unwrap();
        let err = template.render(&context(None)).unwrap_err();
        assert_eq!(err, TemplateError::MissingValue("outputFile"));
    }

    #[test]
    fn test_program_validation() {
        assert_eq!(
            CommandTemplate::parse("  ", Vec::<String>::new()).unwrap_err(),
            TemplateError::EmptyProgram
        );
        assert!(matches!(
            CommandTemplate::parse("{domain}", Vec::<String>::new()).unwrap_err(),
            TemplateError::PlaceholderInProgram(_)
        ));
    }

    #[test]
    fn test_raw_args_and_display() {
        let template = CommandTemplate::parse("amass", ["enum", "-d", "{domain}"]).unwrap();
        assert_eq!(template.raw_args(), vec!["enum", "-d", "{domain}"]);
        assert_eq!(template.to_string(), "amass enum -d {domain}");
    }

    #[test]
    fn test_empty_argument_preserved() {
        let template = CommandTemplate::parse("tool", [""]).unwrap();
        let rendered = template.render(&context(None)).unwrap();
        assert_eq!(rendered.args, vec![String::new()]);
    }
}
