/*!
 * Extraction of error annotations from evaluator responses.
 *
 * The evaluator answers in a loose MQM layout:
 *
 * ```text
 * Critical:
 * no-error
 * Major:
 * accuracy/mistranslation - "involvement"
 * Minor:
 * fluency/grammar - "wäre"
 * ```
 *
 * Blank lines are skipped. Other lines are classified by `LINE_RULES`,
 * evaluated top to bottom. A line no rule claims is parsed as `category - "span"`; lines that do not fit that
 * shape become diagnostics instead of errors.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{AnnotationSet, ErrorAnnotation, Severity};

/// Separator between category and quoted span
pub const CATEGORY_SEPARATOR: &str = " - ";

/// Quoted span, straight or curly double quotes
static SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["“”](.*?)["“”]"#).expect("Invalid span regex")
});

/// What a matching line rule does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// Move the severity cursor; the line itself yields nothing
    SetSeverity(Severity),
    /// Drop the line without a diagnostic
    Skip,
}

/// One entry of the line classification table
#[derive(Debug, Clone, Copy)]
pub struct LineRule {
    /// Short name used in logs and tests
    pub name: &'static str,
    /// Lowercase tokens; the rule matches when any is contained in the line
    pub tokens: &'static [&'static str],
    /// Action taken on a match
    pub action: LineAction,
}

impl LineRule {
    /// Check the rule against an already lowercased line
    pub fn matches(&self, lowered: &str) -> bool {
        self.tokens.iter().any(|token| lowered.contains(token))
    }
}

/// Line rules in priority order
pub const LINE_RULES: [LineRule; 4] = [
    LineRule {
        name: "critical-header",
        tokens: &["critical:", "critical error"],
        action: LineAction::SetSeverity(Severity::Critical),
    },
    LineRule {
        name: "major-header",
        tokens: &["major:", "major error"],
        action: LineAction::SetSeverity(Severity::Major),
    },
    LineRule {
        name: "minor-header",
        tokens: &["minor:", "minor error"],
        action: LineAction::SetSeverity(Severity::Minor),
    },
    LineRule {
        name: "no-error",
        tokens: &["no-error", "no error"],
        action: LineAction::Skip,
    },
];

/// Classification of a single response line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Claimed by a line rule
    Rule(LineAction),
    /// A well-formed annotation
    Annotation(ErrorAnnotation),
    /// Unparseable; kept as a diagnostic
    Omitted,
}

/// Result of parsing one evaluator response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Annotations bucketed by severity
    pub annotations: AnnotationSet,
    /// One message per omitted line
    pub diagnostics: Vec<String>,
}

/// Parser for evaluator responses
pub struct AnnotationExtractor;

impl AnnotationExtractor {
    /// Parse a whole response into an annotation set plus diagnostics
    pub fn extract(response: &str) -> Extraction {
        let mut extraction = Extraction::default();
        let mut cursor = Severity::Minor;

        for line in response.split('\n') {
            match Self::classify_line(line) {
                LineOutcome::Rule(LineAction::SetSeverity(severity)) => cursor = severity,
                LineOutcome::Rule(LineAction::Skip) => {}
                LineOutcome::Annotation(annotation) => extraction.annotations.push(cursor, annotation),
                LineOutcome::Omitted => {
                    debug!("Omitting evaluator line: {}", line);
                    extraction.diagnostics.push(Self::omitted_message(line));
                }
            }
        }

        extraction
    }

    /// Classify a single line without any cursor state
    pub fn classify_line(line: &str) -> LineOutcome {
        // Blank lines carry nothing to report
        if line.trim().is_empty() {
            return LineOutcome::Rule(LineAction::Skip);
        }

        let lowered = line.to_lowercase();
        if let Some(rule) = LINE_RULES.iter().find(|rule| rule.matches(&lowered)) {
            return LineOutcome::Rule(rule.action);
        }

        let Some((category, rest)) = line.split_once(CATEGORY_SEPARATOR) else {
            return LineOutcome::Omitted;
        };

        match SPAN_REGEX.captures(rest).and_then(|caps| caps.get(1)) {
            Some(span) => LineOutcome::Annotation(ErrorAnnotation::new(category, span.as_str())),
            None => LineOutcome::Omitted,
        }
    }

    /// Diagnostic text for an omitted line
    pub fn omitted_message(line: &str) -> String {
        format!("This line will omit: {}", line)
    }
}
