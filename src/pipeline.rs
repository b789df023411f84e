//! Parse, filter and rebuild one command.

use serde::Serialize;

use crate::command::{parse, CommandBuilder, StructuredRequest};
use crate::rules::{FilterContext, FilterEngine};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanOutcome {
    /// The request after filtering.
    pub request: StructuredRequest,
    pub output: String,
    pub applied_rules: Vec<String>,
    pub warnings: Vec<String>,
}

impl CleanOutcome {
    /// Whether a URL was found; an empty URL means the input did not parse.
    pub fn has_url(&self) -> bool {
        !self.request.url.is_empty()
    }
}

/// Run `input` through the parser, `engine` and `builder`.
pub fn clean_command(input: &str, engine: &FilterEngine, builder: &CommandBuilder) -> CleanOutcome {
    let mut request = parse(input);
    let result = engine.apply_filters(&FilterContext::from(&request));
    result.apply_to(&mut request);
    let output = builder.build(&request, Some(&result.headers));

    tracing::info!(
        applied = result.applied_rules.len(),
        warnings = result.warnings.len(),
        "command cleaned"
    );

    CleanOutcome {
        request,
        output,
        applied_rules: result.applied_rules,
        warnings: result.warnings,
    }
}
