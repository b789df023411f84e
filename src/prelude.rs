//! Convenience prelude for common curlscrub embedding tasks.

pub use crate::api::{
    build, clean_command, parse, CommandBuilder, FilterAction, FilterEngine, FilterRule,
    FilterTarget, MatchMode, Result, RuleDraft, ScrubError, StructuredRequest,
};
