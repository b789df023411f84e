//! Stable, supported API surface for embedding curlscrub.
//!
//! This module re-exports the types and functions intended for external use.
//! Treat the contents of this module as SemVer-stable.

pub use crate::command::tokenizer::{normalize, tokenize, unquote};
pub use crate::command::{build, parse, parse_query, CommandBuilder, StructuredRequest};
pub use crate::db::SqliteStore;
pub use crate::error::{Result, ScrubError};
pub use crate::pipeline::{clean_command, CleanOutcome};
pub use crate::rules::{
    compile_pattern, export_rules, find_template, import_rules, is_match, parse_export, templates,
    validate_rule, validate_rules, FieldMatcher, FilterAction, FilterContext, FilterEngine,
    FilterResult, FilterRule, FilterTarget, ImportMode, ImportOutcome, MatchMode, RuleBook,
    RuleDraft, RuleExport, RuleTemplate, ValidationReport, DEFAULT_PRIORITY, EXPORT_VERSION,
    MAX_PRIORITY, MIN_PRIORITY,
};
pub use crate::store::{HistoryEntry, HistoryStore, MemoryStore, RuleStore};
