//! Filter rules: model, matching, application, validation and exchange.

mod book;
mod engine;
mod matcher;
mod model;
mod templates;
mod transfer;
mod validator;

pub use book::RuleBook;
pub use engine::{FilterContext, FilterEngine, FilterResult};
pub use matcher::{compile_pattern, is_match, FieldMatcher};
pub use model::{
    FilterAction, FilterRule, FilterTarget, MatchMode, RuleDraft, DEFAULT_PRIORITY, MAX_PRIORITY,
    MIN_PRIORITY,
};
pub use templates::{find_template, templates, RuleTemplate};
pub use transfer::{
    export_rules, import_rules, parse_export, ImportMode, ImportOutcome, RuleExport,
    EXPORT_VERSION,
};
pub use validator::{validate_rule, validate_rules, ValidationReport};
