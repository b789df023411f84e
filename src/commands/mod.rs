mod clean;
mod history;
mod rules;
mod util;

pub use clean::{clean, record, run_clean, run_parse, CleanOptions};
pub use history::{format_history, run_history_clear, run_history_list, HistoryOptions};
pub use rules::{
    format_rule_table, run_rules_add, run_rules_export, run_rules_import, run_rules_list,
    run_rules_remove, run_rules_set_enabled, run_rules_template, run_rules_templates,
    run_rules_update, run_rules_validate, RuleEdit,
};
pub use util::{open_store, read_file, InputSource, OutputFormat};
