use std::path::Path;

use crate::error::Result;
use crate::store::{HistoryEntry, HistoryStore};

use super::util::{open_store, print_json};

pub struct HistoryOptions {
    pub limit: usize,
    pub json: bool,
}

pub fn run_history_list(database: &Path, options: &HistoryOptions) -> Result<()> {
    let entries = open_store(database)?.recent(options.limit)?;
    if options.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No history.");
        return Ok(());
    }
    print!("{}", format_history(&entries));
    Ok(())
}

pub fn format_history(entries: &[HistoryEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{}  {} rule(s) applied\n",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.applied_rules.len()
        ));
        out.push_str(&format!("  in:  {}\n", one_line(&entry.input)));
        out.push_str(&format!("  out: {}\n", one_line(&entry.output)));
    }
    out
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn run_history_clear(database: &Path) -> Result<()> {
    let removed = open_store(database)?.clear()?;
    println!("Removed {removed} history entr{}", if removed == 1 { "y" } else { "ies" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::format_history;
    use crate::store::HistoryEntry;
    use chrono::{TimeZone, Utc};

    #[test]
    fn flattens_multiline_commands() {
        let entry = HistoryEntry {
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            input: "curl 'https://x.io' \\\n  -H 'a: b'".to_string(),
            output: "curl \"https://x.io\"".to_string(),
            applied_rules: vec!["r1".to_string()],
        };
        let text = format_history(&[entry]);
        assert!(text.starts_with("2024-05-01 12:30:00  1 rule(s) applied"));
        assert!(text.contains("  in:  curl 'https://x.io' \\ -H 'a: b'"));
        assert!(text.contains("  out: curl \"https://x.io\""));
    }
}
