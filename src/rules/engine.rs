//! Priority-ordered application of filter rules to one request.
//!
//! Each target collection is filtered on its own:
//!
//! 1. Enabled rules for the target are ordered by priority, highest first
//!    (ties keep their original order).
//! 2. Only the highest-priority global rule counts: `delete_all` empties the
//!    collection, `keep_all` leaves it alone. Either is recorded as applied,
//!    even when the collection was already empty.
//! 3. `delete` and `keep` rules then run in priority order against the
//!    *original* field names. `delete` removes matches; `keep` puts matches
//!    back with their original values. `keep` never removes anything, so it
//!    only acts as an allow-list after a `delete_all` (or a broader `delete`).
//!
//! `delete` and `keep` rules that match nothing are not recorded. A JSON body
//! that is not an object is left untouched and records nothing. Output
//! collections keep the original field order.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use super::matcher::FieldMatcher;
use super::model::{FilterAction, FilterRule, FilterTarget};
use crate::command::StructuredRequest;

/// The immutable input of one filtering pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterContext {
    pub headers: IndexMap<String, String>,
    pub query_params: IndexMap<String, String>,
    pub form_data: IndexMap<String, String>,
    pub json_body: Option<Value>,
    pub url: String,
    pub method: String,
}

impl From<&StructuredRequest> for FilterContext {
    fn from(request: &StructuredRequest) -> Self {
        Self {
            headers: request.headers.clone(),
            query_params: request.query_params.clone(),
            form_data: request.form_data.clone(),
            json_body: request.json_body.clone(),
            url: request.url.clone(),
            method: request.method.clone(),
        }
    }
}

/// The filtered collections plus a trace of what fired.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
    pub headers: IndexMap<String, String>,
    pub query_params: IndexMap<String, String>,
    pub form_data: IndexMap<String, String>,
    pub json_body: Option<Value>,
    /// Ids of rules that matched something, in application order.
    pub applied_rules: Vec<String>,
    pub warnings: Vec<String>,
}

impl FilterResult {
    /// Copy the filtered collections into `request`.
    pub fn apply_to(&self, request: &mut StructuredRequest) {
        request.headers = self.headers.clone();
        request.query_params = self.query_params.clone();
        request.form_data = self.form_data.clone();
        request.json_body = self.json_body.clone();
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: FilterRule,
    matcher: FieldMatcher,
}

#[derive(Default)]
struct Trace {
    applied: Vec<String>,
    warnings: Vec<String>,
}

/// Holds the current rule set and applies it to filter contexts.
///
/// Not synchronized: callers that share an engine serialize `set_rules` and
/// `apply_filters` themselves.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    rules: Vec<CompiledRule>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: &[FilterRule]) -> Self {
        let mut engine = Self::new();
        engine.set_rules(rules);
        engine
    }

    /// Replace the rule set. Rules are copied; the caller's slice is not retained.
    pub fn set_rules(&mut self, rules: &[FilterRule]) {
        let mut compiled: Vec<CompiledRule> = rules
            .iter()
            .map(|rule| CompiledRule {
                matcher: if rule.action.is_global() {
                    FieldMatcher::Never
                } else {
                    FieldMatcher::new(&rule.match_value, rule.match_mode)
                },
                rule: rule.clone(),
            })
            .collect();
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        self.rules = compiled;
        tracing::debug!(rules = self.rules.len(), "filter rules loaded");
    }

    pub fn rules(&self) -> impl Iterator<Item = &FilterRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// Filter every target of `context`. Does not modify `context`.
    pub fn apply_filters(&self, context: &FilterContext) -> FilterResult {
        let mut trace = Trace::default();

        let headers = self.filter_map(FilterTarget::Headers, &context.headers, &mut trace);
        let query_params =
            self.filter_map(FilterTarget::QueryParams, &context.query_params, &mut trace);
        let form_data = self.filter_map(FilterTarget::FormData, &context.form_data, &mut trace);
        let json_body = match &context.json_body {
            Some(Value::Object(object)) => {
                Some(Value::Object(self.filter_object(object, &mut trace)))
            }
            other => other.clone(),
        };

        FilterResult {
            headers,
            query_params,
            form_data,
            json_body,
            applied_rules: trace.applied,
            warnings: trace.warnings,
        }
    }

    fn filter_map(
        &self,
        target: FilterTarget,
        original: &IndexMap<String, String>,
        trace: &mut Trace,
    ) -> IndexMap<String, String> {
        let keys: Vec<&str> = original.keys().map(String::as_str).collect();
        let surviving = self.surviving_keys(target, &keys, trace);
        original
            .iter()
            .filter(|(k, _)| surviving.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn filter_object(&self, original: &Map<String, Value>, trace: &mut Trace) -> Map<String, Value> {
        let keys: Vec<&str> = original.keys().map(String::as_str).collect();
        let surviving = self.surviving_keys(FilterTarget::JsonBody, &keys, trace);
        original
            .iter()
            .filter(|(k, _)| surviving.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn surviving_keys<'k>(
        &self,
        target: FilterTarget,
        keys: &[&'k str],
        trace: &mut Trace,
    ) -> HashSet<&'k str> {
        let mut present: HashSet<&'k str> = keys.iter().copied().collect();

        let rules: Vec<&CompiledRule> = self
            .rules
            .iter()
            .filter(|c| c.rule.enabled && c.rule.target == target)
            .collect();

        let globals: Vec<&FilterRule> = rules
            .iter()
            .map(|c| &c.rule)
            .filter(|r| r.action.is_global())
            .collect();
        if let Some(winner) = globals.first() {
            if globals.len() > 1 {
                trace.warnings.push(global_conflict_warning(target, &globals));
            }
            if winner.action == FilterAction::DeleteAll {
                present.clear();
            }
            tracing::debug!(filter_target = %target, rule = %winner.id, action = %winner.action, "global rule applied");
            trace.applied.push(winner.id.clone());
        }

        for compiled in rules.iter().filter(|c| !c.rule.action.is_global()) {
            let mut matched = 0usize;
            for key in keys.iter().copied() {
                if !compiled.matcher.matches(key) {
                    continue;
                }
                matched += 1;
                match compiled.rule.action {
                    FilterAction::Delete => {
                        present.remove(key);
                    }
                    FilterAction::Keep => {
                        present.insert(key);
                    }
                    FilterAction::DeleteAll | FilterAction::KeepAll => {}
                }
            }
            if matched > 0 {
                tracing::debug!(filter_target = %target, rule = %compiled.rule.id, matched, "rule applied");
                trace.applied.push(compiled.rule.id.clone());
            }
        }

        present
    }
}

fn global_conflict_warning(target: FilterTarget, globals: &[&FilterRule]) -> String {
    let winner = globals[0];
    let tied: Vec<&&FilterRule> = globals[1..]
        .iter()
        .filter(|r| r.priority == winner.priority && r.action != winner.action)
        .collect();
    if tied.is_empty() {
        format!(
            "{} global rules target {}; only {} {} (priority {}) was applied",
            globals.len(),
            target,
            winner.action,
            winner.display_name(),
            winner.priority
        )
    } else {
        format!(
            "{} {} and {} {} on {} share priority {}; the earlier rule {} was applied",
            winner.action,
            winner.display_name(),
            tied[0].action,
            tied[0].display_name(),
            target,
            winner.priority,
            winner.display_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterContext, FilterEngine};
    use crate::command::parse;
    use crate::rules::{FilterAction, FilterRule, FilterTarget, MatchMode, RuleDraft};
    use serde_json::json;

    fn rule(
        action: FilterAction,
        target: FilterTarget,
        mode: MatchMode,
        value: &str,
        priority: i64,
    ) -> FilterRule {
        RuleDraft::new(format!("{action} {value}"), action, target, mode, value, priority)
            .into_rule()
    }

    fn context(cmd: &str) -> FilterContext {
        FilterContext::from(&parse(cmd))
    }

    #[test]
    fn deletes_exact_header() {
        let ctx = context(
            "curl 'https://api.example.com/users' -H 'user-agent: Mozilla/5.0' -H 'authorization: Bearer x'",
        );
        let r = rule(FilterAction::Delete, FilterTarget::Headers, MatchMode::Exact, "user-agent", 50);
        let result = FilterEngine::with_rules(&[r.clone()]).apply_filters(&ctx);

        assert_eq!(result.headers.len(), 1);
        assert_eq!(result.headers.get("authorization").unwrap(), "Bearer x");
        assert_eq!(result.applied_rules, vec![r.id]);
    }

    #[test]
    fn deletes_query_param() {
        let ctx = context("curl 'https://x.io/list?page=1&limit=10'");
        let r = rule(FilterAction::Delete, FilterTarget::QueryParams, MatchMode::Exact, "page", 50);
        let result = FilterEngine::with_rules(&[r]).apply_filters(&ctx);

        assert_eq!(result.query_params.len(), 1);
        assert_eq!(result.query_params.get("limit").unwrap(), "10");
    }

    #[test]
    fn applied_rules_follow_priority() {
        let ctx = context("curl https://x.io -H 'user-agent: a' -H 'accept: b' -H 'x: c'");
        let a = rule(FilterAction::Delete, FilterTarget::Headers, MatchMode::Exact, "user-agent", 30);
        let b = rule(FilterAction::Delete, FilterTarget::Headers, MatchMode::Exact, "accept", 70);
        let result = FilterEngine::with_rules(&[a.clone(), b.clone()]).apply_filters(&ctx);

        assert_eq!(result.applied_rules, vec![b.id, a.id]);
        assert_eq!(result.headers.keys().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn delete_all_with_keep_is_an_allow_list() {
        let ctx = context(
            "curl https://x.io -H 'authorization: Bearer t' -H 'accept: */*' -H 'user-agent: u'",
        );
        let wipe = rule(FilterAction::DeleteAll, FilterTarget::Headers, MatchMode::Exact, "", 10);
        let keep = rule(FilterAction::Keep, FilterTarget::Headers, MatchMode::Exact, "authorization", 90);
        let result = FilterEngine::with_rules(&[wipe.clone(), keep.clone()]).apply_filters(&ctx);

        assert_eq!(result.headers.len(), 1);
        assert_eq!(result.headers.get("authorization").unwrap(), "Bearer t");
        assert!(result.applied_rules.contains(&wipe.id));
        assert!(result.applied_rules.contains(&keep.id));
    }

    #[test]
    fn keep_alone_removes_nothing() {
        let ctx = context("curl https://x.io -H 'a: 1' -H 'b: 2'");
        let keep = rule(FilterAction::Keep, FilterTarget::Headers, MatchMode::Exact, "a", 50);
        let result = FilterEngine::with_rules(&[keep.clone()]).apply_filters(&ctx);

        assert_eq!(result.headers, ctx.headers);
        assert_eq!(result.applied_rules, vec![keep.id]);
    }

    #[test]
    fn keep_restores_after_delete_in_original_order() {
        let ctx = context("curl https://x.io -H 'x-a: 1' -H 'accept: 2' -H 'x-b: 3'");
        let drop_x = rule(FilterAction::Delete, FilterTarget::Headers, MatchMode::StartsWith, "x-", 80);
        let keep_b = rule(FilterAction::Keep, FilterTarget::Headers, MatchMode::Exact, "x-b", 20);
        let result = FilterEngine::with_rules(&[keep_b, drop_x]).apply_filters(&ctx);

        assert_eq!(result.headers.keys().collect::<Vec<_>>(), vec!["accept", "x-b"]);
    }

    #[test]
    fn only_top_global_rule_applies() {
        let ctx = context("curl https://x.io -H 'a: 1'");
        let keep_all = rule(FilterAction::KeepAll, FilterTarget::Headers, MatchMode::Exact, "", 60);
        let delete_all = rule(FilterAction::DeleteAll, FilterTarget::Headers, MatchMode::Exact, "", 40);
        let result = FilterEngine::with_rules(&[delete_all.clone(), keep_all.clone()]).apply_filters(&ctx);

        assert_eq!(result.headers, ctx.headers);
        assert_eq!(result.applied_rules, vec![keep_all.id]);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("only keep_all"));
    }

    #[test]
    fn tied_global_rules_warn_and_first_wins() {
        let ctx = context("curl https://x.io -H 'a: 1'");
        let delete_all = rule(FilterAction::DeleteAll, FilterTarget::Headers, MatchMode::Exact, "", 50);
        let keep_all = rule(FilterAction::KeepAll, FilterTarget::Headers, MatchMode::Exact, "", 50);
        let result = FilterEngine::with_rules(&[delete_all.clone(), keep_all]).apply_filters(&ctx);

        assert!(result.headers.is_empty());
        assert_eq!(result.applied_rules, vec![delete_all.id]);
        assert!(result.warnings[0].contains("share priority 50"));
    }

    #[test]
    fn invalid_regex_fails_open() {
        let ctx = context("curl https://x.io -H 'a: 1' -H '[invalid regex: 2'");
        let bad = rule(FilterAction::Delete, FilterTarget::Headers, MatchMode::Regex, "[invalid regex", 50);
        let result = FilterEngine::with_rules(&[bad]).apply_filters(&ctx);

        assert!(result.applied_rules.is_empty());
        assert_eq!(result.headers, ctx.headers);
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let ctx = context("curl https://x.io -H 'a: 1'");
        let mut off = rule(FilterAction::DeleteAll, FilterTarget::Headers, MatchMode::Exact, "", 100);
        off.enabled = false;
        let result = FilterEngine::with_rules(&[off]).apply_filters(&ctx);

        assert!(result.applied_rules.is_empty());
        assert_eq!(result.headers, ctx.headers);
    }

    #[test]
    fn json_body_object_is_filtered_at_top_level() {
        let ctx = context(
            r#"curl https://x.io -H 'content-type: application/json' -d '{"password":"p","user":{"password":"nested"},"id":1}'"#,
        );
        let r = rule(FilterAction::Delete, FilterTarget::JsonBody, MatchMode::Exact, "password", 50);
        let result = FilterEngine::with_rules(&[r.clone()]).apply_filters(&ctx);

        assert_eq!(
            result.json_body,
            Some(json!({"user": {"password": "nested"}, "id": 1}))
        );
        assert_eq!(result.applied_rules, vec![r.id]);
        // The context is untouched.
        assert_eq!(
            ctx.json_body,
            Some(json!({"password": "p", "user": {"password": "nested"}, "id": 1}))
        );
    }

    #[test]
    fn non_object_json_bodies_are_untouched() {
        let ctx = context("curl https://x.io -d '[1,2,3]'");
        let r = rule(FilterAction::DeleteAll, FilterTarget::JsonBody, MatchMode::Exact, "", 50);
        let result = FilterEngine::with_rules(&[r]).apply_filters(&ctx);

        assert_eq!(result.json_body, Some(json!([1, 2, 3])));
        assert!(result.applied_rules.is_empty());
    }

    #[test]
    fn form_data_filtering() {
        let ctx = context("curl https://x.io -d 'csrf_token=abc&name=bob&email=b%40x.io'");
        let r = rule(FilterAction::Delete, FilterTarget::FormData, MatchMode::Contains, "TOKEN", 50);
        let result = FilterEngine::with_rules(&[r]).apply_filters(&ctx);

        assert_eq!(result.form_data.keys().collect::<Vec<_>>(), vec!["name", "email"]);
    }

    #[test]
    fn targets_do_not_interact() {
        let ctx = context("curl 'https://x.io/?token=1' -H 'token: 2'");
        let r = rule(FilterAction::Delete, FilterTarget::QueryParams, MatchMode::Exact, "token", 50);
        let result = FilterEngine::with_rules(&[r]).apply_filters(&ctx);

        assert!(result.query_params.is_empty());
        assert_eq!(result.headers.get("token").unwrap(), "2");
    }

    #[test]
    fn repeated_application_is_identical() {
        let ctx = context(
            "curl 'https://x.io/?utm_source=a&q=1' -H 'authorization: t' -H 'cookie: c' -H 'accept: */*'",
        );
        let rules = vec![
            rule(FilterAction::DeleteAll, FilterTarget::Headers, MatchMode::Exact, "", 10),
            rule(FilterAction::Keep, FilterTarget::Headers, MatchMode::Regex, "^(authorization|accept)$", 90),
            rule(FilterAction::Delete, FilterTarget::QueryParams, MatchMode::StartsWith, "utm_", 50),
        ];
        let engine = FilterEngine::with_rules(&rules);
        let first = engine.apply_filters(&ctx);
        let second = engine.apply_filters(&ctx);
        assert_eq!(first, second);
        assert_eq!(first.applied_rules.len(), 3);
    }

    #[test]
    fn rules_that_match_nothing_are_not_recorded() {
        let ctx = context("curl https://x.io -H 'a: 1'");
        let r = rule(FilterAction::Delete, FilterTarget::Headers, MatchMode::Exact, "b", 50);
        let wipe_form = rule(FilterAction::DeleteAll, FilterTarget::FormData, MatchMode::Exact, "", 50);
        let result = FilterEngine::with_rules(&[r, wipe_form.clone()]).apply_filters(&ctx);
        assert_eq!(result.applied_rules, vec![wipe_form.id]);
    }

    #[test]
    fn global_rules_apply_to_empty_collections() {
        let ctx = context("curl https://x.io/ -H 'a: 1'");
        let wipe_query = rule(FilterAction::DeleteAll, FilterTarget::QueryParams, MatchMode::Exact, "", 40);
        let keep_query = rule(FilterAction::KeepAll, FilterTarget::QueryParams, MatchMode::Exact, "", 20);
        let keep_body = rule(FilterAction::KeepAll, FilterTarget::JsonBody, MatchMode::Exact, "", 50);
        let result = FilterEngine::with_rules(&[wipe_query.clone(), keep_query, keep_body])
            .apply_filters(&ctx);

        assert!(result.query_params.is_empty());
        assert_eq!(result.applied_rules, vec![wipe_query.id]);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.json_body.is_none());
    }
}
