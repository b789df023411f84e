//! Built-in rule bundles.

use super::model::{FilterAction, FilterTarget, MatchMode, RuleDraft};

pub struct RuleTemplate {
    pub name: &'static str,
    pub description: &'static str,
    build: fn() -> Vec<RuleDraft>,
}

impl RuleTemplate {
    pub fn rules(&self) -> Vec<RuleDraft> {
        (self.build)()
    }
}

fn browser_noise() -> Vec<RuleDraft> {
    vec![
        RuleDraft::new(
            "Strip sec-* headers",
            FilterAction::Delete,
            FilterTarget::Headers,
            MatchMode::StartsWith,
            "sec-",
            60,
        ),
        RuleDraft::new(
            "Strip browser headers",
            FilterAction::Delete,
            FilterTarget::Headers,
            MatchMode::Regex,
            "^(user-agent|accept-language|accept-encoding|cache-control|pragma|priority|dnt|upgrade-insecure-requests|referer|origin)$",
            60,
        ),
    ]
}

fn auth_only() -> Vec<RuleDraft> {
    vec![
        RuleDraft::new(
            "Drop all headers",
            FilterAction::DeleteAll,
            FilterTarget::Headers,
            MatchMode::Exact,
            "",
            10,
        )
        .with_description("Pairs with the keep rule below to form an allow-list"),
        RuleDraft::new(
            "Keep auth and content headers",
            FilterAction::Keep,
            FilterTarget::Headers,
            MatchMode::Regex,
            "^(authorization|proxy-authorization|cookie|x-api-key|x-auth-token|x-csrf-token|content-type|accept)$",
            90,
        ),
    ]
}

fn tracking_params() -> Vec<RuleDraft> {
    vec![
        RuleDraft::new(
            "Strip utm_* params",
            FilterAction::Delete,
            FilterTarget::QueryParams,
            MatchMode::StartsWith,
            "utm_",
            50,
        ),
        RuleDraft::new(
            "Strip click ids",
            FilterAction::Delete,
            FilterTarget::QueryParams,
            MatchMode::Regex,
            "^(fbclid|gclid|dclid|msclkid|mc_cid|mc_eid|_ga|_gl|yclid)$",
            50,
        ),
    ]
}

fn no_cookies() -> Vec<RuleDraft> {
    vec![RuleDraft::new(
        "Strip cookies",
        FilterAction::Delete,
        FilterTarget::Headers,
        MatchMode::Exact,
        "cookie",
        70,
    )]
}

pub fn templates() -> Vec<RuleTemplate> {
    vec![
        RuleTemplate {
            name: "browser-noise",
            description: "Remove sec-*, user agent and other headers browsers add",
            build: browser_noise,
        },
        RuleTemplate {
            name: "auth-only",
            description: "Keep only auth and content headers",
            build: auth_only,
        },
        RuleTemplate {
            name: "tracking-params",
            description: "Remove utm_* and click-id query parameters",
            build: tracking_params,
        },
        RuleTemplate {
            name: "no-cookies",
            description: "Remove the cookie header",
            build: no_cookies,
        },
    ]
}

pub fn find_template(name: &str) -> Option<RuleTemplate> {
    templates()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}
