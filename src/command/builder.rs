use indexmap::IndexMap;
use url::{form_urlencoded, Url};

use super::parser::{parse_query, StructuredRequest};

/// Reassembles a [`StructuredRequest`] into a `curl` command line.
///
/// Arguments are double-quoted. Bodies are always emitted with `-d`, so the
/// original data flag spelling is not preserved.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandBuilder {
    multiline: bool,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put each argument on its own line with `\` continuations.
    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// Build the command. `headers_override` replaces the request's headers when given.
    pub fn build(
        &self,
        request: &StructuredRequest,
        headers_override: Option<&IndexMap<String, String>>,
    ) -> String {
        let mut parts: Vec<String> = vec!["curl".to_string()];

        if !request.method.is_empty() && !request.method.eq_ignore_ascii_case("GET") {
            parts.push(format!("-X {}", request.method));
        }

        let headers = headers_override.unwrap_or(&request.headers);
        for (name, value) in headers {
            parts.push(format!("-H {}", shell_quote(&format!("{name}: {value}"))));
        }

        if let Some(body) = serialize_body(request) {
            parts.push(format!("-d {}", shell_quote(&body)));
        }

        parts.extend(request.other_options.iter().cloned());

        if !request.url.is_empty() {
            parts.push(shell_quote(&rebuild_url(&request.url, &request.query_params)));
        }

        let separator = if self.multiline { " \\\n  " } else { " " };
        parts.join(separator)
    }
}

/// Build a single-line command with the default builder.
pub fn build(request: &StructuredRequest, headers_override: Option<&IndexMap<String, String>>) -> String {
    CommandBuilder::new().build(request, headers_override)
}

fn serialize_body(request: &StructuredRequest) -> Option<String> {
    if let Some(json) = &request.json_body {
        return serde_json::to_string(json).ok();
    }
    if !request.form_data.is_empty() {
        return Some(
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(request.form_data.iter())
                .finish(),
        );
    }
    request.raw_body.clone()
}

/// Re-append `params` to `url` when they differ from what the URL already carries.
fn rebuild_url(url: &str, params: &IndexMap<String, String>) -> String {
    if parse_query(url) == *params {
        return url.to_string();
    }

    match Url::parse(url) {
        Ok(mut parsed) => {
            if params.is_empty() {
                parsed.set_query(None);
            } else {
                parsed.query_pairs_mut().clear().extend_pairs(params.iter());
            }
            parsed.into()
        }
        Err(_) => {
            let (without_fragment, fragment) = match url.split_once('#') {
                Some((head, frag)) => (head, Some(frag)),
                None => (url, None),
            };
            let base = without_fragment
                .split_once('?')
                .map_or(without_fragment, |(head, _)| head);
            let mut out = base.to_string();
            if !params.is_empty() {
                out.push('?');
                out.push_str(
                    &form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(params.iter())
                        .finish(),
                );
            }
            if let Some(fragment) = fragment {
                out.push('#');
                out.push_str(fragment);
            }
            out
        }
    }
}

/// Double-quote `value` for a POSIX shell. Values holding control characters
/// or non-space whitespace use `$'...'` so they survive re-parsing.
fn shell_quote(value: &str) -> String {
    if value.chars().any(needs_ansi_escape) {
        return ansi_quote(value);
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn needs_ansi_escape(c: char) -> bool {
    c.is_control() || (c.is_whitespace() && c != ' ')
}

fn ansi_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 3);
    out.push_str("$'");
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if needs_ansi_escape(c) && (c as u32) < 0x80 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if needs_ansi_escape(c) => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::{build, CommandBuilder};
    use crate::command::parse;
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn builds_get_without_method_flag() {
        let req = parse("curl 'https://x.io/a' -H 'Accept: */*'");
        assert_eq!(build(&req, None), r#"curl -H "accept: */*" "https://x.io/a""#);
    }

    #[test]
    fn builds_method_body_and_other_options() {
        let req = parse(
            r#"curl -X POST https://x.io -H 'content-type: application/json' --data-raw '{"a":"$x"}' --compressed"#,
        );
        assert_eq!(
            build(&req, None),
            r#"curl -X POST -H "content-type: application/json" -d "{\"a\":\"\$x\"}" --compressed "https://x.io""#
        );
    }

    #[test]
    fn headers_override_replaces_headers() {
        let req = parse("curl https://x.io -H 'a: 1' -H 'b: 2'");
        let mut only_b = IndexMap::new();
        only_b.insert("b".to_string(), "2".to_string());
        assert_eq!(build(&req, Some(&only_b)), r#"curl -H "b: 2" "https://x.io""#);
    }

    #[test]
    fn mutated_query_params_are_reappended() {
        let mut req = parse("curl 'https://x.io/list?page=1&limit=10#top'");
        req.query_params.shift_remove("page");
        assert_eq!(build(&req, None), r#"curl "https://x.io/list?limit=10#top""#);

        req.query_params.clear();
        assert_eq!(build(&req, None), r#"curl "https://x.io/list#top""#);
    }

    #[test]
    fn untouched_url_is_emitted_verbatim() {
        let req = parse("curl 'https://x.io/search?q=a%20b&x'");
        assert_eq!(build(&req, None), r#"curl "https://x.io/search?q=a%20b&x""#);
    }

    #[test]
    fn form_body_is_reencoded() {
        let mut req = parse("curl https://x.io -d 'a=1&b=two%20words'");
        req.form_data.shift_remove("a");
        assert_eq!(build(&req, None), r#"curl -d "b=two+words" "https://x.io""#);
    }

    #[test]
    fn emptied_form_emits_no_body() {
        let mut req = parse("curl https://x.io -d 'a=1'");
        req.form_data.clear();
        assert_eq!(build(&req, None), r#"curl "https://x.io""#);
    }

    #[test]
    fn json_body_preserves_key_order() {
        let mut req = parse("curl https://x.io");
        req.json_body = Some(json!({"z": 1, "a": 2}));
        assert_eq!(build(&req, None), r#"curl -d "{\"z\":1,\"a\":2}" "https://x.io""#);
    }

    #[test]
    fn multiline_output() {
        let req = parse("curl https://x.io -H 'a: 1'");
        let out = CommandBuilder::new().multiline(true).build(&req, None);
        assert_eq!(out, "curl \\\n  -H \"a: 1\" \\\n  \"https://x.io\"");
        assert_eq!(parse(&out).headers, req.headers);
    }

    #[test]
    fn control_characters_use_ansi_quoting() {
        let req = parse(r#"curl https://x.io -H $'x-note: a\nb\tc\x01 it\'s'"#);
        assert_eq!(req.headers.get("x-note").unwrap(), "a\nb\tc\u{1} it's");

        let once = build(&req, None);
        assert_eq!(once, r#"curl -H $'x-note: a\nb\tc\x01 it\'s' "https://x.io""#);
        assert_eq!(build(&parse(&once), None), once);
    }

    #[test]
    fn round_trip_is_stable() {
        let cmds = [
            r#"curl 'https://api.example.com/users?x=1' -H 'user-agent: Mozilla/5.0' -H 'authorization: Bearer x' --compressed"#,
            r#"curl -X PATCH https://x.io/a -H "Content-Type: application/json" -d '{"k":"v \"q\""}'"#,
            r#"curl https://x.io -H $'x-note: it\'s $5' -d 'a=1&b=2'"#,
        ];
        for cmd in cmds {
            let once = build(&parse(cmd), None);
            let twice = build(&parse(&once), None);
            let (a, b) = (parse(&once), parse(&twice));
            assert_eq!(a.headers, b.headers, "{cmd}");
            assert_eq!(a.method, b.method, "{cmd}");
            assert_eq!(a.url, b.url, "{cmd}");
            assert_eq!(once, twice, "{cmd}");
        }
    }
}
