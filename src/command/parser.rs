use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{form_urlencoded, Url};

use super::tokenizer::{normalize, tokenize, unquote};

/// A copied command line broken into the pieces rules operate on.
///
/// At most one of `form_data` (non-empty) and `json_body` is populated for a
/// given body; `raw_body` only holds bodies that were neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRequest {
    pub url: String,
    pub method: String,
    /// Lowercased header names in first-seen order; repeated names keep the last value.
    pub headers: IndexMap<String, String>,
    pub query_params: IndexMap<String, String>,
    pub form_data: IndexMap<String, String>,
    pub json_body: Option<Value>,
    pub raw_body: Option<String>,
    /// Unrecognized flags and their arguments, exactly as they appeared.
    pub other_options: Vec<String>,
}

impl Default for StructuredRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: "GET".to_string(),
            headers: IndexMap::new(),
            query_params: IndexMap::new(),
            form_data: IndexMap::new(),
            json_body: None,
            raw_body: None,
            other_options: Vec::new(),
        }
    }
}

impl StructuredRequest {
    /// Whether a body (in any representation) is present.
    pub fn has_body(&self) -> bool {
        self.json_body.is_some() || !self.form_data.is_empty() || self.raw_body.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flag {
    Method,
    Header,
    Data,
    Url,
}

fn classify_flag(token: &str) -> Option<Flag> {
    match token {
        "-X" | "--request" => Some(Flag::Method),
        "-H" | "--header" => Some(Flag::Header),
        "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii" => Some(Flag::Data),
        "--url" => Some(Flag::Url),
        _ => None,
    }
}

/// `-XPOST`, `-H'a: b'`, `-d'x=1'`.
fn split_attached_flag(token: &str) -> Option<(Flag, &str)> {
    if token.starts_with("--") {
        return None;
    }
    let (flag, rest) = if let Some(rest) = token.strip_prefix("-X") {
        (Flag::Method, rest)
    } else if let Some(rest) = token.strip_prefix("-H") {
        (Flag::Header, rest)
    } else if let Some(rest) = token.strip_prefix("-d") {
        (Flag::Data, rest)
    } else {
        return None;
    };
    if rest.is_empty() {
        return None;
    }
    Some((flag, rest))
}

/// curl flags that never take an argument, so the token after them is left alone.
const BOOLEAN_FLAGS: &[&str] = &[
    "--compressed",
    "-k",
    "--insecure",
    "-s",
    "--silent",
    "-S",
    "--show-error",
    "-L",
    "--location",
    "-i",
    "--include",
    "-I",
    "--head",
    "-v",
    "--verbose",
    "-G",
    "--get",
    "-f",
    "--fail",
    "-N",
    "--no-buffer",
    "--http1.1",
    "--http2",
    "--http2-prior-knowledge",
    "--http3",
    "-g",
    "--globoff",
    "--path-as-is",
];

fn is_program_name(token: &str) -> bool {
    let bare = unquote(token);
    let name = bare.rsplit(['/', '\\']).next().unwrap_or(&bare);
    name.eq_ignore_ascii_case("curl") || name.eq_ignore_ascii_case("curl.exe")
}

fn is_http_url(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn looks_like_url(value: &str) -> bool {
    !value.starts_with('-') && (value.contains('.') || value.contains('/'))
}

/// Parse a copied command line. Never fails: input without a recognizable URL
/// produces a request with an empty `url`.
pub fn parse(command: &str) -> StructuredRequest {
    let tokens = tokenize(&normalize(command));
    let mut request = StructuredRequest::default();
    let mut body: Option<String> = None;
    let mut fallback_url: Option<(String, String)> = None;

    let mut i = 0;
    if tokens.first().is_some_and(|t| is_program_name(t)) {
        i = 1;
    }

    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if let Some(flag) = classify_flag(token) {
            let Some(value) = tokens.get(i) else {
                request.other_options.push(token.clone());
                break;
            };
            i += 1;
            apply_flag(&mut request, &mut body, flag, unquote(value));
            continue;
        }

        if let Some((flag, value)) = split_attached_flag(token) {
            apply_flag(&mut request, &mut body, flag, unquote(value));
            continue;
        }

        let bare = unquote(token);
        if is_http_url(&bare) {
            if request.url.is_empty() {
                request.url = bare;
            } else {
                request.other_options.push(token.clone());
            }
            continue;
        }

        if token.starts_with('-') && token.len() > 1 {
            request.other_options.push(token.clone());
            if BOOLEAN_FLAGS.contains(&token.as_str()) {
                continue;
            }
            if let Some(next) = tokens.get(i) {
                if !next.starts_with('-') && !is_http_url(&unquote(next)) {
                    request.other_options.push(next.clone());
                    i += 1;
                }
            }
            continue;
        }

        if request.url.is_empty() && fallback_url.is_none() && looks_like_url(&bare) {
            fallback_url = Some((token.clone(), bare));
            continue;
        }

        request.other_options.push(token.clone());
    }

    if let Some((raw, bare)) = fallback_url {
        if request.url.is_empty() {
            request.url = bare;
        } else {
            request.other_options.push(raw);
        }
    }

    request.query_params = parse_query(&request.url);

    if let Some(body) = body {
        classify_body(&mut request, body);
    }

    request
}

fn apply_flag(request: &mut StructuredRequest, body: &mut Option<String>, flag: Flag, value: String) {
    match flag {
        Flag::Method => {
            let method = value.trim();
            if !method.is_empty() {
                request.method = method.to_ascii_uppercase();
            }
        }
        Flag::Header => match value.split_once(':') {
            Some((name, header_value)) if !name.trim().is_empty() => {
                request
                    .headers
                    .insert(name.trim().to_lowercase(), header_value.trim().to_string());
            }
            _ => tracing::debug!(header = %value, "ignoring header without a name"),
        },
        Flag::Data => *body = Some(value),
        Flag::Url => {
            if request.url.is_empty() {
                request.url = value;
            }
        }
    }
}

/// Percent-decoded query parameters of `url`; empty when the URL does not parse.
pub fn parse_query(url: &str) -> IndexMap<String, String> {
    if url.is_empty() {
        return IndexMap::new();
    }
    match Url::parse(url) {
        Ok(parsed) => parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        Err(_) => IndexMap::new(),
    }
}

fn parse_form(body: &str) -> IndexMap<String, String> {
    form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn looks_like_form(body: &str) -> bool {
    body.contains('=') && !body.chars().any(char::is_whitespace)
}

/// Decide how a captured body is represented. With no recognized content type,
/// JSON is tried before form encoding, so a form body that is also valid JSON
/// (a bare number, say) is read as JSON.
fn classify_body(request: &mut StructuredRequest, body: String) {
    let content_type = request
        .headers
        .get("content-type")
        .map(|v| v.to_ascii_lowercase())
        .unwrap_or_default();

    if content_type.contains("application/json") {
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => request.json_body = Some(value),
            Err(err) => {
                tracing::debug!(error = %err, "body declared as JSON did not parse");
                request.raw_body = Some(body);
            }
        }
        return;
    }

    if content_type.contains("application/x-www-form-urlencoded") {
        let form = parse_form(&body);
        if form.is_empty() {
            request.raw_body = Some(body);
        } else {
            request.form_data = form;
        }
        return;
    }

    if let Ok(value) = serde_json::from_str::<Value>(&body) {
        request.json_body = Some(value);
    } else if looks_like_form(&body) {
        request.form_data = parse_form(&body);
    } else {
        request.raw_body = Some(body);
    }
}
