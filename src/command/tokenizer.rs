//! Shell-like splitting of copied command lines.
//!
//! Tokens keep their quote characters; [`unquote`] resolves them once the
//! parser knows what a token is for. Every function here makes a single pass
//! over its input.

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
    /// Bash `$'...'` string with backslash escapes.
    Ansi,
}

impl Quote {
    fn closing(self) -> char {
        match self {
            Quote::Single | Quote::Ansi => '\'',
            Quote::Double => '"',
        }
    }

    fn has_escapes(self) -> bool {
        !matches!(self, Quote::Single)
    }
}

/// Collapse backslash-newline continuations and runs of whitespace into single spaces.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\n') => {
                    chars.next();
                    pending_space = true;
                    continue;
                }
                Some('\r') => {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'\n') {
                        chars.next();
                        chars.next();
                        pending_space = true;
                        continue;
                    }
                }
                _ => {}
            }
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}

/// Split on unquoted whitespace. Quote delimiters stay in the tokens and an
/// unterminated quote runs to the end of the input.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<Quote> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            current.push(c);
            if c == '\\' && q.has_escapes() {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            } else if c == q.closing() {
                quote = None;
            }
            continue;
        }

        if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
            continue;
        }

        in_token = true;
        match c {
            '\'' => {
                quote = Some(if current.ends_with('$') {
                    Quote::Ansi
                } else {
                    Quote::Single
                });
                current.push(c);
            }
            '"' => {
                quote = Some(Quote::Double);
                current.push(c);
            }
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            _ => current.push(c),
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Strip shell quoting from one token and resolve its escapes.
pub fn unquote(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut quote: Option<Quote> = None;
    let mut chars = token.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            None => match c {
                '\'' => quote = Some(Quote::Single),
                '"' => quote = Some(Quote::Double),
                '$' if chars.peek() == Some(&'\'') => {
                    chars.next();
                    quote = Some(Quote::Ansi);
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                _ => out.push(c),
            },
            Some(Quote::Single) => {
                if c == '\'' {
                    quote = None;
                } else {
                    out.push(c);
                }
            }
            Some(Quote::Double) => match c {
                '"' => quote = None,
                '\\' => match chars.peek() {
                    Some(&next @ ('"' | '\\' | '$' | '`')) => {
                        chars.next();
                        out.push(next);
                    }
                    _ => out.push('\\'),
                },
                _ => out.push(c),
            },
            Some(Quote::Ansi) => match c {
                '\'' => quote = None,
                '\\' => push_ansi_escape(&mut out, &mut chars),
                _ => out.push(c),
            },
        }
    }

    out
}

fn push_ansi_escape(out: &mut String, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    let Some(c) = chars.next() else {
        out.push('\\');
        return;
    };
    match c {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        '0' => out.push('\0'),
        '\\' | '\'' | '"' | '?' => out.push(c),
        'x' | 'u' => {
            let max_digits = if c == 'x' { 2 } else { 4 };
            let mut digits = String::new();
            while digits.len() < max_digits {
                match chars.peek() {
                    Some(d) if d.is_ascii_hexdigit() => {
                        digits.push(*d);
                        chars.next();
                    }
                    _ => break,
                }
            }
            match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                Some(decoded) => out.push(decoded),
                None => {
                    out.push('\\');
                    out.push(c);
                    out.push_str(&digits);
                }
            }
        }
        other => {
            out.push('\\');
            out.push(other);
        }
    }
}
