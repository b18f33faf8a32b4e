// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML helpers: wrapping plain text for the renderer, and flattening markup
// back to text for the built-in PDF writer.

/// Escape `&`, `<` and `>` so text can be embedded in HTML.
///
/// Quotes are left alone: the text only ever lands in element content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Wrap plain text in a minimal monospace HTML page.
pub fn text_to_html(text: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><style>\
         body {{ margin: 0; }} \
         pre {{ font-family: monospace; font-size: 12px; white-space: pre-wrap; word-wrap: break-word; margin: 0; }}\
         </style></head><body><pre>{}</pre></body></html>\n",
        escape_text(text)
    )
}

/// Tags whose content is never visible.
const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "head"];

/// Tags that end a visual line.
const BREAKING_TAGS: [&str; 14] = [
    "br", "p", "div", "tr", "li", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "table", "hr",
];

/// Flatten HTML to plain text: drop tags and invisible elements, turn block
/// boundaries into newlines, decode the common entities.
///
/// Whitespace inside `<pre>` is kept as-is; elsewhere runs of whitespace
/// collapse to a single space like a browser would.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut pre_depth = 0usize;

    while let Some(lt) = rest.find('<') {
        push_text(&mut out, &rest[..lt], pre_depth > 0);
        rest = &rest[lt..];

        let Some(gt) = rest.find('>') else {
            // Unterminated tag: treat the rest as text.
            push_text(&mut out, rest, pre_depth > 0);
            rest = "";
            break;
        };

        let tag = &rest[1..gt];
        rest = &rest[gt + 1..];

        if tag.starts_with('!') || tag.starts_with('?') {
            continue;
        }

        let closing = tag.starts_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        if !closing && HIDDEN_ELEMENTS.contains(&name.as_str()) && !tag.ends_with('/') {
            let close = format!("</{name}");
            match find_ignore_case(rest, &close) {
                Some(pos) => {
                    let after = &rest[pos..];
                    rest = after.find('>').map(|end| &after[end + 1..]).unwrap_or("");
                }
                None => rest = "",
            }
            continue;
        }

        if name == "pre" {
            if closing {
                pre_depth = pre_depth.saturating_sub(1);
            } else {
                pre_depth += 1;
            }
        }

        if BREAKING_TAGS.contains(&name.as_str()) {
            trim_trailing_spaces(&mut out);
            if !out.is_empty() && !out.ends_with('\n') || name == "br" {
                out.push('\n');
            }
        } else if name == "td" || name == "th" {
            if !out.is_empty() && !out.ends_with([' ', '\n']) {
                out.push(' ');
            }
        }
    }
    push_text(&mut out, rest, pre_depth > 0);

    trim_trailing_spaces(&mut out);
    out.trim_matches('\n').to_string()
}

fn push_text(out: &mut String, raw: &str, preformatted: bool) {
    let text = decode_entities(raw);
    if preformatted {
        out.push_str(&text);
        return;
    }
    for (i, word) in text.split_whitespace().enumerate() {
        let starts_with_space = i > 0 || text.starts_with(char::is_whitespace);
        if starts_with_space && !out.is_empty() && !out.ends_with([' ', '\n']) {
            out.push(' ');
        }
        out.push_str(word);
    }
    if text.ends_with(char::is_whitespace) && !text.trim().is_empty() {
        out.push(' ');
    }
}

fn trim_trailing_spaces(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

/// Text of the first `<title>` element, if it has any.
pub fn document_title(html: &str) -> Option<String> {
    let open = find_ignore_case(html, "<title")?;
    let after_open = open + html[open..].find('>')? + 1;
    let len = find_ignore_case(&html[after_open..], "</title")?;
    let title = decode_entities(html[after_open..after_open + len].trim());
    (!title.is_empty()).then_some(title)
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

/// Decode the named entities `escape_text` produces plus the usual extras
/// and numeric references.  Unknown entities are kept verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
