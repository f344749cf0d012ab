//! Markdown subset renderer: `*`/`-` bullets and `**bold**`, nothing else.
//!
//! Input is HTML-escaped first, so the output only ever contains the
//! tags emitted here.

use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn inline(text: &str) -> String {
    BOLD.replace_all(&escape_html(text), "<strong>$1</strong>")
        .into_owned()
}

/// Bullet body if `line` is a list item (`* item` / `- item`).
fn bullet(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix('*')
        .or_else(|| line.strip_prefix('-'))?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut html = Vec::new();
    let mut in_list = false;

    for raw in markdown.lines() {
        let line = raw.trim();
        match bullet(line) {
            Some(item) => {
                if !in_list {
                    html.push("<ul>".to_string());
                    in_list = true;
                }
                html.push(format!("<li>{}</li>", inline(item)));
            }
            None => {
                if in_list {
                    html.push("</ul>".to_string());
                    in_list = false;
                }
                if !line.is_empty() {
                    html.push(format!("<p>{}</p>", inline(line)));
                }
            }
        }
    }
    if in_list {
        html.push("</ul>".to_string());
    }
    html.join("\n")
}
