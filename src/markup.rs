//! Markdown subset → Telegram HTML (`parse_mode=HTML`).
//!
//! Supported: `**x**` / `__x__` (bold), `*x*` / `_x_` (italic) and
//! `[label](http(s)://url)` links.  Everything else passes through with
//! `&`, `<`, `>` escaped.  Link URLs never go through the emphasis passes.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("BOLD_STARS regex"));

static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").expect("BOLD_UNDERSCORES regex"));

static ITALIC_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*[^*\n]+\*").expect("ITALIC_STARS regex"));

static ITALIC_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[^_\n]+_").expect("ITALIC_UNDERSCORES regex"));

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]\n]+)\]\((https?://[^\s)"]+)\)"#).expect("LINK regex")
});

/// Private-use delimiters around a parked anchor's index.
const SLOT_OPEN: char = '\u{E000}';
const SLOT_CLOSE: char = '\u{E001}';

static SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("SLOT regex"));

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Links are parked first (label converted on its own, URL untouched),
/// then bold before italic so `**x**` is never split into two italic
/// spans, then the anchors are put back.
pub fn to_telegram_html(text: &str) -> String {
    let html = escape_html(&text.replace([SLOT_OPEN, SLOT_CLOSE], ""));

    let mut anchors: Vec<String> = Vec::new();
    let parked = LINK.replace_all(&html, |caps: &Captures<'_>| {
        anchors.push(format!(
            r#"<a href="{}">{}</a>"#,
            &caps[2],
            emphasize(&caps[1])
        ));
        format!("{SLOT_OPEN}{}{SLOT_CLOSE}", anchors.len() - 1)
    });
    let html = emphasize(&parked);

    SLOT.replace_all(&html, |caps: &Captures<'_>| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| anchors.get(i))
            .cloned()
            .unwrap_or_default()
    })
    .into_owned()
}

fn emphasize(text: &str) -> String {
    let html = BOLD_STARS.replace_all(text, "<b>${1}</b>");
    let html = BOLD_UNDERSCORES.replace_all(&html, "<b>${1}</b>");
    let html = replace_italic(&html, &ITALIC_STARS, '*');
    replace_italic(&html, &ITALIC_UNDERSCORES, '_')
}

/// Rewrite single-marker spans matched by `re`.  The regex engine has no
/// look-around, so the flanking rules are checked here: the span must not
/// touch another `marker` or a letter/digit on either side, and its content
/// must not start or end with whitespace.  `24*6 NEWS` and `red_alert_24x6`
/// stay as they are.
fn replace_italic(text: &str, re: &Regex, marker: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;
    while let Some(m) = re.find_at(text, pos) {
        let (start, end) = (m.start(), m.end());
        if is_flanked(text, start, end, marker) {
            out.push_str(&text[copied..start]);
            out.push_str("<i>");
            out.push_str(&text[start + 1..end - 1]);
            out.push_str("</i>");
            copied = end;
            pos = end;
        } else {
            // markers are ASCII, so the next byte is a char boundary
            pos = start + 1;
        }
    }
    out.push_str(&text[copied..]);
    out
}

fn is_flanked(text: &str, start: usize, end: usize, marker: char) -> bool {
    let outside_ok = |c: Option<char>| c.is_none_or(|c| c != marker && !c.is_alphanumeric());
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let inner = &text[start + 1..end - 1];
    outside_ok(before)
        && outside_ok(after)
        && !inner.starts_with(char::is_whitespace)
        && !inner.ends_with(char::is_whitespace)
}
