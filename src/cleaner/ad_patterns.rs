use regex::Regex;
use std::sync::LazyLock;

const PIRATE_FLAG: &str = r"\x{1F3F4}\x{200D}\x{2620}\x{FE0F}?";

/// "[24*6 NEWS](…) [24*6 NEWS DISCUSSIONS](…)" as markdown links.
const NEWS_LINKS_MD: &str = r"\[24\*6 NEWS\]\(https?://t\.me/News24x6\)\s*\[24\*6 NEWS DISCUSSIONS\]\(https?://t\.me/Group24x6\)";

/// Same link pair after the client flattened it to "label (url)".
const NEWS_LINKS_PLAIN: &str =
    r"24\*6 NEWS \(https?://t\.me/News24x6\)\s*24\*6 NEWS DISCUSSIONS \(https?://t\.me/Group24x6\)";

/// Wrap a phrase so it matches with or without `**` around it.
fn emph(phrase: &str) -> String {
    format!(r"(?:\*\*)?{phrase}(?:\*\*)?")
}

/// Promotional blocks injected by upstream re-broadcasters.  Every rule is
/// applied in order, unconditionally; a message may hit several of them.
///
/// To cover a new phrasing, append a pattern here.
fn ad_block_sources() -> Vec<String> {
    vec![
        // ── Phrased pirate-flag blocks with the NEWS/DISCUSSIONS links ──
        format!(
            r"{PIRATE_FLAG} ?{}\s*{}\s*{NEWS_LINKS_MD}",
            emph("אם אתה לא כאן אתה לא מעודכן"),
            emph("חפשו אותנו בטלגרם"),
        ),
        format!(
            r"{PIRATE_FLAG} ?{}\s*{}\s*{NEWS_LINKS_MD}",
            emph("לא צריך לעבור מערוץ לערוץ,"),
            emph("כל (?:החדשות|הידיעות) בערוץ אחד!"),
        ),
        format!(
            r"{PIRATE_FLAG} ?{}\s*{}\s*{NEWS_LINKS_MD}",
            emph("כל הדיווחים בערוץ אחד,"),
            emph("וללא צנזורה!"),
        ),
        // Same slogan, links already gone.
        format!(
            r"{PIRATE_FLAG} ?{}\s*{}",
            emph("אם אתה לא כאן אתה לא מעודכן"),
            emph("חפשו אותנו בטלגרם"),
        ),
        // Red-alert sister channel.
        format!(
            r"{PIRATE_FLAG} ?{}, {}!\s*\[ערוץ צבע אדום מבית 24X6 NEWS\]\(https?://t\.me/red_alert_24x6\)",
            emph("אם אתה לא כאן"),
            emph("אתה לא מעודכן"),
        ),
        // ── Premium BOOST plea ──
        r"\x{1F1EE}\x{1F1F1} יש לכם חשבון טלגרם פרימיום ?\?? אנחנו ממש נשמח שתתנו לנו BOOST \(https?://t\.me/boost/News24x6\)\.\s*".to_owned(),
        // ── Catch-all: pirate flag up to the link pair (non-greedy) ──
        format!(r"{PIRATE_FLAG}[\s\S]*?{NEWS_LINKS_PLAIN}[\d¹]*"),
        format!(r"{PIRATE_FLAG}[\s\S]*?{NEWS_LINKS_MD}[\d¹]*"),
        // ── Signature emoji line ──
        r"\x{1F17E}\x{FE0F}?\x{1F182}\x{1F178}\x{1F17D}\x{1F183}Cosmos\x{1F397}\x{FE0F}?".to_owned(),
        // ── Generic: channel signature line followed by a bare t.me link ──
        //
        // CAREFUL: also eats a legitimate last line that happens to be
        // followed by a bare t.me link.
        r#"[\x{0590}-\x{05FF} \w'".\-]+\nhttps?://t\.me/\S+"#.to_owned(),
    ]
}

pub static AD_BLOCK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ad_block_sources()
        .iter()
        .map(|src| Regex::new(src).expect("ad block pattern"))
        .collect()
});
