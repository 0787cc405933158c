//! Civil-alert summarizer.
//!
//! The upstream broadcaster posts the same alert in several overlapping
//! shapes.  [`ALERT_RULES`] is evaluated top to bottom and the first rule
//! whose predicate holds renders the summary, so a "flash" pre-alert is
//! never rendered as a full red alert.

use regex::Regex;
use std::sync::LazyLock;

use crate::cleaner::AlertKind;

/// Static line of the flash template; also the exact prefix that opens an
/// area alert.
pub const AREA_INSTRUCTION: &str = "בדקות הקרובות צפויות להתקבל התרעות באזורך";

const FLASH_MARKER: &str = "מבזק";
const REGIONS_PREFIX: &str = "אזורים עיקריים: ";
const UNKNOWN_REGIONS: &str = "אזורים לא ידועים";

const EVENT_ENDED_PHRASES: &[&str] = &["האירוע הסתיים", "השוהים במרחב המוגן יכולים לצאת"];
const SHELTER_EXIT_PHRASE: &str = "ניתן לצאת מהמרחב המוגן";
const RED_ALERT_PHRASE: &str = "צבע אדום";
const ROCKET_FIRE_PHRASES: &[&str] = &[
    "ירי רקטות",
    "ירי טילים",
    "שיגור",
    "שיגורים",
    "זוהו שיגורים",
    "זוהה שיגור",
    "טילים",
];

static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d{1,2}/\d{1,2}/\d{4})\)\s*(\d{1,2}:\d{2})").expect("DATE_TIME regex")
});

/// Flash / area lists: region marker at the start, name runs as far as it can.
static REGION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^אזור ([\x{0590}-\x{05FF} '"-]+)"#).expect("REGION_PREFIX regex")
});

/// Siren lists: the whole line must be marker + name.
static REGION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^אזור\s+([\x{0590}-\x{05FF} '"-]+)$"#).expect("REGION_LINE regex")
});

static INSTRUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:היכנסו למרחב המוגן|ניתן לצאת מהמרחב המוגן|השוהים במרחב המוגן יכולים לצאת)[^\n]*",
    )
    .expect("INSTRUCTION regex")
});

/// A recognised alert reduced to its short form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSummary {
    pub kind: AlertKind,
    pub text: String,
}

/// Line-oriented view of an incoming message.
struct AlertText<'a> {
    full: &'a str,
    lines: Vec<&'a str>,
    first_line: &'a str,
}

impl<'a> AlertText<'a> {
    fn new(full: &'a str) -> Self {
        let lines: Vec<&str> = full.trim().lines().collect();
        let first_line = lines.first().copied().unwrap_or(full);
        Self {
            full,
            lines,
            first_line,
        }
    }

    /// `"<date> <time>"` from the first line, when present.
    fn date_time(&self) -> Option<String> {
        DATE_TIME
            .captures(self.first_line)
            .map(|c| format!("{} {}", &c[1], &c[2]))
    }

    /// Region names captured by `re`, first-seen order, no repeats.
    fn regions(&self, re: &Regex) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for line in &self.lines {
            let Some(caps) = re.captures(line.trim()) else {
                continue;
            };
            let name = caps[1].trim();
            if !name.is_empty() && !out.iter().any(|seen| seen == name) {
                out.push(name.to_owned());
            }
        }
        out
    }

    fn instruction(&self) -> Option<&'a str> {
        INSTRUCTION
            .find(self.full)
            .map(|m| m.as_str().trim_end())
    }
}

// ───────────────────────────── Rule table ────────────────────────────────

struct AlertRule {
    kind: AlertKind,
    matches: fn(&AlertText<'_>) -> bool,
    render: fn(&AlertText<'_>, AlertKind) -> String,
}

/// **Order matters**: Flash → Area → EventEnded → ShelterExit → RedAlert →
/// RocketFire.  Message shapes routinely satisfy several predicates.
const ALERT_RULES: &[AlertRule] = &[
    AlertRule {
        kind: AlertKind::FlashAlert,
        matches: is_flash,
        render: render_flash,
    },
    AlertRule {
        kind: AlertKind::AreaAlert,
        matches: is_area,
        render: render_area,
    },
    AlertRule {
        kind: AlertKind::EventEnded,
        matches: is_event_ended,
        render: render_siren,
    },
    AlertRule {
        kind: AlertKind::ShelterExit,
        matches: is_shelter_exit,
        render: render_siren,
    },
    AlertRule {
        kind: AlertKind::RedAlert,
        matches: is_red_alert,
        render: render_siren,
    },
    AlertRule {
        kind: AlertKind::RocketFire,
        matches: is_rocket_fire,
        render: render_siren,
    },
];

/// Reduce a recognised alert shape to its canonical summary.  `None` means
/// the message is ordinary content.
pub fn summarize(text: &str) -> Option<AlertSummary> {
    let view = AlertText::new(text);
    ALERT_RULES
        .iter()
        .find(|rule| (rule.matches)(&view))
        .map(|rule| AlertSummary {
            kind: rule.kind,
            text: (rule.render)(&view, rule.kind),
        })
}

// ───────────────────────────── Predicates ────────────────────────────────

fn is_flash(t: &AlertText<'_>) -> bool {
    t.first_line.contains(FLASH_MARKER)
}

fn is_area(t: &AlertText<'_>) -> bool {
    t.lines
        .first()
        .is_some_and(|line| line.starts_with(AREA_INSTRUCTION))
}

fn is_event_ended(t: &AlertText<'_>) -> bool {
    EVENT_ENDED_PHRASES.iter().any(|p| t.full.contains(p))
}

fn is_shelter_exit(t: &AlertText<'_>) -> bool {
    t.full.contains(SHELTER_EXIT_PHRASE)
}

fn is_red_alert(t: &AlertText<'_>) -> bool {
    t.first_line.contains(RED_ALERT_PHRASE)
}

fn is_rocket_fire(t: &AlertText<'_>) -> bool {
    ROCKET_FIRE_PHRASES.iter().any(|p| t.first_line.contains(p))
}

// ───────────────────────────── Renderers ─────────────────────────────────

fn headline(kind: AlertKind, date_time: Option<String>) -> String {
    let header = kind.header().unwrap_or_default();
    match date_time {
        Some(dt) => format!("{header} - {dt}"),
        None => header.to_owned(),
    }
}

fn regions_line(regions: &[String]) -> String {
    if regions.is_empty() {
        format!("{REGIONS_PREFIX}{UNKNOWN_REGIONS}")
    } else {
        format!("{REGIONS_PREFIX}{}", regions.join(", "))
    }
}

fn render_flash(t: &AlertText<'_>, kind: AlertKind) -> String {
    format!(
        "{}\n{AREA_INSTRUCTION}\n{}",
        headline(kind, t.date_time()),
        regions_line(&t.regions(&REGION_PREFIX)),
    )
}

fn render_area(t: &AlertText<'_>, _kind: AlertKind) -> String {
    format!(
        "{AREA_INSTRUCTION}\n{}",
        regions_line(&t.regions(&REGION_PREFIX))
    )
}

/// Shared by the four siren kinds; only the header differs.
fn render_siren(t: &AlertText<'_>, kind: AlertKind) -> String {
    let mut out = format!(
        "{}\n{}",
        headline(kind, t.date_time()),
        regions_line(&t.regions(&REGION_LINE)),
    );
    if let Some(instruction) = t.instruction() {
        out.push('\n');
        out.push_str(instruction);
    }
    out
}
