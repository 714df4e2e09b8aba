use crate::model::{Agent, Prd};
use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_agents: usize,
    pub active_agents: usize,
    pub total_prds: usize,
}

pub fn summarize(agents: &[Agent], prds: &[Prd]) -> Summary {
    Summary {
        total_agents: agents.len(),
        active_agents: active_agent_count(agents),
        total_prds: prds.len(),
    }
}

pub fn active_agent_count(agents: &[Agent]) -> usize {
    agents.iter().filter(|a| a.status == "active").count()
}

/// Visual category for a status badge. Anything unrecognised is `Neutral`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Positive,
    Progress,
    Negative,
    Neutral,
}

impl StatusTone {
    pub fn css_class(self) -> &'static str {
        match self {
            StatusTone::Positive => "ok",
            StatusTone::Progress => "progress",
            StatusTone::Negative => "warn",
            StatusTone::Neutral => "neutral",
        }
    }
}

pub fn agent_tone(status: &str) -> StatusTone {
    match status {
        "active" => StatusTone::Positive,
        _ => StatusTone::Neutral,
    }
}

pub fn prd_tone(status: &str) -> StatusTone {
    match status {
        "completed" => StatusTone::Positive,
        "in_progress" => StatusTone::Progress,
        "failed" => StatusTone::Negative,
        _ => StatusTone::Neutral,
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = raw.parse::<NaiveDateTime>() {
        return Some(naive.and_utc());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Locale date for a creation timestamp; `None` means "show no date at all".
pub fn format_created(raw: Option<&str>, locale: Locale) -> Option<String> {
    let at = parse_timestamp(raw?)?;
    Some(at.format_localized("%x", locale).to_string())
}

/// Maps a BCP 47 tag like `en-US` or `de` to a chrono locale, defaulting to `en_US`.
pub fn locale_from_tag(tag: &str) -> Locale {
    let normalized = tag.trim().replace('-', "_");
    let mut parts = normalized.split('_');
    let lang = parts.next().unwrap_or_default().to_ascii_lowercase();
    let region = parts.next().map(str::to_ascii_uppercase);

    let candidates = match region {
        Some(region) => vec![format!("{lang}_{region}")],
        None => vec![format!("{lang}_{}", lang.to_ascii_uppercase()), lang.clone()],
    };
    candidates
        .iter()
        .find_map(|c| Locale::try_from(c.as_str()).ok())
        .unwrap_or(Locale::en_US)
}
