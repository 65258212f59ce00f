//! Arrival time computation
//!
//! Turns predicted arrival timestamps into "minutes until arrival" labels.

use chrono::{DateTime, TimeZone};
use std::fmt;

use crate::i18n::Language;

use super::types::{Bound, EtaEntry};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Whole minutes from `now` until `eta`, halves rounding up
pub fn minutes_until<A: TimeZone, B: TimeZone>(eta: &DateTime<A>, now: &DateTime<B>) -> i64 {
    let diff_ms = eta.timestamp_millis() - now.timestamp_millis();
    (diff_ms as f64 / MILLIS_PER_MINUTE + 0.5).floor() as i64
}

/// Display form of one arrival estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtaLabel {
    /// Bus is this many minutes away (always > 0)
    Minutes(i64),
    /// Bus is due now or overdue
    ArrivingSoon,
}

impl EtaLabel {
    /// Classify a minute count; non-positive values are "arriving soon"
    pub fn from_minutes(minutes: i64) -> Self {
        if minutes > 0 {
            EtaLabel::Minutes(minutes)
        } else {
            EtaLabel::ArrivingSoon
        }
    }

    /// Label for a predicted arrival relative to `now`
    pub fn between<A: TimeZone, B: TimeZone>(eta: &DateTime<A>, now: &DateTime<B>) -> Self {
        Self::from_minutes(minutes_until(eta, now))
    }

    /// Localized text
    pub fn render(&self, lang: Language) -> String {
        let strings = lang.strings();
        match self {
            EtaLabel::Minutes(m) => format!("{m} {}", strings.minutes),
            EtaLabel::ArrivingSoon => strings.arriving.to_string(),
        }
    }
}

impl fmt::Display for EtaLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Language::En))
    }
}

/// Labels for the predictions that apply to one stop
///
/// Keeps entries for stop position `seq` travelling in `bound`, drops
/// entries without a timestamp, and orders by prediction rank.
pub fn stop_labels<Tz: TimeZone>(
    entries: &[EtaEntry],
    seq: u32,
    bound: Bound,
    now: &DateTime<Tz>,
) -> Vec<EtaLabel> {
    let mut matching: Vec<&EtaEntry> = entries
        .iter()
        .filter(|e| e.seq == seq && e.bound == bound && e.eta.is_some())
        .collect();
    matching.sort_by_key(|e| e.eta_seq);

    matching
        .into_iter()
        .filter_map(|e| e.eta.as_ref().map(|eta| EtaLabel::between(eta, now)))
        .collect()
}

/// Rendered ETA strings for one stop
pub fn stop_etas<Tz: TimeZone>(
    entries: &[EtaEntry],
    seq: u32,
    bound: Bound,
    now: &DateTime<Tz>,
    lang: Language,
) -> Vec<String> {
    stop_labels(entries, seq, bound, now)
        .into_iter()
        .map(|label| label.render(lang))
        .collect()
}
