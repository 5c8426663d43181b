use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component};
use tracing::debug;

use crate::error::AppResult;
use crate::services::filter::{self, Filter};
use crate::services::matcher;
use crate::services::schedule::{ScheduleClient, ScheduleSet};
use crate::services::template::FormatSpec;

const PRODID: &str = "-//splatoon-ical//Splatoon 2 Schedule//JA";

/// One VEVENT of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

/// Feed builder:
///
/// - Fetches the schedule (cached upstream call).
/// - Pairs every regular slot with its gachi and league counterparts.
/// - Drops triples rejected by the mode / rule filters.
/// - Renders title and description for the rest, in regular-slot order.
///
/// Any fetch or render failure aborts the whole build.
pub struct FeedBuilder;

impl FeedBuilder {
    pub async fn build(
        client: &ScheduleClient,
        format: &FormatSpec,
        mode: &Filter,
        rule: &Filter,
    ) -> AppResult<Vec<CalendarEvent>> {
        let schedule = client.fetch().await?;
        Self::events(&schedule, format, mode, rule)
    }

    pub fn events(
        schedule: &ScheduleSet,
        format: &FormatSpec,
        mode: &Filter,
        rule: &Filter,
    ) -> AppResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();

        for triple in matcher::triples(schedule) {
            if !filter::accept(&triple, mode, rule) {
                continue;
            }

            events.push(CalendarEvent {
                uid: format!("{}-{}@splatoon-ical", triple.start_t(), triple.regular.end_t),
                start: triple.regular.start_utc,
                end: triple.regular.end_utc,
                summary: format.title.render(&triple)?,
                description: format.description.render(&triple)?,
            });
        }

        debug!(
            "Built {} of {} schedule events",
            events.len(),
            schedule.regular.len()
        );

        Ok(events)
    }
}

fn ical_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Serialize events into a published VCALENDAR document.
pub fn to_ical(events: &[CalendarEvent], calendar_name: &str, stamp: DateTime<Utc>) -> String {
    let mut cal = Calendar::new();
    cal.name(calendar_name);

    let dtstamp = ical_utc(&stamp);
    for event in events {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&event.uid);
        ics_event.add_property("DTSTAMP", &dtstamp);
        ics_event.add_property("DTSTART", ical_utc(&event.start));
        ics_event.add_property("DTEND", ical_utc(&event.end));
        ics_event.summary(&event.summary);
        ics_event.description(&event.description);
        cal.push(ics_event.done());
    }

    publish(&cal.done().to_string())
}

/// Rewrite the header the icalendar crate emits: our PRODID and `METHOD:PUBLISH`.
fn publish(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len() + 32);

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }
        if line.starts_with("METHOD:") {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");

        if line == "VERSION:2.0" {
            result.push_str("METHOD:PUBLISH\r\n");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::schedule::tests::slot;

    fn schedule() -> ScheduleSet {
        ScheduleSet {
            regular: vec![
                slot(7200, "ナワバリバトル", "turf_war", "ナワバリバトル"),
                slot(14400, "ナワバリバトル", "turf_war", "ナワバリバトル"),
            ],
            gachi: vec![
                slot(7200, "ガチエリア", "splat_zones", "ガチエリア"),
                slot(14400, "ガチヤグラ", "tower_control", "ガチヤグラ"),
            ],
            league: vec![
                slot(7200, "ガチホコバトル", "rainmaker", "ガチホコバトル"),
                slot(14400, "ガチアサリ", "clam_blitz", "ガチアサリ"),
            ],
        }
    }

    #[test]
    fn builds_one_event_per_regular_slot() {
        let events = FeedBuilder::events(
            &schedule(),
            &FormatSpec::default(),
            &Filter::Unrestricted,
            &Filter::Unrestricted,
        )
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].summary, "ナワバリ / エリア / ホコ");
        assert_eq!(events[0].start.timestamp(), 7200);
        assert_eq!(events[0].end.timestamp(), 7200 + 7200);
        assert_eq!(events[1].summary, "ナワバリ / ヤグラ / アサリ");
        assert_eq!(events[1].uid, "14400-21600@splatoon-ical");
    }

    #[test]
    fn filtered_triples_are_skipped() {
        let mode = Filter::parse(Some("league"));
        let rule = Filter::parse(Some("clam_blitz"));
        let events =
            FeedBuilder::events(&schedule(), &FormatSpec::default(), &mode, &rule).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start.timestamp(), 14400);
    }

    #[test]
    fn render_failure_aborts_build() {
        let mut set = schedule();
        set.league.truncate(1);

        let res = FeedBuilder::events(
            &set,
            &FormatSpec::default(),
            &Filter::Unrestricted,
            &Filter::Unrestricted,
        );
        assert!(matches!(
            res,
            Err(AppError::MissingCounterpart { start_t: 14400, .. })
        ));
    }

    #[test]
    fn ical_output_is_published() {
        let event = CalendarEvent {
            uid: "7200-14400@splatoon-ical".to_string(),
            start: DateTime::from_timestamp(7200, 0).unwrap(),
            end: DateTime::from_timestamp(14400, 0).unwrap(),
            summary: "ナワバリ / エリア / ホコ".to_string(),
            description: "ナワバリバトル".to_string(),
        };
        let ics = to_ical(&[event], "Test", DateTime::from_timestamp(0, 0).unwrap());

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert_eq!(ics.matches("METHOD:PUBLISH").count(), 1);
        assert!(ics.contains(&format!("PRODID:{}\r\n", PRODID)));
        assert!(ics.contains("X-WR-CALNAME:Test"));
        assert!(ics.contains("DTSTART:19700101T020000Z"));
        assert!(ics.contains("DTEND:19700101T040000Z"));
        assert!(ics.contains("SUMMARY:ナワバリ / エリア / ホコ"));
        assert!(ics.contains("UID:7200-14400@splatoon-ical"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    }
}
