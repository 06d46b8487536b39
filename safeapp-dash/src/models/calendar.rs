use chrono::{DateTime, FixedOffset, NaiveDate};
use safeapp_common::CanonicalRow;
use serde::{Deserialize, Serialize};

/// Event start: timed events carry `dateTime`, all-day events only `date`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStart {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// One calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub start: EventStart,
    #[serde(default)]
    pub location: Option<String>,
}

impl CalendarEvent {
    pub fn starts_at(&self) -> Option<DateTime<FixedOffset>> {
        self.start
            .date_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }

    pub fn all_day_date(&self) -> Option<NaiveDate> {
        self.start
            .date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// Short start label: `2026-10-20 14:30` or `2026-10-20`
    pub fn start_label(&self) -> String {
        if let Some(at) = self.starts_at() {
            at.format("%Y-%m-%d %H:%M").to_string()
        } else if let Some(day) = self.all_day_date() {
            day.format("%Y-%m-%d").to_string()
        } else {
            String::new()
        }
    }

    pub fn from_rows(rows: Vec<CanonicalRow>) -> Vec<CalendarEvent> {
        rows.into_iter()
            .filter_map(|row| match serde_json::from_value::<CalendarEvent>(row) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable calendar event");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timed_and_all_day_events() {
        let events = CalendarEvent::from_rows(vec![
            json!({"id": "e1", "summary": "Pose serrure", "start": {"dateTime": "2026-10-20T14:30:00+02:00"}, "location": "Lille"}),
            json!({"id": "e2", "summary": "Inventaire", "start": {"date": "2026-10-21"}}),
            json!("garbage"),
        ]);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start_label(), "2026-10-20 14:30");
        assert_eq!(events[0].location.as_deref(), Some("Lille"));
        assert_eq!(events[1].start_label(), "2026-10-21");
        assert!(events[1].starts_at().is_none());
    }
}
