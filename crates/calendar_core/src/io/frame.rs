use serde::{Deserialize, Serialize};

use crate::clock::CalendarState;
use crate::config::CalendarConfig;
use crate::event::CalendarEvent;
use crate::moon::MoonPhase;
use crate::recurrence;
use crate::season::Season;
use crate::weather::WeatherSample;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameEvent {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
}

impl From<&CalendarEvent> for FrameEvent {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            color: event.color.clone(),
        }
    }
}

/// One day of a calendar run, written as a single NDJSON line.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayFrame {
    pub t: u64,
    pub date: String,
    pub weekday: String,
    pub month: String,
    pub moon: MoonPhase,
    pub season: Season,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub weather: Option<WeatherSample>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<FrameEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub chronicle: Vec<String>,
    pub year_end: bool,
}

/// Build the frame for `state`'s current day. `previous` is the state of the
/// day before, used to narrate season and year changes.
pub fn make_frame(
    t: u64,
    previous: Option<&CalendarState>,
    state: &CalendarState,
    config: &CalendarConfig,
    events: &[CalendarEvent],
) -> DayFrame {
    let today = state.today();
    let total_months = config.total_months();

    let mut chronicle = Vec::new();
    if let Some(previous) = previous {
        if previous.current_year != state.current_year {
            chronicle.push(format!("Year {} begins.", state.current_year));
        }
        if previous.season != state.season {
            chronicle.push(format!("{} begins.", state.season.label()));
        }
        if previous.moon_phase != state.moon_phase && state.moon_phase == MoonPhase::Full {
            chronicle.push("The full moon rises.".to_string());
        }
    }

    DayFrame {
        t,
        date: today.key().to_string(),
        weekday: config
            .weekday_name(state.day_of_week)
            .unwrap_or_default()
            .to_string(),
        month: config
            .month_name(state.current_month)
            .unwrap_or_default()
            .to_string(),
        moon: state.moon_phase,
        season: state.season,
        weather: state.weather_on(today).cloned(),
        events: recurrence::events_on(events, today, total_months)
            .into_iter()
            .map(FrameEvent::from)
            .collect(),
        chronicle,
        year_end: state.current_day == crate::date::DAYS_PER_MONTH
            && state.current_month == total_months,
    }
}

impl DayFrame {
    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::CampaignDate;
    use crate::event::RepeatType;

    #[test]
    fn frame_lists_agenda_and_omits_missing_weather() {
        let config = CalendarConfig::default();
        let state = CalendarState::initial(&config).unwrap();
        let events = vec![CalendarEvent::repeating(
            "rite",
            "Dawn rite",
            CampaignDate::new(1, 1, 1),
            RepeatType::Daily,
            1,
        )];

        let frame = make_frame(0, None, &state, &config, &events);
        let json_line = frame.to_ndjson().expect("frame serializes");
        let value: serde_json::Value =
            serde_json::from_str(json_line.trim_end()).expect("valid json");
        assert_eq!(value["date"], "1-1-1");
        assert_eq!(value["weekday"], "Day 1");
        assert_eq!(value["moon"], "new");
        assert_eq!(value["events"][0]["id"], "rite");
        assert!(value.get("weather").is_none());
        assert!(value.get("chronicle").is_none());
    }

    #[test]
    fn chronicle_narrates_rollovers() {
        let config = CalendarConfig::default();
        let previous = CalendarState::initial(&config)
            .unwrap()
            .advance(&config, 359)
            .unwrap();
        assert_eq!(previous.today(), CampaignDate::new(1, 12, 30));
        let state = previous.advance(&config, 1).unwrap();
        let frame = make_frame(360, Some(&previous), &state, &config, &[]);
        assert!(make_frame(359, None, &previous, &config, &[]).year_end);
        assert!(frame.chronicle.contains(&"Year 2 begins.".to_string()));
        assert!(frame.chronicle.contains(&"Winter begins.".to_string()));
    }
}
