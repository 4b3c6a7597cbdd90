//! Campaign event records as persisted by the storage layer.

use serde::{Deserialize, Serialize};

use crate::date::CampaignDate;
use crate::error::{CalendarError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

fn default_interval() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_year: u32,
    pub event_month: u32,
    pub event_day: u32,
    #[serde(default)]
    pub is_repeatable: bool,
    #[serde(default)]
    pub repeat_type: Option<RepeatType>,
    #[serde(default = "default_interval")]
    pub repeat_interval: u32,
    #[serde(default)]
    pub repeat_end_year: Option<u32>,
    #[serde(default)]
    pub repeat_end_month: Option<u32>,
    #[serde(default)]
    pub repeat_end_day: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
}

impl CalendarEvent {
    /// A one-off event on `date`.
    pub fn single(id: impl Into<String>, title: impl Into<String>, date: CampaignDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            event_year: date.year,
            event_month: date.month,
            event_day: date.day,
            is_repeatable: false,
            repeat_type: None,
            repeat_interval: 1,
            repeat_end_year: None,
            repeat_end_month: None,
            repeat_end_day: None,
            color: None,
        }
    }

    /// An event repeating every `interval` units of `repeat` from `date`.
    pub fn repeating(
        id: impl Into<String>,
        title: impl Into<String>,
        date: CampaignDate,
        repeat: RepeatType,
        interval: u32,
    ) -> Self {
        Self {
            is_repeatable: true,
            repeat_type: Some(repeat),
            repeat_interval: interval,
            ..Self::single(id, title, date)
        }
    }

    pub fn until(mut self, end: CampaignDate) -> Self {
        self.repeat_end_year = Some(end.year);
        self.repeat_end_month = Some(end.month);
        self.repeat_end_day = Some(end.day);
        self
    }

    pub fn anchor(&self) -> CampaignDate {
        CampaignDate::new(self.event_year, self.event_month, self.event_day)
    }

    /// Inclusive end of the recurrence, when all three components are set.
    pub fn repeat_end(&self) -> Option<CampaignDate> {
        match (
            self.repeat_end_year,
            self.repeat_end_month,
            self.repeat_end_day,
        ) {
            (Some(year), Some(month), Some(day)) => Some(CampaignDate::new(year, month, day)),
            _ => None,
        }
    }

    /// Creation/update-time checks. Evaluation assumes these have passed.
    pub fn validate(&self, total_months: u32) -> Result<()> {
        self.anchor().validate(total_months)?;

        if !self.is_repeatable {
            if self.repeat_type.is_some() {
                return Err(CalendarError::RepeatTypeOnSingleEvent);
            }
            return Ok(());
        }
        if self.repeat_type.is_none() {
            return Err(CalendarError::MissingRepeatType);
        }
        if self.repeat_interval < 1 {
            return Err(CalendarError::RepeatInterval {
                interval: self.repeat_interval,
            });
        }

        let parts = [
            self.repeat_end_year.is_some(),
            self.repeat_end_month.is_some(),
            self.repeat_end_day.is_some(),
        ];
        if parts.iter().any(|set| *set) && !parts.iter().all(|set| *set) {
            return Err(CalendarError::PartialRepeatEnd);
        }
        if let Some(end) = self.repeat_end() {
            end.validate(total_months)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        let event = CalendarEvent::repeating(
            "e1",
            "Market day",
            CampaignDate::new(1, 1, 1),
            RepeatType::Weekly,
            0,
        );
        assert_eq!(
            event.validate(12),
            Err(CalendarError::RepeatInterval { interval: 0 })
        );
    }

    #[test]
    fn partial_end_is_rejected() {
        let mut event = CalendarEvent::repeating(
            "e1",
            "Tithe",
            CampaignDate::new(1, 1, 1),
            RepeatType::Monthly,
            1,
        );
        event.repeat_end_year = Some(4);
        assert_eq!(event.validate(12), Err(CalendarError::PartialRepeatEnd));
    }

    #[test]
    fn single_event_with_repeat_type_is_rejected() {
        let mut event = CalendarEvent::single("e1", "Coronation", CampaignDate::new(2, 6, 15));
        assert!(event.validate(12).is_ok());
        event.repeat_type = Some(RepeatType::Yearly);
        assert_eq!(
            event.validate(12),
            Err(CalendarError::RepeatTypeOnSingleEvent)
        );
    }

    #[test]
    fn anchor_must_fit_calendar() {
        let event = CalendarEvent::single("e1", "Eclipse", CampaignDate::new(1, 11, 1));
        assert!(event.validate(12).is_ok());
        assert!(matches!(
            event.validate(10),
            Err(CalendarError::InvalidDate { month: 11, .. })
        ));
    }

    #[test]
    fn nullable_fields_default_when_missing() {
        let json = r#"{
            "id": "feast",
            "title": "Feast",
            "eventYear": 1,
            "eventMonth": 2,
            "eventDay": 3,
            "repeatEndYear": null
        }"#;
        let event: CalendarEvent = serde_json::from_str(json).expect("event parses");
        assert!(!event.is_repeatable);
        assert_eq!(event.repeat_interval, 1);
        assert_eq!(event.repeat_end(), None);
        assert!(event.validate(12).is_ok());
    }
}
