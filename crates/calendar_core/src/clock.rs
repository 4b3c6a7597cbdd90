//! The mutable "now" of a campaign and its pure transitions.
//!
//! Every transition takes `&self` and returns a fresh [`CalendarState`]; the
//! caller decides how and when to persist it.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::config::{CalendarConfig, WEEK_DAYS};
use crate::date::{days_between, normalize, CampaignDate, DAYS_PER_MONTH};
use crate::error::{CalendarError, Result};
use crate::moon::{self, MoonPhase, CYCLE_DAYS};
use crate::season::Season;
use crate::weather::{WeatherMap, WeatherSample};

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarState {
    pub current_day: u32,
    pub current_month: u32,
    pub current_year: u32,
    pub day_of_week: u32,
    pub moon_phase_day: u32,
    pub moon_phase: MoonPhase,
    pub season: Season,
    #[serde_as(as = "std::collections::BTreeMap<DisplayFromStr, _>")]
    #[serde(default)]
    pub weather: WeatherMap,
}

impl CalendarState {
    /// Campaign-setup state: year 1, month 1, day 1, first weekday, new moon.
    pub fn initial(config: &CalendarConfig) -> Result<Self> {
        config.validate()?;
        let state = Self {
            current_day: 1,
            current_month: 1,
            current_year: 1,
            day_of_week: 1,
            moon_phase_day: 1,
            moon_phase: moon::phase_for(Some(1), 0),
            season: config.season_for(1)?,
            weather: WeatherMap::new(),
        };
        state.checked(config)
    }

    pub fn today(&self) -> CampaignDate {
        CampaignDate::new(self.current_year, self.current_month, self.current_day)
    }

    /// Move `days` days forward, rolling day, month, year, weekday and moon
    /// together. The weather table is carried over unchanged.
    pub fn advance(&self, config: &CalendarConfig, days: u32) -> Result<Self> {
        let total_months = config.total_months();
        let date = normalize(
            u64::from(self.current_day) + u64::from(days),
            u64::from(self.current_month),
            u64::from(self.current_year),
            total_months,
        )
        .ok_or(CalendarError::YearOverflow {
            year: self.current_year,
        })?;
        let offset = i64::from(days);
        let day_of_week =
            (i64::from(self.day_of_week) - 1 + offset).rem_euclid(i64::from(WEEK_DAYS)) as u32 + 1;
        let moon_phase_day = moon::cycle_day(Some(self.moon_phase_day), offset) + 1;

        let next = Self {
            current_day: date.day,
            current_month: date.month,
            current_year: date.year,
            day_of_week,
            moon_phase_day,
            moon_phase: moon::phase_for(Some(moon_phase_day), 0),
            season: config.season_for(date.month)?,
            weather: self.weather.clone(),
        };
        next.checked(config)
    }

    /// Owner override of the year; season and moon are unaffected.
    pub fn set_year(&self, year: u32) -> Result<Self> {
        if year < 1 {
            return Err(CalendarError::InvalidYear {
                year: i64::from(year),
            });
        }
        Ok(Self {
            current_year: year,
            ..self.clone()
        })
    }

    /// Re-derive the state under a new configuration: a month past the new
    /// month count is clamped to the last month and the season re-resolved.
    pub fn rebase(&self, config: &CalendarConfig) -> Result<Self> {
        let current_month = self.current_month.min(config.total_months()).max(1);
        let next = Self {
            current_month,
            season: config.season_for(current_month)?,
            ..self.clone()
        };
        next.checked(config)
    }

    /// Overlay `weather` onto the stored table; keys outside it are kept.
    pub fn merge_weather(&self, weather: WeatherMap) -> Self {
        let mut next = self.clone();
        next.weather.extend(weather);
        next
    }

    pub fn weather_on(&self, date: CampaignDate) -> Option<&WeatherSample> {
        self.weather.get(&date.key())
    }

    /// Weekday (1..=7) of an arbitrary date, relative to today.
    pub fn weekday_of(&self, date: CampaignDate, total_months: u32) -> u32 {
        let offset = days_between(self.today(), date, total_months);
        (i64::from(self.day_of_week) - 1 + offset).rem_euclid(i64::from(WEEK_DAYS)) as u32 + 1
    }

    /// Moon phase of an arbitrary date, relative to today.
    pub fn moon_phase_of(&self, date: CampaignDate, total_months: u32) -> MoonPhase {
        let offset = days_between(self.today(), date, total_months);
        moon::phase_for(Some(self.moon_phase_day), offset)
    }

    /// Check a state against `config`, including one read back from storage.
    pub fn check_invariants(&self, config: &CalendarConfig) -> Result<()> {
        match self.violation(config) {
            Some(detail) => Err(CalendarError::InvariantViolation { detail }),
            None => Ok(()),
        }
    }

    /// Post-transform check. A violation here means a transition is broken.
    fn checked(self, config: &CalendarConfig) -> Result<Self> {
        if let Err(err) = self.check_invariants(config) {
            debug_assert!(false, "{err}");
            return Err(err);
        }
        Ok(self)
    }

    fn violation(&self, config: &CalendarConfig) -> Option<String> {
        if !(1..=DAYS_PER_MONTH).contains(&self.current_day) {
            Some(format!("current day {} outside 1..={DAYS_PER_MONTH}", self.current_day))
        } else if !(1..=config.total_months()).contains(&self.current_month) {
            Some(format!(
                "current month {} outside 1..={}",
                self.current_month,
                config.total_months()
            ))
        } else if self.current_year < 1 {
            Some(format!("current year {} below 1", self.current_year))
        } else if !(1..=WEEK_DAYS).contains(&self.day_of_week) {
            Some(format!("day of week {} outside 1..={WEEK_DAYS}", self.day_of_week))
        } else if !(1..=CYCLE_DAYS).contains(&self.moon_phase_day) {
            Some(format!("moon phase day {} outside 1..={CYCLE_DAYS}", self.moon_phase_day))
        } else if self.moon_phase != moon::phase_for(Some(self.moon_phase_day), 0) {
            Some(format!(
                "moon phase {:?} out of sync with day {}",
                self.moon_phase, self.moon_phase_day
            ))
        } else if config.season_for(self.current_month).ok() != Some(self.season) {
            Some(format!(
                "season {:?} does not match month {}",
                self.season, self.current_month
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherType;
    use proptest::prelude::*;

    fn state_at(day: u32, month: u32, year: u32, dow: u32, moon: u32) -> CalendarState {
        CalendarState {
            current_day: day,
            current_month: month,
            current_year: year,
            day_of_week: dow,
            moon_phase_day: moon,
            moon_phase: moon::phase_for(Some(moon), 0),
            season: Season::Winter,
            weather: WeatherMap::new(),
        }
    }

    #[test]
    fn initial_state_uses_defaults() {
        let state = CalendarState::initial(&CalendarConfig::default()).unwrap();
        assert_eq!(state.today(), CampaignDate::new(1, 1, 1));
        assert_eq!(state.day_of_week, 1);
        assert_eq!(state.moon_phase, MoonPhase::New);
        assert_eq!(state.season, Season::Winter);
    }

    #[test]
    fn year_end_rolls_everything() {
        let config = CalendarConfig::default();
        let state = state_at(30, 12, 4, 3, 14);
        let next = state.advance(&config, 1).unwrap();
        assert_eq!(next.today(), CampaignDate::new(5, 1, 1));
        assert_eq!(next.day_of_week, 4);
        assert_eq!(next.moon_phase_day, 15);
        assert_eq!(next.moon_phase, MoonPhase::Full);
        assert_eq!(next.season, Season::Winter);
    }

    #[test]
    fn advance_keeps_weather_table() {
        let config = CalendarConfig::default();
        let state = state_at(1, 1, 1, 1, 1).merge_weather(WeatherMap::from([(
            CampaignDate::new(1, 1, 1).key(),
            WeatherSample {
                kind: WeatherType::Foggy,
                temperature: 2,
                description: String::new(),
            },
        )]));
        let next = state.advance(&config, 3).unwrap();
        assert_eq!(next.weather.len(), 1);
    }

    #[test]
    fn set_year_only_touches_year() {
        let state = state_at(10, 4, 2, 5, 9);
        let next = state.set_year(1_200).unwrap();
        assert_eq!(next.current_year, 1_200);
        assert_eq!(next.current_day, 10);
        assert_eq!(next.moon_phase_day, 9);
        assert!(state.set_year(0).is_err());
    }

    #[test]
    fn advance_past_the_last_year_is_an_error() {
        let config = CalendarConfig::default();
        let state = state_at(30, 12, 1, 1, 1).set_year(u32::MAX).unwrap();
        assert_eq!(
            state.advance(&config, 1).unwrap_err(),
            CalendarError::YearOverflow { year: u32::MAX }
        );
        assert_eq!(state.advance(&config, 0).unwrap().current_year, u32::MAX);
    }

    #[test]
    fn loaded_state_with_stale_season_is_rejected() {
        let config = CalendarConfig::default();
        let state = state_at(1, 5, 1, 1, 1);
        assert_eq!(state.season, Season::Winter);
        assert!(matches!(
            state.check_invariants(&config),
            Err(CalendarError::InvariantViolation { .. })
        ));
        let fixed = CalendarState {
            season: Season::Spring,
            ..state
        };
        assert_eq!(fixed.check_invariants(&config), Ok(()));
    }

    #[test]
    fn out_of_range_state_is_reported_not_asserted() {
        let config = CalendarConfig::default();
        let state = state_at(31, 1, 1, 1, 1);
        assert!(matches!(
            state.check_invariants(&config),
            Err(CalendarError::InvariantViolation { detail }) if detail.contains("current day 31")
        ));
    }

    #[test]
    fn weekday_and_moon_of_other_dates() {
        let state = state_at(1, 1, 1, 1, 1);
        assert_eq!(state.weekday_of(CampaignDate::new(1, 1, 8), 12), 1);
        assert_eq!(state.weekday_of(CampaignDate::new(1, 2, 1), 12), 3);
        assert_eq!(
            state.moon_phase_of(CampaignDate::new(1, 1, 15), 12),
            MoonPhase::Full
        );
    }

    fn thirteen_month_config() -> CalendarConfig {
        let months = (1..=13).map(|month| format!("Moon {month}")).collect();
        let mut mapping = crate::season::SeasonMonths::new();
        for month in 1..=13u32 {
            let season = Season::ALL[((month - 1) / 4).min(3) as usize];
            mapping.entry(season).or_default().insert(month);
        }
        CalendarConfig::default()
            .reconfigure(months, Some(mapping))
            .expect("13-month config is valid")
    }

    proptest! {
        #[test]
        fn advance_is_additive(
            state in crate::strategies::state_for(CalendarConfig::default()),
            first in 0u32..5_000,
            second in 0u32..5_000,
        ) {
            let config = CalendarConfig::default();
            let stepped = state.advance(&config, first).unwrap().advance(&config, second).unwrap();
            let direct = state.advance(&config, first + second).unwrap();
            prop_assert_eq!(stepped, direct);
        }

        #[test]
        fn advance_is_additive_for_odd_month_counts(
            state in crate::strategies::state_for(thirteen_month_config()),
            first in 0u32..5_000,
            second in 0u32..5_000,
        ) {
            let config = thirteen_month_config();
            let stepped = state.advance(&config, first).unwrap().advance(&config, second).unwrap();
            let direct = state.advance(&config, first + second).unwrap();
            prop_assert_eq!(stepped, direct);
        }
    }

    #[test]
    fn state_serializes_weather_keys_as_strings() {
        let state = state_at(1, 1, 1, 1, 1).merge_weather(WeatherMap::from([(
            CampaignDate::new(1, 10, 2).key(),
            WeatherSample {
                kind: WeatherType::Clear,
                temperature: 20,
                description: String::new(),
            },
        )]));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentDay"], 1);
        assert_eq!(json["moonPhase"], "new");
        assert_eq!(json["weather"]["1-10-2"]["type"], "clear");

        let back: CalendarState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
