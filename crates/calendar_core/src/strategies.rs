//! Proptest strategies for calendar values.

use proptest::prelude::*;

use crate::clock::CalendarState;
use crate::config::CalendarConfig;
use crate::date::{CampaignDate, DAYS_PER_MONTH};
use crate::moon::{self, CYCLE_DAYS};
use crate::weather::WeatherMap;

pub fn date_in(total_months: u32, max_year: u32) -> impl Strategy<Value = CampaignDate> {
    (1..=max_year, 1..=total_months, 1..=DAYS_PER_MONTH)
        .prop_map(|(year, month, day)| CampaignDate::new(year, month, day))
}

/// Any valid state under `config`, which must already validate.
pub fn state_for(config: CalendarConfig) -> impl Strategy<Value = CalendarState> {
    let total_months = config.total_months();
    (date_in(total_months, 2_000), 1u32..=7, 1..=CYCLE_DAYS).prop_map(
        move |(date, day_of_week, moon_phase_day)| CalendarState {
            current_day: date.day,
            current_month: date.month,
            current_year: date.year,
            day_of_week,
            moon_phase_day,
            moon_phase: moon::phase_for(Some(moon_phase_day), 0),
            season: config
                .season_for(date.month)
                .expect("strategy config must resolve every month"),
            weather: WeatherMap::new(),
        },
    )
}
