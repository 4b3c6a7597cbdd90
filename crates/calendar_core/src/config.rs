use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::season::{self, Season, SeasonMonths};
use crate::weather::WeatherModel;

pub const WEEK_DAYS: u32 = 7;

/// Per-campaign calendar layout, set once and edited by the owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfig {
    pub month_names: Vec<String>,
    pub weekday_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_months: Option<SeasonMonths>,
    #[serde(default)]
    pub weather: WeatherModel,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            month_names: (1..=12).map(|month| format!("Month {month}")).collect(),
            weekday_names: (1..=WEEK_DAYS).map(|day| format!("Day {day}")).collect(),
            season_months: None,
            weather: WeatherModel::default(),
        }
    }
}

impl CalendarConfig {
    pub fn total_months(&self) -> u32 {
        self.month_names.len() as u32
    }

    pub fn validate(&self) -> Result<()> {
        if self.month_names.is_empty() {
            return Err(CalendarError::NoMonths);
        }
        if self.weekday_names.len() != WEEK_DAYS as usize {
            return Err(CalendarError::WeekdayCount {
                count: self.weekday_names.len(),
            });
        }
        let total_months = self.total_months();
        match &self.season_months {
            Some(mapping) => season::check_partition(mapping, total_months)?,
            None if total_months != 12 => {
                return Err(CalendarError::MissingSeasonMapping { total_months })
            }
            None => {}
        }
        self.weather.validate()
    }

    pub fn season_for(&self, month: u32) -> Result<Season> {
        season::season_for(month, self.season_months.as_ref())
    }

    /// Replace month names and season mapping, keeping weekday names and the
    /// weather model. The result is validated before it is returned.
    pub fn reconfigure(
        &self,
        month_names: Vec<String>,
        season_months: Option<SeasonMonths>,
    ) -> Result<Self> {
        let next = Self {
            month_names,
            season_months,
            ..self.clone()
        };
        next.validate()?;
        Ok(next)
    }

    pub fn month_name(&self, month: u32) -> Option<&str> {
        let index = usize::try_from(month.checked_sub(1)?).ok()?;
        self.month_names.get(index).map(String::as_str)
    }

    pub fn weekday_name(&self, day_of_week: u32) -> Option<&str> {
        let index = usize::try_from(day_of_week.checked_sub(1)?).ok()?;
        self.weekday_names.get(index).map(String::as_str)
    }
}
