//! Season-weighted weather with streak persistence.
//!
//! Generation is a left fold over consecutive days: each day consumes the
//! [`WeatherStreak`] left by the previous one. Chunked generation must carry
//! the streak between chunks to reproduce a single long run.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::date::{add_days, CampaignDate, DateKey};
use crate::error::{CalendarError, Result};
use crate::season::Season;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherType {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Foggy,
    Windy,
}

impl WeatherType {
    /// Bucket order for weighted sampling.
    pub const ALL: [WeatherType; 8] = [
        WeatherType::Clear,
        WeatherType::PartlyCloudy,
        WeatherType::Cloudy,
        WeatherType::Rainy,
        WeatherType::Stormy,
        WeatherType::Snowy,
        WeatherType::Foggy,
        WeatherType::Windy,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSample {
    #[serde(rename = "type")]
    pub kind: WeatherType,
    pub temperature: i32,
    pub description: String,
}

pub type WeatherMap = BTreeMap<DateKey, WeatherSample>;

/// Inclusive integer range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonClimate {
    /// Relative draw weights; missing types weigh 0.
    pub weights: BTreeMap<WeatherType, u32>,
    pub temperature: Span<i32>,
}

impl SeasonClimate {
    fn weight(&self, kind: WeatherType) -> u32 {
        self.weights.get(&kind).copied().unwrap_or(0)
    }

    fn total_weight(&self) -> u32 {
        WeatherType::ALL.iter().map(|kind| self.weight(*kind)).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherModel {
    pub seasons: BTreeMap<Season, SeasonClimate>,
    /// Streak length in days once a type is drawn.
    pub durations: BTreeMap<WeatherType, Span<u32>>,
}

fn climate(weights: [u32; 8], min: i32, max: i32) -> SeasonClimate {
    SeasonClimate {
        weights: WeatherType::ALL.into_iter().zip(weights).collect(),
        temperature: Span::new(min, max),
    }
}

impl Default for WeatherModel {
    fn default() -> Self {
        // clear, partly_cloudy, cloudy, rainy, stormy, snowy, foggy, windy
        let seasons = BTreeMap::from([
            (Season::Winter, climate([1, 1, 2, 0, 1, 2, 1, 1], -10, 5)),
            (Season::Spring, climate([3, 3, 2, 3, 1, 0, 2, 2], 5, 18)),
            (Season::Summer, climate([5, 3, 1, 1, 2, 0, 0, 1], 18, 32)),
            (Season::Autumn, climate([2, 2, 3, 3, 1, 0, 3, 3], 4, 16)),
        ]);
        let durations = BTreeMap::from([
            (WeatherType::Clear, Span::new(2, 5)),
            (WeatherType::PartlyCloudy, Span::new(1, 3)),
            (WeatherType::Cloudy, Span::new(1, 3)),
            (WeatherType::Rainy, Span::new(1, 3)),
            (WeatherType::Stormy, Span::new(1, 2)),
            (WeatherType::Snowy, Span::new(3, 7)),
            (WeatherType::Foggy, Span::new(1, 2)),
            (WeatherType::Windy, Span::new(1, 2)),
        ]);
        Self { seasons, durations }
    }
}

impl WeatherModel {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(CalendarError::WeatherModel { reason });
        for season in Season::ALL {
            let Some(climate) = self.seasons.get(&season) else {
                return invalid(format!("no climate for {}", season.label()));
            };
            if climate.total_weight() == 0 {
                return invalid(format!("{} has no weather with positive weight", season.label()));
            }
            if climate.temperature.min > climate.temperature.max {
                return invalid(format!("{} temperature range is inverted", season.label()));
            }
        }
        for kind in WeatherType::ALL {
            match self.durations.get(&kind) {
                Some(span) if span.min >= 1 && span.min <= span.max => {}
                _ => return invalid(format!("{kind:?} needs a duration range with 1 <= min <= max")),
            }
        }
        Ok(())
    }

    fn climate(&self, season: Season) -> Result<&SeasonClimate> {
        self.seasons
            .get(&season)
            .ok_or_else(|| CalendarError::WeatherModel {
                reason: format!("no climate for {}", season.label()),
            })
    }

    /// Weighted draw over `season`'s table. Zero-weight types are never picked.
    pub fn draw_type<R: Rng + ?Sized>(&self, season: Season, rng: &mut R) -> Result<WeatherType> {
        let climate = self.climate(season)?;
        let total = climate.total_weight();
        if total == 0 {
            return Err(CalendarError::WeatherModel {
                reason: format!("{} has no weather with positive weight", season.label()),
            });
        }
        let mut roll = rng.gen_range(0..total);
        for kind in WeatherType::ALL {
            let weight = climate.weight(kind);
            if roll < weight {
                return Ok(kind);
            }
            roll -= weight;
        }
        Err(CalendarError::WeatherModel {
            reason: "weighted draw fell through every bucket".to_string(),
        })
    }

    fn draw_duration<R: Rng + ?Sized>(&self, kind: WeatherType, rng: &mut R) -> Result<u32> {
        let span = self
            .durations
            .get(&kind)
            .ok_or_else(|| CalendarError::WeatherModel {
                reason: format!("no duration for {kind:?}"),
            })?;
        Ok(rng.gen_range(span.min.max(1)..=span.max.max(span.min).max(1)))
    }

    fn draw_temperature<R: Rng + ?Sized>(&self, season: Season, rng: &mut R) -> Result<i32> {
        let span = self.climate(season)?.temperature;
        Ok(rng.gen_range(span.min..=span.max.max(span.min)))
    }
}

/// Weather carried from one day to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeatherStreak {
    pub current: Option<WeatherType>,
    pub remaining: u32,
    pub season: Option<Season>,
}

impl WeatherStreak {
    /// Produce one day's sample and the streak left for the next day.
    pub fn step<R: Rng + ?Sized>(
        self,
        season: Season,
        model: &WeatherModel,
        rng: &mut R,
    ) -> Result<(Self, WeatherSample)> {
        let mut next = self;
        let kind = match self.current {
            Some(kind) if self.remaining > 0 && self.season == Some(season) => kind,
            _ => {
                let kind = model.draw_type(season, rng)?;
                next.remaining = model.draw_duration(kind, rng)?;
                next.current = Some(kind);
                next.season = Some(season);
                kind
            }
        };
        let temperature = model.draw_temperature(season, rng)?;
        next.remaining = next.remaining.saturating_sub(1);
        Ok((
            next,
            WeatherSample {
                kind,
                temperature,
                description: String::new(),
            },
        ))
    }
}

/// Longest range a single generation request may cover: ten 360-day years.
pub const MAX_GENERATION_DAYS: u32 = 3_600;

/// Generate `day_count` days of weather starting at `start`, continuing from
/// `streak`. Returns the streak after the last day.
pub fn generate_from<R: Rng + ?Sized>(
    streak: WeatherStreak,
    config: &CalendarConfig,
    start: CampaignDate,
    day_count: u32,
    rng: &mut R,
) -> Result<(WeatherStreak, WeatherMap)> {
    let total_months = config.total_months();
    let mut weather = WeatherMap::new();
    let mut streak = streak;
    let mut walking = start;
    for offset in 0..day_count {
        if offset > 0 {
            walking = add_days(walking, 1, total_months).ok_or(CalendarError::YearOverflow {
                year: walking.year,
            })?;
        }
        let season = config.season_for(walking.month)?;
        let (next, sample) = streak.step(season, &config.weather, rng)?;
        weather.insert(walking.key(), sample);
        streak = next;
    }
    Ok((streak, weather))
}

/// Generate `day_count` days of weather starting at `start` with no prior streak.
pub fn generate<R: Rng + ?Sized>(
    config: &CalendarConfig,
    start: CampaignDate,
    day_count: u32,
    rng: &mut R,
) -> Result<WeatherMap> {
    generate_from(WeatherStreak::default(), config, start, day_count, rng).map(|(_, map)| map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn default_model_is_valid() {
        assert!(WeatherModel::default().validate().is_ok());
    }

    #[test]
    fn model_without_positive_weight_is_rejected() {
        let mut model = WeatherModel::default();
        model
            .seasons
            .get_mut(&Season::Summer)
            .unwrap()
            .weights
            .clear();
        assert!(matches!(
            model.validate(),
            Err(CalendarError::WeatherModel { .. })
        ));
    }

    #[test]
    fn streak_holds_type_until_duration_expires() {
        let model = WeatherModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let (first, sample) = WeatherStreak::default()
            .step(Season::Spring, &model, &mut rng)
            .unwrap();
        let kind = sample.kind;
        let mut streak = first;
        while streak.remaining > 0 {
            let (next, sample) = streak.step(Season::Spring, &model, &mut rng).unwrap();
            assert_eq!(sample.kind, kind);
            streak = next;
        }
    }

    #[test]
    fn season_change_forces_redraw() {
        let model = WeatherModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let streak = WeatherStreak {
            current: Some(WeatherType::Snowy),
            remaining: 6,
            season: Some(Season::Winter),
        };
        let (next, sample) = streak.step(Season::Summer, &model, &mut rng).unwrap();
        assert_ne!(sample.kind, WeatherType::Snowy);
        assert_eq!(next.season, Some(Season::Summer));
    }

    #[test]
    fn temperature_stays_in_season_range() {
        let model = WeatherModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut streak = WeatherStreak::default();
        for _ in 0..500 {
            let (next, sample) = streak.step(Season::Winter, &model, &mut rng).unwrap();
            assert!((-10..=5).contains(&sample.temperature));
            assert!(sample.description.is_empty());
            streak = next;
        }
    }

    #[test]
    fn sample_serializes_with_type_field() {
        let sample = WeatherSample {
            kind: WeatherType::PartlyCloudy,
            temperature: 12,
            description: String::new(),
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "partly_cloudy", "temperature": 12, "description": ""})
        );
    }
}
