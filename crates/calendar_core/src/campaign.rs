//! Campaign-level operations over an in-memory book of campaigns.
//!
//! The book stands in for the storage collaborator: it owns each campaign's
//! config, current state and events, and bumps a revision on every write so
//! callers can detect lost updates with `expected_revision`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::CalendarState;
use crate::config::CalendarConfig;
use crate::date::CampaignDate;
use crate::error::{CalendarError, Result};
use crate::event::CalendarEvent;
use crate::recurrence;
use crate::rng;
use crate::season::SeasonMonths;
use crate::weather::{self, WeatherMap};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub config: CalendarConfig,
    #[serde(default)]
    pub state: Option<CalendarState>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub revision: u64,
}

impl Campaign {
    pub fn new(id: impl Into<String>, config: CalendarConfig) -> Self {
        Self {
            id: id.into(),
            config,
            state: None,
            events: Vec::new(),
            revision: 0,
        }
    }

    /// Check config, state and every event against each other.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if let Some(state) = &self.state {
            state.check_invariants(&self.config)?;
        }
        let total_months = self.config.total_months();
        for event in &self.events {
            event.validate(total_months)?;
        }
        Ok(())
    }

    pub fn state(&self) -> Result<&CalendarState> {
        self.state.as_ref().ok_or_else(|| CalendarError::Uninitialized {
            id: self.id.clone(),
        })
    }

    fn check_revision(&self, expected: Option<u64>) -> Result<()> {
        match expected {
            Some(expected) if expected != self.revision => Err(CalendarError::StaleRevision {
                expected,
                current: self.revision,
            }),
            _ => Ok(()),
        }
    }

    fn event_index(&self, event_id: &str) -> Result<usize> {
        self.events
            .iter()
            .position(|event| event.id == event_id)
            .ok_or_else(|| CalendarError::UnknownEvent {
                id: event_id.to_string(),
            })
    }
}

fn day_count(days: i64) -> Result<u32> {
    if days < 0 {
        return Err(CalendarError::NegativeDayCount { days });
    }
    u32::try_from(days).map_err(|_| CalendarError::DayCountTooLarge { days })
}

#[derive(Debug, Default)]
pub struct CampaignBook {
    campaigns: HashMap<String, Campaign>,
}

impl CampaignBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully formed campaign, e.g. one loaded from a campaign file.
    pub fn insert(&mut self, campaign: Campaign) -> Result<()> {
        campaign.validate()?;
        info!(campaign = %campaign.id, events = campaign.events.len(), "campaign loaded");
        self.campaigns.insert(campaign.id.clone(), campaign);
        Ok(())
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.campaigns.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn campaign(&self, id: &str) -> Result<&Campaign> {
        self.campaigns
            .get(id)
            .ok_or_else(|| CalendarError::UnknownCampaign { id: id.to_string() })
    }

    fn campaign_mut(&mut self, id: &str, expected: Option<u64>) -> Result<&mut Campaign> {
        let campaign = self
            .campaigns
            .get_mut(id)
            .ok_or_else(|| CalendarError::UnknownCampaign { id: id.to_string() })?;
        campaign.check_revision(expected)?;
        Ok(campaign)
    }

    /// Current state; `Uninitialized` before [`CampaignBook::initialize`].
    pub fn state(&self, id: &str) -> Result<&CalendarState> {
        self.campaign(id)?.state()
    }

    pub fn config(&self, id: &str) -> Result<&CalendarConfig> {
        Ok(&self.campaign(id)?.config)
    }

    /// Create the campaign's calendar with default state under `config`.
    pub fn initialize(&mut self, id: &str, config: CalendarConfig) -> Result<&CalendarState> {
        if self.campaigns.get(id).is_some_and(|c| c.state.is_some()) {
            return Err(CalendarError::AlreadyInitialized { id: id.to_string() });
        }
        let state = CalendarState::initial(&config)?;
        let campaign = self
            .campaigns
            .entry(id.to_string())
            .or_insert_with(|| Campaign::new(id, config.clone()));
        campaign.config = config;
        campaign.state = Some(state);
        campaign.revision += 1;
        info!(campaign = %id, months = campaign.config.total_months(), "calendar initialized");
        campaign.state()
    }

    pub fn advance(
        &mut self,
        id: &str,
        days: i64,
        expected_revision: Option<u64>,
    ) -> Result<&CalendarState> {
        let days = day_count(days)?;
        let campaign = self.campaign_mut(id, expected_revision)?;
        let next = campaign.state()?.advance(&campaign.config, days)?;
        debug!(campaign = %id, days, today = %next.today(), "calendar advanced");
        campaign.state = Some(next);
        campaign.revision += 1;
        campaign.state()
    }

    pub fn set_year(
        &mut self,
        id: &str,
        year: i64,
        expected_revision: Option<u64>,
    ) -> Result<&CalendarState> {
        let year = u32::try_from(year)
            .ok()
            .filter(|year| *year >= 1)
            .ok_or(CalendarError::InvalidYear { year })?;
        let campaign = self.campaign_mut(id, expected_revision)?;
        let next = campaign.state()?.set_year(year)?;
        debug!(campaign = %id, year, "year overridden");
        campaign.state = Some(next);
        campaign.revision += 1;
        campaign.state()
    }

    /// Replace month names and season mapping. The stored state, if any, is
    /// rebased onto the new month count.
    pub fn reconfigure(
        &mut self,
        id: &str,
        month_names: Vec<String>,
        season_months: Option<SeasonMonths>,
        expected_revision: Option<u64>,
    ) -> Result<&CalendarConfig> {
        let campaign = self.campaign_mut(id, expected_revision)?;
        let config = campaign.config.reconfigure(month_names, season_months)?;
        let state = match &campaign.state {
            Some(state) => Some(state.rebase(&config)?),
            None => None,
        };
        campaign.config = config;
        campaign.state = state;
        campaign.revision += 1;
        info!(campaign = %id, months = campaign.config.total_months(), "calendar reconfigured");
        Ok(&campaign.config)
    }

    /// Generate weather for `day_count` days from `start` and merge it into
    /// the stored state. Returns the freshly generated entries. At most
    /// [`weather::MAX_GENERATION_DAYS`] days per request.
    pub fn generate_weather(
        &mut self,
        id: &str,
        start: CampaignDate,
        day_count: i64,
        seed: Option<u64>,
    ) -> Result<WeatherMap> {
        let days = self::day_count(day_count)?;
        if days > weather::MAX_GENERATION_DAYS {
            return Err(CalendarError::DayCountTooLarge { days: day_count });
        }
        let campaign = self.campaign_mut(id, None)?;
        let start = start.validate(campaign.config.total_months())?;
        let state = campaign.state()?;
        let mut stream = rng::weather_stream(id, start, seed);
        let generated = weather::generate(&campaign.config, start, days, &mut stream)?;
        let next = state.merge_weather(generated.clone());
        campaign.state = Some(next);
        campaign.revision += 1;
        debug!(campaign = %id, %start, days, "weather generated");
        Ok(generated)
    }

    pub fn create_event(&mut self, id: &str, event: CalendarEvent) -> Result<&CalendarEvent> {
        let campaign = self.campaign_mut(id, None)?;
        event.validate(campaign.config.total_months())?;
        if campaign.events.iter().any(|existing| existing.id == event.id) {
            return Err(CalendarError::DuplicateEvent { id: event.id });
        }
        debug!(campaign = %id, event = %event.id, "event created");
        campaign.events.push(event);
        campaign.revision += 1;
        Ok(&campaign.events[campaign.events.len() - 1])
    }

    pub fn update_event(&mut self, id: &str, event: CalendarEvent) -> Result<&CalendarEvent> {
        let campaign = self.campaign_mut(id, None)?;
        event.validate(campaign.config.total_months())?;
        let index = campaign.event_index(&event.id)?;
        debug!(campaign = %id, event = %event.id, "event updated");
        campaign.events[index] = event;
        campaign.revision += 1;
        Ok(&campaign.events[index])
    }

    pub fn delete_event(&mut self, id: &str, event_id: &str) -> Result<CalendarEvent> {
        let campaign = self.campaign_mut(id, None)?;
        let index = campaign.event_index(event_id)?;
        campaign.revision += 1;
        debug!(campaign = %id, event = %event_id, "event deleted");
        Ok(campaign.events.remove(index))
    }

    pub fn events_on(&self, id: &str, date: CampaignDate) -> Result<Vec<&CalendarEvent>> {
        let campaign = self.campaign(id)?;
        let total_months = campaign.config.total_months();
        Ok(recurrence::events_on(
            &campaign.events,
            date,
            total_months,
        ))
    }

    pub fn month_agenda(
        &self,
        id: &str,
        year: u32,
        month: u32,
    ) -> Result<BTreeMap<u32, Vec<&CalendarEvent>>> {
        let campaign = self.campaign(id)?;
        let total_months = campaign.config.total_months();
        CampaignDate::new(year, month, 1).validate(total_months)?;
        Ok(recurrence::month_agenda(
            &campaign.events,
            year,
            month,
            total_months,
        ))
    }
}
