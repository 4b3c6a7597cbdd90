use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::campaign::Campaign;
use crate::clock::CalendarState;
use crate::config::CalendarConfig;
use crate::event::CalendarEvent;

/// Parsed campaign file: a calendar layout, an optional saved state and the
/// campaign's events.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignFile {
    pub id: String,
    #[serde(default)]
    pub config: CalendarConfig,
    #[serde(default)]
    pub state: Option<CalendarState>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

impl CampaignFile {
    /// Load a campaign JSON document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open campaign file {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Deserialize a campaign document from an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).context("invalid campaign json")
    }
}

/// Realise a validated [`Campaign`] from a file, starting a fresh calendar
/// when the file carries no saved state.
pub fn build_campaign(file: CampaignFile) -> Result<Campaign> {
    let state = match file.state {
        Some(state) => state,
        None => CalendarState::initial(&file.config)
            .with_context(|| format!("campaign {} has an invalid calendar", file.id))?,
    };
    let campaign = Campaign {
        id: file.id,
        config: file.config,
        state: Some(state),
        events: file.events,
        revision: 0,
    };
    campaign
        .validate()
        .with_context(|| format!("campaign {} failed validation", campaign.id))?;
    Ok(campaign)
}
