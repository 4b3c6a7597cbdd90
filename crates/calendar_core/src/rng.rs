//! Deterministic random streams for weather generation.
//!
//! A stream is derived from an explicit numeric seed when the caller supplies
//! one, otherwise from the campaign id and the requested start date, so
//! regenerating the same range of the same campaign is reproducible.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_seeder::Seeder;

use crate::date::CampaignDate;

pub const WEATHER_STAGE: &str = "weather";

/// Stream for an explicit user-supplied seed.
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Stream labelled by `(campaign, stage, start)` for callers without a seed.
pub fn labelled(campaign_id: &str, stage: &str, start: CampaignDate) -> ChaCha8Rng {
    Seeder::from(format!("{campaign_id}/{stage}/{start}")).make_rng()
}

/// Pick the weather stream for a generation request.
pub fn weather_stream(campaign_id: &str, start: CampaignDate, seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => seeded(seed),
        None => labelled(campaign_id, WEATHER_STAGE, start),
    }
}
