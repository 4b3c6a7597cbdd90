//! 28-day moon cycle with eight phases of unequal width.

use serde::{Deserialize, Serialize};

pub const CYCLE_DAYS: u32 = 28;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

/// Last 0-indexed cycle day of each phase, in cycle order (4-4-3-3-4-3-3-4).
const PHASE_ENDS: [(u32, MoonPhase); 8] = [
    (3, MoonPhase::New),
    (7, MoonPhase::WaxingCrescent),
    (10, MoonPhase::FirstQuarter),
    (13, MoonPhase::WaxingGibbous),
    (17, MoonPhase::Full),
    (20, MoonPhase::WaningGibbous),
    (23, MoonPhase::LastQuarter),
    (27, MoonPhase::WaningCrescent),
];

impl MoonPhase {
    /// Phase for a 0-indexed cycle day; values wrap modulo the cycle length.
    pub fn from_cycle_day(cycle_day: u32) -> Self {
        let cycle_day = cycle_day % CYCLE_DAYS;
        PHASE_ENDS
            .iter()
            .find(|(end, _)| cycle_day <= *end)
            .map(|(_, phase)| *phase)
            .unwrap_or(MoonPhase::WaningCrescent)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::New => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::Full => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
        }
    }
}

/// 0-indexed cycle day reached `day_offset` days after 1-indexed `base`.
pub fn cycle_day(base_moon_phase_day: Option<u32>, day_offset: i64) -> u32 {
    let base = i64::from(base_moon_phase_day.unwrap_or(1));
    let cycle = i64::from(CYCLE_DAYS);
    (base - 1 + day_offset).rem_euclid(cycle) as u32
}

/// Moon phase `day_offset` days after a cycle position of `base_moon_phase_day`
/// (1..=28). Without a known base the cycle starts at a new moon.
pub fn phase_for(base_moon_phase_day: Option<u32>, day_offset: i64) -> MoonPhase {
    MoonPhase::from_cycle_day(cycle_day(base_moon_phase_day, day_offset))
}
