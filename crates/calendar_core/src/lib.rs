pub mod campaign;
pub mod clock;
pub mod config;
pub mod date;
pub mod error;
pub mod event;
pub mod io;
pub mod moon;
pub mod pending;
pub mod recurrence;
pub mod rng;
pub mod season;
pub mod weather;

#[cfg(any(test, feature = "proptest-support"))]
pub mod strategies;

use clock::CalendarState;
use config::CalendarConfig;
use error::Result;
use event::CalendarEvent;
use io::frame::{make_frame, DayFrame};

pub use date::CampaignDate;
pub use error::CalendarError;

/// Walk a calendar forward one day at a time.
///
/// Produces a [`DayFrame`] for each of `days` consecutive days starting with
/// `state`'s current day, and returns the state reached after the last frame
/// (i.e. `state` advanced by `days`).
pub fn walk_days(
    state: &CalendarState,
    config: &CalendarConfig,
    events: &[CalendarEvent],
    days: u32,
) -> Result<(CalendarState, Vec<DayFrame>)> {
    let mut frames = Vec::with_capacity(days as usize);
    let mut previous: Option<CalendarState> = None;
    let mut current = state.clone();

    for t in 0..days {
        frames.push(make_frame(
            u64::from(t),
            previous.as_ref(),
            &current,
            config,
            events,
        ));
        let next = current.advance(config, 1)?;
        previous = Some(std::mem::replace(&mut current, next));
    }

    Ok((current, frames))
}
