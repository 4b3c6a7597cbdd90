//! Occurrence checks for single and repeating events.
//!
//! Nothing here is cached: every query recomputes from the event record, so
//! the functions are safe to call from any number of threads at once.

use std::collections::BTreeMap;

use crate::date::{add_days, days_between, CampaignDate, DAYS_PER_MONTH};
use crate::event::{CalendarEvent, RepeatType};

/// Does `event` fall on `target` in a calendar of `total_months` months?
///
/// The event is assumed to have passed [`CalendarEvent::validate`].
pub fn occurs_on(event: &CalendarEvent, target: CampaignDate, total_months: u32) -> bool {
    let anchor = event.anchor();
    let repeat = match (event.is_repeatable, event.repeat_type) {
        (true, Some(repeat)) => repeat,
        _ => return anchor == target,
    };

    let offset = days_between(anchor, target, total_months);
    if offset < 0 {
        return false;
    }
    if let Some(end) = event.repeat_end() {
        if days_between(target, end, total_months) < 0 {
            return false;
        }
    }

    let interval = i64::from(event.repeat_interval.max(1));
    match repeat {
        RepeatType::Yearly => {
            let years = i64::from(target.year) - i64::from(anchor.year);
            target.month == anchor.month
                && target.day == anchor.day
                && years >= 0
                && years % interval == 0
        }
        RepeatType::Monthly => {
            let months = (i64::from(target.year) - i64::from(anchor.year))
                * i64::from(total_months)
                + (i64::from(target.month) - i64::from(anchor.month));
            target.day == anchor.day && months >= 0 && months % interval == 0
        }
        RepeatType::Weekly => offset % (7 * interval) == 0,
        RepeatType::Daily => offset % interval == 0,
    }
}

/// Events from `events` that occur on `date`, in input order.
pub fn events_on<'a, I>(events: I, date: CampaignDate, total_months: u32) -> Vec<&'a CalendarEvent>
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    events
        .into_iter()
        .filter(|event| occurs_on(event, date, total_months))
        .collect()
}

/// Day-of-month → occurring events for one month; days without events are
/// omitted.
pub fn month_agenda<'a>(
    events: &'a [CalendarEvent],
    year: u32,
    month: u32,
    total_months: u32,
) -> BTreeMap<u32, Vec<&'a CalendarEvent>> {
    let mut agenda = BTreeMap::new();
    for day in 1..=DAYS_PER_MONTH {
        let date = CampaignDate::new(year, month, day);
        let todays = events_on(events, date, total_months);
        if !todays.is_empty() {
            agenda.insert(day, todays);
        }
    }
    agenda
}

/// First date on or after `from`, within `horizon_days`, on which `event`
/// occurs.
pub fn next_occurrence(
    event: &CalendarEvent,
    from: CampaignDate,
    horizon_days: u32,
    total_months: u32,
) -> Option<CampaignDate> {
    (0..=horizon_days)
        .map_while(|offset| add_days(from, offset, total_months))
        .find(|date| occurs_on(event, *date, total_months))
}
