use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn label(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
        }
    }
}

/// Season → months assignment as configured by the campaign owner.
pub type SeasonMonths = BTreeMap<Season, BTreeSet<u32>>;

/// Fixed fallback for 12-month calendars.
pub fn default_season(month: u32) -> Option<Season> {
    match month {
        1..=3 => Some(Season::Winter),
        4..=6 => Some(Season::Spring),
        7..=9 => Some(Season::Summer),
        10..=12 => Some(Season::Autumn),
        _ => None,
    }
}

/// The default 12-month mapping expressed as an explicit partition.
pub fn default_season_months() -> SeasonMonths {
    let mut months = SeasonMonths::new();
    for month in 1..=12 {
        if let Some(season) = default_season(month) {
            months.entry(season).or_default().insert(month);
        }
    }
    months
}

/// Resolve the season of `month`, falling back to the 12-month table when no
/// mapping is configured.
pub fn season_for(month: u32, season_months: Option<&SeasonMonths>) -> Result<Season> {
    let resolved = match season_months {
        Some(mapping) => mapping
            .iter()
            .find(|(_, months)| months.contains(&month))
            .map(|(season, _)| *season),
        None => default_season(month),
    };
    resolved.ok_or(CalendarError::UnresolvedSeason { month })
}

/// Months in `1..=total_months` not assigned to exactly one season.
///
/// An empty result means the mapping is a valid partition.
pub fn validate_partition(season_months: &SeasonMonths, total_months: u32) -> Vec<u32> {
    (1..=total_months)
        .filter(|month| {
            season_months
                .values()
                .filter(|months| months.contains(month))
                .count()
                != 1
        })
        .collect()
}

/// Full configuration-time check: partition coverage plus range.
pub fn check_partition(season_months: &SeasonMonths, total_months: u32) -> Result<()> {
    if let Some(month) = season_months
        .values()
        .flatten()
        .find(|month| !(1..=total_months).contains(*month))
    {
        return Err(CalendarError::SeasonMonthOutOfRange {
            month: *month,
            total_months,
        });
    }
    let months = validate_partition(season_months, total_months);
    if months.is_empty() {
        Ok(())
    } else {
        Err(CalendarError::IncompletePartition { months })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ten_month_partition() -> SeasonMonths {
        SeasonMonths::from([
            (Season::Winter, BTreeSet::from([1, 2, 10])),
            (Season::Spring, BTreeSet::from([3, 4])),
            (Season::Summer, BTreeSet::from([5, 6, 7])),
            (Season::Autumn, BTreeSet::from([8, 9])),
        ])
    }

    #[test]
    fn fallback_covers_twelve_months() {
        assert_eq!(season_for(1, None), Ok(Season::Winter));
        assert_eq!(season_for(6, None), Ok(Season::Spring));
        assert_eq!(season_for(9, None), Ok(Season::Summer));
        assert_eq!(season_for(12, None), Ok(Season::Autumn));
        assert_eq!(
            season_for(13, None),
            Err(CalendarError::UnresolvedSeason { month: 13 })
        );
    }

    #[test]
    fn configured_mapping_wins_over_fallback() {
        let mapping = ten_month_partition();
        assert_eq!(season_for(10, Some(&mapping)), Ok(Season::Winter));
        assert_eq!(season_for(3, Some(&mapping)), Ok(Season::Spring));
    }

    #[test]
    fn validate_partition_reports_unassigned_and_duplicates() {
        let mut mapping = ten_month_partition();
        assert!(validate_partition(&mapping, 10).is_empty());

        mapping.get_mut(&Season::Winter).unwrap().remove(&10);
        mapping.get_mut(&Season::Spring).unwrap().insert(5);
        assert_eq!(validate_partition(&mapping, 10), vec![5, 10]);
    }

    #[test]
    fn check_partition_rejects_out_of_range_months() {
        let mut mapping = ten_month_partition();
        mapping.get_mut(&Season::Autumn).unwrap().insert(11);
        assert_eq!(
            check_partition(&mapping, 10),
            Err(CalendarError::SeasonMonthOutOfRange {
                month: 11,
                total_months: 10
            })
        );
    }

    #[test]
    fn default_months_form_valid_partition() {
        assert!(check_partition(&default_season_months(), 12).is_ok());
    }

    proptest! {
        #[test]
        fn partition_valid_iff_each_month_assigned_once(
            assignments in proptest::collection::vec(
                proptest::collection::vec(0usize..4, 0..3),
                1..16,
            ),
        ) {
            let total_months = assignments.len() as u32;
            let mut mapping = SeasonMonths::new();
            for (index, seasons) in assignments.iter().enumerate() {
                for season in seasons {
                    mapping
                        .entry(Season::ALL[*season])
                        .or_default()
                        .insert(index as u32 + 1);
                }
            }
            let exactly_once = assignments.iter().all(|seasons| {
                seasons.iter().collect::<BTreeSet<_>>().len() == 1
            });
            let problems = validate_partition(&mapping, total_months);
            prop_assert_eq!(problems.is_empty(), exactly_once);
            if problems.is_empty() {
                for month in 1..=total_months {
                    prop_assert!(season_for(month, Some(&mapping)).is_ok());
                }
            }
        }
    }
}
