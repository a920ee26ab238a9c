use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Label a service date is priced under. Holiday windows overlap the base
/// seasons and win over them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
    NewYear,
    TetHoliday,
}

impl Season {
    pub const ALL: [Season; 6] = [
        Self::Winter,
        Self::Spring,
        Self::Summer,
        Self::Autumn,
        Self::NewYear,
        Self::TetHoliday,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::NewYear => "new_year",
            Self::TetHoliday => "tet_holiday",
        }
    }

    pub fn is_holiday(&self) -> bool {
        matches!(self, Self::NewYear | Self::TetHoliday)
    }

    /// Meteorological season underneath a holiday label.
    pub fn base(&self) -> Season {
        match self {
            Self::NewYear | Self::TetHoliday => Self::Winter,
            other => *other,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown season label `{0}`")]
pub struct UnknownSeason(pub String);

impl FromStr for Season {
    type Err = UnknownSeason;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|season| season.label() == normalized)
            .ok_or_else(|| UnknownSeason(value.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SeasonalCalendar;

impl SeasonalCalendar {
    pub fn season_of(&self, date: NaiveDate) -> Season {
        season_of(date)
    }
}

pub fn season_of(date: NaiveDate) -> Season {
    if let Some(holiday) = holiday_of(date) {
        return holiday;
    }

    base_season_of(date)
}

fn holiday_of(date: NaiveDate) -> Option<Season> {
    match (date.month(), date.day()) {
        (12, 25..=31) | (1, 1..=5) => Some(Season::NewYear),
        (1, 20..=31) | (2, 1..=15) => Some(Season::TetHoliday),
        _ => None,
    }
}

fn base_season_of(date: NaiveDate) -> Season {
    match (date.month(), date.day()) {
        (12, 20..=31) | (1, _) | (2, _) => Season::Winter,
        (3..=5, _) => Season::Spring,
        (6..=8, _) => Season::Summer,
        _ => Season::Autumn,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{season_of, Season};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn base_seasons_follow_fixed_month_ranges() {
        assert_eq!(season_of(date(2026, 3, 1)), Season::Spring);
        assert_eq!(season_of(date(2026, 5, 31)), Season::Spring);
        assert_eq!(season_of(date(2026, 6, 1)), Season::Summer);
        assert_eq!(season_of(date(2026, 8, 31)), Season::Summer);
        assert_eq!(season_of(date(2026, 9, 1)), Season::Autumn);
        assert_eq!(season_of(date(2026, 12, 19)), Season::Autumn);
        assert_eq!(season_of(date(2026, 12, 20)), Season::Winter);
        assert_eq!(season_of(date(2026, 1, 10)), Season::Winter);
        assert_eq!(season_of(date(2028, 2, 29)), Season::Winter);
    }

    // Holiday windows take precedence over the base season they fall in.
    #[test]
    fn holidays_override_base_season() {
        assert_eq!(season_of(date(2026, 12, 24)), Season::Winter);
        assert_eq!(season_of(date(2026, 12, 25)), Season::NewYear);
        assert_eq!(season_of(date(2027, 1, 1)), Season::NewYear);
        assert_eq!(season_of(date(2027, 1, 5)), Season::NewYear);
        assert_eq!(season_of(date(2027, 1, 6)), Season::Winter);
        assert_eq!(season_of(date(2027, 1, 19)), Season::Winter);
        assert_eq!(season_of(date(2027, 1, 20)), Season::TetHoliday);
        assert_eq!(season_of(date(2027, 2, 1)), Season::TetHoliday);
        assert_eq!(season_of(date(2027, 2, 15)), Season::TetHoliday);
        assert_eq!(season_of(date(2027, 2, 16)), Season::Winter);
    }

    #[test]
    fn holiday_labels_keep_their_base_season() {
        assert_eq!(Season::TetHoliday.base(), Season::Winter);
        assert_eq!(Season::NewYear.base(), Season::Winter);
        assert_eq!(Season::Summer.base(), Season::Summer);
        assert!(Season::NewYear.is_holiday());
        assert!(!Season::Autumn.is_holiday());
    }

    #[test]
    fn labels_parse_back_into_seasons() {
        for season in Season::ALL {
            assert_eq!(season.label().parse::<Season>(), Ok(season));
        }
        assert!("monsoon".parse::<Season>().is_err());
    }
}
