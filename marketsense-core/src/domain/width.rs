//! Bar width: the interval one bar represents.

use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bar widths offered by the market-data provider.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BarWidth {
    Min1,
    Min5,
    Min15,
    Min30,
    Min45,
    Hour1,
    Hour2,
    Hour4,
    #[default]
    Day1,
    Week1,
    Month1,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BarWidthError {
    #[error("unknown bar width '{0}'")]
    Unknown(String),
}

impl BarWidth {
    pub const ALL: [BarWidth; 11] = [
        BarWidth::Min1,
        BarWidth::Min5,
        BarWidth::Min15,
        BarWidth::Min30,
        BarWidth::Min45,
        BarWidth::Hour1,
        BarWidth::Hour2,
        BarWidth::Hour4,
        BarWidth::Day1,
        BarWidth::Week1,
        BarWidth::Month1,
    ];

    /// Provider interval code, e.g. `"1day"`.
    pub fn code(&self) -> &'static str {
        match self {
            BarWidth::Min1 => "1min",
            BarWidth::Min5 => "5min",
            BarWidth::Min15 => "15min",
            BarWidth::Min30 => "30min",
            BarWidth::Min45 => "45min",
            BarWidth::Hour1 => "1h",
            BarWidth::Hour2 => "2h",
            BarWidth::Hour4 => "4h",
            BarWidth::Day1 => "1day",
            BarWidth::Week1 => "1week",
            BarWidth::Month1 => "1month",
        }
    }

    /// Nominal duration of one bar. Month bars are nominally 30 days.
    pub fn duration(&self) -> Duration {
        match self {
            BarWidth::Min1 => Duration::minutes(1),
            BarWidth::Min5 => Duration::minutes(5),
            BarWidth::Min15 => Duration::minutes(15),
            BarWidth::Min30 => Duration::minutes(30),
            BarWidth::Min45 => Duration::minutes(45),
            BarWidth::Hour1 => Duration::hours(1),
            BarWidth::Hour2 => Duration::hours(2),
            BarWidth::Hour4 => Duration::hours(4),
            BarWidth::Day1 => Duration::days(1),
            BarWidth::Week1 => Duration::weeks(1),
            BarWidth::Month1 => Duration::days(30),
        }
    }

    /// Shift `instant` by `bars` whole bars (negative shifts backwards).
    ///
    /// Month bars move by calendar months; every other width moves by its
    /// fixed duration.
    pub fn offset(&self, instant: NaiveDateTime, bars: i64) -> NaiveDateTime {
        match self {
            BarWidth::Month1 => {
                let months = Months::new(bars.unsigned_abs().min(u32::MAX as u64) as u32);
                if bars >= 0 {
                    instant.checked_add_months(months).unwrap_or(NaiveDateTime::MAX)
                } else {
                    instant.checked_sub_months(months).unwrap_or(NaiveDateTime::MIN)
                }
            }
            _ => {
                let shift = self.duration().num_seconds().saturating_mul(bars);
                instant
                    .checked_add_signed(Duration::seconds(shift))
                    .unwrap_or(if bars >= 0 { NaiveDateTime::MAX } else { NaiveDateTime::MIN })
            }
        }
    }

    pub fn is_intraday(&self) -> bool {
        self.duration() < Duration::days(1)
    }
}

impl fmt::Display for BarWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for BarWidth {
    type Err = BarWidthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BarWidth::ALL
            .iter()
            .copied()
            .find(|w| w.code() == wanted)
            .ok_or_else(|| BarWidthError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn codes_parse_back() {
        for width in BarWidth::ALL {
            assert_eq!(width.code().parse::<BarWidth>().unwrap(), width);
        }
        assert!("3day".parse::<BarWidth>().is_err());
    }

    #[test]
    fn offset_by_fixed_duration() {
        let t = at(2024, 1, 2, 10);
        assert_eq!(BarWidth::Hour1.offset(t, 3), at(2024, 1, 2, 13));
        assert_eq!(BarWidth::Day1.offset(t, -2), at(2023, 12, 31, 10));
    }

    #[test]
    fn offset_month_uses_calendar() {
        let t = at(2024, 1, 31, 0);
        assert_eq!(BarWidth::Month1.offset(t, 1), at(2024, 2, 29, 0));
        assert_eq!(BarWidth::Month1.offset(at(2024, 3, 15, 0), -2), at(2024, 1, 15, 0));
    }

    #[test]
    fn offset_is_invertible_for_fixed_widths() {
        let t = at(2024, 6, 5, 9);
        for width in BarWidth::ALL.iter().filter(|w| **w != BarWidth::Month1) {
            assert_eq!(width.offset(width.offset(t, 7), -7), t);
        }
    }
}
