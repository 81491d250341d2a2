//! Weekend-avoiding datetime adjustments.

use chrono::{Datelike, Duration, NaiveDateTime, Weekday};

/// Push a weekend datetime forward to the following Monday; weekdays are unchanged.
pub fn forward_from_weekend(datetime: NaiveDateTime) -> NaiveDateTime {
    match datetime.weekday() {
        Weekday::Sat => datetime + Duration::days(2),
        Weekday::Sun => datetime + Duration::days(1),
        _ => datetime,
    }
}

/// Push a weekend datetime back to the preceding Friday; weekdays are unchanged.
pub fn backward_from_weekend(datetime: NaiveDateTime) -> NaiveDateTime {
    match datetime.weekday() {
        Weekday::Sat => datetime - Duration::days(1),
        Weekday::Sun => datetime - Duration::days(2),
        _ => datetime,
    }
}
