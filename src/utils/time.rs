//! UTC timestamp helpers.
//!
//! Interaction records are compared lexicographically by their ISO
//! timestamps (DynamoDB filter expressions, sort keys), so every producer
//! in the system writes the same naive-UTC format with microseconds.

use chrono::{NaiveDateTime, Utc};

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[must_use]
pub fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// ISO-8601 without zone suffix, microsecond precision.
#[must_use]
pub fn iso_timestamp(t: NaiveDateTime) -> String {
    t.format(ISO_FORMAT).to_string()
}

#[must_use]
pub fn utc_now_iso() -> String {
    iso_timestamp(utc_now())
}

/// ISO-8601 with a trailing `Z`, used in human-facing email bodies and
/// stored artifacts.
#[must_use]
pub fn utc_now_iso_z() -> String {
    format!("{}Z", utc_now_iso())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn iso_timestamps_sort_lexicographically() {
        let early = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_micro_opt(9, 30, 0, 1)
            .unwrap();
        let late = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_micro_opt(9, 30, 0, 2)
            .unwrap();
        assert!(iso_timestamp(early) < iso_timestamp(late));
    }
}
