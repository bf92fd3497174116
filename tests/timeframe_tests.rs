use berrybot::handlers::analytics::{Timeframe, start_of_timeframe};
use chrono::{NaiveDate, NaiveDateTime};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[test]
fn weekly_from_a_wednesday_starts_the_preceding_monday_at_midnight() {
    // 2025-06-18 is a Wednesday; 2025-06-16 the Monday before.
    let now = at(2025, 6, 18, 14, 37);
    assert_eq!(
        start_of_timeframe(Timeframe::Weekly, now),
        at(2025, 6, 16, 0, 0)
    );
}

#[test]
fn weekly_on_a_monday_is_that_monday() {
    let now = at(2025, 6, 16, 9, 0);
    assert_eq!(
        start_of_timeframe(Timeframe::Weekly, now),
        at(2025, 6, 16, 0, 0)
    );
}

#[test]
fn weekly_crosses_month_boundaries() {
    // 2025-07-02 is a Wednesday; the preceding Monday is June 30th.
    let now = at(2025, 7, 2, 8, 0);
    assert_eq!(
        start_of_timeframe(Timeframe::Weekly, now),
        at(2025, 6, 30, 0, 0)
    );
}

#[test]
fn today_truncates_to_midnight() {
    let now = at(2025, 12, 31, 23, 59);
    assert_eq!(
        start_of_timeframe(Timeframe::Today, now),
        at(2025, 12, 31, 0, 0)
    );
}

#[test]
fn monthly_and_yearly_snap_to_the_first() {
    let now = at(2025, 2, 28, 6, 0);
    assert_eq!(
        start_of_timeframe(Timeframe::Monthly, now),
        at(2025, 2, 1, 0, 0)
    );
    assert_eq!(
        start_of_timeframe(Timeframe::Yearly, now),
        at(2025, 1, 1, 0, 0)
    );
}

#[test]
fn parse_is_case_insensitive() {
    assert_eq!(Timeframe::parse("WEEKLY").unwrap(), Timeframe::Weekly);
    assert_eq!(Timeframe::parse("Today").unwrap(), Timeframe::Today);
}

#[test]
fn unrecognized_timeframe_is_a_400() {
    let err = Timeframe::parse("fortnightly").unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("fortnightly"));
}
