use std::collections::HashSet;

use berrybot::handlers::classifier::composite_sort_key;

#[test]
fn same_instant_keys_never_collide() {
    // 10,000 simulated writes at the exact same timestamp must produce
    // pairwise-distinct sort keys.
    let instant = "2025-06-01T12:00:00.000000";
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let key = composite_sort_key(instant);
        assert!(seen.insert(key), "sort key collision");
    }
}

#[test]
fn key_is_timestamp_plus_eight_char_suffix() {
    let key = composite_sort_key("2025-06-01T12:00:00.000000");
    let (ts, suffix) = key.split_once('#').unwrap();
    assert_eq!(ts, "2025-06-01T12:00:00.000000");
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn keys_for_the_same_session_still_sort_by_timestamp() {
    let earlier = composite_sort_key("2025-06-01T12:00:00.000000");
    let later = composite_sort_key("2025-06-01T12:00:01.000000");
    assert!(earlier < later);
}
