use berrybot::handlers::file_admin::extract_key;
use berrybot::utils::encoding::{quote_plus, unquote_plus};
use serde_json::{Map, Value, json};

fn params(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

#[test]
fn proxy_parameter_wins_over_key() {
    let p = params(&[("proxy", "a.pdf"), ("key", "b.pdf")]);
    assert_eq!(extract_key(&p, "/files/ignored").unwrap(), "a.pdf");
}

#[test]
fn key_parameter_is_the_fallback() {
    let p = params(&[("key", "b.pdf")]);
    assert_eq!(extract_key(&p, "/files/ignored").unwrap(), "b.pdf");
}

#[test]
fn raw_path_is_split_on_files_segment() {
    let p = Map::new();
    assert_eq!(
        extract_key(&p, "/files/reports/2025.csv").unwrap(),
        "reports/2025.csv"
    );
}

#[test]
fn path_without_files_segment_is_an_input_error() {
    let p = Map::new();
    assert_eq!(extract_key(&p, "/sync").unwrap_err().status_code(), 400);
}

#[test]
fn keys_are_decoded_form_style() {
    // `+` means space, `%2B` means a literal plus.
    let p = params(&[("proxy", "field+notes%2Bv2.txt")]);
    assert_eq!(extract_key(&p, "").unwrap(), "field notes+v2.txt");

    let empty = Map::new();
    assert_eq!(
        extract_key(&empty, "/files/field+notes%2Bv2.txt").unwrap(),
        "field notes+v2.txt"
    );
}

#[test]
fn reserved_character_keys_round_trip_through_the_listing_endpoints() {
    // The list endpoint publishes quote_plus-encoded action paths; the
    // download/delete routes must decode them back to the original key.
    for key in [
        "plain.txt",
        "with space.txt",
        "a+b&c=d.txt",
        "nested/dir/file #1.pdf",
        "100%\u{e9}.bin",
    ] {
        let endpoint = format!("/files/{}", quote_plus(key));
        let empty = Map::new();
        assert_eq!(extract_key(&empty, &endpoint).unwrap(), key, "key: {key}");
        assert_eq!(unquote_plus(&quote_plus(key)).unwrap(), key);
    }
}

#[test]
fn missing_parameter_values_resolve_to_empty_key() {
    let p = params(&[("other", "x")]);
    assert_eq!(extract_key(&p, "/files/whatever").unwrap(), "");
    // Null values behave like absent strings.
    let mut p = Map::new();
    p.insert("proxy".into(), json!(null));
    assert_eq!(extract_key(&p, "/files/whatever").unwrap(), "");
}
