use berrybot::handlers::email_ingest::extract_qna;

#[test]
fn explicit_markers_extract_exactly() {
    let body = "QUESTION: Do I need a permit?\nANSWER: Yes, see state guidelines.";
    let (q, a) = extract_qna(body).unwrap();
    assert_eq!(q, "Do I need a permit?");
    assert_eq!(a, "Yes, see state guidelines.");
}

#[test]
fn markers_are_case_insensitive_and_span_lines() {
    let body = "question:\nHow deep should rows be?\n\nanswer:\nAbout 45 cm,\ndepending on soil.";
    let (q, a) = extract_qna(body).unwrap();
    assert_eq!(q, "How deep should rows be?");
    assert_eq!(a, "About 45 cm,\ndepending on soil.");
}

#[test]
fn question_marker_without_answer_marker_splits_on_first_line_break() {
    let body = "QUESTION: When is pruning season?\nLate winter, before bud break.";
    let (q, a) = extract_qna(body).unwrap();
    assert_eq!(q, "When is pruning season?");
    assert_eq!(a, "Late winter, before bud break.");
}

// The last fallback treats ANY multi-line text as question/answer; a
// marker-free reply "extracts" whether or not it contains one. This is
// intentionally lenient and preserved as-is.
#[test]
fn markerless_email_falls_back_to_first_line_split() {
    let body = "Thanks for reaching out!\nI'll have a look next week.\nBest, Sam";
    let (q, a) = extract_qna(body).unwrap();
    assert_eq!(q, "Thanks for reaching out!");
    assert_eq!(a, "I'll have a look next week.\nBest, Sam");
}

#[test]
fn single_line_body_without_markers_does_not_match() {
    assert!(extract_qna("just one line, no markers").is_none());
}

#[test]
fn empty_captures_are_reported_for_the_caller_to_reject() {
    // Matches pattern 1 but the answer group is empty; the handler treats
    // empty captures as a failed extraction.
    let (q, a) = extract_qna("QUESTION: something ANSWER:").unwrap();
    assert_eq!(q, "something");
    assert!(a.is_empty());
}

#[test]
fn crlf_line_endings_are_accepted() {
    let body = "QUESTION: Mulch type?\r\nANSWER: Pine bark works well.";
    let (q, a) = extract_qna(body).unwrap();
    assert_eq!(q, "Mulch type?");
    assert_eq!(a, "Pine bark works well.");
}
