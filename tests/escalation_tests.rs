use berrybot::handlers::escalation::{EscalationFields, build_response, email_body, extract_fields};
use serde_json::json;

#[test]
fn flat_parameter_list_is_scanned_case_insensitively() {
    let event = json!({
        "parameters": [
            { "name": "Email", "value": "grower@example.com" },
            { "name": "queryText", "value": "Which mulch?" },
            { "name": "agentResponse", "value": "I could not find an answer." },
        ]
    });
    let fields = extract_fields(&event);
    assert_eq!(fields.email, "grower@example.com");
    assert_eq!(fields.querytext, "Which mulch?");
    assert_eq!(fields.agent_response, "I could not find an answer.");
}

#[test]
fn question_and_inputtext_are_accepted_aliases() {
    let event = json!({
        "parameters": [
            { "name": "question", "value": "Which mulch?" },
            { "name": "response", "value": "No idea." },
        ]
    });
    let fields = extract_fields(&event);
    assert_eq!(fields.querytext, "Which mulch?");
    assert_eq!(fields.agent_response, "No idea.");
}

#[test]
fn request_body_fills_only_the_missing_fields() {
    let event = json!({
        "parameters": [
            { "name": "email", "value": "from-params@example.com" },
        ],
        "requestBody": {
            "content": {
                "application/json": {
                    "properties": [
                        { "name": "email", "value": "from-body@example.com" },
                        { "name": "inputText", "value": "Soil pH target?" },
                        { "name": "agentresponse", "value": "Unsure." },
                    ]
                }
            }
        }
    });
    let fields = extract_fields(&event);
    // The flat list won for email; the body supplied the rest.
    assert_eq!(fields.email, "from-params@example.com");
    assert_eq!(fields.querytext, "Soil pH target?");
    assert_eq!(fields.agent_response, "Unsure.");
}

#[test]
fn unset_fields_get_placeholders_never_absent() {
    let fields = extract_fields(&json!({}));
    assert_eq!(fields.email, "<unknown>");
    assert_eq!(fields.querytext, "<no question>");
    assert_eq!(fields.agent_response, "<no agent response>");
}

#[test]
fn email_body_matches_the_admin_template_exactly() {
    let fields = EscalationFields {
        email: "grower@example.com".to_string(),
        querytext: "Which mulch?".to_string(),
        agent_response: "I could not find an answer.".to_string(),
    };
    let body = email_body(&fields, "2025-06-18T14:37:00.000000Z");
    assert_eq!(
        body,
        "Hello Admin,\n\n\
         A user needs assistance with this question:\n\n  \
         \u{2022} User Email: grower@example.com\n  \
         \u{2022} Original Question: Which mulch?\n  \
         \u{2022} Agent\u{2019}s Response: I could not find an answer.\n\n\
         Timestamp: 2025-06-18T14:37:00.000000Z\n\n\
         Thanks,\nBlueberry BOT"
    );
}

#[test]
fn function_mode_failure_carries_state_and_message() {
    let event = json!({
        "actionGroup": "escalate",
        "function": "notifyAdmin",
        "sessionAttributes": { "sid": "abc" },
    });
    let out = build_response(&event, "Failed to notify admin: boom", true);

    assert_eq!(out["messageVersion"], "1.0");
    let response = &out["response"];
    assert_eq!(response["function"], "notifyAdmin");
    assert_eq!(response["functionResponse"]["responseState"], "FAILURE");
    assert_eq!(
        response["functionResponse"]["responseBody"]["TEXT"]["body"],
        "Failed to notify admin: boom"
    );
    assert_eq!(out["sessionAttributes"]["sid"], "abc");
}

#[test]
fn function_mode_success_omits_response_state() {
    let event = json!({ "actionGroup": "escalate", "function": "notifyAdmin" });
    let out = build_response(&event, "Admin has been notified successfully.", false);
    assert!(out["response"]["functionResponse"].get("responseState").is_none());
}

#[test]
fn openapi_mode_maps_outcome_to_http_status() {
    let event = json!({
        "actionGroup": "escalate",
        "apiPath": "/notify",
        "httpMethod": "POST",
        "promptSessionAttributes": { "turn": "3" },
    });

    let ok = build_response(&event, "Admin has been notified successfully.", false);
    assert_eq!(ok["response"]["httpStatusCode"], 200);
    assert_eq!(ok["response"]["apiPath"], "/notify");
    assert_eq!(ok["response"]["httpMethod"], "POST");
    let body: serde_json::Value = serde_json::from_str(
        ok["response"]["responseBody"]["application/json"]["body"]
            .as_str()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(body["message"], "Admin has been notified successfully.");
    assert_eq!(ok["promptSessionAttributes"]["turn"], "3");

    let failed = build_response(&event, "Failed to notify admin: boom", true);
    assert_eq!(failed["response"]["httpStatusCode"], 500);
}
