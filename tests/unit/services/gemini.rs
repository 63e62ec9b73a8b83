use super::*;

fn response(json: &str) -> GenerateResponse {
    serde_json::from_str(json).unwrap()
}

#[test]
fn endpoint_appends_model_operation() {
    let c = GeminiClient::with_base("key", "http://127.0.0.1:9/v1beta/").unwrap();
    assert_eq!(
        c.endpoint("gemini-2.5-flash-image").unwrap().as_str(),
        "http://127.0.0.1:9/v1beta/models/gemini-2.5-flash-image:generateContent"
    );
}

#[test]
fn blank_key_and_bad_base_are_rejected() {
    assert!(matches!(
        GeminiClient::with_base("  ", GEMINI_API_BASE),
        Err(PinError::Validation(_))
    ));
    assert!(GeminiClient::with_base("key", "not a url").is_err());
    assert!(GeminiClient::with_base("key", "mailto:someone@example.com").is_err());
}

#[test]
fn blocked_prompt_names_the_reason() {
    let err = first_candidate_parts(response(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#))
        .unwrap_err();
    assert!(matches!(&err, PinError::Generation(m) if m.contains("SAFETY")));

    let err = first_candidate_parts(response("{}")).unwrap_err();
    assert!(matches!(&err, PinError::Generation(m) if m.contains("no content")));
}

#[test]
fn candidate_without_parts_is_an_error() {
    let err = first_candidate_parts(response(
        r#"{"candidates":[{"finishReason":"IMAGE_SAFETY"}]}"#,
    ))
    .unwrap_err();
    assert!(matches!(&err, PinError::Generation(m) if m.contains("IMAGE_SAFETY")));
}

#[test]
fn inline_image_becomes_data_uri() {
    let parts = first_candidate_parts(response(
        r#"{"candidates":[{"content":{"parts":[
            {"text":"Here you go"},
            {"inlineData":{"mimeType":"image/jpeg","data":"AAEC"}}
        ]}}]}"#,
    ))
    .unwrap();
    assert_eq!(
        image_from_parts(parts).unwrap(),
        ImagePayload::Encoded("data:image/jpeg;base64,AAEC".to_owned())
    );

    let parts = vec![Part {
        text: None,
        inline_data: Some(InlineData {
            mime_type: None,
            data: "AAEC".to_owned(),
        }),
    }];
    assert_eq!(
        image_from_parts(parts).unwrap().into_bytes().unwrap(),
        vec![0, 1, 2]
    );
}

#[test]
fn text_only_image_response_is_a_refusal() {
    let parts = vec![
        Part {
            text: Some("I can't draw".to_owned()),
            inline_data: None,
        },
        Part {
            text: Some("that.".to_owned()),
            inline_data: None,
        },
    ];
    let err = image_from_parts(parts).unwrap_err();
    assert!(matches!(&err, PinError::Generation(m) if m.ends_with("I can't draw that.")));

    let empty = vec![Part::default()];
    assert!(matches!(
        image_from_parts(empty),
        Err(PinError::Generation(m)) if m == "no image data in response"
    ));
}

#[test]
fn schema_requires_every_variation_field() {
    let schema = content_schema();
    let required = &schema["properties"]["variations"]["items"]["required"];
    assert_eq!(required.as_array().unwrap().len(), 7);
    assert!(required.as_array().unwrap().iter().any(|f| f == "imagePrompt"));
    assert_eq!(schema["required"], serde_json::json!(["variations", "gradientColors"]));
}

#[test]
fn google_error_message_is_extracted() {
    assert_eq!(
        api_message(r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#)
            .as_deref(),
        Some("API key not valid.")
    );
    assert_eq!(api_message("<html>"), None);
}
