use super::*;

const SAMPLE: &str = r##"{
  "variations": [
    {
      "imagePrompt": "a cozy woodworking shop at golden hour",
      "headline": "Build Your Dream Workshop",
      "seoTitle": "Woodworking Workshop Ideas",
      "seoDescription": "Plans and tips.",
      "hashtags": "#woodworking #diy",
      "textColor": "#ffffff",
      "outlineColor": "#000000"
    }
  ],
  "gradientColors": ["#112233", "#445566"]
}"##;

#[test]
fn prompt_names_keyword_and_shape() {
    let p = variation_prompt("woodworking");
    assert!(p.contains("\"woodworking\""));
    assert!(p.contains("5 distinct"));
    assert!(p.contains("at most 10 words"));
    assert!(p.contains("gradientColors"));
}

#[test]
fn parses_provider_json() {
    let c = parse_generated_content(SAMPLE).unwrap();
    assert_eq!(c.variations.len(), 1);
    assert_eq!(c.variations[0].headline, "Build Your Dream Workshop");
    assert_eq!(c.variations[0].seo_title, "Woodworking Workshop Ideas");
    assert_eq!(c.gradient_colors, vec!["#112233", "#445566"]);
}

#[test]
fn parses_fenced_json() {
    let fenced = format!("```json\n{SAMPLE}\n```");
    assert_eq!(parse_generated_content(&fenced).unwrap().variations.len(), 1);
}

#[test]
fn rejects_blank_headline() {
    let bad = SAMPLE.replace("Build Your Dream Workshop", "  ");
    let err = parse_generated_content(&bad).unwrap_err();
    assert!(matches!(err, PinError::Generation(_)));
}

#[test]
fn rejects_malformed_json() {
    let err = parse_generated_content("{\"variations\": 3}").unwrap_err();
    assert!(err.to_string().contains("generation error"));
}

#[test]
fn decodes_data_uri_and_bare_base64() {
    assert_eq!(
        decode_image_payload("data:image/png;base64,aGVsbG8=").unwrap(),
        b"hello"
    );
    assert_eq!(decode_image_payload("aGVsbG8=").unwrap(), b"hello");
    assert_eq!(
        ImagePayload::Encoded("aGk=".to_owned()).into_bytes().unwrap(),
        b"hi"
    );
}

#[test]
fn rejects_bad_payloads() {
    assert!(decode_image_payload("data:image/png,raw").is_err());
    assert!(decode_image_payload("data:image/png;base64").is_err());
    assert!(decode_image_payload("").is_err());
    assert!(decode_image_payload("not base64!!").is_err());
}
