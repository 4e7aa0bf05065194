use recurrist::utils::richtext::*;

#[test]
fn test_extract_media_urls() {
    let content = r#"<p>a</p><img src="https://x/1.png"><img src="https://x/2.png" alt="b">"#;
    assert_eq!(extract_media_urls(content), vec!["https://x/1.png", "https://x/2.png"]);
}

#[test]
fn test_extract_media_urls_dedupes() {
    let content = r#"<img src="https://x/1.png"><img src="https://x/1.png">"#;
    assert_eq!(extract_media_urls(content), vec!["https://x/1.png"]);
}

#[test]
fn test_extract_media_urls_ignores_unterminated_attribute() {
    assert!(extract_media_urls(r#"<img src="https://x/1.png"#).is_empty());
    assert!(extract_media_urls("no media here").is_empty());
}

#[test]
fn test_references_media() {
    let content = r#"<img src="https://x/1.png">"#;
    assert!(references_media(content, "https://x/1.png"));
    assert!(!references_media(content, "https://x/2.png"));
}

#[test]
fn test_strip_media_reference_removes_whole_tag() {
    let content = r#"<p>before</p><img src="https://x/1.png" alt="chart"><p>after</p>"#;
    assert_eq!(
        strip_media_reference(content, "https://x/1.png"),
        "<p>before</p><p>after</p>"
    );
}

#[test]
fn test_strip_media_reference_keeps_other_media() {
    let content = r#"<img src="https://x/1.png"><img src="https://x/2.png">"#;
    assert_eq!(
        strip_media_reference(content, "https://x/1.png"),
        r#"<img src="https://x/2.png">"#
    );
}

#[test]
fn test_strip_media_reference_handles_repeats() {
    let content = r#"<img src="https://x/1.png"><p>mid</p><img src="https://x/1.png">"#;
    assert_eq!(strip_media_reference(content, "https://x/1.png"), "<p>mid</p>");
}

#[test]
fn test_strip_media_reference_without_tag_context() {
    // A bare reference outside any tag loses just the attribute text.
    let content = r#"src="https://x/1.png" trailing"#;
    assert_eq!(strip_media_reference(content, "https://x/1.png"), " trailing");
}
