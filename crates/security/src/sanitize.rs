use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Longest accepted search text, in characters.
pub const MAX_QUERY_CHARS: usize = 100;

static ANGLE_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<>]").expect("static regex"));
static JS_PROTOCOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i-u)javascript:").expect("static regex"));
static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i-u)on[a-z0-9_]+=").expect("static regex"));

/// Strip markup-ish fragments from `input` and trim it.
///
/// Removes `<` and `>`, any `javascript:` protocol and any `on<word>=` event
/// handler (both ASCII case-insensitive), then trims surrounding whitespace. The
/// passes repeat until the text stops changing, so a removal that splices a
/// new pattern together (`javajavascript:script:`) is caught as well and
/// `sanitize(sanitize(x)) == sanitize(x)` holds.
pub fn sanitize(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn sanitize_pass(input: &str) -> String {
    let without_brackets = ANGLE_BRACKETS.replace_all(input, "");
    let without_protocol = JS_PROTOCOL.replace_all(&without_brackets, "");
    let without_handlers = EVENT_HANDLER.replace_all(&without_protocol, "");
    without_handlers.trim().to_string()
}

/// `true` iff `input` is at most [`MAX_QUERY_CHARS`] characters. Empty text is valid.
pub fn is_valid(input: &str) -> bool {
    input.chars().count() <= MAX_QUERY_CHARS
}

/// Sanitized `input`, or an empty string when the raw text is too long.
///
/// Length is checked on the raw text, so over-length input is rejected
/// outright instead of being trimmed into range.
pub fn sanitize_and_validate(input: &str) -> String {
    if !is_valid(input) {
        log::debug!(
            "search text rejected: {} chars exceeds {MAX_QUERY_CHARS}",
            input.chars().count()
        );
        return String::new();
    }
    sanitize(input)
}

/// [`sanitize`] for untyped input; anything other than a JSON string yields `""`.
pub fn sanitize_value(input: &Value) -> String {
    match input {
        Value::String(text) => sanitize(text),
        _ => String::new(),
    }
}

/// [`is_valid`] for untyped input; non-strings are never valid.
pub fn is_valid_value(input: &Value) -> bool {
    match input {
        Value::String(text) => is_valid(text),
        _ => false,
    }
}

/// [`sanitize_and_validate`] for untyped input.
pub fn sanitize_and_validate_value(input: &Value) -> String {
    match input {
        Value::String(text) => sanitize_and_validate(text),
        other => {
            log::debug!("search text rejected: expected a string, got {other}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_html_tags() {
        assert_eq!(
            sanitize(r#"<script>alert("XSS")</script>"#),
            r#"scriptalert("XSS")/script"#
        );
        assert_eq!(sanitize("test <> string"), "test  string");
    }

    #[test]
    fn removes_javascript_protocol_in_any_case() {
        assert_eq!(sanitize("javascript:alert(1)"), "alert(1)");
        for raw in ["JavaScript:alert(1)", "JAVASCRIPT:alert(1)", "JaVaScRiPt:alert(1)"] {
            assert!(!sanitize(raw).to_lowercase().contains("javascript:"), "{raw}");
        }
    }

    #[test]
    fn case_folding_is_ascii_only() {
        // U+017F folds to `s` and U+212A to `k` under Unicode rules.
        assert_eq!(sanitize("java\u{17F}cript:x"), "java\u{17F}cript:x");
        assert_eq!(sanitize("on\u{212A}ey=x"), "on\u{212A}ey=x");
        assert_eq!(sanitize("JAVASCRIPT:x"), "x");
        assert_eq!(sanitize("ONKEY=x"), "x");
    }

    #[test]
    fn removes_event_handlers() {
        assert_eq!(sanitize("test onclick=alert(1)"), "test alert(1)");
        assert_eq!(sanitize("<img src=x onerror=alert(1)>"), "img src=x alert(1)");
        assert_eq!(sanitize("ONLOAD=boom"), "boom");
    }

    #[test]
    fn keeps_ordinary_text() {
        for raw in [
            "John Doe",
            "john@example.com",
            "Romaguera-Crona",
            "New York",
            "123 Main St",
            "José García",
            "123456",
        ] {
            assert_eq!(sanitize_and_validate(raw), raw);
        }
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(sanitize("  test  "), "test");
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("x <"), "x");
    }

    #[test]
    fn spliced_patterns_are_removed_too() {
        assert_eq!(sanitize("javajavascript:script:alert(1)"), "alert(1)");
        assert_eq!(sanitize("oonx=nclick=go"), "go");
        assert_eq!(sanitize("java<script:x"), "x");
        assert_eq!(sanitize("javaonx=script:y"), "y");
    }

    #[test]
    fn length_boundary() {
        assert!(is_valid(""));
        assert!(is_valid(&"a".repeat(100)));
        assert!(!is_valid(&"a".repeat(101)));
        assert_eq!(sanitize_and_validate(&"a".repeat(101)), "");
        assert_eq!(sanitize_and_validate(&"a".repeat(100)), "a".repeat(100));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(is_valid(&"é".repeat(100)));
        assert!(!is_valid(&"é".repeat(101)));
    }

    #[test]
    fn raw_length_is_checked_before_trimming() {
        let padded = format!("  {}  ", "a".repeat(98));
        assert_eq!(padded.chars().count(), 102);
        assert_eq!(sanitize_and_validate(&padded), "");
    }

    #[test]
    fn sanitize_and_validate_strips_markup() {
        assert_eq!(
            sanitize_and_validate("<script>John Doe</script>"),
            "scriptJohn Doe/script"
        );
    }

    #[test]
    fn untyped_input_is_total() {
        assert_eq!(sanitize_value(&Value::Null), "");
        assert_eq!(sanitize_value(&json!(123)), "");
        assert_eq!(sanitize_value(&json!({})), "");
        assert_eq!(sanitize_value(&json!(" <b>bold</b> ")), "bbold/b");

        assert!(!is_valid_value(&Value::Null));
        assert!(!is_valid_value(&json!(123)));
        assert!(!is_valid_value(&json!({})));
        assert!(is_valid_value(&json!("")));

        assert_eq!(sanitize_and_validate_value(&Value::Null), "");
        assert_eq!(sanitize_and_validate_value(&json!("test@example.com")), "test@example.com");
    }
}
