use log::Level;
use serde_json::{json, Value};
use time::OffsetDateTime;

/// Write one diagnostic event through the `log` facade.
///
/// `code` follows the catalogue in [`crate::errors`], `module` becomes the
/// log target, and `data` is appended as a compact JSON object so lines stay
/// grep-able.
pub fn log_event(
    level: Level,
    code: Option<&str>,
    module: &str,
    message: &str,
    explain: Option<&str>,
    data: Option<Value>,
) {
    if !log::log_enabled!(target: module, level) {
        return;
    }
    log::log!(target: module, level, "{}", render_event(code, message, explain, data));
}

fn render_event(code: Option<&str>, message: &str, explain: Option<&str>, data: Option<Value>) -> String {
    let mut record = json!({
        "ts": OffsetDateTime::now_utc().unix_timestamp(),
    });
    if let Some(code) = code {
        record["code"] = json!(code);
    }
    if let Some(explain) = explain {
        record["explain"] = json!(explain);
    }
    if let Some(data) = data {
        record["data"] = data;
    }
    format!("{message} {record}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_event_carries_code_and_data() {
        let line = render_event(
            Some("AI-0201"),
            "AI provider invocation failed",
            Some("Attempting fallback"),
            Some(json!({"provider": "gemini"})),
        );
        let payload: Value =
            serde_json::from_str(line.trim_start_matches("AI provider invocation failed ")).unwrap();
        assert_eq!(payload["data"]["provider"], "gemini");
        assert!(line.contains(r#""code":"AI-0201""#));
        assert!(line.contains(r#""data":{"provider":"gemini"}"#));
        assert!(line.contains(r#""explain":"Attempting fallback""#));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let line = render_event(None, "ready", None, None);
        assert!(line.starts_with("ready {\"ts\":"));
        assert!(!line.contains("code"));
    }
}
