use serde::Serialize;

/// Longest pretty-printed payload written to the debug log.
const PRETTY_JSON_MAX_CHARS: usize = 8_000;

/// Hands a pretty-printed, length-capped JSON rendering of `value` to `log_action`.
///
/// Serialization is skipped entirely unless DEBUG is enabled.
pub(crate) fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let mut rendered = serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    if let Some((cut, _)) = rendered.char_indices().nth(PRETTY_JSON_MAX_CHARS) {
        let omitted = rendered[cut..].chars().count();
        rendered.truncate(cut);
        rendered.push_str(&format!("\n...<{omitted} more chars>"));
    }
    log_action(rendered.as_str());
}
