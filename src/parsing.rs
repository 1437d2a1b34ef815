//! Minimal, no-dependency JSON parsing helpers.
//!
//! These extractors cover builds where the `serde` feature is disabled and
//! only the raw values are needed. For full request types, use the
//! [`messages`](crate::messages) module with `serde-json-core`.

use crate::sensing::PanelCommand;

/// Parse a panel command from JSON like `{"command": "raise"}`.
///
/// Returns `None` if the JSON is malformed or the verb is unrecognised.
pub fn parse_command_json(json: &str) -> Option<PanelCommand> {
    // Look for the "command" key followed by a quoted verb
    if !json.contains("\"command\"") {
        return None;
    }

    if json.contains("\"raise\"") {
        Some(PanelCommand::Raise)
    } else if json.contains("\"lower\"") {
        Some(PanelCommand::Lower)
    } else if json.contains("\"abort\"") {
        Some(PanelCommand::Abort)
    } else if json.contains("\"clear\"") {
        Some(PanelCommand::Clear)
    } else {
        None
    }
}

/// Parse a `(name, value)` pair from JSON like
/// `{"name": "open_max_ms", "value": "9000"}`.
///
/// Both fields must be quoted strings. Returns borrowed slices into the
/// input; validation of the pair itself happens in
/// [`BridgeConfig::set_param`](crate::config::BridgeConfig::set_param).
pub fn parse_param_json(json: &str) -> Option<(&str, &str)> {
    let name = extract_string_field(json, "name")?;
    let value = extract_string_field(json, "value")?;
    Some((name, value))
}

/// Extract the quoted value of `"key": "..."` from a flat JSON object.
fn extract_string_field<'a>(json: &'a str, key: &str) -> Option<&'a str> {
    let mut search = 0;
    loop {
        let rel = json[search..].find('"')?;
        let key_start = search + rel + 1;
        let key_end = key_start + json[key_start..].find('"')?;
        let candidate = &json[key_start..key_end];
        search = key_end + 1;

        if candidate != key {
            continue;
        }

        let rest = json[search..].trim_start();
        if !rest.starts_with(':') {
            continue;
        }
        let rest = rest[1..].trim_start();
        if !rest.starts_with('"') {
            return None;
        }
        let value_start = json.len() - rest.len() + 1;
        let value_end = value_start + json[value_start..].find('"')?;
        return Some(&json[value_start..value_end]);
    }
}
