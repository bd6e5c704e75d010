//! Lenient parsing of inbound client messages.
//!
//! Clients send one JSON object per line. Only `{"type": "config", ...}`
//! means anything to the daemon; every other shape is ignored without a
//! response, so a buggy client degrades its own stream but never kills
//! the session.

use lockin_core::TrackerConfig;
use serde::Serialize;
use serde_json::Value;

/// Partial configuration extracted from one config message.
///
/// Coercion is per field: a field with the wrong JSON type drops
/// silently and the rest of the message still applies. Unknown keys
/// never reach this struct at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conf_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_talking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_objects: Option<bool>,
}

impl ConfigUpdate {
    /// Extracts known fields from a decoded config message body.
    ///
    /// `as_f64` accepts integers too, mirroring how loosely clients
    /// tend to build these messages.
    pub fn from_value(value: &Value) -> Self {
        Self {
            h_min: value.get("h_min").and_then(Value::as_f64),
            h_max: value.get("h_max").and_then(Value::as_f64),
            v_min: value.get("v_min").and_then(Value::as_f64),
            v_max: value.get("v_max").and_then(Value::as_f64),
            ear_threshold: value.get("ear_threshold").and_then(Value::as_f64),
            conf_threshold: value.get("conf_threshold").and_then(Value::as_f64),
            audio_threshold: value.get("audio_threshold").and_then(Value::as_f64),
            include_talking: value.get("include_talking").and_then(Value::as_bool),
            include_objects: value.get("include_objects").and_then(Value::as_bool),
        }
    }

    /// Overwrites present fields onto a config. Last write wins; absent
    /// fields leave the current value untouched.
    pub fn apply_to(&self, cfg: &mut TrackerConfig) {
        if let Some(v) = self.h_min {
            cfg.h_min = v;
        }
        if let Some(v) = self.h_max {
            cfg.h_max = v;
        }
        if let Some(v) = self.v_min {
            cfg.v_min = v;
        }
        if let Some(v) = self.v_max {
            cfg.v_max = v;
        }
        if let Some(v) = self.ear_threshold {
            cfg.ear_threshold = v;
        }
        if let Some(v) = self.conf_threshold {
            cfg.conf_threshold = v;
        }
        if let Some(v) = self.audio_threshold {
            cfg.audio_threshold = v;
        }
        if let Some(v) = self.include_talking {
            cfg.include_talking = v;
        }
        if let Some(v) = self.include_objects {
            cfg.include_objects = v;
        }
    }

    /// Names of the fields this update carries, for logging.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.h_min.is_some() {
            names.push("h_min");
        }
        if self.h_max.is_some() {
            names.push("h_max");
        }
        if self.v_min.is_some() {
            names.push("v_min");
        }
        if self.v_max.is_some() {
            names.push("v_max");
        }
        if self.ear_threshold.is_some() {
            names.push("ear_threshold");
        }
        if self.conf_threshold.is_some() {
            names.push("conf_threshold");
        }
        if self.audio_threshold.is_some() {
            names.push("audio_threshold");
        }
        if self.include_talking.is_some() {
            names.push("include_talking");
        }
        if self.include_objects.is_some() {
            names.push("include_objects");
        }
        names
    }

    /// True when no usable field survived extraction.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Decodes one inbound line.
///
/// Returns `None` for anything that should be ignored: invalid JSON,
/// non-object values, a missing or different `type`, or a config body
/// whose fields all failed coercion. Applying the result is always safe.
pub fn parse_client_line(line: &str) -> Option<ConfigUpdate> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    if value.get("type").and_then(Value::as_str) != Some("config") {
        return None;
    }
    let update = ConfigUpdate::from_value(&value);
    if update.is_empty() {
        None
    } else {
        Some(update)
    }
}
