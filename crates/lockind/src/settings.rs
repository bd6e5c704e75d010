//! Daemon settings resolved from the environment.
//!
//! Every knob has a `LOCKIN_*` environment variable and a built-in
//! default. An unparseable value falls back to the default with a
//! warning rather than aborting startup.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Default TCP port for the stream server (`LOCKIN_VISION_PORT`).
pub const DEFAULT_PORT: u16 = 8765;

/// Default camera index opened per connection (`LOCKIN_CAMERA_ID`).
pub const DEFAULT_CAMERA_ID: u32 = 0;

/// Default preview rate cap in frames per second (`LOCKIN_PREVIEW_FPS`).
pub const DEFAULT_PREVIEW_FPS: f64 = 5.0;

/// Default number of payloads between throughput log lines
/// (`LOCKIN_VISION_LOG_EVERY`).
pub const DEFAULT_LOG_EVERY: u64 = 30;

/// Runtime settings for the daemon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaemonSettings {
    /// TCP port the stream server listens on.
    pub port: u16,

    /// Camera index handed to the source factory for every connection.
    pub camera_id: u32,

    /// Preview rate cap in frames per second. Zero or negative disables
    /// previews entirely.
    pub preview_fps: f64,

    /// Number of sent payloads between throughput log lines. Zero
    /// disables throughput logging.
    pub log_every: u64,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            camera_id: DEFAULT_CAMERA_ID,
            preview_fps: DEFAULT_PREVIEW_FPS,
            log_every: DEFAULT_LOG_EVERY,
        }
    }
}

impl DaemonSettings {
    /// Resolves settings from `LOCKIN_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("LOCKIN_VISION_PORT", DEFAULT_PORT),
            camera_id: env_parsed("LOCKIN_CAMERA_ID", DEFAULT_CAMERA_ID),
            preview_fps: env_parsed("LOCKIN_PREVIEW_FPS", DEFAULT_PREVIEW_FPS),
            log_every: env_parsed("LOCKIN_VISION_LOG_EVERY", DEFAULT_LOG_EVERY),
        }
    }

    /// Minimum spacing between preview frames, or `None` when previews
    /// are disabled.
    ///
    /// A positive rate below 0.1 fps is clamped to one preview every
    /// ten seconds.
    pub fn preview_interval(&self) -> Option<Duration> {
        (self.preview_fps > 0.0).then(|| Duration::from_secs_f64(1.0 / self.preview_fps.max(0.1)))
    }
}

/// Reads and parses one environment variable, falling back to the
/// default when unset or unparseable.
fn env_parsed<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    var = name,
                    value = %raw,
                    default = %default,
                    "Ignoring unparseable environment variable"
                );
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DaemonSettings::default();
        assert_eq!(settings.port, 8765);
        assert_eq!(settings.camera_id, 0);
        assert_eq!(settings.preview_fps, 5.0);
        assert_eq!(settings.log_every, 30);
    }

    #[test]
    fn test_preview_interval() {
        let mut settings = DaemonSettings::default();
        assert_eq!(settings.preview_interval(), Some(Duration::from_millis(200)));

        settings.preview_fps = 0.0;
        assert_eq!(settings.preview_interval(), None);

        settings.preview_fps = -1.0;
        assert_eq!(settings.preview_interval(), None);

        // Rates under the clamp floor cap out at ten seconds.
        settings.preview_fps = 0.01;
        assert_eq!(settings.preview_interval(), Some(Duration::from_secs(10)));
    }

    // Environment variables are process-global, so all env cases run in
    // one test to avoid clobbering between parallel tests.
    #[test]
    fn test_from_env_overrides_and_fallback() {
        env::set_var("LOCKIN_VISION_PORT", "9001");
        env::set_var("LOCKIN_CAMERA_ID", "2");
        env::set_var("LOCKIN_PREVIEW_FPS", "not-a-number");
        env::set_var("LOCKIN_VISION_LOG_EVERY", "10");

        let settings = DaemonSettings::from_env();
        assert_eq!(settings.port, 9001);
        assert_eq!(settings.camera_id, 2);
        assert_eq!(settings.preview_fps, DEFAULT_PREVIEW_FPS);
        assert_eq!(settings.log_every, 10);

        env::remove_var("LOCKIN_VISION_PORT");
        env::remove_var("LOCKIN_CAMERA_ID");
        env::remove_var("LOCKIN_PREVIEW_FPS");
        env::remove_var("LOCKIN_VISION_LOG_EVERY");

        assert_eq!(DaemonSettings::from_env(), DaemonSettings::default());
    }
}
