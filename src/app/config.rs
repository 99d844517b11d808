//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// In-document recorder settings
    #[serde(default)]
    pub recorder: RecorderConfig,
    /// Host-side controller settings
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Test generation settings
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,
}

/// Recorder capture toggles and timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Capture window size and user agent at start
    pub user_info: bool,
    pub clicks: bool,
    /// Sample pointer position (off by default, it is noisy)
    pub mouse_movement: bool,
    /// Pointer sampling interval (ms)
    pub mouse_movement_interval_ms: u64,
    pub mouse_scroll: bool,
    pub keyboard_activity: bool,
    pub page_navigation: bool,
    pub form_interactions: bool,
    pub touch_events: bool,
    pub audio_video_interaction: bool,
    pub window_resize: bool,
    pub visibility_change: bool,
    /// Quiet period before an input's `complete` record (ms)
    pub input_debounce_ms: u64,
    /// Delay between a selection gesture and its assertion (ms)
    pub assertion_debounce_ms: u64,
    /// Same-selector assertions inside this window are dropped (ms)
    pub assertion_dedup_window_ms: u64,
    /// Delay before the live selection is cleared after an assertion (ms)
    pub selection_clear_delay_ms: u64,
    /// Reset the trace once it has been posted
    pub clear_after_process: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            user_info: true,
            clicks: true,
            mouse_movement: false,
            mouse_movement_interval_ms: 1000,
            mouse_scroll: true,
            keyboard_activity: true,
            page_navigation: true,
            form_interactions: true,
            touch_events: true,
            audio_video_interaction: true,
            window_resize: true,
            visibility_change: true,
            input_debounce_ms: 2000,
            assertion_debounce_ms: 500,
            assertion_dedup_window_ms: 1000,
            selection_clear_delay_ms: 500,
            clear_after_process: true,
        }
    }
}

/// Host controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Debounce for inputs typed into the host document (ms)
    pub host_input_debounce_ms: u64,
    /// How long to wait for a frame's results before falling back (ms)
    pub results_timeout_ms: u64,
    /// Clicks inside an element with this class are not recorded
    pub toolbar_class: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host_input_debounce_ms: 300,
            results_timeout_ms: 1000,
            toolbar_class: "staktrak-toolbar".to_string(),
        }
    }
}

/// Playwright generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    /// Title of the generated `test(...)` block
    pub test_name: String,
    /// Viewport used when the trace has no recorded window size
    pub fallback_viewport: (u32, u32),
    /// Gaps at or below this are not reproduced (ms)
    pub min_wait_ms: u64,
    /// Trailing settle wait (ms)
    pub final_wait_ms: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            test_name: "Recorded flow".to_string(),
            fallback_viewport: (1280, 720),
            min_wait_ms: 100,
            final_wait_ms: 1000,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let recorder = &self.recorder;
        if recorder.input_debounce_ms == 0 {
            return Err(crate::Error::Config("input_debounce_ms must be > 0".to_string()));
        }
        if recorder.mouse_movement_interval_ms == 0 {
            return Err(crate::Error::Config(
                "mouse_movement_interval_ms must be > 0".to_string(),
            ));
        }
        if recorder.assertion_dedup_window_ms > 60_000 {
            return Err(crate::Error::Config(format!(
                "assertion_dedup_window_ms must be <= 60000, got {}",
                recorder.assertion_dedup_window_ms
            )));
        }
        if self.controller.results_timeout_ms == 0 {
            return Err(crate::Error::Config("results_timeout_ms must be > 0".to_string()));
        }
        if self.controller.toolbar_class.trim().is_empty() {
            return Err(crate::Error::Config("toolbar_class must not be empty".to_string()));
        }
        let (width, height) = self.synthesizer.fallback_viewport;
        if width == 0 || height == 0 {
            return Err(crate::Error::Config(format!(
                "fallback_viewport must be non-zero, got {}x{}",
                width, height
            )));
        }
        if self.synthesizer.test_name.trim().is_empty() {
            return Err(crate::Error::Config("test_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".staktrak").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Look up a single value by dotted key, e.g. `recorder.input_debounce_ms`
    pub fn get(&self, key: &str) -> Option<String> {
        let value = toml::Value::try_from(self).ok()?;
        let found = key
            .split('.')
            .try_fold(&value, |node, part| node.get(part))?;
        Some(found.to_string())
    }

    /// Set a single value by dotted key. The value is parsed as a TOML literal,
    /// falling back to a plain string. The key must already exist.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), crate::Error> {
        let mut root =
            toml::Value::try_from(&*self).map_err(|e| crate::Error::Config(e.to_string()))?;

        let parsed = toml::from_str::<toml::Table>(&format!("value = {}", raw))
            .ok()
            .and_then(|mut table| table.remove("value"))
            .unwrap_or_else(|| toml::Value::String(raw.to_string()));

        let slot = key
            .split('.')
            .try_fold(&mut root, |node, part| node.get_mut(part))
            .ok_or_else(|| crate::Error::Config(format!("unknown key '{}'", key)))?;
        *slot = parsed;

        let updated: Config = root
            .try_into()
            .map_err(|e: toml::de::Error| crate::Error::Config(format!("{}: {}", key, e)))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.recorder.input_debounce_ms, 2000);
        assert_eq!(config.controller.host_input_debounce_ms, 300);
        assert_eq!(config.controller.results_timeout_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[recorder]"));
        assert!(toml.contains("[controller]"));
        assert!(toml.contains("[synthesizer]"));
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path();
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_recorder_defaults() {
        let recorder = RecorderConfig::default();
        assert!(!recorder.mouse_movement);
        assert_eq!(recorder.mouse_movement_interval_ms, 1000);
        assert_eq!(recorder.assertion_debounce_ms, 500);
        assert_eq!(recorder.assertion_dedup_window_ms, 1000);
        assert!(recorder.clear_after_process);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[recorder]\ninput_debounce_ms = 750\n").unwrap();
        assert_eq!(config.recorder.input_debounce_ms, 750);
        assert!(config.recorder.clicks);
        assert_eq!(config.synthesizer.final_wait_ms, 1000);
    }

    #[test]
    fn test_validate_rejects_zero_debounce() {
        let mut config = Config::default();
        config.recorder.input_debounce_ms = 0;
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_viewport() {
        let mut config = Config::default();
        config.synthesizer.fallback_viewport = (0, 720);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.recorder.mouse_movement = true;
        original.controller.toolbar_class = "recorder-bar".to_string();
        original.synthesizer.test_name = "Checkout".to_string();

        original.save(&config_path).expect("Failed to save config");
        let loaded = Config::load(&config_path).expect("Failed to load config");

        assert!(loaded.recorder.mouse_movement);
        assert_eq!(loaded.controller.toolbar_class, "recorder-bar");
        assert_eq!(loaded.synthesizer.test_name, "Checkout");
    }

    #[test]
    fn test_load_invalid_values_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[controller]\nresults_timeout_ms = 0\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load(&PathBuf::from("/tmp/nonexistent_staktrak_config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_set_dotted_key() {
        let mut config = Config::default();
        config.set("recorder.input_debounce_ms", "750").unwrap();
        config.set("synthesizer.test_name", "Checkout flow").unwrap();
        assert_eq!(config.recorder.input_debounce_ms, 750);
        assert_eq!(config.synthesizer.test_name, "Checkout flow");

        assert!(config.set("recorder.nope", "1").is_err());
        assert!(config.set("recorder.input_debounce_ms", "0").is_err());
        assert_eq!(config.recorder.input_debounce_ms, 750);
    }

    #[test]
    fn test_get_dotted_key() {
        let config = Config::default();
        assert_eq!(config.get("recorder.input_debounce_ms").as_deref(), Some("2000"));
        assert_eq!(
            config.get("controller.toolbar_class").as_deref(),
            Some("\"staktrak-toolbar\"")
        );
        assert!(config.get("recorder.missing").is_none());
    }
}
