use crate::cli::EngineArgs;
use crate::error::{CliError, Result};
use fieldlines::engine::config::{EngineConfig, EngineConfigBuilder};
use nalgebra::Vector2;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialTraceConfig {
    distance_epsilon: Option<f64>,
    stall_epsilon: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialInteractionConfig {
    scroll_step: Option<f64>,
    magnitude_floor: Option<f64>,
    duplicate_offset: Option<[f64; 2]>,
    drag_throttle_ms: Option<u64>,
}

/// Engine configuration as read from a TOML file; every value is optional
/// and falls back to the engine default.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialEngineConfig {
    trace: Option<PartialTraceConfig>,
    interaction: Option<PartialInteractionConfig>,
}

impl PartialEngineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the file named by `args`, if any, and applies its `-S` overrides.
    pub fn resolve(args: &EngineArgs) -> Result<EngineConfig> {
        let partial = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        partial.merge_with_cli(&args.set_values)
    }

    pub fn merge_with_cli(mut self, set_values: &[String]) -> Result<EngineConfig> {
        self.apply_set_values(set_values)?;

        let trace = self.trace.unwrap_or_default();
        let interaction = self.interaction.unwrap_or_default();

        let mut builder = EngineConfigBuilder::new();
        if let Some(v) = trace.distance_epsilon {
            builder = builder.distance_epsilon(v);
        }
        if let Some(v) = trace.stall_epsilon {
            builder = builder.stall_epsilon(v);
        }
        if let Some(v) = interaction.scroll_step {
            builder = builder.scroll_step(v);
        }
        if let Some(v) = interaction.magnitude_floor {
            builder = builder.magnitude_floor(v);
        }
        if let Some([dx, dy]) = interaction.duplicate_offset {
            builder = builder.duplicate_offset(Vector2::new(dx, dy));
        }
        if let Some(ms) = interaction.drag_throttle_ms {
            builder = builder.drag_throttle(Duration::from_millis(ms));
        }

        builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value_str = value_str.trim();

            match key {
                "trace.distance-epsilon" => {
                    self.trace
                        .get_or_insert_with(Default::default)
                        .distance_epsilon = Some(parse_value(key, value_str)?);
                }
                "trace.stall-epsilon" => {
                    self.trace.get_or_insert_with(Default::default).stall_epsilon =
                        Some(parse_value(key, value_str)?);
                }
                "interaction.scroll-step" => {
                    self.interaction
                        .get_or_insert_with(Default::default)
                        .scroll_step = Some(parse_value(key, value_str)?);
                }
                "interaction.magnitude-floor" => {
                    self.interaction
                        .get_or_insert_with(Default::default)
                        .magnitude_floor = Some(parse_value(key, value_str)?);
                }
                "interaction.drag-throttle-ms" => {
                    self.interaction
                        .get_or_insert_with(Default::default)
                        .drag_throttle_ms = Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value_str
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldlines::engine::config::InteractionConfig;
    use once_cell::sync::Lazy;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn args(config: Option<PathBuf>, set_values: &[&str]) -> EngineArgs {
        EngineArgs {
            config,
            set_values: set_values.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn no_file_and_no_overrides_gives_defaults() {
        let config = PartialEngineConfig::resolve(&args(None, &[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn file_values_are_merged_with_defaults() {
        let path = write_config_file(
            "engine.toml",
            r#"
            [trace]
            stall-epsilon = 1e-8

            [interaction]
            scroll-step = 0.25
            duplicate-offset = [5.0, -5.0]
            drag-throttle-ms = 33
            "#,
        );
        let config = PartialEngineConfig::resolve(&args(Some(path), &[])).unwrap();

        assert_eq!(config.trace.stall_epsilon, 1e-8);
        assert_eq!(config.interaction.scroll_step, 0.25);
        assert_eq!(config.interaction.duplicate_offset, Vector2::new(5.0, -5.0));
        assert_eq!(config.interaction.drag_throttle, Duration::from_millis(33));
        assert_eq!(
            config.interaction.magnitude_floor,
            InteractionConfig::default().magnitude_floor
        );
    }

    #[test]
    fn set_values_override_file_values() {
        let path = write_config_file(
            "override.toml",
            "[interaction]\nscroll-step = 0.25\n",
        );
        let config = PartialEngineConfig::resolve(&args(
            Some(path),
            &["interaction.scroll-step=0.5", "trace.distance-epsilon = 1e-6"],
        ))
        .unwrap();

        assert_eq!(config.interaction.scroll_step, 0.5);
        assert_eq!(config.trace.distance_epsilon, 1e-6);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let path = write_config_file("unknown.toml", "[trace]\nmax-steps = 10\n");
        let result = PartialEngineConfig::resolve(&args(Some(path), &[]));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in [
            "interaction.scroll-step",
            "interaction.scroll-step=fast",
            "render.colors=red",
            "interaction.drag-throttle-ms=-1",
        ] {
            let result = PartialEngineConfig::default().merge_with_cli(&[bad.to_string()]);
            assert!(matches!(result, Err(CliError::Config(_))), "{bad}");
        }
    }

    #[test]
    fn invalid_values_fail_engine_validation() {
        let result = PartialEngineConfig::default()
            .merge_with_cli(&["interaction.magnitude-floor=0".to_string()]);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("magnitude_floor")));
    }
}
