use crate::detector::DetectorConfig;
use crate::render::RenderConfig;
use crate::sampler::SamplerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_OUTPUT_FILENAME: &str = "chinified.png";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub render: RenderConfig,
    pub detector: DetectorConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_OUTPUT_FILENAME.to_string(),
        }
    }
}

/// Read config from `path`, falling back to defaults when the file doesn't
/// exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn to_toml(cfg: &Config) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RendererKind;

    #[test]
    fn test_empty_is_default() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.output.filename, "chinified.png");
        assert_eq!(cfg.sampler.stride, 10);
        assert_eq!(cfg.detector.timeout_ms, 5000);
    }

    #[test]
    fn test_partial_sections() {
        let cfg: Config = toml::from_str(
            r#"
            [sampler]
            brighten = 15
            top_fraction = 0.4
            brightness_range = [40, 230]

            [render]
            kind = "asset"
            align_to_face = false

            [detector]
            timeout_ms = 250
            min_detection_confidence = 0.8
            "#,
        )
        .unwrap();

        assert_eq!(cfg.sampler.brighten, 15);
        assert_eq!(cfg.sampler.brightness_range, Some((40, 230)));
        assert_eq!(cfg.sampler.stride, 10);
        assert_eq!(cfg.render.kind, RendererKind::Asset);
        assert!(!cfg.render.align_to_face);
        assert_eq!(cfg.render.stroke_width, 3);
        assert_eq!(cfg.detector.timeout_ms, 250);
        assert_eq!(cfg.detector.options.min_detection_confidence, 0.8);
        assert_eq!(cfg.detector.options.max_faces, 1);
    }

    #[test]
    fn test_default_serializes() {
        let raw = to_toml(&Config::default()).unwrap();
        let back: Config = toml::from_str(&raw).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let cfg = load_config(Path::new("/nonexistent/chinify.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_bad_file_errors() {
        let path = std::env::temp_dir().join(format!("chinify-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[sampler]\nstride = \"lots\"\n").unwrap();
        let res = load_config(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(res.is_err());
    }
}
