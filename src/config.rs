use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analyser: AnalyserConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyserConfig {
    #[serde(default = "default_analyser_size")]
    pub size: usize,
    /// Seconds per 128-sample block; derived from the sample rate when absent.
    #[serde(default)]
    pub block_time: Option<f32>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
        }
    }
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            size: default_analyser_size(),
            block_time: None,
        }
    }
}

pub fn default_width() -> u32 { 1280 }
pub fn default_height() -> u32 { 720 }
pub fn default_fps() -> u32 { 30 }
pub fn default_crf() -> u32 { 18 }
pub fn default_codec() -> String { "libx264".into() }
pub fn default_analyser_size() -> usize { 256 }

/// Explicit path first, then `./pitchwheel.toml`, then the per-user config.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("pitchwheel.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("pitchwheel").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("pitchwheel").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Option<Config> {
    match toml::from_str(content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.output.width, 1280);
        assert_eq!(config.output.fps, 30);
        assert_eq!(config.analyser.size, 256);
        assert_eq!(config.analyser.block_time, None);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = parse_config(
            r#"
            [output]
            width = 800
            codec = "libx265"

            [analyser]
            size = 512
            block_time = 0.002667
            "#,
        )
        .unwrap();
        assert_eq!(config.output.width, 800);
        assert_eq!(config.output.height, 720);
        assert_eq!(config.output.codec, "libx265");
        assert_eq!(config.analyser.size, 512);
        assert_eq!(config.analyser.block_time, Some(0.002667));
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(parse_config("[output]\nwidth = \"wide\"").is_none());
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/custom.toml");
        assert_eq!(find_config(Some(path)), Some(path.to_path_buf()));
    }
}
