//! Render configuration.

use std::path::Path;

use pixform_core::Channel;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Environment variable overriding the default `rand()` seed.
pub const SEED_ENV: &str = "PIXFORM_SEED";

/// Formulas and switches for one render.
///
/// Every field has a default, so a JSON file only needs the keys it
/// changes. The default formulas reproduce the source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub red: String,
    pub green: String,
    pub blue: String,
    pub gray: String,
    pub alpha: String,
    /// Constant-fold formulas before the pixel loop.
    pub optimize: bool,
    /// Seed for `rand()`.
    pub seed: u64,
    /// Render rows on the rayon thread pool.
    pub parallel: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            red: "red(x,y)".to_string(),
            green: "green(x,y)".to_string(),
            blue: "blue(x,y)".to_string(),
            gray: "gray(x,y)".to_string(),
            alpha: "alpha(x,y)".to_string(),
            optimize: true,
            seed: std::env::var(SEED_ENV)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            parallel: true,
        }
    }
}

impl RenderConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn formula(&self, channel: Channel) -> &str {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
            Channel::Gray => &self.gray,
            Channel::Alpha => &self.alpha,
        }
    }

    pub fn set_formula(&mut self, channel: Channel, text: impl Into<String>) {
        let slot = match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
            Channel::Gray => &mut self.gray,
            Channel::Alpha => &mut self.alpha,
        };
        *slot = text.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_identity() {
        let config = RenderConfig::default();
        assert_eq!(config.formula(Channel::Red), "red(x,y)");
        assert_eq!(config.formula(Channel::Alpha), "alpha(x,y)");
        assert!(config.optimize);
        assert!(config.parallel);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RenderConfig::from_json(r#"{ "red": "255-red(x,y)", "seed": 9 }"#)
            .expect("valid config");
        assert_eq!(config.red, "255-red(x,y)");
        assert_eq!(config.green, "green(x,y)");
        assert_eq!(config.seed, 9);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = RenderConfig::from_json("{ \"optimize\": 3 }").unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = RenderConfig::default();
        config.set_formula(Channel::Gray, "x*y");
        config.parallel = false;
        let back = RenderConfig::from_json(&config.to_json().expect("serialize")).expect("parse");
        assert_eq!(back, config);
    }
}
