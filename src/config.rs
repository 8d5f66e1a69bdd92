use crate::catalog::Catalog;
use crate::display::{Resolution, Rgb, DEFAULT_SCALE, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::error::{Error, Result};
use crate::scheduler::DEFAULT_FRAME_RATE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// largest surface cell count per CHIP-8 pixel, each way
pub const MAX_SCALE: usize = 64;

/// longest a terminal key may be held without repeating, in milliseconds
pub const MAX_KEY_HOLD_MS: u64 = 10_000;

/// frame and refresh rates, in Hz
const RATE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=1000.0;

/// settings read from a JSON file; anything missing gets its default
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// logical frames per second the VM is driven at
    pub frame_rate: f64,
    /// how often the host loop runs and redraws
    pub refresh_rate: f64,
    /// surface cells per CHIP-8 pixel, each way
    pub scale: usize,
    /// `#rrggbb`
    pub foreground: String,
    /// where program locators are resolved from
    pub rom_dir: String,
    /// JSON catalog; the built-in games when unset
    pub catalog: Option<String>,
    /// terminals don't report key releases, so a key counts as released
    /// once it hasn't repeated for this long
    pub key_hold_ms: u64,
    pub sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            frame_rate: DEFAULT_FRAME_RATE,
            refresh_rate: DEFAULT_FRAME_RATE,
            scale: DEFAULT_SCALE,
            foreground: "#26cdff".to_string(),
            rom_dir: "roms".to_string(),
            catalog: None,
            key_hold_ms: 150,
            sound: false,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Config::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [("frame_rate", self.frame_rate), ("refresh_rate", self.refresh_rate)] {
            if !RATE_RANGE.contains(&rate) {
                return Err(Error::Config(format!(
                    "{} must be between {} and {} Hz, got {}",
                    name,
                    RATE_RANGE.start(),
                    RATE_RANGE.end(),
                    rate
                )));
            }
        }
        if !(1..=MAX_SCALE).contains(&self.scale) {
            return Err(Error::Config(format!(
                "scale must be between 1 and {}, got {}",
                MAX_SCALE, self.scale
            )));
        }
        if self.key_hold_ms > MAX_KEY_HOLD_MS {
            return Err(Error::Config(format!(
                "key_hold_ms must be at most {}, got {}",
                MAX_KEY_HOLD_MS, self.key_hold_ms
            )));
        }
        self.foreground()?;
        Ok(())
    }

    pub fn foreground(&self) -> Result<Rgb> {
        self.foreground.parse()
    }

    pub fn resolution(&self) -> Resolution {
        Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT, self.scale)
    }

    pub fn rom_dir(&self) -> PathBuf {
        PathBuf::from(&self.rom_dir)
    }

    pub fn key_hold(&self) -> Duration {
        Duration::from_millis(self.key_hold_ms)
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_rate)
    }

    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::load(Path::new(path)),
            None => Ok(Catalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() -> Result<()> {
        let c = Config::from_json("{}")?;
        assert_eq!(c, Config::default());
        assert_eq!(c.resolution(), Resolution(64, 32, 8));
        assert_eq!(c.foreground()?, Rgb(0x26, 0xcd, 0xff));
        assert_eq!(c.catalog()?.len(), 4);
        Ok(())
    }

    #[test]
    fn test_partial_override() -> Result<()> {
        let c = Config::from_json(r#"{"refresh_rate": 144.0, "scale": 4, "key_hold_ms": 90}"#)?;
        assert_eq!(c.frame_rate, 60.0);
        assert_eq!(c.scale, 4);
        assert_eq!(c.key_hold(), Duration::from_millis(90));
        assert!(c.refresh_period() < Duration::from_millis(7));
        Ok(())
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_json(r#"{"frame_rate": 0}"#).is_err());
        assert!(Config::from_json(r#"{"refresh_rate": -30}"#).is_err());
        assert!(Config::from_json(r#"{"scale": 0}"#).is_err());
        assert!(Config::from_json(r#"{"foreground": "blue"}"#).is_err());
        assert!(Config::from_json(r#"{"scale": "big"}"#).is_err());
        assert!(Config::from_json(r#"{"frame_rate": 1e-300}"#).is_err());
        assert!(Config::from_json(r#"{"key_hold_ms": 18446744073709551615}"#).is_err());
    }

    #[test]
    fn test_rejects_huge_scale() {
        let r = Config::from_json(r#"{"scale": 2147483648}"#);
        assert!(matches!(r, Err(Error::Config(_))));
        assert!(Config::from_json(r#"{"scale": 65}"#).is_err());

        let c = Config::from_json(r#"{"scale": 64}"#).unwrap();
        assert_eq!(c.resolution().surface_width(), 4096);
    }

    #[test]
    fn test_refresh_rate_bounded() {
        assert!(matches!(
            Config::from_json(r#"{"refresh_rate": 1e-300}"#),
            Err(Error::Config(_))
        ));
        assert!(Config::from_json(r#"{"refresh_rate": 1001}"#).is_err());

        let slowest = Config::from_json(r#"{"refresh_rate": 1}"#).unwrap();
        assert_eq!(slowest.refresh_period(), Duration::from_secs(1));
        let fastest = Config::from_json(r#"{"refresh_rate": 1000}"#).unwrap();
        assert_eq!(fastest.refresh_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_missing_catalog_file() {
        let c = Config {
            catalog: Some("/nonexistent/catalog.json".into()),
            ..Config::default()
        };
        assert!(matches!(c.catalog(), Err(Error::Io(_))));
    }
}
