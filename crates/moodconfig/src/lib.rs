use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level `fluidpaper` configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackgroundConfig {
    pub version: u32,
    /// Artwork shown whenever no explicit artwork is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default)]
    pub mood: MoodSettings,
    #[serde(default)]
    pub loader: LoaderSettings,
    #[serde(default)]
    pub window: WindowSettings,
}

/// Animation parameters. Defaults match the renderer's built-in mood.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoodSettings {
    pub flow: f32,
    pub volume: f32,
    pub zoom: f32,
    pub noise: f32,
}

impl Default for MoodSettings {
    fn default() -> Self {
        Self {
            flow: 3.0,
            volume: 0.6,
            zoom: 1.0,
            noise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderSettings {
    /// Upper bound for one artwork download.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: String::from("fluidpaper"),
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            version: 1,
            fallback: None,
            mood: MoodSettings::default(),
            loader: LoaderSettings::default(),
            window: WindowSettings::default(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("duration must be non-negative"))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

impl BackgroundConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: BackgroundConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        self.mood.validate()?;

        if self.loader.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "loader.timeout must be greater than zero".into(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }

        if let Some(fallback) = &self.fallback {
            if fallback.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "fallback may not be empty; omit it instead".into(),
                ));
            }
        }

        Ok(())
    }
}

impl MoodSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("flow", self.flow),
            ("volume", self.volume),
            ("zoom", self.zoom),
            ("noise", self.noise),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "mood.{name} must be a finite number"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.zoom) {
            return Err(ConfigError::Invalid(format!(
                "mood.zoom must be within [0, 1], got {}",
                self.zoom
            )));
        }
        if self.volume < 0.0 {
            return Err(ConfigError::Invalid("mood.volume must be >= 0".into()));
        }
        if self.noise < 0.0 {
            return Err(ConfigError::Invalid("mood.noise must be >= 0".into()));
        }

        Ok(())
    }
}

/// Parses a `WIDTHxHEIGHT` size such as `1920x1080`.
pub fn parse_size(raw: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::Invalid(format!("invalid size '{raw}'; expected WIDTHxHEIGHT"));
    let (width, height) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
