//! World generation configuration with defaults and JSON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse or serialize JSON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] serde_json::Error),

    /// A value is outside its legal range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which shape function decides land and water.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IslandShapeKind {
    /// Sine-modulated radial profile with a random dip
    #[default]
    Radial,
    /// Octave Perlin noise with a radial falloff
    Perlin,
}

impl std::fmt::Display for IslandShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Radial => write!(f, "radial"),
            Self::Perlin => write!(f, "perlin"),
        }
    }
}

impl std::str::FromStr for IslandShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "radial" => Ok(Self::Radial),
            "perlin" => Ok(Self::Perlin),
            other => Err(format!("unknown island shape `{}` (expected radial or perlin)", other)),
        }
    }
}

/// Parameters for one island build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Master seed; the whole build is a pure function of the config.
    pub seed: u64,
    /// Number of Voronoi sites sampled.
    pub site_count: usize,
    /// Side length of the square bounds, in rooms.
    pub extent: u32,
    /// Lloyd relaxation passes.
    pub lloyd_iterations: usize,
    /// Chance of a spring on a newly grown max-elevation room.
    pub spring_frequency: f64,
    /// Fraction of water corners that makes a polygon water.
    pub water_threshold: f64,
    /// Land/water shape function.
    pub island_shape: IslandShapeKind,
    /// Layer every materialized room is placed on.
    pub z: i64,
    /// Biome used for pixels whose color matches no biome.
    pub default_biome: String,
    /// Directory for the diagnostic map image; `None` disables the export.
    pub map_dir: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            site_count: 2000,
            extent: 400,
            lloyd_iterations: 1,
            spring_frequency: 0.01,
            water_threshold: 0.3,
            island_shape: IslandShapeKind::Radial,
            z: 0,
            default_biome: "Ocean".to_string(),
            map_dir: Some(PathBuf::from("maps")),
        }
    }
}

impl WorldConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: WorldConfig = serde_json::from_str(&text).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Write this config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self).map_err(ConfigError::ParseError)?;
        std::fs::write(path, text).map_err(ConfigError::WriteError)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_count == 0 {
            return Err(ConfigError::Invalid {
                field: "site_count",
                reason: "at least one site is required".to_string(),
            });
        }
        if self.extent == 0 {
            return Err(ConfigError::Invalid {
                field: "extent",
                reason: "bounds must have a non-zero size".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.spring_frequency) {
            return Err(ConfigError::Invalid {
                field: "spring_frequency",
                reason: format!("{} is not a probability", self.spring_frequency),
            });
        }
        if !(self.water_threshold > 0.0 && self.water_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "water_threshold",
                reason: format!("{} is outside (0, 1]", self.water_threshold),
            });
        }
        Ok(())
    }

    /// File name of the diagnostic map for this build.
    pub fn map_file_name(&self) -> String {
        format!("seed-{}-sites-{}-lloyds-{}.png", self.seed, self.site_count, self.lloyd_iterations)
    }
}
