use crate::enums::{InputFormat, RawCast};

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// gzip level h5py uses when none is given.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 4;
/// Gaussian kernels are cut off at this many standard deviations.
pub const DEFAULT_TRUNCATE: f64 = 4.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(
        "Unsupported file format for {0}. Supported formats: {supported}",
        supported = InputFormat::SUPPORTED
    )]
    UnsupportedFormat(PathBuf),

    #[error("`shape` is required for raw input {0}")]
    MissingShape(PathBuf),

    #[error("`shape` must list exactly 3 positive extents (z, y, x), got {0:?}")]
    InvalidShape(Vec<usize>),

    #[error("`raw_internal_path` is required for HDF5 input {0}")]
    MissingInternalPath(PathBuf),

    #[error("`{name}` must be a positive finite number, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("`compression_level` must be between 0 and 9, got {0}")]
    InvalidCompressionLevel(u8),
}

/// Where the voxels come from, resolved from the input extension.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeSource {
    /// Flat native-endian u16 file with an externally known (z, y, x) shape.
    Raw { shape: (usize, usize, usize) },
    /// A dataset inside an HDF5 file.
    Hdf5 { internal_path: String },
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub file_path: PathBuf,
    pub result_path: PathBuf,
    pub source: VolumeSource,
    /// μm
    pub fiber_diameter: f64,
    /// μm
    pub voxel_size: f64,
    pub raw_cast: RawCast,
    pub compression_level: u8,
    pub truncate: f64,
}

#[derive(Deserialize)]
struct RawConfig {
    file_path: PathBuf,
    result_path: PathBuf,
    #[serde(default)]
    shape: Option<Vec<usize>>,
    #[serde(default)]
    raw_internal_path: Option<String>,
    fiber_diameter: f64,
    voxel_size: f64,
    #[serde(default)]
    raw_cast: RawCast,
    #[serde(default = "default_compression_level")]
    compression_level: u8,
    #[serde(default = "default_truncate")]
    truncate: f64,
}

fn default_compression_level() -> u8 {
    DEFAULT_COMPRESSION_LEVEL
}

fn default_truncate() -> f64 {
    DEFAULT_TRUNCATE
}

impl Config {
    /// Load and validate a YAML config file
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, isn't valid YAML, lacks a
    /// required key or names an unsupported input format
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate YAML config text
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let format = InputFormat::from_path(&raw.file_path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(raw.file_path.clone()))?;

        let source = match format {
            InputFormat::Raw => {
                let shape = raw
                    .shape
                    .ok_or_else(|| ConfigError::MissingShape(raw.file_path.clone()))?;
                match shape[..] {
                    [z, y, x] if z > 0 && y > 0 && x > 0 => {
                        VolumeSource::Raw { shape: (z, y, x) }
                    }
                    _ => return Err(ConfigError::InvalidShape(shape.clone())),
                }
            }
            InputFormat::Hdf5 => VolumeSource::Hdf5 {
                internal_path: raw
                    .raw_internal_path
                    .ok_or_else(|| ConfigError::MissingInternalPath(raw.file_path.clone()))?,
            },
        };

        check_positive("fiber_diameter", raw.fiber_diameter)?;
        check_positive("voxel_size", raw.voxel_size)?;
        check_positive("truncate", raw.truncate)?;
        if raw.compression_level > 9 {
            return Err(ConfigError::InvalidCompressionLevel(raw.compression_level));
        }

        Ok(Self {
            file_path: raw.file_path,
            result_path: raw.result_path,
            source,
            fiber_diameter: raw.fiber_diameter,
            voxel_size: raw.voxel_size,
            raw_cast: raw.raw_cast,
            compression_level: raw.compression_level,
            truncate: raw.truncate,
        })
    }

    pub fn format(&self) -> InputFormat {
        match self.source {
            VolumeSource::Raw { .. } => InputFormat::Raw,
            VolumeSource::Hdf5 { .. } => InputFormat::Hdf5,
        }
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}
