use crate::{
    config::{Config, VolumeSource},
    volume::Volume,
};

use hdf5::types::{IntSize, TypeDescriptor};
use log::info;
use ndarray::{Array3, Ix3};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("Input file {0} not found")]
    NotFound(PathBuf),

    #[error("Raw file holds {actual} bytes but shape {shape:?} needs {expected}")]
    ShapeMismatch {
        shape: (usize, usize, usize),
        expected: usize,
        actual: usize,
    },

    #[error("Dataset {path} holds {dtype}; only unsigned integers up to 16 bits are supported")]
    UnsupportedDtype { path: String, dtype: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load the volume described by a config
    ///
    /// # Errors
    ///
    /// Returns error if the input file is missing, can't be decoded or
    /// doesn't match the configured shape
    pub fn load(config: &Config) -> Result<Volume, VolumeLoaderError> {
        let data = match &config.source {
            VolumeSource::Raw { shape } => Self::load_raw(&config.file_path, *shape)?,
            VolumeSource::Hdf5 { internal_path } => {
                Self::load_hdf5(&config.file_path, internal_path)?
            }
        };
        let volume = Volume::new(data, config.voxel_size);
        info!(
            "Loaded volume {:?} uint16 {:.3} MiB",
            volume.dim(),
            volume.size_mib()
        );
        Ok(volume)
    }

    /// Read a flat file of native-endian u16 values and reshape it to
    /// `shape` (z, y, x)
    pub fn load_raw(
        path: impl AsRef<Path>,
        shape: (usize, usize, usize),
    ) -> Result<Array3<u16>, VolumeLoaderError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| Self::not_found_or_io(path, err))?;

        let expected = shape.0 * shape.1 * shape.2 * std::mem::size_of::<u16>();
        if bytes.len() != expected {
            return Err(VolumeLoaderError::ShapeMismatch {
                shape,
                expected,
                actual: bytes.len(),
            });
        }

        let values: Vec<u16> = bytemuck::pod_collect_to_vec(&bytes);
        let volume = Array3::from_shape_vec(shape, values)
            .map_err(|_| VolumeLoaderError::ShapeMismatch {
                shape,
                expected,
                actual: bytes.len(),
            })?;
        Ok(volume)
    }

    /// Read the 3D dataset at `internal_path` of an HDF5 file. The file is
    /// closed again when this returns.
    ///
    /// Only u8 and u16 datasets are accepted, since they widen to u16
    /// without changing any value.
    pub fn load_hdf5(
        path: impl AsRef<Path>,
        internal_path: &str,
    ) -> Result<Array3<u16>, VolumeLoaderError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(VolumeLoaderError::NotFound(path.to_path_buf()));
        }

        let file = hdf5::File::open(path)?;
        let dataset = file.dataset(internal_path)?;
        let descriptor = dataset.dtype()?.to_descriptor()?;
        if !matches!(
            descriptor,
            TypeDescriptor::Unsigned(IntSize::U1 | IntSize::U2)
        ) {
            return Err(VolumeLoaderError::UnsupportedDtype {
                path: internal_path.to_string(),
                dtype: format!("{descriptor:?}"),
            });
        }
        let volume = dataset.read::<u16, Ix3>()?;
        Ok(volume)
    }

    fn not_found_or_io(path: &Path, err: std::io::Error) -> VolumeLoaderError {
        if err.kind() == ErrorKind::NotFound {
            VolumeLoaderError::NotFound(path.to_path_buf())
        } else {
            VolumeLoaderError::Io(err)
        }
    }
}
