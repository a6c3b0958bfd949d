use crate::{enums::RawCast, scales::SmoothingScales, volume::Volume};

use half::f16;
use hdf5::{File, H5Type};
use ndarray::{Array3, Array4, ArrayView, Dimension};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RAW_DATASET: &str = "raw";
pub const VEC_DATASET: &str = "vec";
pub const OUTPUT_SUFFIX: &str = ".vec.h5";

/// Upper bound on the chunk extent along each axis.
const MAX_CHUNK_EXTENT: usize = 64;

#[derive(Debug, Error)]
pub enum ResultWriterError {
    #[error("Can't derive an output name from {0}")]
    InvalidInputName(PathBuf),

    #[error("Orientation field shape {vec:?} doesn't match volume shape {raw:?} plus 3 components")]
    ShapeMismatch { raw: Vec<usize>, vec: Vec<usize> },

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

/// Analysis parameters stored as root attributes of the result file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultAttributes {
    pub scales: SmoothingScales,
    pub fiber_diameter: f64,
    pub voxel_size: f64,
}

/// Storage representation of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationResult {
    pub raw: Array3<u8>,
    pub vec: Array4<f16>,
}

impl OrientationResult {
    /// Cast volume and orientation field to their storage types. Both casts
    /// lose information: see [`RawCast`] for the volume, the vectors are
    /// rounded to the nearest half-precision float.
    pub fn new(
        volume: &Volume,
        vectors: &Array4<f64>,
        raw_cast: RawCast,
    ) -> Result<Self, ResultWriterError> {
        let (z, y, x) = volume.dim();
        if vectors.dim() != (z, y, x, 3) {
            return Err(ResultWriterError::ShapeMismatch {
                raw: vec![z, y, x],
                vec: vectors.shape().to_vec(),
            });
        }

        Ok(Self {
            raw: volume.to_u8(raw_cast),
            vec: vectors.mapv(f16::from_f64),
        })
    }
}

pub struct ResultWriter {
    compression_level: u8,
}

impl ResultWriter {
    pub fn new(compression_level: u8) -> Self {
        Self { compression_level }
    }

    /// `<result_path>/<input file stem>.vec.h5`
    pub fn output_path(
        file_path: impl AsRef<Path>,
        result_path: impl AsRef<Path>,
    ) -> Result<PathBuf, ResultWriterError> {
        let file_path = file_path.as_ref();
        let stem = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResultWriterError::InvalidInputName(file_path.to_path_buf()))?;
        Ok(result_path.as_ref().join(format!("{stem}{OUTPUT_SUFFIX}")))
    }

    /// Write `raw` and `vec` as gzip-compressed datasets. An existing file at
    /// `path` is replaced.
    ///
    /// # Errors
    ///
    /// Returns error if the file or one of its datasets can't be written. A
    /// partially written file is left in place.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        result: &OrientationResult,
        attributes: &ResultAttributes,
    ) -> Result<(), ResultWriterError> {
        let file = File::create(path.as_ref())?;

        self.write_dataset(&file, RAW_DATASET, result.raw.view())?;
        self.write_dataset(&file, VEC_DATASET, result.vec.view())?;

        Self::write_attribute(&file, "sigma", attributes.scales.sigma)?;
        Self::write_attribute(&file, "rho", attributes.scales.rho)?;
        Self::write_attribute(&file, "fiber_diameter", attributes.fiber_diameter)?;
        Self::write_attribute(&file, "voxel_size", attributes.voxel_size)?;

        file.close()?;
        Ok(())
    }

    fn write_dataset<T: H5Type, D: Dimension>(
        &self,
        file: &File,
        name: &str,
        data: ArrayView<'_, T, D>,
    ) -> Result<(), ResultWriterError> {
        let shape = data.shape().to_vec();
        let dataset = file
            .new_dataset::<T>()
            .shape(shape.clone())
            .chunk(Self::chunk_shape(&shape))
            .deflate(self.compression_level)
            .create(name)?;
        dataset.write(data)?;
        Ok(())
    }

    fn write_attribute(file: &File, name: &str, value: f64) -> Result<(), ResultWriterError> {
        file.new_attr::<f64>().create(name)?.write_scalar(&value)?;
        Ok(())
    }

    // Chunks need a non-zero extent on every axis.
    fn chunk_shape(shape: &[usize]) -> Vec<usize> {
        shape
            .iter()
            .map(|&extent| extent.clamp(1, MAX_CHUNK_EXTENT))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn names_output_after_input_stem() {
        let path = ResultWriter::output_path("data/scan01.h5", "/out").unwrap();
        assert_eq!(path, PathBuf::from("/out/scan01.vec.h5"));

        let path = ResultWriter::output_path("/mnt/a/sample.v2.raw", "results").unwrap();
        assert_eq!(path, PathBuf::from("results/sample.v2.vec.h5"));
    }

    #[test]
    fn rejects_inputs_without_a_name() {
        assert!(matches!(
            ResultWriter::output_path("/", "/out"),
            Err(ResultWriterError::InvalidInputName(_))
        ));
    }

    #[test]
    fn casts_to_storage_types() {
        let volume = Volume::new(array![[[1u16, 300], [512, 65535]]], 1.0);
        let mut vectors = Array4::<f64>::zeros((1, 2, 2, 3));
        vectors[[0, 0, 0, 0]] = 1.0;
        vectors[[0, 1, 1, 2]] = 0.1;

        let result = OrientationResult::new(&volume, &vectors, RawCast::Truncate).unwrap();
        assert_eq!(result.raw, array![[[1u8, 44], [0, 255]]]);
        assert_eq!(result.vec.dim(), (1, 2, 2, 3));
        assert_eq!(result.vec[[0, 0, 0, 0]], f16::ONE);
        assert_eq!(result.vec[[0, 1, 1, 2]], f16::from_f64(0.1));
    }

    #[test]
    fn rejects_mismatched_orientation_field() {
        let volume = Volume::new(Array3::zeros((2, 2, 2)), 1.0);
        let vectors = Array4::<f64>::zeros((2, 2, 3, 3));
        assert!(matches!(
            OrientationResult::new(&volume, &vectors, RawCast::Truncate),
            Err(ResultWriterError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn chunks_are_bounded_and_non_empty() {
        assert_eq!(ResultWriter::chunk_shape(&[200, 3, 0, 3]), vec![64, 3, 1, 3]);
    }
}
