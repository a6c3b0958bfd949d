use crate::{
    config::Config,
    result_writer::{OrientationResult, ResultAttributes, ResultWriter, ResultWriterError},
    scales::{ScaleError, SmoothingScales},
    structure_tensor::{GaussianStructureTensor, StructureTensorEngine},
    volume_loader::{VolumeLoader, VolumeLoaderError},
};

use log::{debug, info};
use std::path::PathBuf;
use thiserror::Error;
use web_time::Instant;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] VolumeLoaderError),

    #[error(transparent)]
    Scale(#[from] ScaleError),

    #[error(transparent)]
    Write(#[from] ResultWriterError),
}

/// Load, analyse and store one volume.
pub struct Pipeline<'a, E: StructureTensorEngine> {
    config: &'a Config,
    engine: E,
}

impl<'a> Pipeline<'a, GaussianStructureTensor> {
    pub fn new(config: &'a Config) -> Self {
        Self::with_engine(config, GaussianStructureTensor::new(config.truncate))
    }
}

impl<'a, E: StructureTensorEngine> Pipeline<'a, E> {
    pub fn with_engine(config: &'a Config, engine: E) -> Self {
        Self { config, engine }
    }

    /// Run every stage once and return the path of the written result file
    ///
    /// # Errors
    ///
    /// Returns the first stage error; nothing already written is removed
    pub fn run(&self) -> Result<PathBuf, PipelineError> {
        let config = self.config;
        let output_path = ResultWriter::output_path(&config.file_path, &config.result_path)?;
        if let Some(stem) = config.file_path.file_stem() {
            info!("Filename without extension: {}", stem.to_string_lossy());
        }

        let scales = SmoothingScales::from_fiber(config.fiber_diameter, config.voxel_size)?;

        let started = Instant::now();
        let volume = VolumeLoader::load(config)?;
        debug!("Loading took {:?}", started.elapsed());

        info!("sigma: {}", scales.sigma);
        info!("rho: {}", scales.rho);

        let started = Instant::now();
        let field = self.engine.structure_tensor(volume.to_f64().view(), scales);
        info!(
            "Structure tensor information is carried in a {:?} array.",
            field.shape()
        );
        let vectors = self.engine.dominant_eigenvectors(&field);
        drop(field);
        info!(
            "Orientation information is carried in a {:?} array.",
            vectors.shape()
        );
        debug!("Structure tensor analysis took {:?}", started.elapsed());

        let result = OrientationResult::new(&volume, &vectors, config.raw_cast)?;
        let attributes = ResultAttributes {
            scales,
            fiber_diameter: config.fiber_diameter,
            voxel_size: volume.voxel_size,
        };

        let started = Instant::now();
        ResultWriter::new(config.compression_level).write(&output_path, &result, &attributes)?;
        debug!("Writing took {:?}", started.elapsed());
        info!("Wrote {}", output_path.display());

        Ok(output_path)
    }
}
