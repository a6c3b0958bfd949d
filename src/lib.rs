//! # fiber-orientation
//!
//! Structure tensor analysis of scanned fiber materials.
//!
//! A volume is read from a flat u16 `.raw` file or from a dataset inside an
//! HDF5 file (`.hdf5`/`.h5`). The physical fiber diameter and voxel size give
//! the two Gaussian scales of the analysis:
//!  - sigma, the noise scale the gradients are taken at
//!  - rho = 4 * sigma, the integration scale the gradient products are
//!    averaged over
//!
//! For every voxel the eigenvector of the smallest structure tensor
//! eigenvalue points along the local fiber direction. The volume (as u8) and
//! the orientation field (as f16) are written as gzip-compressed datasets
//! `raw` and `vec` to `<result_path>/<input stem>.vec.h5`.
//!
//! Everything is held in memory at once: the input, its f64 copy, the six
//! tensor components and the orientation field.
//!
//! # Examples
//!
//! ## Running an analysis from a config file
//!
//! ```no_run
//! # use fiber_orientation::{Config, Pipeline};
//! let config = Config::from_path("analysis.yaml").expect("should have read the config");
//! let output = Pipeline::new(&config)
//!     .run()
//!     .expect("should have written the orientation field");
//! println!("{}", output.display());
//! ```
//!
//! with `analysis.yaml`:
//!
//! ```yaml
//! file_path: scans/scan01.raw
//! result_path: results
//! shape: [400, 512, 512] # z, y, x
//! fiber_diameter: 7.0 # μm
//! voxel_size: 1.3 # μm
//! ```

pub mod config;
pub mod enums;
mod filters;
pub mod pipeline;
pub mod result_writer;
pub mod scales;
pub mod structure_tensor;
pub mod volume;
pub mod volume_loader;

pub use config::{Config, ConfigError, VolumeSource};
pub use enums::{InputFormat, RawCast, TensorComponent};
pub use pipeline::{Pipeline, PipelineError};
pub use result_writer::{OrientationResult, ResultAttributes, ResultWriter, ResultWriterError};
pub use scales::{ScaleError, SmoothingScales};
pub use structure_tensor::{
    EigenDecomposition, GaussianStructureTensor, StructureTensorEngine, StructureTensorField,
};
pub use volume::Volume;
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
