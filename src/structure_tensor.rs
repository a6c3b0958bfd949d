//! Structure tensor of a volume and the eigen decomposition that turns it
//! into a local orientation field.

use crate::{
    config::DEFAULT_TRUNCATE, enums::TensorComponent, filters::GaussianFilter,
    scales::SmoothingScales,
};

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use ndarray::{Array3, Array4, ArrayView3, Axis, Zip, s};

/// Per-voxel symmetric 3x3 tensors stored as six component volumes, shape
/// `(6, z, y, x)` in [`TensorComponent`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureTensorField {
    pub data: Array4<f64>,
}

impl StructureTensorField {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Spatial dimensions (z, y, x)
    pub fn dim(&self) -> (usize, usize, usize) {
        let (_, z, y, x) = self.data.dim();
        (z, y, x)
    }

    pub fn component(&self, component: TensorComponent) -> ArrayView3<'_, f64> {
        self.data.index_axis(Axis(0), component.index())
    }

    /// Full matrix at one voxel; rows and columns ordered (x, y, z)
    pub fn tensor_at(&self, z: usize, y: usize, x: usize) -> Matrix3<f64> {
        let at = |c: TensorComponent| self.data[[c.index(), z, y, x]];
        let xx = at(TensorComponent::Xx);
        let yy = at(TensorComponent::Yy);
        let zz = at(TensorComponent::Zz);
        let xy = at(TensorComponent::Xy);
        let xz = at(TensorComponent::Xz);
        let yz = at(TensorComponent::Yz);
        Matrix3::new(xx, xy, xz, xy, yy, yz, xz, yz, zz)
    }
}

/// Eigenvalues in ascending order and the eigenvector of the smallest one,
/// both shaped `(z, y, x, 3)`. Vector components are ordered (x, y, z).
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    pub values: Array4<f64>,
    pub vectors: Array4<f64>,
}

pub trait StructureTensorEngine {
    fn structure_tensor(
        &self,
        volume: ArrayView3<f64>,
        scales: SmoothingScales,
    ) -> StructureTensorField;

    fn eigen_decomposition(&self, field: &StructureTensorField) -> EigenDecomposition;

    /// Local fiber direction per voxel; eigenvalues are dropped.
    fn dominant_eigenvectors(&self, field: &StructureTensorField) -> Array4<f64> {
        self.eigen_decomposition(field).vectors
    }
}

/// CPU engine built from Gaussian derivative filters.
///
/// Gradients are taken at scale `sigma`, their outer products averaged at
/// scale `rho`. Kernels are cut off at `truncate` standard deviations and
/// borders replicate the edge voxels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianStructureTensor {
    pub truncate: f64,
}

impl Default for GaussianStructureTensor {
    fn default() -> Self {
        Self {
            truncate: DEFAULT_TRUNCATE,
        }
    }
}

impl GaussianStructureTensor {
    pub fn new(truncate: f64) -> Self {
        Self { truncate }
    }

    fn gradients(&self, volume: ArrayView3<f64>, sigma: f64) -> [Array3<f64>; 3] {
        // Axes are (z, y, x); derivative orders pick the direction.
        let vx = GaussianFilter::filter(volume, sigma, [0, 0, 1], self.truncate);
        let vy = GaussianFilter::filter(volume, sigma, [0, 1, 0], self.truncate);
        let vz = GaussianFilter::filter(volume, sigma, [1, 0, 0], self.truncate);
        [vx, vy, vz]
    }

    // Sign convention: first non-zero component in (x, y, z) order is positive.
    fn canonical_sign(v: &mut Vector3<f64>) {
        if let Some(&lead) = v.iter().find(|c| **c != 0.0) {
            if lead < 0.0 {
                *v = -*v;
            }
        }
    }

    fn smallest_eigenpair(tensor: Matrix3<f64>) -> (Vector3<f64>, Vector3<f64>) {
        let eigen = SymmetricEigen::new(tensor);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

        let values = Vector3::new(
            eigen.eigenvalues[order[0]],
            eigen.eigenvalues[order[1]],
            eigen.eigenvalues[order[2]],
        );
        let mut vector: Vector3<f64> = eigen.eigenvectors.column(order[0]).into_owned();
        let norm = vector.norm();
        if norm > 0.0 {
            vector /= norm;
        }
        Self::canonical_sign(&mut vector);
        (values, vector)
    }
}

impl StructureTensorEngine for GaussianStructureTensor {
    fn structure_tensor(
        &self,
        volume: ArrayView3<f64>,
        scales: SmoothingScales,
    ) -> StructureTensorField {
        let [vx, vy, vz] = self.gradients(volume, scales.sigma);
        let (z, y, x) = volume.dim();
        let mut data = Array4::<f64>::zeros((6, z, y, x));

        let products = [
            (TensorComponent::Xx, &vx, &vx),
            (TensorComponent::Yy, &vy, &vy),
            (TensorComponent::Zz, &vz, &vz),
            (TensorComponent::Xy, &vx, &vy),
            (TensorComponent::Xz, &vx, &vz),
            (TensorComponent::Yz, &vy, &vz),
        ];
        for (component, a, b) in products {
            let product = Zip::from(a).and(b).par_map_collect(|&p, &q| p * q);
            let averaged = GaussianFilter::smooth(product.view(), scales.rho, self.truncate);
            data.slice_mut(s![component.index(), .., .., ..]).assign(&averaged);
        }

        StructureTensorField { data }
    }

    fn eigen_decomposition(&self, field: &StructureTensorField) -> EigenDecomposition {
        let (z, y, x) = field.dim();
        let mut values = Array4::<f64>::zeros((z, y, x, 3));
        let mut vectors = Array4::<f64>::zeros((z, y, x, 3));

        Zip::indexed(values.lanes_mut(Axis(3)))
            .and(vectors.lanes_mut(Axis(3)))
            .par_for_each(|(k, j, i), mut value_lane, mut vector_lane| {
                let (eigenvalues, eigenvector) =
                    Self::smallest_eigenpair(field.tensor_at(k, j, i));
                for c in 0..3 {
                    value_lane[c] = eigenvalues[c];
                    vector_lane[c] = eigenvector[c];
                }
            });

        EigenDecomposition { values, vectors }
    }
}
