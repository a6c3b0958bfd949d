use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis, Zip};

/// Separable Gaussian filtering of 3D arrays with "nearest" (edge replicate)
/// boundaries.
pub(crate) struct GaussianFilter;

impl GaussianFilter {
    /// Sampled Gaussian of standard deviation `sigma`, or its first
    /// derivative for `order == 1`. Index `i` holds the weight at offset
    /// `i - radius` with `radius = floor(truncate * sigma + 0.5)`.
    pub(crate) fn kernel(sigma: f64, order: u8, truncate: f64) -> Vec<f64> {
        let radius = (truncate * sigma + 0.5) as isize;
        let sigma2 = sigma * sigma;

        let mut weights: Vec<f64> = (-radius..=radius)
            .map(|x| (-0.5 * (x * x) as f64 / sigma2).exp())
            .collect();
        let sum: f64 = weights.iter().sum();
        for w in weights.iter_mut() {
            *w /= sum;
        }

        if order == 1 {
            for (w, x) in weights.iter_mut().zip(-radius..=radius) {
                *w *= -(x as f64) / sigma2;
            }
        }
        weights
    }

    /// Convolve every lane along `axis` with `kernel`.
    pub(crate) fn convolve_axis(input: ArrayView3<f64>, axis: Axis, kernel: &[f64]) -> Array3<f64> {
        let mut output = Array3::<f64>::zeros(input.raw_dim());
        Zip::from(output.lanes_mut(axis))
            .and(input.lanes(axis))
            .par_for_each(|out, lane| Self::convolve_lane(lane, out, kernel));
        output
    }

    #[inline]
    fn convolve_lane(lane: ArrayView1<f64>, mut out: ArrayViewMut1<f64>, kernel: &[f64]) {
        let len = lane.len() as isize;
        let radius = (kernel.len() / 2) as isize;

        for n in 0..len {
            let mut sum = 0.0;
            for (k, &w) in kernel.iter().enumerate() {
                let offset = k as isize - radius;
                let src = (n - offset).clamp(0, len - 1);
                sum += w * lane[src as usize];
            }
            out[n as usize] = sum;
        }
    }

    /// Gaussian filter with a per-axis derivative order (0 or 1), axes in
    /// order 0, 1, 2.
    pub(crate) fn filter(
        input: ArrayView3<f64>,
        sigma: f64,
        orders: [u8; 3],
        truncate: f64,
    ) -> Array3<f64> {
        let first = Self::kernel(sigma, orders[0], truncate);
        let mut result = Self::convolve_axis(input, Axis(0), &first);
        for (axis, &order) in orders.iter().enumerate().skip(1) {
            let kernel = Self::kernel(sigma, order, truncate);
            result = Self::convolve_axis(result.view(), Axis(axis), &kernel);
        }
        result
    }

    /// Plain Gaussian smoothing.
    pub(crate) fn smooth(input: ArrayView3<f64>, sigma: f64, truncate: f64) -> Array3<f64> {
        Self::filter(input, sigma, [0, 0, 0], truncate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn smoothing_kernel_is_normalized_and_symmetric() {
        let kernel = GaussianFilter::kernel(1.77, 0, 4.0);
        // floor(4 * 1.77 + 0.5) = 7
        assert_eq!(kernel.len(), 15);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for i in 0..kernel.len() {
            assert_eq!(kernel[i], kernel[kernel.len() - 1 - i]);
        }
        assert!(kernel[7] > kernel[6]);
    }

    #[test]
    fn derivative_kernel_is_antisymmetric() {
        let kernel = GaussianFilter::kernel(1.0, 1, 4.0);
        assert_eq!(kernel.len(), 9);
        assert_eq!(kernel[4], 0.0);
        for i in 0..kernel.len() {
            assert!((kernel[i] + kernel[kernel.len() - 1 - i]).abs() < 1e-15);
        }
        // Positive offsets weigh samples behind the centre, so they're negative.
        assert!(kernel[5] < 0.0);
    }

    #[test]
    fn derivative_kernel_matches_reference_taps() {
        // scipy.ndimage._gaussian_kernel1d(1.0, 1, 4)
        let expected = [
            0.000535322498458967,
            0.013295584860093797,
            0.10798225484140882,
            0.24197144565660073,
            0.0,
            -0.24197144565660073,
            -0.10798225484140882,
            -0.013295584860093797,
            -0.000535322498458967,
        ];
        let kernel = GaussianFilter::kernel(1.0, 1, 4.0);
        assert_eq!(kernel.len(), expected.len());
        for (got, want) in kernel.iter().zip(expected) {
            assert!((got - want).abs() < 1e-15, "{got} != {want}");
        }
    }

    #[test]
    fn filter_reads_strided_input_directly() {
        let base =
            Array3::from_shape_fn((6, 5, 8), |(z, y, x)| ((z * 13 + y * 7 + x * 3) % 11) as f64);
        let strided = base.slice(s![..;2, .., 1..;2]);
        let output = GaussianFilter::filter(strided, 0.9, [0, 1, 0], 4.0);

        let mut expected = strided.to_owned();
        for (axis, order) in [0u8, 1, 0].into_iter().enumerate() {
            let kernel = GaussianFilter::kernel(0.9, order, 4.0);
            expected = GaussianFilter::convolve_axis(expected.view(), Axis(axis), &kernel);
        }
        assert_eq!(output, expected);
    }

    #[test]
    fn smoothing_preserves_constants() {
        let input = Array3::from_elem((3, 4, 5), 42.0);
        let output = GaussianFilter::smooth(input.view(), 1.5, 4.0);
        assert!(output.iter().all(|&v| (v - 42.0).abs() < 1e-10));
    }

    #[test]
    fn derivative_of_ramp_is_its_slope() {
        let input = Array3::from_shape_fn((5, 5, 40), |(_, _, x)| 3.0 * x as f64);
        let output = GaussianFilter::filter(input.view(), 1.0, [0, 0, 1], 4.0);
        // Away from the replicated edges only the kernel truncation is off.
        for x in 6..34 {
            assert!((output[[2, 2, x]] - 3.0).abs() < 1e-3, "x = {x}: {}", output[[2, 2, x]]);
        }
        // Along the other axes the ramp is constant.
        let across = GaussianFilter::filter(input.view(), 1.0, [1, 0, 0], 4.0);
        assert!(across.iter().all(|&v| v.abs() < 1e-9));
    }

    #[test]
    fn boundaries_replicate_edges() {
        let mut input = Array3::<f64>::zeros((1, 1, 3));
        input[[0, 0, 0]] = 1.0;
        let kernel = [0.25, 0.5, 0.25];
        let output = GaussianFilter::convolve_axis(input.view(), Axis(2), &kernel);
        // Left neighbour of index 0 is index 0 itself.
        assert!((output[[0, 0, 0]] - 0.75).abs() < 1e-15);
        assert!((output[[0, 0, 1]] - 0.25).abs() < 1e-15);
        assert_eq!(output[[0, 0, 2]], 0.0);
    }
}
