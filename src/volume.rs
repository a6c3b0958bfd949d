use crate::enums::RawCast;

use ndarray::{Array3, Zip};

const MIB: f64 = 1024.0 * 1024.0;

/// Scanned intensity data, axes ordered (z, y, x).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Volume {
    pub data: Array3<u16>,
    /// Isotropic edge length of one voxel in μm
    pub voxel_size: f64,
}

impl Volume {
    pub fn new(data: Array3<u16>, voxel_size: f64) -> Self {
        Self { data, voxel_size }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u16> {
        &self.data
    }

    pub fn nbytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<u16>()
    }

    /// Memory held by the voxel data in MiB
    pub fn size_mib(&self) -> f64 {
        self.nbytes() as f64 / MIB
    }

    /// Widen to f64 for the structure tensor computation
    pub fn to_f64(&self) -> Array3<f64> {
        self.data.mapv(f64::from)
    }

    /// Bring the volume down to u8 for storage. Lossy for both casts.
    pub fn to_u8(&self, cast: RawCast) -> Array3<u8> {
        match cast {
            RawCast::Truncate => {
                Zip::from(&self.data).par_map_collect(|&v| Self::truncate_to_u8(v))
            }
            RawCast::MinMax => {
                let (min, max) = self.value_range();
                Zip::from(&self.data).par_map_collect(|&v| Self::rescale_to_u8(v, min, max))
            }
        }
    }

    fn value_range(&self) -> (u16, u16) {
        self.data
            .iter()
            .fold((u16::MAX, u16::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    // Low byte, i.e. value mod 256
    #[inline]
    fn truncate_to_u8(value: u16) -> u8 {
        value as u8
    }

    #[inline]
    fn rescale_to_u8(value: u16, min: u16, max: u16) -> u8 {
        if max <= min {
            return 0;
        }
        let unit = f64::from(value - min) / f64::from(max - min);
        (unit * 255.0).clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Volume {
        Volume::new(
            array![[[0u16, 255, 256], [257, 1000, 65535]], [[10, 20, 30], [40, 50, 60]]],
            2.0,
        )
    }

    #[test]
    fn reports_dimensions_and_footprint() {
        let volume = Volume::new(Array3::zeros((4, 8, 16)), 1.0);
        assert_eq!(volume.dim(), (4, 8, 16));
        assert_eq!(volume.nbytes(), 4 * 8 * 16 * 2);
        assert!((volume.size_mib() - 1024.0 / MIB).abs() < 1e-15);
    }

    #[test]
    fn widens_without_changing_values() {
        let volume = sample();
        let wide = volume.to_f64();
        assert_eq!(wide.dim(), volume.dim());
        assert_eq!(wide[[0, 1, 2]], 65535.0);
        assert_eq!(wide[[1, 0, 1]], 20.0);
    }

    #[test]
    fn truncating_cast_keeps_low_byte() {
        let raw = sample().to_u8(RawCast::Truncate);
        assert_eq!(raw[[0, 0, 1]], 255);
        assert_eq!(raw[[0, 0, 2]], 0);
        assert_eq!(raw[[0, 1, 0]], 1);
        assert_eq!(raw[[0, 1, 1]], (1000 % 256) as u8);
        assert_eq!(raw[[0, 1, 2]], 255);
    }

    #[test]
    fn min_max_cast_spans_full_range() {
        let raw = sample().to_u8(RawCast::MinMax);
        assert_eq!(raw[[0, 0, 0]], 0);
        assert_eq!(raw[[0, 1, 2]], 255);
        assert!(raw[[1, 1, 2]] < raw[[0, 1, 1]]);
    }

    #[test]
    fn min_max_cast_of_constant_volume_is_zero() {
        let volume = Volume::new(Array3::from_elem((2, 2, 2), 700), 1.0);
        assert!(volume.to_u8(RawCast::MinMax).iter().all(|&v| v == 0));
    }
}
