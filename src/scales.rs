use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaleError {
    #[error(
        "fiber diameter {fiber_diameter} and voxel size {voxel_size} give no usable smoothing scale"
    )]
    Degenerate { fiber_diameter: f64, voxel_size: f64 },
}

/// Gaussian scales of the structure tensor, in voxels.
///
/// `sigma` is the noise scale used for the gradients, `rho` the integration
/// scale used to average the gradient products.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingScales {
    pub sigma: f64,
    pub rho: f64,
}

impl SmoothingScales {
    /// Derive the scales from a fiber diameter and voxel size (both in μm).
    ///
    /// The fiber radius in voxels `r` gives `sigma = round(sqrt(r² / 2), 2)`
    /// and `rho = 4 * sigma`. Sigma is rounded before the multiply.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::Degenerate`] if an input is not a positive finite
    /// number or sigma rounds to zero.
    pub fn from_fiber(fiber_diameter: f64, voxel_size: f64) -> Result<Self, ScaleError> {
        let degenerate = ScaleError::Degenerate {
            fiber_diameter,
            voxel_size,
        };
        if !(fiber_diameter.is_finite() && fiber_diameter > 0.0)
            || !(voxel_size.is_finite() && voxel_size > 0.0)
        {
            return Err(degenerate);
        }

        let r = fiber_diameter / 2.0 / voxel_size;
        let sigma = round_decimals(((r * r) / 2.0).sqrt(), 2);
        if sigma <= 0.0 || !sigma.is_finite() {
            return Err(degenerate);
        }

        Ok(Self {
            sigma,
            rho: 4.0 * sigma,
        })
    }
}

// Scale, round half to even, scale back.
fn round_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
