use serde::Deserialize;
use std::path::Path;

/// On-disk layout of the input volume, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Raw,
    Hdf5,
}

impl InputFormat {
    pub const SUPPORTED: &'static str = ".raw, .hdf5, .h5";

    /// Detect the format from the extension of `path`. Matching is
    /// case-sensitive, so `scan.RAW` is not recognised.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            "raw" => Some(Self::Raw),
            "hdf5" | "h5" => Some(Self::Hdf5),
            _ => None,
        }
    }
}

/// How the u16 volume is brought down to u8 for storage. Both are lossy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawCast {
    /// Keep the low byte of every value (`value mod 256`), no rescaling.
    #[default]
    Truncate,
    /// Rescale `[min, max]` of the volume onto `[0, 255]`.
    MinMax,
}

/// Independent entries of a symmetric 3x3 structure tensor, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorComponent {
    Xx = 0,
    Yy = 1,
    Zz = 2,
    Xy = 3,
    Xz = 4,
    Yz = 5,
}

impl TensorComponent {
    pub const ALL: [TensorComponent; 6] = [
        TensorComponent::Xx,
        TensorComponent::Yy,
        TensorComponent::Zz,
        TensorComponent::Xy,
        TensorComponent::Xz,
        TensorComponent::Yz,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}
