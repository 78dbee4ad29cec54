//! Problem shape, precision, direction and sample types.

use std::fmt;

use num_complex::Complex;

use crate::error::{FftFpgaError, Result};

/// Cubic edge lengths for which configuration images exist.
pub const SUPPORTED_SIZES: [usize; 3] = [16, 32, 64];

/// Extent of a 3-D transform. Samples are stored x-fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProblemShape {
    /// Extent along x (fastest varying).
    pub nx: usize,
    /// Extent along y.
    pub ny: usize,
    /// Extent along z (slowest varying).
    pub nz: usize,
}

impl ProblemShape {
    /// Create a shape from its three extents.
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Create an `n × n × n` shape.
    pub const fn cubic(n: usize) -> Self {
        Self::new(n, n, n)
    }

    /// Number of complex samples in the volume.
    pub fn volume(&self) -> usize {
        self.nx.saturating_mul(self.ny).saturating_mul(self.nz)
    }

    /// Whether all three extents are equal.
    pub fn is_cubic(&self) -> bool {
        self.nx == self.ny && self.ny == self.nz
    }

    /// Edge length for cubic shapes.
    pub fn edge(&self) -> Option<usize> {
        self.is_cubic().then_some(self.nx)
    }

    /// Whether a configuration image can exist for this shape.
    pub fn is_supported(&self) -> bool {
        self.edge().is_some_and(|n| SUPPORTED_SIZES.contains(&n))
    }

    /// Bytes needed to hold the volume at the given precision.
    pub fn byte_len(&self, precision: Precision) -> usize {
        self.volume().saturating_mul(precision.sample_bytes())
    }

    /// Iterate over every supported shape, smallest first.
    pub fn supported() -> impl Iterator<Item = ProblemShape> {
        SUPPORTED_SIZES.into_iter().map(ProblemShape::cubic)
    }
}

impl From<[usize; 3]> for ProblemShape {
    fn from(n: [usize; 3]) -> Self {
        Self::new(n[0], n[1], n[2])
    }
}

impl fmt::Display for ProblemShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

/// Floating-point precision of the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// 32-bit components.
    Single,
    /// 64-bit components.
    Double,
}

impl Precision {
    /// Size of one complex sample in bytes.
    pub const fn sample_bytes(self) -> usize {
        match self {
            Self::Single => 8,
            Self::Double => 16,
        }
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "sp" | "f32" => Ok(Self::Single),
            "double" | "dp" | "f64" => Ok(Self::Double),
            other => Err(format!("unknown precision '{}'", other)),
        }
    }
}

/// Transform direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Forward transform (negative exponent).
    #[default]
    Forward,
    /// Backward transform (positive exponent), unnormalized.
    Backward,
}

impl Direction {
    /// Whether the FFT stages run in inverse mode.
    pub const fn is_inverse(self) -> bool {
        matches!(self, Self::Backward)
    }

    /// Inverse flag as passed to the FFT kernel units.
    pub const fn inverse_flag(self) -> i32 {
        self.is_inverse() as i32
    }
}

impl TryFrom<i32> for Direction {
    type Error = FftFpgaError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Backward),
            other => Err(FftFpgaError::InvalidDirection(other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Backward => f.write_str("backward"),
        }
    }
}

/// Direction of a host/device copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    /// Host to device.
    HostToDevice,
    /// Device to host.
    DeviceToHost,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostToDevice => f.write_str("host-to-device"),
            Self::DeviceToHost => f.write_str("device-to-host"),
        }
    }
}

/// A complex sample the engine can move to and from device memory.
///
/// The precision is a property of the type, so an engine instantiated for a
/// sample type is fixed to that precision.
pub trait ComplexSample: bytemuck::Pod + Default + Send + Sync + 'static {
    /// Precision of both components.
    const PRECISION: Precision;
}

impl ComplexSample for Complex<f32> {
    const PRECISION: Precision = Precision::Single;
}

impl ComplexSample for Complex<f64> {
    const PRECISION: Precision = Precision::Double;
}
