//! Fixed five-stage pipeline topology.
//!
//! The transform runs as five kernel units, each on its own channel:
//!
//! ```text
//! Channel 0: [HtoD write]                                   (transfer)
//! Channel 1:   [fetch       ]                                arg0 = input buffer
//! Channel 2:     [fft3da      ]                              arg0 = inverse flag
//! Channel 3:       [transpose   ]                            arg0 = output buffer
//! Channel 4:         [fft3db      ]                          arg0 = inverse flag
//! Channel 5:           [transpose3d ][DtoH read]
//! ```
//!
//! Samples move between stages over the device's internal streaming wiring;
//! the host only launches the units and waits for them.

use std::fmt;

/// Number of execution channels: one transfer channel plus one per stage.
pub const CHANNEL_COUNT: usize = 6;

/// Argument slot every host-bound kernel argument occupies.
pub const ARG_SLOT: u32 = 0;

/// One of the five pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    /// Reads the input buffer into the pipeline.
    Fetch,
    /// First FFT stage.
    FftA,
    /// First transpose, uses the output buffer as scratch.
    TransposeA,
    /// Second FFT stage.
    FftB,
    /// Final transpose, produces the result.
    TransposeB,
}

impl StageKind {
    /// All stages in dataflow order.
    pub const ALL: [StageKind; 5] = [
        StageKind::Fetch,
        StageKind::FftA,
        StageKind::TransposeA,
        StageKind::FftB,
        StageKind::TransposeB,
    ];

    /// Position in the pipeline.
    pub const fn index(self) -> usize {
        match self {
            Self::Fetch => 0,
            Self::FftA => 1,
            Self::TransposeA => 2,
            Self::FftB => 3,
            Self::TransposeB => 4,
        }
    }

    /// Stage identifier used in logs and errors.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::FftA => "fft-A",
            Self::TransposeA => "transpose-A",
            Self::FftB => "fft-B",
            Self::TransposeB => "transpose-B",
        }
    }

    /// Descriptor of this stage.
    pub fn descriptor(self) -> &'static StageDescriptor {
        &PIPELINE[self.index()]
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    /// Dedicated host-to-device transfer channel.
    Transfer,
    /// Channel owned by one stage.
    Stage(StageKind),
}

impl ChannelId {
    /// All channels, transfer first.
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [
        ChannelId::Transfer,
        ChannelId::Stage(StageKind::Fetch),
        ChannelId::Stage(StageKind::FftA),
        ChannelId::Stage(StageKind::TransposeA),
        ChannelId::Stage(StageKind::FftB),
        ChannelId::Stage(StageKind::TransposeB),
    ];

    /// Slot in the queue set.
    pub const fn index(self) -> usize {
        match self {
            Self::Transfer => 0,
            Self::Stage(stage) => stage.index() + 1,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => f.write_str("transfer"),
            Self::Stage(stage) => write!(f, "{}", stage),
        }
    }
}

/// What the host binds to a stage's argument slot before launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageBinding {
    /// Device input buffer.
    InputBuffer,
    /// Device output buffer.
    OutputBuffer,
    /// Inverse-transform flag as a 32-bit integer.
    InverseFlag,
    /// Nothing: the unit is fully wired on the device.
    Unbound,
}

/// Static description of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    /// Stage identity.
    pub stage: StageKind,
    /// Kernel name inside the configuration image.
    pub kernel: &'static str,
    /// Channel the unit is launched on.
    pub channel: ChannelId,
    /// Host-side argument binding.
    pub binding: StageBinding,
}

/// The pipeline, in launch and drain order.
pub const PIPELINE: [StageDescriptor; 5] = [
    StageDescriptor {
        stage: StageKind::Fetch,
        kernel: "fetch",
        channel: ChannelId::Stage(StageKind::Fetch),
        binding: StageBinding::InputBuffer,
    },
    StageDescriptor {
        stage: StageKind::FftA,
        kernel: "fft3da",
        channel: ChannelId::Stage(StageKind::FftA),
        binding: StageBinding::InverseFlag,
    },
    StageDescriptor {
        stage: StageKind::TransposeA,
        kernel: "transpose",
        channel: ChannelId::Stage(StageKind::TransposeA),
        binding: StageBinding::OutputBuffer,
    },
    StageDescriptor {
        stage: StageKind::FftB,
        kernel: "fft3db",
        channel: ChannelId::Stage(StageKind::FftB),
        binding: StageBinding::InverseFlag,
    },
    StageDescriptor {
        stage: StageKind::TransposeB,
        kernel: "transpose3d",
        channel: ChannelId::Stage(StageKind::TransposeB),
        binding: StageBinding::Unbound,
    },
];

/// Channel used to stage input into the device.
pub const TRANSFER_CHANNEL: ChannelId = ChannelId::Transfer;

/// Channel the result is read back on.
pub const RESULT_CHANNEL: ChannelId = ChannelId::Stage(StageKind::TransposeB);

/// Kernel names in pipeline order.
pub fn kernel_names() -> impl Iterator<Item = &'static str> {
    PIPELINE.iter().map(|d| d.kernel)
}
