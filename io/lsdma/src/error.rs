// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use core::fmt;

use kerrno::{KError, KErrorKind};

/// Why a DMA mask could not be applied.
///
/// Every variant reports `-EIO` to the driver; the variants only tell the
/// caller which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaError {
    /// The device has no DMA mask configured.
    NoMask,
    /// The bounce-buffer engine cannot serve a device with this mask.
    Unsupported { mask: u64 },
    /// The mask exceeds the platform maximum. The device mask was lowered to
    /// `granted` anyway.
    Clamped { requested: u64, granted: u64 },
}

impl DmaError {
    /// The negative `errno` handed back to drivers.
    pub fn code(&self) -> i32 {
        KError::from(*self).errno()
    }

    /// Stable error message for display/logging.
    pub const fn message(&self) -> &'static str {
        match self {
            DmaError::NoMask => "device has no DMA mask",
            DmaError::Unsupported { .. } => "DMA mask not supported",
            DmaError::Clamped { .. } => "DMA mask clamped to platform limit",
        }
    }
}

impl fmt::Display for DmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DmaError::NoMask => f.write_str(self.message()),
            DmaError::Unsupported { mask } => write!(f, "{} ({:#x})", self.message(), mask),
            DmaError::Clamped { requested, granted } => {
                write!(f, "{} ({:#x} -> {:#x})", self.message(), requested, granted)
            }
        }
    }
}

impl From<DmaError> for KErrorKind {
    fn from(_: DmaError) -> Self {
        KErrorKind::Io
    }
}

/// A specialized `Result` type for mask negotiation.
pub type DmaResult<T = ()> = Result<T, DmaError>;
