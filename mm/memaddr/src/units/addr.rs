// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use core::{fmt, ops::Add};

use crate::{align_offset, floor_align};

/// A CPU physical address.
///
/// Loongson-3 physical addresses are 48 bits wide regardless of the native
/// word size, so the wrapper is always backed by a [`u64`].
#[repr(transparent)]
#[derive(Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct PhysAddr(u64);

impl PhysAddr {
    /// Converts an [`u64`] to a physical address.
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Converts the address to an [`u64`].
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Rounds the address down to `align`, which must be a power of two.
    pub const fn align_down(self, align: u64) -> Self {
        Self(floor_align(self.0, align))
    }

    /// Returns the offset of the address within an `align`-sized block.
    pub const fn align_offset(self, align: u64) -> u64 {
        align_offset(self.0, align)
    }

    /// Checked addition of a byte count.
    pub const fn checked_add(self, size: u64) -> Option<Self> {
        match self.0.checked_add(size) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }
}

impl From<u64> for PhysAddr {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<PhysAddr> for u64 {
    fn from(value: PhysAddr) -> Self {
        value.0
    }
}

/// Wraps on overflow, like the bus arithmetic it models. Use
/// [`PhysAddr::checked_add`] where the end of a buffer must be validated.
impl Add<u64> for PhysAddr {
    type Output = Self;

    fn add(self, rhs: u64) -> Self {
        Self(self.0.wrapping_add(rhs))
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PhysAddr")
            .field(&format_args!("{:#x}", self.0))
            .finish()
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
