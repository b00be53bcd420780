// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! DMA address translation and bounce-buffer mapping policy for Loongson
//! platforms.
//!
//! Devices behind the Loongson bridges do not see CPU physical addresses
//! directly. Depending on the chipset, a DMA address is either the physical
//! address with the NUMA node id folded into the HyperTransport window
//! (RS780/LS7A family), or a windowed remap that keeps high memory below 4G
//! (LS2H). This crate hides that difference behind [`DmaMapOps`] and routes
//! every buffer through an external software I/O TLB ([`SwiotlbEngine`]),
//! which bounces whatever a device cannot reach.
//!
//! The platform is brought up once by [`DmaPlatform::setup`]; afterwards the
//! returned object is immutable and is shared by reference with drivers.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate log;

mod config;
mod consts;
mod device;
mod engine;
mod error;
mod gfp;
mod mask;
mod ops;
mod platform;
mod translate;

pub use self::{
    config::{BoardType, SysConf},
    consts::*,
    device::{ArchData, Device, DmaAttrs, DmaDirection},
    engine::{DmaContext, ScatterEntry, SwiotlbEngine},
    error::{DmaError, DmaResult},
    gfp::{GfpFlags, coherent_gfp},
    mask::{DmaQuirks, dma_capable},
    ops::{DmaMapOps, LoongsonDmaOps},
    platform::DmaPlatform,
    translate::{
        AddressTranslation, Ls2hTranslation, Rs780Translation, Translation, ht40_representable,
        ht40_to_phys48, ls2h_dma_to_phys, ls2h_phys_to_dma, phys48_to_ht40, rs780_dma_to_phys,
        rs780_phys_to_dma,
    },
};
pub use memaddr::PhysAddr;

use core::ptr::NonNull;

/// A bus address as presented by a device.
///
/// It's a wrapper type around an [`u64`]. The all-ones value is the mapping
/// error sentinel, see [`DmaAddr::ERROR`].
#[repr(transparent)]
#[derive(Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct DmaAddr(u64);

impl DmaAddr {
    /// The sentinel returned when an address cannot be represented on the bus.
    pub const ERROR: Self = Self(DMA_MAPPING_ERROR);

    /// Converts an [`u64`] to a DMA address.
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Converts the address to an [`u64`].
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the mapping error sentinel.
    pub const fn is_error(self) -> bool {
        self.0 == DMA_MAPPING_ERROR
    }
}

impl From<u64> for DmaAddr {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Debug for DmaAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("DmaAddr")
            .field(&format_args!("{:#X}", self.0))
            .finish()
    }
}

/// A coherent buffer handed out by the bounce-buffer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaInfo {
    /// The address at which the CPU accesses this memory region.
    pub cpu_addr: NonNull<u8>,
    /// The address the device uses to reach the same memory.
    pub dma_addr: DmaAddr,
}

// The buffer is owned by whichever driver holds the handle; the pointer is
// never dereferenced by this crate.
unsafe impl Send for DmaInfo {}
unsafe impl Sync for DmaInfo {}
