// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Allocation hints for coherent buffers.

use bitflags::bitflags;
use memaddr::dma_bit_mask;

bitflags! {
    /// Page allocator hints, bit compatible with the kernel's `gfp_t`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct GfpFlags: u32 {
        /// Allocate from the low (ISA-reachable / 32-bit) zone.
        const DMA = 0x01;
        const HIGHMEM = 0x02;
        /// Allocate from the zone reachable with a 40-bit mask.
        const DMA32 = 0x04;
        const MOVABLE = 0x08;
        const RECLAIM = 0x10;
        const HIGH = 0x20;
        const IO = 0x40;
        const FS = 0x80;
        /// Do not log allocation failures.
        const NOWARN = 0x200;
        /// Fail instead of retrying hard.
        const NORETRY = 0x1000;
        const ZERO = 0x8000;

        const ZONE_MASK = Self::DMA.bits() | Self::HIGHMEM.bits() | Self::DMA32.bits();
        const KERNEL = Self::RECLAIM.bits() | Self::IO.bits() | Self::FS.bits();
        const ATOMIC = Self::HIGH.bits();
    }
}

/// Rewrites caller hints for a coherent allocation.
///
/// Zone modifiers supplied by the caller are dropped and re-derived from the
/// device's coherent mask. Failure is handled by falling back to the bounce
/// pool, so the allocation is also marked no-retry and no-warn.
pub fn coherent_gfp(coherent_mask: u64, gfp: GfpFlags) -> GfpFlags {
    let gfp = gfp.difference(GfpFlags::ZONE_MASK) | zone_for_mask(coherent_mask);
    gfp | GfpFlags::NORETRY | GfpFlags::NOWARN
}

fn zone_for_mask(mask: u64) -> GfpFlags {
    if cfg!(feature = "zone-dma") && mask < dma_bit_mask(32) {
        GfpFlags::DMA
    } else if cfg!(feature = "zone-dma32") && mask < dma_bit_mask(40) {
        GfpFlags::DMA32
    } else {
        GfpFlags::empty()
    }
}
