// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Boundary with the software I/O TLB.
//!
//! The engine owns the bounce pool, its locking and its coherency handling.
//! This crate only decides *how* to call it.

use alloc::sync::Arc;

use memaddr::PhysAddr;

use crate::{
    DmaAddr, DmaInfo,
    device::{Device, DmaAttrs, DmaDirection},
    gfp::GfpFlags,
    mask::{DmaQuirks, dma_capable},
    translate::{AddressTranslation, Translation},
};

/// One element of a scatter-gather list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScatterEntry {
    /// Physical address of the first page of the segment.
    pub page: PhysAddr,
    /// Byte offset of the data within `page`.
    pub offset: u64,
    pub length: u64,
    /// Filled in by the engine when the list is mapped.
    pub dma_address: DmaAddr,
    pub dma_length: u64,
}

impl ScatterEntry {
    pub const fn new(page: PhysAddr, offset: u64, length: u64) -> Self {
        Self {
            page,
            offset,
            length,
            dma_address: DmaAddr::new(0),
            dma_length: 0,
        }
    }

    /// Physical address of the first data byte.
    pub const fn phys(&self) -> PhysAddr {
        PhysAddr::new(self.page.as_u64().wrapping_add(self.offset))
    }
}

/// What the engine needs to know about the device it is mapping for.
///
/// Gives the engine the platform transform and the capability gate, so it can
/// tell whether a buffer must be bounced.
#[derive(Debug, Clone, Copy)]
pub struct DmaContext<'a> {
    pub dev: &'a Device,
    pub translation: Translation,
    pub quirks: DmaQuirks,
}

impl<'a> DmaContext<'a> {
    pub fn new(dev: &'a Device, translation: Translation, quirks: DmaQuirks) -> Self {
        Self {
            dev,
            translation,
            quirks,
        }
    }

    pub fn phys_to_dma(&self, paddr: PhysAddr) -> DmaAddr {
        self.translation.phys_to_dma(paddr)
    }

    pub fn dma_to_phys(&self, daddr: DmaAddr) -> PhysAddr {
        self.translation.dma_to_phys(daddr)
    }

    /// See [`dma_capable`].
    pub fn dma_capable(&self, addr: DmaAddr, size: u64) -> bool {
        dma_capable(self.dev.dma_mask(), addr, size, self.quirks)
    }
}

/// The bounce-buffer engine ("swiotlb") this layer delegates to.
///
/// Implementations must be internally synchronized: every method may be
/// called concurrently from any CPU.
pub trait SwiotlbEngine: Send + Sync {
    /// Sets up the bounce pool. Called once from [`DmaPlatform::setup`].
    ///
    /// [`DmaPlatform::setup`]: crate::DmaPlatform::setup
    fn init(&self, verbose: bool);

    fn alloc_coherent(&self, ctx: &DmaContext<'_>, size: usize, gfp: GfpFlags) -> Option<DmaInfo>;

    fn free_coherent(&self, ctx: &DmaContext<'_>, size: usize, info: DmaInfo);

    fn map_page(
        &self,
        ctx: &DmaContext<'_>,
        page: PhysAddr,
        offset: u64,
        size: usize,
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) -> DmaAddr;

    fn unmap_page(
        &self,
        ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    );

    /// Maps a scatter list, returning the number of DMA segments produced
    /// (0 on failure).
    fn map_sg(
        &self,
        ctx: &DmaContext<'_>,
        sg: &mut [ScatterEntry],
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) -> usize;

    fn unmap_sg(
        &self,
        ctx: &DmaContext<'_>,
        sg: &mut [ScatterEntry],
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    );

    fn sync_single_for_cpu(
        &self,
        ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
    );

    fn sync_single_for_device(
        &self,
        ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
    );

    fn sync_sg_for_cpu(&self, ctx: &DmaContext<'_>, sg: &mut [ScatterEntry], dir: DmaDirection);

    fn sync_sg_for_device(&self, ctx: &DmaContext<'_>, sg: &mut [ScatterEntry], dir: DmaDirection);

    /// Whether `addr` is the engine's mapping failure value.
    fn mapping_error(&self, ctx: &DmaContext<'_>, addr: DmaAddr) -> bool;

    /// Whether the bounce pool itself is reachable with `mask`.
    fn dma_supported(&self, ctx: &DmaContext<'_>, mask: u64) -> bool;
}

impl<T: SwiotlbEngine + ?Sized> SwiotlbEngine for Arc<T> {
    fn init(&self, verbose: bool) {
        (**self).init(verbose)
    }

    fn alloc_coherent(&self, ctx: &DmaContext<'_>, size: usize, gfp: GfpFlags) -> Option<DmaInfo> {
        (**self).alloc_coherent(ctx, size, gfp)
    }

    fn free_coherent(&self, ctx: &DmaContext<'_>, size: usize, info: DmaInfo) {
        (**self).free_coherent(ctx, size, info)
    }

    fn map_page(
        &self,
        ctx: &DmaContext<'_>,
        page: PhysAddr,
        offset: u64,
        size: usize,
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) -> DmaAddr {
        (**self).map_page(ctx, page, offset, size, dir, attrs)
    }

    fn unmap_page(
        &self,
        ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) {
        (**self).unmap_page(ctx, addr, size, dir, attrs)
    }

    fn map_sg(
        &self,
        ctx: &DmaContext<'_>,
        sg: &mut [ScatterEntry],
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) -> usize {
        (**self).map_sg(ctx, sg, dir, attrs)
    }

    fn unmap_sg(
        &self,
        ctx: &DmaContext<'_>,
        sg: &mut [ScatterEntry],
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) {
        (**self).unmap_sg(ctx, sg, dir, attrs)
    }

    fn sync_single_for_cpu(
        &self,
        ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
    ) {
        (**self).sync_single_for_cpu(ctx, addr, size, dir)
    }

    fn sync_single_for_device(
        &self,
        ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
    ) {
        (**self).sync_single_for_device(ctx, addr, size, dir)
    }

    fn sync_sg_for_cpu(&self, ctx: &DmaContext<'_>, sg: &mut [ScatterEntry], dir: DmaDirection) {
        (**self).sync_sg_for_cpu(ctx, sg, dir)
    }

    fn sync_sg_for_device(&self, ctx: &DmaContext<'_>, sg: &mut [ScatterEntry], dir: DmaDirection) {
        (**self).sync_sg_for_device(ctx, sg, dir)
    }

    fn mapping_error(&self, ctx: &DmaContext<'_>, addr: DmaAddr) -> bool {
        (**self).mapping_error(ctx, addr)
    }

    fn dma_supported(&self, ctx: &DmaContext<'_>, mask: u64) -> bool {
        (**self).dma_supported(ctx, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scatter_entry_phys() {
        let ent = ScatterEntry::new(PhysAddr::new(0x1000_4000), 0x10, 0x200);
        assert_eq!(ent.phys(), PhysAddr::new(0x1000_4010));
        assert_eq!(ent.dma_address, DmaAddr::new(0));

        let wild = ScatterEntry::new(PhysAddr::new(u64::MAX), 0x10, 1);
        assert_eq!(wild.phys(), PhysAddr::new(0xf));
    }
}
