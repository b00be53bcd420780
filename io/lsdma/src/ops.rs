// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! The DMA operation table and its Loongson implementation.

use core::sync::atomic::{Ordering, fence};

use memaddr::{PhysAddr, align_offset, dma_bit_mask};

use crate::{
    DmaAddr, DmaInfo,
    consts::PCIE_DMA_ALIGN,
    device::{Device, DmaAttrs, DmaDirection},
    engine::{DmaContext, ScatterEntry, SwiotlbEngine},
    error::{DmaError, DmaResult},
    gfp::{GfpFlags, coherent_gfp},
    mask::DmaQuirks,
    translate::{AddressTranslation, Translation},
};

/// Operations every DMA-capable device is driven through.
///
/// `attrs` arguments are the caller's attributes; an implementation is free
/// to substitute its own.
pub trait DmaMapOps: Send + Sync {
    /// Allocates a coherent buffer. `None` if no suitable memory is left.
    fn alloc(&self, dev: &Device, size: usize, gfp: GfpFlags, attrs: DmaAttrs) -> Option<DmaInfo>;

    fn free(&self, dev: &Device, size: usize, info: DmaInfo, attrs: DmaAttrs);

    fn map_page(
        &self,
        dev: &Device,
        page: PhysAddr,
        offset: u64,
        size: usize,
        dir: DmaDirection,
        attrs: DmaAttrs,
    ) -> DmaAddr;

    fn unmap_page(
        &self,
        dev: &Device,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
        attrs: DmaAttrs,
    );

    fn map_sg(
        &self,
        dev: &Device,
        sg: &mut [ScatterEntry],
        dir: DmaDirection,
        attrs: DmaAttrs,
    ) -> usize;

    fn unmap_sg(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection, attrs: DmaAttrs);

    fn sync_single_for_cpu(&self, dev: &Device, addr: DmaAddr, size: usize, dir: DmaDirection);

    fn sync_single_for_device(&self, dev: &Device, addr: DmaAddr, size: usize, dir: DmaDirection);

    fn sync_sg_for_cpu(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection);

    fn sync_sg_for_device(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection);

    fn mapping_error(&self, dev: &Device, addr: DmaAddr) -> bool;

    fn dma_supported(&self, dev: &Device, mask: u64) -> bool;

    fn set_dma_mask(&self, dev: &Device, mask: u64) -> DmaResult;

    fn phys_to_dma(&self, dev: &Device, paddr: PhysAddr) -> DmaAddr;

    fn dma_to_phys(&self, dev: &Device, daddr: DmaAddr) -> PhysAddr;
}

/// Orders CPU accesses to a DMA buffer against the device.
#[inline]
fn mb() {
    fence(Ordering::SeqCst);
}

/// Loongson operation table on top of a bounce-buffer engine.
pub struct LoongsonDmaOps<E> {
    engine: E,
    translation: Translation,
    quirks: DmaQuirks,
    mask_bits: u32,
}

impl<E: SwiotlbEngine> LoongsonDmaOps<E> {
    pub fn new(engine: E, translation: Translation, quirks: DmaQuirks, mask_bits: u32) -> Self {
        Self {
            engine,
            translation,
            quirks,
            mask_bits,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn translation(&self) -> Translation {
        self.translation
    }

    pub fn quirks(&self) -> DmaQuirks {
        self.quirks
    }

    /// Largest mask a device may hold on this platform.
    pub fn max_dma_mask(&self) -> u64 {
        dma_bit_mask(self.mask_bits)
    }

    pub fn context<'a>(&self, dev: &'a Device) -> DmaContext<'a> {
        DmaContext::new(dev, self.translation, self.quirks)
    }
}

impl<E: SwiotlbEngine> DmaMapOps for LoongsonDmaOps<E> {
    fn alloc(&self, dev: &Device, size: usize, gfp: GfpFlags, _attrs: DmaAttrs) -> Option<DmaInfo> {
        let gfp = coherent_gfp(dev.coherent_dma_mask(), gfp);
        debug!("{}: coherent alloc {:#x} bytes, gfp {:?}", dev.name(), size, gfp);
        let ret = self.engine.alloc_coherent(&self.context(dev), size, gfp);
        mb();
        ret
    }

    fn free(&self, dev: &Device, size: usize, info: DmaInfo, _attrs: DmaAttrs) {
        self.engine.free_coherent(&self.context(dev), size, info);
    }

    fn map_page(
        &self,
        dev: &Device,
        page: PhysAddr,
        offset: u64,
        size: usize,
        dir: DmaDirection,
        _attrs: DmaAttrs,
    ) -> DmaAddr {
        // Sub-16-byte offsets may share a cache line with unrelated data.
        let attrs = if align_offset(offset, PCIE_DMA_ALIGN) != 0 {
            Some(dev.archdata.dma_attrs)
        } else {
            None
        };
        let daddr = self
            .engine
            .map_page(&self.context(dev), page, offset, size, dir, attrs);
        mb();
        daddr
    }

    fn unmap_page(
        &self,
        dev: &Device,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
        attrs: DmaAttrs,
    ) {
        self.engine
            .unmap_page(&self.context(dev), addr, size, dir, Some(attrs));
    }

    fn map_sg(
        &self,
        dev: &Device,
        sg: &mut [ScatterEntry],
        dir: DmaDirection,
        _attrs: DmaAttrs,
    ) -> usize {
        let r = self
            .engine
            .map_sg(&self.context(dev), sg, dir, Some(dev.archdata.dma_attrs));
        mb();
        r
    }

    fn unmap_sg(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection, attrs: DmaAttrs) {
        self.engine
            .unmap_sg(&self.context(dev), sg, dir, Some(attrs));
    }

    fn sync_single_for_cpu(&self, dev: &Device, addr: DmaAddr, size: usize, dir: DmaDirection) {
        self.engine
            .sync_single_for_cpu(&self.context(dev), addr, size, dir);
    }

    fn sync_single_for_device(&self, dev: &Device, addr: DmaAddr, size: usize, dir: DmaDirection) {
        self.engine
            .sync_single_for_device(&self.context(dev), addr, size, dir);
        mb();
    }

    fn sync_sg_for_cpu(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection) {
        self.engine.sync_sg_for_cpu(&self.context(dev), sg, dir);
    }

    fn sync_sg_for_device(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection) {
        self.engine.sync_sg_for_device(&self.context(dev), sg, dir);
        mb();
    }

    fn mapping_error(&self, dev: &Device, addr: DmaAddr) -> bool {
        self.engine.mapping_error(&self.context(dev), addr)
    }

    fn dma_supported(&self, dev: &Device, mask: u64) -> bool {
        self.engine.dma_supported(&self.context(dev), mask)
    }

    fn set_dma_mask(&self, dev: &Device, mask: u64) -> DmaResult {
        if !dev.has_dma_mask() {
            return Err(DmaError::NoMask);
        }
        if !self.dma_supported(dev, mask) {
            return Err(DmaError::Unsupported { mask });
        }

        let max = self.max_dma_mask();
        if mask > max {
            // The device still gets the widest mask we can offer.
            dev.store_dma_mask(max);
            warn!(
                "{}: DMA mask {:#x} exceeds {}-bit platform limit, clamped to {:#x}",
                dev.name(),
                mask,
                self.mask_bits,
                max
            );
            return Err(DmaError::Clamped {
                requested: mask,
                granted: max,
            });
        }

        dev.store_dma_mask(mask);
        debug!("{}: DMA mask set to {:#x}", dev.name(), mask);
        Ok(())
    }

    fn phys_to_dma(&self, _dev: &Device, paddr: PhysAddr) -> DmaAddr {
        self.translation.phys_to_dma(paddr)
    }

    fn dma_to_phys(&self, _dev: &Device, daddr: DmaAddr) -> PhysAddr {
        self.translation.dma_to_phys(daddr)
    }
}
