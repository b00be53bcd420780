// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Boot-time selection of the DMA strategy and the driver-facing entry points.

use alloc::sync::Arc;

use kerrno::KResult;
use memaddr::PhysAddr;

use crate::{
    DmaAddr, DmaInfo,
    config::SysConf,
    consts::PAGE_SIZE,
    device::{Device, DmaAttrs, DmaDirection},
    engine::{ScatterEntry, SwiotlbEngine},
    error::{DmaError, DmaResult},
    gfp::GfpFlags,
    mask::{DmaQuirks, dma_capable},
    ops::{DmaMapOps, LoongsonDmaOps},
    translate::Translation,
};

/// The DMA configuration of a running system.
///
/// Built once by [`DmaPlatform::setup`] before any driver maps memory and
/// never changed afterwards; drivers share it by reference.
pub struct DmaPlatform<E> {
    ops: Arc<LoongsonDmaOps<E>>,
    conf: SysConf,
}

impl<E: SwiotlbEngine + 'static> DmaPlatform<E> {
    /// Brings up DMA for the platform.
    ///
    /// Initializes the bounce-buffer engine, installs the Loongson operation
    /// table with the RS780 transforms, and switches to the LS2H transforms
    /// when that bridge was detected.
    pub fn setup(engine: E, conf: SysConf) -> KResult<Self> {
        conf.validate()?;
        engine.init(true);

        let translation = Translation::for_board(conf.board);
        let quirks = DmaQuirks::detect(&conf);
        info!(
            "swiotlb: board {}, {} address translation, {}-bit DMA limit",
            conf.board.map_or("none", Into::into),
            translation.name(),
            conf.dma_mask_bits,
        );
        if quirks.r2_dma_hole {
            info!("swiotlb: bouncing DMA at or above node 3 (3A-R2)");
        }

        let ops = LoongsonDmaOps::new(engine, translation, quirks, conf.dma_mask_bits);
        Ok(Self {
            ops: Arc::new(ops),
            conf,
        })
    }

    pub fn sysconf(&self) -> &SysConf {
        &self.conf
    }

    /// The platform operation table.
    pub fn default_ops(&self) -> &LoongsonDmaOps<E> {
        &self.ops
    }

    /// The platform operation table as a shareable trait object, e.g. to
    /// install on a device explicitly.
    pub fn default_ops_arc(&self) -> Arc<dyn DmaMapOps> {
        self.ops.clone()
    }

    pub fn translation(&self) -> Translation {
        self.ops.translation()
    }

    /// The table a device is driven through: its own if it has one,
    /// otherwise the platform default.
    pub fn get_dma_ops<'a>(&'a self, dev: &'a Device) -> &'a dyn DmaMapOps {
        match dev.archdata.dma_ops.as_deref() {
            Some(ops) => ops,
            None => &*self.ops,
        }
    }

    pub fn phys_to_dma(&self, dev: &Device, paddr: PhysAddr) -> DmaAddr {
        self.get_dma_ops(dev).phys_to_dma(dev, paddr)
    }

    pub fn dma_to_phys(&self, dev: &Device, daddr: DmaAddr) -> PhysAddr {
        self.get_dma_ops(dev).dma_to_phys(dev, daddr)
    }

    /// Whether `dev` can reach `size` bytes at `addr` without bouncing.
    pub fn dma_capable(&self, dev: &Device, addr: DmaAddr, size: u64) -> bool {
        dma_capable(dev.dma_mask(), addr, size, self.ops.quirks())
    }

    pub fn alloc_coherent(&self, dev: &Device, size: usize, gfp: GfpFlags) -> Option<DmaInfo> {
        self.get_dma_ops(dev)
            .alloc(dev, size, gfp, DmaAttrs::empty())
    }

    pub fn free_coherent(&self, dev: &Device, size: usize, info: DmaInfo) {
        self.get_dma_ops(dev)
            .free(dev, size, info, DmaAttrs::empty());
    }

    pub fn map_page(
        &self,
        dev: &Device,
        page: PhysAddr,
        offset: u64,
        size: usize,
        dir: DmaDirection,
    ) -> DmaAddr {
        self.get_dma_ops(dev)
            .map_page(dev, page, offset, size, dir, DmaAttrs::empty())
    }

    pub fn unmap_page(&self, dev: &Device, addr: DmaAddr, size: usize, dir: DmaDirection) {
        self.get_dma_ops(dev)
            .unmap_page(dev, addr, size, dir, DmaAttrs::empty());
    }

    /// Maps a physically contiguous buffer starting at `paddr`.
    pub fn map_single(
        &self,
        dev: &Device,
        paddr: PhysAddr,
        size: usize,
        dir: DmaDirection,
    ) -> DmaAddr {
        let page = paddr.align_down(PAGE_SIZE);
        let offset = paddr.align_offset(PAGE_SIZE);
        self.map_page(dev, page, offset, size, dir)
    }

    pub fn unmap_single(&self, dev: &Device, addr: DmaAddr, size: usize, dir: DmaDirection) {
        self.unmap_page(dev, addr, size, dir);
    }

    pub fn map_sg(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection) -> usize {
        self.get_dma_ops(dev)
            .map_sg(dev, sg, dir, DmaAttrs::empty())
    }

    pub fn unmap_sg(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection) {
        self.get_dma_ops(dev)
            .unmap_sg(dev, sg, dir, DmaAttrs::empty());
    }

    pub fn sync_single_for_cpu(&self, dev: &Device, addr: DmaAddr, size: usize, dir: DmaDirection) {
        self.get_dma_ops(dev)
            .sync_single_for_cpu(dev, addr, size, dir);
    }

    pub fn sync_single_for_device(
        &self,
        dev: &Device,
        addr: DmaAddr,
        size: usize,
        dir: DmaDirection,
    ) {
        self.get_dma_ops(dev)
            .sync_single_for_device(dev, addr, size, dir);
    }

    pub fn sync_sg_for_cpu(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection) {
        self.get_dma_ops(dev).sync_sg_for_cpu(dev, sg, dir);
    }

    pub fn sync_sg_for_device(&self, dev: &Device, sg: &mut [ScatterEntry], dir: DmaDirection) {
        self.get_dma_ops(dev).sync_sg_for_device(dev, sg, dir);
    }

    pub fn mapping_error(&self, dev: &Device, addr: DmaAddr) -> bool {
        self.get_dma_ops(dev).mapping_error(dev, addr)
    }

    pub fn dma_supported(&self, dev: &Device, mask: u64) -> bool {
        self.get_dma_ops(dev).dma_supported(dev, mask)
    }

    /// Negotiates the streaming mask of `dev`.
    ///
    /// On [`DmaError::Clamped`] the device mask has already been lowered to
    /// the platform maximum.
    pub fn set_dma_mask(&self, dev: &Device, mask: u64) -> DmaResult {
        self.get_dma_ops(dev).set_dma_mask(dev, mask)
    }

    /// Sets the mask used for coherent allocations.
    pub fn set_coherent_mask(&self, dev: &Device, mask: u64) -> DmaResult {
        if !self.dma_supported(dev, mask) {
            return Err(DmaError::Unsupported { mask });
        }
        dev.store_coherent_dma_mask(mask);
        Ok(())
    }

    /// Sets both masks. The coherent mask is only touched if the streaming
    /// mask was accepted as is.
    pub fn set_mask_and_coherent(&self, dev: &Device, mask: u64) -> DmaResult {
        self.set_dma_mask(dev, mask)?;
        self.set_coherent_mask(dev, mask)
    }

    /// Caches are coherent with DMA on Loongson-3; nothing to clean.
    pub fn dma_mark_clean(&self, _paddr: PhysAddr, _size: usize) {}
}
