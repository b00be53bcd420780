// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! A recording stand-in for the software I/O TLB.

#![allow(dead_code)]

use std::{
    ptr::NonNull,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use lsdma::{
    DmaAddr, DmaAttrs, DmaContext, DmaDirection, DmaInfo, DmaPlatform, GfpFlags, PhysAddr,
    ScatterEntry, SwiotlbEngine, SysConf,
};

/// Bounce pool placement; below 256M so both transforms map it 1:1.
pub const POOL_BASE: u64 = 0x0400_0000;
pub const POOL_END: u64 = 0x0800_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init {
        verbose: bool,
    },
    Alloc {
        size: usize,
        gfp: GfpFlags,
    },
    Free {
        size: usize,
        dma_addr: DmaAddr,
    },
    MapPage {
        page: PhysAddr,
        offset: u64,
        size: usize,
        dir: DmaDirection,
        attrs: Option<DmaAttrs>,
        bounced: bool,
    },
    UnmapPage {
        addr: DmaAddr,
        size: usize,
        attrs: Option<DmaAttrs>,
    },
    MapSg {
        nents: usize,
        attrs: Option<DmaAttrs>,
    },
    UnmapSg {
        nents: usize,
        attrs: Option<DmaAttrs>,
    },
    SyncSingleForCpu {
        addr: DmaAddr,
        size: usize,
    },
    SyncSingleForDevice {
        addr: DmaAddr,
        size: usize,
    },
    SyncSgForCpu {
        nents: usize,
    },
    SyncSgForDevice {
        nents: usize,
    },
}

#[derive(Default)]
pub struct MockEngine {
    calls: Mutex<Vec<Call>>,
    fail_alloc: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub fn fail_allocations(&self, fail: bool) {
        self.fail_alloc.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Device address of the bounce slot used for `size` bytes.
    fn bounce(&self, ctx: &DmaContext<'_>, size: usize) -> DmaAddr {
        let daddr = ctx.phys_to_dma(PhysAddr::new(POOL_BASE));
        if ctx.dma_capable(daddr, size as u64) {
            daddr
        } else {
            DmaAddr::ERROR
        }
    }
}

impl SwiotlbEngine for MockEngine {
    fn init(&self, verbose: bool) {
        self.record(Call::Init { verbose });
    }

    fn alloc_coherent(&self, ctx: &DmaContext<'_>, size: usize, gfp: GfpFlags) -> Option<DmaInfo> {
        self.record(Call::Alloc { size, gfp });
        if self.fail_alloc.load(Ordering::SeqCst) {
            return None;
        }
        Some(DmaInfo {
            cpu_addr: NonNull::dangling(),
            dma_addr: ctx.phys_to_dma(PhysAddr::new(POOL_BASE)),
        })
    }

    fn free_coherent(&self, _ctx: &DmaContext<'_>, size: usize, info: DmaInfo) {
        self.record(Call::Free {
            size,
            dma_addr: info.dma_addr,
        });
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
        let direct = ctx.phys_to_dma(page + offset);
        let bounced = direct.is_error() || !ctx.dma_capable(direct, size as u64);
        self.record(Call::MapPage {
            page,
            offset,
            size,
            dir,
            attrs,
            bounced,
        });
        if bounced {
            self.bounce(ctx, size)
        } else {
            direct
        }
    }

    fn unmap_page(
        &self,
        _ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        _dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) {
        self.record(Call::UnmapPage { addr, size, attrs });
    }

    fn map_sg(
        &self,
        ctx: &DmaContext<'_>,
        sg: &mut [ScatterEntry],
        _dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) -> usize {
        self.record(Call::MapSg {
            nents: sg.len(),
            attrs,
        });
        for ent in sg.iter_mut() {
            let direct = ctx.phys_to_dma(ent.phys());
            ent.dma_address = if ctx.dma_capable(direct, ent.length) {
                direct
            } else {
                self.bounce(ctx, ent.length as usize)
            };
            ent.dma_length = ent.length;
            if ent.dma_address.is_error() {
                return 0;
            }
        }
        sg.len()
    }

    fn unmap_sg(
        &self,
        _ctx: &DmaContext<'_>,
        sg: &mut [ScatterEntry],
        _dir: DmaDirection,
        attrs: Option<DmaAttrs>,
    ) {
        self.record(Call::UnmapSg {
            nents: sg.len(),
            attrs,
        });
    }

    fn sync_single_for_cpu(
        &self,
        _ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        _dir: DmaDirection,
    ) {
        self.record(Call::SyncSingleForCpu { addr, size });
    }

    fn sync_single_for_device(
        &self,
        _ctx: &DmaContext<'_>,
        addr: DmaAddr,
        size: usize,
        _dir: DmaDirection,
    ) {
        self.record(Call::SyncSingleForDevice { addr, size });
    }

    fn sync_sg_for_cpu(&self, _ctx: &DmaContext<'_>, sg: &mut [ScatterEntry], _dir: DmaDirection) {
        self.record(Call::SyncSgForCpu { nents: sg.len() });
    }

    fn sync_sg_for_device(
        &self,
        _ctx: &DmaContext<'_>,
        sg: &mut [ScatterEntry],
        _dir: DmaDirection,
    ) {
        self.record(Call::SyncSgForDevice { nents: sg.len() });
    }

    fn mapping_error(&self, _ctx: &DmaContext<'_>, addr: DmaAddr) -> bool {
        addr.is_error()
    }

    fn dma_supported(&self, ctx: &DmaContext<'_>, mask: u64) -> bool {
        ctx.phys_to_dma(PhysAddr::new(POOL_END - 1)).as_u64() <= mask
    }
}

/// Sets up a platform over a fresh mock engine. The engine's call log starts
/// out empty.
pub fn platform(conf: SysConf) -> (DmaPlatform<Arc<MockEngine>>, Arc<MockEngine>) {
    let engine = MockEngine::new();
    let plat = DmaPlatform::setup(engine.clone(), conf).unwrap();
    assert_eq!(engine.take_calls(), [Call::Init { verbose: true }]);
    (plat, engine)
}
