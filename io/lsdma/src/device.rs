// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! The per-device state this layer reads and writes.

use alloc::{string::String, sync::Arc};
use core::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use bitflags::bitflags;
use memaddr::dma_bit_mask;

use crate::ops::DmaMapOps;

bitflags! {
    /// Attributes passed to the bounce-buffer engine with a mapping.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct DmaAttrs: u32 {
        const WRITE_BARRIER = 1 << 0;
        const WEAK_ORDERING = 1 << 1;
        const WRITE_COMBINE = 1 << 2;
        /// The buffer may share cache lines with unrelated data.
        const NON_CONSISTENT = 1 << 3;
        const NO_KERNEL_MAPPING = 1 << 4;
        const SKIP_CPU_SYNC = 1 << 5;
        const FORCE_CONTIGUOUS = 1 << 6;
        const ALLOC_SINGLE_PAGES = 1 << 7;
    }
}

/// Direction of a streaming DMA transfer.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmaDirection {
    Bidirectional = 0,
    ToDevice = 1,
    FromDevice = 2,
    None = 3,
}

/// Architecture specific part of a device.
#[derive(Default)]
pub struct ArchData {
    /// Operation table overriding the platform default for this device.
    pub dma_ops: Option<Arc<dyn DmaMapOps>>,
    /// Attributes handed to the engine for maps that need stricter handling.
    pub dma_attrs: DmaAttrs,
}

/// A device doing DMA.
///
/// The streaming mask is written only by the owning driver (through
/// [`DmaMapOps::set_dma_mask`]) but may be read from any CPU, so it lives in
/// an atomic.
pub struct Device {
    name: String,
    dma_mask: Option<AtomicU64>,
    coherent_dma_mask: AtomicU64,
    pub archdata: ArchData,
}

impl Device {
    /// Creates a device with no streaming mask and the 32-bit coherent mask a
    /// PCI function starts with.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dma_mask: None,
            coherent_dma_mask: AtomicU64::new(dma_bit_mask(32)),
            archdata: ArchData::default(),
        }
    }

    pub fn with_dma_mask(mut self, mask: u64) -> Self {
        self.dma_mask = Some(AtomicU64::new(mask));
        self
    }

    pub fn with_coherent_dma_mask(self, mask: u64) -> Self {
        self.coherent_dma_mask.store(mask, Ordering::Relaxed);
        self
    }

    pub fn with_dma_attrs(mut self, attrs: DmaAttrs) -> Self {
        self.archdata.dma_attrs = attrs;
        self
    }

    pub fn with_dma_ops(mut self, ops: Arc<dyn DmaMapOps>) -> Self {
        self.archdata.dma_ops = Some(ops);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The streaming DMA mask, or `None` if the bus never configured one.
    pub fn dma_mask(&self) -> Option<u64> {
        self.dma_mask.as_ref().map(|m| m.load(Ordering::Acquire))
    }

    pub fn has_dma_mask(&self) -> bool {
        self.dma_mask.is_some()
    }

    /// Stores a new streaming mask. Returns `false` if the device has none.
    pub(crate) fn store_dma_mask(&self, mask: u64) -> bool {
        match &self.dma_mask {
            Some(m) => {
                m.store(mask, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn coherent_dma_mask(&self) -> u64 {
        self.coherent_dma_mask.load(Ordering::Acquire)
    }

    pub(crate) fn store_coherent_dma_mask(&self, mask: u64) {
        self.coherent_dma_mask.store(mask, Ordering::Release);
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Device");
        d.field("name", &self.name);
        match self.dma_mask() {
            Some(mask) => d.field("dma_mask", &format_args!("{:#x}", mask)),
            None => d.field("dma_mask", &"none"),
        };
        let coherent = self.coherent_dma_mask();
        d.field("coherent_dma_mask", &format_args!("{:#x}", coherent))
            .field("dma_attrs", &self.archdata.dma_attrs)
            .field("dma_ops", &self.archdata.dma_ops.is_some())
            .finish()
    }
}
