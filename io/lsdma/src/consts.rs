// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Address-space constants of the supported bridges.

pub use memaddr::{SZ_4G, SZ_256M};

/// All-ones value returned for addresses a device cannot be given.
pub const DMA_MAPPING_ERROR: u64 = u64::MAX;

/// Start of the LS2H high-memory window; DMA addresses above 256M are offset
/// by this amount.
pub const LS2H_DMA_HIGH_MEM_START: u64 = 0x8000_0000;

/// In-page alignment below which a mapping needs the device's DMA attributes.
pub const PCIE_DMA_ALIGN: u64 = 16;

/// Page size used to split single buffers into page + offset.
pub const PAGE_SIZE: u64 = memaddr::PAGE_SIZE_16K;

/// Lowest bit of the node id in a 48-bit physical address.
pub const NODE_ID_PHYS_SHIFT: u32 = 44;
/// Lowest bit of the node id once folded into a 40-bit HT address.
pub const NODE_ID_HT40_SHIFT: u32 = 37;
/// Width mask of the node id field; only nodes 0..=3 are wired.
pub const NODE_ID_MASK: u64 = 0x3;

/// DMA start address of node 3 on 3A-R2 four-way boards.
pub const LOONGSON3A_R2_DMA_HOLE: u64 = 0x0000_0060_0000_0000;

pub const PRID_REV_MASK: u32 = 0x00ff;
pub const PRID_REV_LOONGSON3A_R2: u32 = 0x0008;
