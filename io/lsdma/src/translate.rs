// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Physical <-> DMA address transforms.
//!
//! Each bridge family gets a pair of pure integer formulas. They are wrapped
//! by [`AddressTranslation`] implementors so the operation table can carry the
//! selected pair as a plain `Copy` value.

use enum_dispatch::enum_dispatch;
use memaddr::PhysAddr;

use crate::{
    DmaAddr,
    config::BoardType,
    consts::{
        DMA_MAPPING_ERROR, LS2H_DMA_HIGH_MEM_START, NODE_ID_HT40_SHIFT, NODE_ID_MASK,
        NODE_ID_PHYS_SHIFT, SZ_4G, SZ_256M,
    },
};

/// LS2H: physical to DMA address.
///
/// The low 256M is mapped 1:1. Everything else is seen by the device
/// [`LS2H_DMA_HIGH_MEM_START`] lower. The result must fit below 4G, otherwise
/// [`DMA_MAPPING_ERROR`] is returned.
pub const fn ls2h_phys_to_dma(paddr: u64) -> u64 {
    let daddr = if paddr < SZ_256M {
        paddr
    } else {
        paddr.wrapping_sub(LS2H_DMA_HIGH_MEM_START)
    };
    if daddr < SZ_4G { daddr } else { DMA_MAPPING_ERROR }
}

/// LS2H: DMA to physical address.
pub const fn ls2h_dma_to_phys(daddr: u64) -> u64 {
    if daddr < SZ_256M {
        daddr
    } else {
        daddr.wrapping_add(LS2H_DMA_HIGH_MEM_START)
    }
}

/// Moves the node id from bits 44..=45 of a 48-bit physical address down to
/// bits 37..=38, giving the 40-bit address a HyperTransport device can emit.
pub const fn phys48_to_ht40(paddr: u64) -> u64 {
    let nid = (paddr >> NODE_ID_PHYS_SHIFT) & NODE_ID_MASK;
    ((nid << NODE_ID_PHYS_SHIFT) ^ paddr) | (nid << NODE_ID_HT40_SHIFT)
}

/// Inverse of [`phys48_to_ht40`].
pub const fn ht40_to_phys48(daddr: u64) -> u64 {
    let nid = (daddr >> NODE_ID_HT40_SHIFT) & NODE_ID_MASK;
    ((nid << NODE_ID_HT40_SHIFT) ^ daddr) | (nid << NODE_ID_PHYS_SHIFT)
}

/// Whether `paddr` survives [`phys48_to_ht40`] followed by
/// [`ht40_to_phys48`] unchanged.
///
/// Node-local offsets must leave bits 37..=38 clear, which holds for every
/// node with less than 128G of memory.
pub const fn ht40_representable(paddr: u64) -> bool {
    paddr & (NODE_ID_MASK << NODE_ID_HT40_SHIFT) == 0
}

/// RS780: physical to DMA address. Identity unless `phys48-to-ht40` is on.
pub const fn rs780_phys_to_dma(paddr: u64) -> u64 {
    if cfg!(feature = "phys48-to-ht40") {
        phys48_to_ht40(paddr)
    } else {
        paddr
    }
}

/// RS780: DMA to physical address. Identity unless `phys48-to-ht40` is on.
pub const fn rs780_dma_to_phys(daddr: u64) -> u64 {
    if cfg!(feature = "phys48-to-ht40") {
        ht40_to_phys48(daddr)
    } else {
        daddr
    }
}

/// A physical <-> DMA transform pair.
#[enum_dispatch]
pub trait AddressTranslation {
    /// Converts a CPU physical address to the address a device must use.
    fn phys_to_dma(&self, paddr: PhysAddr) -> DmaAddr;

    /// Converts a device address back to the CPU physical address.
    fn dma_to_phys(&self, daddr: DmaAddr) -> PhysAddr;
}

/// Node-interleave transform used by RS780/LS7A bridges.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rs780Translation;

impl AddressTranslation for Rs780Translation {
    fn phys_to_dma(&self, paddr: PhysAddr) -> DmaAddr {
        DmaAddr::new(rs780_phys_to_dma(paddr.as_u64()))
    }

    fn dma_to_phys(&self, daddr: DmaAddr) -> PhysAddr {
        PhysAddr::new(rs780_dma_to_phys(daddr.as_u64()))
    }
}

/// Windowed remap used by the LS2H bridge.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Ls2hTranslation;

impl AddressTranslation for Ls2hTranslation {
    fn phys_to_dma(&self, paddr: PhysAddr) -> DmaAddr {
        DmaAddr::new(ls2h_phys_to_dma(paddr.as_u64()))
    }

    fn dma_to_phys(&self, daddr: DmaAddr) -> PhysAddr {
        PhysAddr::new(ls2h_dma_to_phys(daddr.as_u64()))
    }
}

/// The transform pair selected at boot.
#[enum_dispatch(AddressTranslation)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Translation {
    Rs780(Rs780Translation),
    Ls2h(Ls2hTranslation),
}

impl Translation {
    /// Picks the transform for the detected PCH board.
    ///
    /// Only LS2H remaps its window; every other bridge, and the case where no
    /// PCH was detected, uses the RS780 formulas.
    pub fn for_board(board: Option<BoardType>) -> Self {
        match board {
            Some(BoardType::Ls2h) => Ls2hTranslation.into(),
            _ => Rs780Translation.into(),
        }
    }

    /// Short name used in boot messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Translation::Rs780(_) => "rs780",
            Translation::Ls2h(_) => "ls2h",
        }
    }
}

impl Default for Translation {
    fn default() -> Self {
        Rs780Translation.into()
    }
}
