// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! The capability gate: can a device reach a buffer without bouncing?

use crate::{DmaAddr, config::SysConf, consts::LOONGSON3A_R2_DMA_HOLE};

/// Hardware defects that shrink the range a device may be given.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DmaQuirks {
    /// Node 3 memory of 3A-R2 four-way boards is unusable for DMA; anything
    /// reaching [`LOONGSON3A_R2_DMA_HOLE`] must be bounced.
    pub r2_dma_hole: bool,
}

impl DmaQuirks {
    pub const NONE: Self = Self { r2_dma_hole: false };

    pub fn detect(conf: &SysConf) -> Self {
        Self {
            r2_dma_hole: has_r2_dma_hole(conf),
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "loongson3")] {
        fn has_r2_dma_hole(conf: &SysConf) -> bool {
            conf.is_loongson3a_r2()
        }
    } else {
        fn has_r2_dma_hole(_conf: &SysConf) -> bool {
            false
        }
    }
}

/// Whether a device with `mask` can address `size` bytes at `addr`.
///
/// A device without a mask can address nothing. The buffer end is compared
/// as `addr + size <= mask`; an end that overflows is never capable.
pub fn dma_capable(mask: Option<u64>, addr: DmaAddr, size: u64, quirks: DmaQuirks) -> bool {
    let Some(mask) = mask else {
        return false;
    };
    let Some(end) = addr.as_u64().checked_add(size) else {
        return false;
    };
    if quirks.r2_dma_hole && end >= LOONGSON3A_R2_DMA_HOLE {
        return false;
    }
    end <= mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_mask_is_never_capable() {
        assert!(!dma_capable(None, DmaAddr::new(0), 0, DmaQuirks::NONE));
        assert!(!dma_capable(None, DmaAddr::new(0x1000), 1, DmaQuirks::NONE));
    }

    #[test]
    fn end_compared_against_mask() {
        let mask = Some(0xffff_ffff);
        assert!(dma_capable(mask, DmaAddr::new(0xffff_f000), 0xfff, DmaQuirks::NONE));
        assert!(!dma_capable(mask, DmaAddr::new(0xffff_f000), 0x1000, DmaQuirks::NONE));
        assert!(!dma_capable(Some(u64::MAX), DmaAddr::new(u64::MAX), 2, DmaQuirks::NONE));
    }

    #[test]
    fn r2_hole() {
        let quirks = DmaQuirks { r2_dma_hole: true };
        let mask = Some(u64::MAX);
        assert!(dma_capable(mask, DmaAddr::new(0x5f_ffff_f000), 0x800, quirks));
        assert!(!dma_capable(mask, DmaAddr::new(0x5f_ffff_f000), 0x1000, quirks));
        assert!(dma_capable(mask, DmaAddr::new(0x5f_ffff_f000), 0x1000, DmaQuirks::NONE));
    }

    #[test]
    #[cfg(feature = "loongson3")]
    fn detect_from_prid() {
        let conf = SysConf::new().with_prid(0x6308);
        assert!(DmaQuirks::detect(&conf).r2_dma_hole);
        assert_eq!(DmaQuirks::detect(&SysConf::new()), DmaQuirks::NONE);
    }
}
