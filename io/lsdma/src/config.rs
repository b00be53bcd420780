// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Boot-time system configuration consumed by [`DmaPlatform::setup`].
//!
//! [`DmaPlatform::setup`]: crate::DmaPlatform::setup

use kerrno::{KResult, ensure, k_err};
use memaddr::dma_bit_mask;
use strum::{Display, EnumString, IntoStaticStr};

use crate::consts::{PRID_REV_LOONGSON3A_R2, PRID_REV_MASK};

/// Platform controller hub detected by the firmware.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BoardType {
    Ls2h,
    Ls7a,
    Rs780e,
}

/// What the firmware and CPU probe told us about the system.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SysConf {
    /// Widest DMA address, in bits, any device may be granted.
    pub dma_mask_bits: u32,
    /// The PCH board type, if a PCH was found.
    pub board: Option<BoardType>,
    /// Processor revision id (`PRId` register).
    pub prid: u32,
}

impl SysConf {
    pub const fn new() -> Self {
        Self {
            dma_mask_bits: 64,
            board: None,
            prid: 0,
        }
    }

    pub const fn with_dma_mask_bits(mut self, bits: u32) -> Self {
        self.dma_mask_bits = bits;
        self
    }

    pub const fn with_board(mut self, board: BoardType) -> Self {
        self.board = Some(board);
        self
    }

    pub const fn with_prid(mut self, prid: u32) -> Self {
        self.prid = prid;
        self
    }

    /// Sets the board from the name the firmware reports, e.g. `"LS2H"`.
    ///
    /// An empty name means no PCH was detected.
    pub fn with_board_name(mut self, name: &str) -> KResult<Self> {
        if name.is_empty() {
            self.board = None;
            return Ok(self);
        }
        match name.parse::<BoardType>() {
            Ok(board) => {
                self.board = Some(board);
                Ok(self)
            }
            Err(_) => k_err!(InvalidInput, "unknown PCH board type"),
        }
    }

    /// The largest mask a device may be granted.
    pub const fn max_dma_mask(&self) -> u64 {
        dma_bit_mask(self.dma_mask_bits)
    }

    /// Whether the CPU is a Loongson-3A revision 2.
    pub const fn is_loongson3a_r2(&self) -> bool {
        self.prid & PRID_REV_MASK == PRID_REV_LOONGSON3A_R2
    }

    pub fn validate(&self) -> KResult {
        ensure!(
            (1..=64).contains(&self.dma_mask_bits),
            k_err!(InvalidInput, "dma_mask_bits must be within 1..=64")
        );
        Ok(())
    }
}

impl Default for SysConf {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use kerrno::KError;

    use super::*;

    #[test]
    fn board_names() {
        assert_eq!("ls2h".parse::<BoardType>(), Ok(BoardType::Ls2h));
        assert_eq!("LS7A".parse::<BoardType>(), Ok(BoardType::Ls7a));
        assert_eq!(BoardType::Rs780e.to_string(), "rs780e");
        let name: &'static str = BoardType::Ls2h.into();
        assert_eq!(name, "ls2h");
    }

    #[test]
    fn board_from_firmware_name() {
        let conf = SysConf::new().with_board_name("Ls2h").unwrap();
        assert_eq!(conf.board, Some(BoardType::Ls2h));
        let conf = conf.with_board_name("").unwrap();
        assert_eq!(conf.board, None);
        assert_eq!(
            SysConf::new().with_board_name("bonito"),
            Err(KError::InvalidInput)
        );
    }

    #[test]
    fn mask_bits() {
        assert_eq!(SysConf::new().max_dma_mask(), u64::MAX);
        assert_eq!(
            SysConf::new().with_dma_mask_bits(40).max_dma_mask(),
            0xff_ffff_ffff
        );
        assert!(SysConf::new().with_dma_mask_bits(0).validate().is_err());
        assert!(SysConf::new().with_dma_mask_bits(65).validate().is_err());
        assert!(SysConf::new().with_dma_mask_bits(32).validate().is_ok());
    }

    #[test]
    fn cpu_revision() {
        assert!(SysConf::new().with_prid(0x6308).is_loongson3a_r2());
        assert!(!SysConf::new().with_prid(0x6305).is_loongson3a_r2());
    }
}
