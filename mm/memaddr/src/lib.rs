#![cfg_attr(not(test), no_std)]

//! Physical addresses and the integer helpers the DMA layer builds on.

mod units;

pub use self::units::PhysAddr;

pub const PAGE_SIZE_4K: u64 = 0x1000;
/// Default page size of Loongson-3 kernels.
pub const PAGE_SIZE_16K: u64 = 0x4000;

pub const SZ_256M: u64 = 0x1000_0000;
pub const SZ_4G: u64 = 0x1_0000_0000;

pub const fn floor_align(addr: u64, align: u64) -> u64 {
    let mask = align - 1;
    addr & !mask
}

pub const fn ceil_align(addr: u64, align: u64) -> u64 {
    let mask = align - 1;
    (addr + mask) & !mask
}

pub const fn align_rem(addr: u64, align: u64) -> u64 {
    addr & (align - 1)
}

pub const fn aligned_to(addr: u64, align: u64) -> bool {
    align_rem(addr, align) == 0
}

/// Returns the mask covering the low `n` address bits.
///
/// `dma_bit_mask(64)` is all ones; `dma_bit_mask(0)` is zero.
pub const fn dma_bit_mask(n: u32) -> u64 {
    if n >= 64 { u64::MAX } else { (1u64 << n) - 1 }
}

pub use align_rem as align_offset;
pub use aligned_to as is_aligned;
pub use ceil_align as align_up;
pub use floor_align as align_down;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_masks() {
        assert_eq!(dma_bit_mask(0), 0);
        assert_eq!(dma_bit_mask(32), 0xffff_ffff);
        assert_eq!(dma_bit_mask(40), 0xff_ffff_ffff);
        assert_eq!(dma_bit_mask(63), u64::MAX >> 1);
        assert_eq!(dma_bit_mask(64), u64::MAX);
    }

    #[test]
    fn alignment() {
        assert_eq!(align_down(0x4123, PAGE_SIZE_16K), 0x4000);
        assert_eq!(align_up(0x4001, PAGE_SIZE_16K), 0x8000);
        assert_eq!(align_offset(0x1008, 16), 8);
        assert!(is_aligned(0x1010, 16));
        assert!(!is_aligned(0x1011, 16));
    }

    #[test]
    fn phys_addr_helpers() {
        let pa = PhysAddr::new(0x9000_4010);
        assert_eq!(pa.align_down(PAGE_SIZE_16K), PhysAddr::new(0x9000_4000));
        assert_eq!(pa.align_offset(PAGE_SIZE_16K), 0x10);
        assert_eq!(pa + 0x10, PhysAddr::new(0x9000_4020));
        assert_eq!(PhysAddr::new(u64::MAX).checked_add(1), None);
        assert_eq!(PhysAddr::new(u64::MAX) + 2, PhysAddr::new(1));
        assert_eq!(format!("{:?}", pa), "PhysAddr(0x90004010)");
    }
}
