mod addr;

pub use self::addr::PhysAddr;
