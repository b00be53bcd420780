#![cfg_attr(not(test), no_std)]

//! Error codes for the DMA mapping layer.
//!
//! Errors are carried either as a [`KErrorKind`] (positive code) or as a raw
//! [`LinuxError`] (negative code), packed into one [`KError`] word so they can
//! cross the driver boundary as the plain `int` status the callers expect.

use core::fmt;

use linux_raw_sys::errno;
use strum::FromRepr;

/// The error kind type used by the DMA layer.
#[repr(i32)]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, FromRepr)]
pub enum KErrorKind {
    /// Bad internal state.
    BadState = 1,
    /// Invalid parameter/argument.
    InvalidInput,
    /// Input/output error.
    Io,
}

impl KErrorKind {
    /// Returns the error description.
    pub fn as_str(&self) -> &'static str {
        use KErrorKind::*;
        match *self {
            BadState => "Bad internal state",
            InvalidInput => "Invalid input parameter",
            Io => "I/O error",
        }
    }

    /// Returns the error code value in `i32`.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for KErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A Linux `errno` value as reported back to drivers.
///
/// The numbers come from the kernel UAPI headers through `linux-raw-sys`.
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LinuxError(i32);

impl LinuxError {
    /// Bad address.
    pub const EFAULT: Self = Self(errno::EFAULT as i32);
    /// Invalid argument.
    pub const EINVAL: Self = Self(errno::EINVAL as i32);
    /// I/O error.
    pub const EIO: Self = Self(errno::EIO as i32);

    /// Creates a new `LinuxError` from a positive `errno` value.
    pub const fn new(num: i32) -> Self {
        Self(num)
    }

    /// Converts the `LinuxError` into the positive raw value.
    pub const fn into_raw(self) -> i32 {
        self.0
    }

    /// Returns the symbolic name, or `None` for a value this crate never
    /// produces.
    pub fn name(&self) -> Option<&'static str> {
        Some(match *self {
            Self::EFAULT => "EFAULT",
            Self::EINVAL => "EINVAL",
            Self::EIO => "EIO",
            _ => return None,
        })
    }
}

impl fmt::Display for LinuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} {name}", -self.0),
            None => write!(f, "{}", -self.0),
        }
    }
}

impl fmt::Debug for LinuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "LinuxError({})", self.0),
        }
    }
}

impl From<KErrorKind> for LinuxError {
    fn from(e: KErrorKind) -> Self {
        use KErrorKind::*;
        match e {
            BadState => LinuxError::EFAULT,
            InvalidInput => LinuxError::EINVAL,
            Io => LinuxError::EIO,
        }
    }
}

/// The error type used by the DMA layer.
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct KError(i32);

enum KErrorData {
    Kind(KErrorKind),
    Linux(LinuxError),
}

impl KError {
    const fn new_kind(kind: KErrorKind) -> Self {
        KError(kind.code())
    }

    const fn new_linux(e: LinuxError) -> Self {
        KError(-e.into_raw())
    }

    fn data(&self) -> KErrorData {
        if self.0 < 0 {
            KErrorData::Linux(LinuxError::new(-self.0))
        } else {
            KErrorData::Kind(KErrorKind::from_repr(self.0).unwrap_or(KErrorKind::BadState))
        }
    }

    /// Returns the error code value in `i32`.
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Returns the negative Linux `errno` this error reports to a driver.
    pub fn errno(self) -> i32 {
        -LinuxError::from(self).into_raw()
    }
}

impl<E: Into<KErrorKind>> From<E> for KError {
    fn from(e: E) -> Self {
        KError::new_kind(e.into())
    }
}

impl From<LinuxError> for KError {
    fn from(e: LinuxError) -> Self {
        KError::new_linux(e)
    }
}

impl From<KError> for LinuxError {
    fn from(e: KError) -> Self {
        match e.data() {
            KErrorData::Kind(kind) => LinuxError::from(kind),
            KErrorData::Linux(e) => e,
        }
    }
}

impl fmt::Debug for KError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data() {
            KErrorData::Kind(kind) => write!(f, "KErrorKind::{:?}", kind),
            KErrorData::Linux(e) => write!(f, "LinuxError::{:?}", e),
        }
    }
}

impl fmt::Display for KError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data() {
            KErrorData::Kind(kind) => write!(f, "{}", kind),
            KErrorData::Linux(e) => write!(f, "{}", e),
        }
    }
}

macro_rules! kerror_consts {
    ($($name:ident),*) => {
        #[allow(non_upper_case_globals)]
        impl KError {
            $(
                #[doc = concat!("An [`KError`] with kind [`KErrorKind::", stringify!($name), "`].")]
                pub const $name: Self = Self::new_kind(KErrorKind::$name);
            )*
        }
    };
}

kerror_consts!(BadState, InvalidInput, Io);

/// A specialized [`Result`] type with [`KError`] as the error type.
pub type KResult<T = ()> = Result<T, KError>;

/// Constructs a [`KError`] while printing a warning message.
///
/// ```
/// # use kerrno::{k_err_type, KError};
/// assert_eq!(k_err_type!(Io), KError::Io);
/// assert_eq!(k_err_type!(InvalidInput, "zero-width mask"), KError::InvalidInput);
/// ```
#[macro_export]
macro_rules! k_err_type {
    ($err:ident) => {{
        use $crate::KErrorKind::*;
        let err = $crate::KError::from($err);
        $crate::__priv::warn!("[{:?}]", err);
        err
    }};
    ($err:ident, $msg:expr) => {{
        use $crate::KErrorKind::*;
        let err = $crate::KError::from($err);
        $crate::__priv::warn!("[{:?}] {}", err, $msg);
        err
    }};
}

/// Ensure a condition is true. If it is not, return from the function
/// with an error.
#[macro_export]
macro_rules! ensure {
    ($predicate:expr, $context_selector:expr $(,)?) => {
        if !$predicate {
            return $context_selector;
        }
    };
}

/// Constructs an [`Err(KError)`] while printing a warning message.
///
/// [`Err(KError)`]: Err
#[macro_export]
macro_rules! k_err {
    ($err:ident) => {
        Err($crate::k_err_type!($err))
    };
    ($err:ident, $msg:expr) => {
        Err($crate::k_err_type!($err, $msg))
    };
}

#[doc(hidden)]
pub mod __priv {
    pub use log::warn;
}

#[cfg(test)]
mod tests {
    use crate::{KError, KErrorKind, KResult, LinuxError};

    #[test]
    fn kind_codes() {
        assert_eq!(KError::BadState.code(), 1);
        assert_eq!(KError::Io.code(), KErrorKind::Io.code());
        assert_eq!(
            KErrorKind::from_repr(KError::InvalidInput.code()),
            Some(KErrorKind::InvalidInput)
        );
        assert_eq!(KErrorKind::from_repr(0), None);
    }

    #[test]
    fn errno_values() {
        assert_eq!(LinuxError::EIO.into_raw(), 5);
        assert_eq!(LinuxError::EFAULT.into_raw(), 14);
        assert_eq!(LinuxError::EINVAL.into_raw(), 22);
        assert_eq!(LinuxError::EIO.name(), Some("EIO"));
        assert_eq!(LinuxError::new(4095).name(), None);
        assert_eq!(LinuxError::EINVAL.to_string(), "-22 EINVAL");
        assert_eq!(format!("{:?}", LinuxError::new(38)), "LinuxError(38)");
    }

    #[test]
    fn io_reports_eio() {
        assert_eq!(KError::Io.errno(), -5);
        assert_eq!(KError::InvalidInput.errno(), -22);
        assert_eq!(LinuxError::from(KError::Io), LinuxError::EIO);

        let raw = KError::from(LinuxError::new(38));
        assert_eq!(raw.code(), -38);
        assert_eq!(raw.errno(), -38);
        assert_eq!(format!("{:?}", KError::from(LinuxError::EIO)), "LinuxError::EIO");
        assert_eq!(format!("{:?}", KError::Io), "KErrorKind::Io");
    }

    #[test]
    fn ensure_returns_error() {
        fn check(ok: bool) -> KResult<u32> {
            ensure!(ok, k_err!(InvalidInput));
            Ok(1)
        }
        assert_eq!(check(true), Ok(1));
        assert_eq!(check(false), Err(KError::InvalidInput));
    }
}
