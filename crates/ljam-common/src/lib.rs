//! Common utilities for ljam.
//!
//! This crate provides the foundational types every ljam crate parses through:
//!
//! - [`ByteView`] - Zero-copy, bounds-checked window into a shared buffer
//! - [`ByteViewMut`] - Exclusive, writable window for building output
//! - [`ByteRead`] - Little-endian reads shared by both view types
//! - [`BitFlags`] - One byte addressed as eight flags

mod bits;
mod error;
mod view;

pub use bits::BitFlags;
pub use error::{Error, Result};
pub use view::{check_bounds, ByteRead, ByteView, ByteViewMut};
