//! An implementation of SMPTE ST 2064-1 content fingerprinting: per-frame video
//! motion fingerprints and per-window audio fingerprints, packed into a
//! checksummed encapsulation container suitable for out-of-band transport
//! alongside the essence it describes.
//!
//! ```
//! use smpte2064::{Colorspace, Context};
//!
//! let mut ctx = Context::alloc(Colorspace::Yuv420p, true, 1280, 720, 8).unwrap();
//! let frame = vec![128u8; 1280 * 720];
//! for _ in 0..3 {
//!     ctx.video_push(&frame).unwrap();
//! }
//! let mut buf = [0u8; 256];
//! let used = ctx.pack(&mut buf).unwrap();
//! assert!(used >= 11);
//! ```

#![deny(missing_docs)]

mod audio;
mod bitstream;
mod container;
mod context;
mod csc;
mod error;
mod tables;
mod video;

pub use audio::AudioType;
pub use context::{Colorspace, Context};
pub use csc::v210_unpack_to_8b;
pub use error::{Error, Result};
pub use tables::picture_rate_code;
