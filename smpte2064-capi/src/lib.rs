#![deny(missing_docs)]

//! A C library that wraps [smpte2064].
//!
//! # Example
//!
//! ```c
//! #include <stdio.h>
//! #include <smpte2064.h>
//!
//! void main() {
//!     Smpte2064Error err;
//!     Smpte2064Context *ctx = NULL;
//!
//!     err = smpte2064_context_alloc(&ctx, SMPTE2064_COLORSPACE_YUV420P, true, 1280, 720, 8);
//!     if (err != 0) {
//!         printf("Failed to allocate context: %s\n", smpte2064_error_to_str(err));
//!         return;
//!     }
//!
//!     err = smpte2064_video_push(ctx, lumaplane);
//!     if (err != 0) {
//!         printf("Failed to push video frame: %s\n", smpte2064_error_to_str(err));
//!         goto done;
//!     }
//!
//!     uint8_t section[512];
//!     size_t used = 0;
//!     err = smpte2064_encapsulation_pack(ctx, section, sizeof(section), &used);
//!     if (err != 0) {
//!         printf("Failed to pack container: %s\n", smpte2064_error_to_str(err));
//!     }
//!
//!     done:
//!     smpte2064_context_free(ctx);
//! }
//! ```

use std::ffi::CStr;
use std::fmt::Display;

use smpte2064::{AudioType, Colorspace, Context};

/// C error code that extends [smpte2064::Error] with the handle-validity and
/// buffer-capacity failures that only arise at the FFI boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smpte2064Error {
    /// No error.
    Ok = 0,
    /// One or more pointer arguments passed into the function were NULL.
    NullArgument,
    /// One or more arguments were invalid (unsupported geometry, bad audio type, etc.).
    InvalidArgument,
    /// The requested geometry or frame rate is not present in the format tables.
    FormatUnsupported,
    /// An allocation was rejected before it was attempted.
    OutOfMemory,
    /// `smpte2064_encapsulation_pack` was called before three video frames had
    /// been pushed.
    NoData,
    /// Unknown error.
    Unknown,
}

impl Display for Smpte2064Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Smpte2064Error::Ok => "No error",
            Smpte2064Error::NullArgument => "Input argument is NULL",
            Smpte2064Error::InvalidArgument => "One or more input arguments were invalid",
            Smpte2064Error::FormatUnsupported => "Geometry or frame rate is not supported",
            Smpte2064Error::OutOfMemory => "Allocation was rejected",
            Smpte2064Error::NoData => "No fingerprint data available yet",
            Smpte2064Error::Unknown => "Unknown error occurred",
        };
        write!(f, "{msg}")
    }
}

impl From<smpte2064::Error> for Smpte2064Error {
    fn from(err: smpte2064::Error) -> Self {
        use Smpte2064Error::*;
        match err {
            smpte2064::Error::InvalidArgument(_) => InvalidArgument,
            smpte2064::Error::OutOfMemory(_) => OutOfMemory,
            smpte2064::Error::NoData => NoData,
            smpte2064::Error::FormatUnsupported(_) => FormatUnsupported,
        }
    }
}

/// Returns the string representation of the given [Smpte2064Error].
///
/// The returned pointer is `'static` and must not be freed by the caller.
#[no_mangle]
pub extern "C" fn smpte2064_error_to_str(error: Smpte2064Error) -> *const libc::c_char {
    match error {
        Smpte2064Error::Ok => unsafe {
            CStr::from_bytes_with_nul_unchecked(b"No error\0").as_ptr()
        },
        Smpte2064Error::NullArgument => unsafe {
            CStr::from_bytes_with_nul_unchecked(b"Input argument is NULL\0").as_ptr()
        },
        Smpte2064Error::InvalidArgument => unsafe {
            CStr::from_bytes_with_nul_unchecked(b"One or more input arguments were invalid\0").as_ptr()
        },
        Smpte2064Error::FormatUnsupported => unsafe {
            CStr::from_bytes_with_nul_unchecked(b"Geometry or frame rate is not supported\0").as_ptr()
        },
        Smpte2064Error::OutOfMemory => unsafe {
            CStr::from_bytes_with_nul_unchecked(b"Allocation was rejected\0").as_ptr()
        },
        Smpte2064Error::NoData => unsafe {
            CStr::from_bytes_with_nul_unchecked(b"No fingerprint data available yet\0").as_ptr()
        },
        Smpte2064Error::Unknown => unsafe {
            CStr::from_bytes_with_nul_unchecked(b"Unknown error occurred\0").as_ptr()
        },
    }
}

/// C-ABI colorspace tag, mirroring [smpte2064::Colorspace].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub enum Smpte2064Colorspace {
    /// Planar 8-bit 4:2:0.
    Yuv420p = 0,
    /// Packed 10-bit 4:2:2.
    V210 = 1,
}

impl From<Smpte2064Colorspace> for Colorspace {
    fn from(c: Smpte2064Colorspace) -> Self {
        match c {
            Smpte2064Colorspace::Yuv420p => Colorspace::Yuv420p,
            Smpte2064Colorspace::V210 => Colorspace::V210,
        }
    }
}

/// C-ABI audio type tag, mirroring [smpte2064::AudioType].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub enum Smpte2064AudioType {
    /// Two planes of signed 16-bit PCM.
    StereoS16P = 1,
    /// One 16-channel-interleaved 32-bit plane; channels 0/1 are L/R.
    StereoS32Ch16Decklink = 2,
    /// One 16-channel-interleaved 32-bit plane carrying a SMPTE 312M 5.1 layout.
    Smpte312S32Ch16Decklink = 3,
}

impl From<Smpte2064AudioType> for AudioType {
    fn from(t: Smpte2064AudioType) -> Self {
        match t {
            Smpte2064AudioType::StereoS16P => AudioType::StereoS16P,
            Smpte2064AudioType::StereoS32Ch16Decklink => AudioType::StereoS32Ch16Decklink,
            Smpte2064AudioType::Smpte312S32Ch16Decklink => AudioType::Smpte312S32Ch16Decklink,
        }
    }
}

/// Opaque handle wrapping [smpte2064::Context] for C callers.
#[derive(Debug)]
pub struct Smpte2064Context(Context);

/// Allocates a context for one fingerprinting stream.
///
/// On success, `*output` is set to a newly-boxed context that the caller must
/// eventually release with [smpte2064_context_free].
#[no_mangle]
pub extern "C" fn smpte2064_context_alloc(
    output: *mut *mut Smpte2064Context,
    colorspace: Smpte2064Colorspace,
    progressive: bool,
    width: u32,
    height: u32,
    bitdepth: u32,
) -> Smpte2064Error {
    if output.is_null() {
        return Smpte2064Error::NullArgument;
    }

    let ctx = match Context::alloc(colorspace.into(), progressive, width, height, bitdepth) {
        Ok(c) => c,
        Err(e) => return e.into(),
    };

    // SAFETY: `output` was checked non-null above; we construct the `Box`
    // ourselves and hand ownership of the raw pointer to the caller.
    unsafe {
        *output = Box::into_raw(Box::new(Smpte2064Context(ctx)));
    }

    Smpte2064Error::Ok
}

/// Frees a context allocated by [smpte2064_context_alloc]. A NULL pointer is a no-op.
#[no_mangle]
pub extern "C" fn smpte2064_context_free(ctx: *mut Smpte2064Context) {
    if ctx.is_null() {
        return;
    }
    // SAFETY: the caller must pass back a pointer obtained from `smpte2064_context_alloc`
    // and not in use elsewhere; we reconstruct the `Box` and let it drop.
    let ctx = unsafe { Box::from_raw(ctx) };
    drop(ctx);
}

/// Sets the diagnostic verbosity level on a context.
#[no_mangle]
pub extern "C" fn smpte2064_context_set_verbose(ctx: *mut Smpte2064Context, level: u8) -> Smpte2064Error {
    if ctx.is_null() {
        return Smpte2064Error::NullArgument;
    }
    // SAFETY: non-null, caller-owned pointer from `smpte2064_context_alloc`.
    let ctx = unsafe { &mut *ctx };
    ctx.0.set_verbose(level);
    Smpte2064Error::Ok
}

/// Pushes one planar 8-bit luma frame (`width * height` bytes) through the video pipeline.
#[no_mangle]
pub extern "C" fn smpte2064_video_push(ctx: *mut Smpte2064Context, luma: *const u8, luma_len: libc::size_t) -> Smpte2064Error {
    if ctx.is_null() || luma.is_null() {
        return Smpte2064Error::NullArgument;
    }
    // SAFETY: non-null pointers; caller guarantees `luma` has at least `luma_len` valid bytes.
    let ctx = unsafe { &mut *ctx };
    let luma = unsafe { std::slice::from_raw_parts(luma, luma_len) };
    match ctx.0.video_push(luma) {
        Ok(()) => Smpte2064Error::Ok,
        Err(e) => e.into(),
    }
}

/// Pushes one audio window through the audio pipeline.
///
/// `planes` points to `num_planes` pointers, each to at least `sample_count`
/// `int32_t` values (or `sample_count * 16` for the 16-channel-interleaved shapes).
#[no_mangle]
pub extern "C" fn smpte2064_audio_push(
    ctx: *mut Smpte2064Context,
    audio_type: Smpte2064AudioType,
    timebase_num: u32,
    timebase_den: u32,
    planes: *const *const i32,
    num_planes: libc::size_t,
    sample_count: libc::size_t,
) -> Smpte2064Error {
    if ctx.is_null() || planes.is_null() {
        return Smpte2064Error::NullArgument;
    }
    // SAFETY: non-null; caller guarantees `num_planes` valid plane pointers, each
    // with enough samples for the declared `audio_type` and `sample_count`.
    let ctx = unsafe { &mut *ctx };
    let plane_ptrs = unsafe { std::slice::from_raw_parts(planes, num_planes) };
    let mut owned_planes: Vec<&[i32]> = Vec::with_capacity(num_planes);
    for &p in plane_ptrs {
        if p.is_null() {
            return Smpte2064Error::NullArgument;
        }
        let expected = match audio_type {
            Smpte2064AudioType::StereoS16P => sample_count,
            _ => sample_count * 16,
        };
        // SAFETY: caller-documented contract on plane length.
        owned_planes.push(unsafe { std::slice::from_raw_parts(p, expected) });
    }

    match ctx.0.audio_push(audio_type.into(), timebase_num, timebase_den, &owned_planes, sample_count) {
        Ok(()) => Smpte2064Error::Ok,
        Err(e) => e.into(),
    }
}

/// Packs the current context state into `buf` (at least `buf_len` bytes), writing
/// the number of bytes used to `*used`.
#[no_mangle]
pub extern "C" fn smpte2064_encapsulation_pack(
    ctx: *mut Smpte2064Context,
    buf: *mut u8,
    buf_len: libc::size_t,
    used: *mut libc::size_t,
) -> Smpte2064Error {
    if ctx.is_null() || buf.is_null() || used.is_null() {
        return Smpte2064Error::NullArgument;
    }
    // SAFETY: non-null pointers; caller guarantees `buf` has at least `buf_len` valid bytes.
    let ctx = unsafe { &mut *ctx };
    let buf = unsafe { std::slice::from_raw_parts_mut(buf, buf_len) };
    match ctx.0.pack(buf) {
        Ok(n) => {
            // SAFETY: `used` was checked non-null above.
            unsafe { *used = n };
            Smpte2064Error::Ok
        }
        Err(e) => e.into(),
    }
}

/// Unpacks one packed V210 4:2:2 10-bit image to planar 8-bit luma.
///
/// When `lines` is non-NULL, only those `num_lines` row indices are converted
/// (sparse mode); when NULL, every row is converted.
#[no_mangle]
pub extern "C" fn smpte2064_v210_unpack_to_8b(
    src: *const u8,
    src_len: libc::size_t,
    src_stride: u32,
    dst: *mut u8,
    dst_len: libc::size_t,
    dst_stride: u32,
    width: u32,
    height: u32,
    lines: *const libc::size_t,
    num_lines: libc::size_t,
) -> Smpte2064Error {
    if src.is_null() || dst.is_null() {
        return Smpte2064Error::NullArgument;
    }
    // SAFETY: non-null pointers; caller guarantees the declared lengths are valid.
    let src = unsafe { std::slice::from_raw_parts(src, src_len) };
    let dst = unsafe { std::slice::from_raw_parts_mut(dst, dst_len) };
    let lines_vec: Option<Vec<usize>> = if lines.is_null() {
        None
    } else {
        // SAFETY: caller guarantees `num_lines` valid entries when `lines` is non-NULL.
        Some(unsafe { std::slice::from_raw_parts(lines, num_lines) }.to_vec())
    };

    let result = smpte2064::v210_unpack_to_8b(
        src,
        src_stride,
        dst,
        dst_stride,
        width,
        height,
        lines_vec.as_deref(),
    );
    match result {
        Ok(()) => Smpte2064Error::Ok,
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn alloc_and_free_round_trips() {
        let mut ctx: *mut Smpte2064Context = std::ptr::null_mut();
        let err = smpte2064_context_alloc(
            &mut ctx,
            Smpte2064Colorspace::Yuv420p,
            true,
            1280,
            720,
            8,
        );
        assert_eq!(err, Smpte2064Error::Ok);
        assert!(!ctx.is_null());
        smpte2064_context_free(ctx);
    }

    #[test]
    fn alloc_rejects_null_output() {
        let err = smpte2064_context_alloc(
            std::ptr::null_mut(),
            Smpte2064Colorspace::Yuv420p,
            true,
            1280,
            720,
            8,
        );
        assert_eq!(err, Smpte2064Error::NullArgument);
    }

    #[test]
    fn alloc_rejects_unsupported_geometry() {
        let mut ctx: *mut Smpte2064Context = std::ptr::null_mut();
        let err = smpte2064_context_alloc(
            &mut ctx,
            Smpte2064Colorspace::Yuv420p,
            true,
            640,
            480,
            8,
        );
        assert_eq!(err, Smpte2064Error::FormatUnsupported);
        assert!(ctx.is_null());
    }

    #[test]
    fn video_push_and_pack_round_trip() {
        let mut ctx: *mut Smpte2064Context = std::ptr::null_mut();
        smpte2064_context_alloc(&mut ctx, Smpte2064Colorspace::Yuv420p, true, 1280, 720, 8);

        let frame = vec![128u8; 1280 * 720];
        for _ in 0..3 {
            let err = smpte2064_video_push(ctx, frame.as_ptr(), frame.len());
            assert_eq!(err, Smpte2064Error::Ok);
        }

        let mut buf = [0u8; 256];
        let mut used: libc::size_t = 0;
        let err = smpte2064_encapsulation_pack(ctx, buf.as_mut_ptr(), buf.len(), &mut used);
        assert_eq!(err, Smpte2064Error::Ok);
        assert!(used > 0);

        smpte2064_context_free(ctx);
    }

    #[test]
    fn pack_reports_no_data_before_warmup() {
        let mut ctx: *mut Smpte2064Context = std::ptr::null_mut();
        smpte2064_context_alloc(&mut ctx, Smpte2064Colorspace::Yuv420p, true, 1280, 720, 8);

        let mut buf = [0u8; 256];
        let mut used: libc::size_t = 0;
        let err = smpte2064_encapsulation_pack(ctx, buf.as_mut_ptr(), buf.len(), &mut used);
        assert_eq!(err, Smpte2064Error::NoData);

        smpte2064_context_free(ctx);
    }

    #[test]
    fn error_to_str_is_non_null_for_every_variant() {
        for err in [
            Smpte2064Error::Ok,
            Smpte2064Error::NullArgument,
            Smpte2064Error::InvalidArgument,
            Smpte2064Error::FormatUnsupported,
            Smpte2064Error::OutOfMemory,
            Smpte2064Error::NoData,
            Smpte2064Error::Unknown,
        ] {
            assert!(!smpte2064_error_to_str(err).is_null());
        }
    }
}
