//! Owns one fingerprinting stream end to end: video state, audio state, the
//! running sequence counter, and the most recently observed picture rate.

use crate::audio::{AudioState, AudioType};
use crate::container;
use crate::error::{Error, Result};
use crate::tables::{self, DEFAULT_PICTURE_RATE_CODE};
use crate::video::VideoState;

/// Pixel format a context was allocated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    /// Planar 8-bit 4:2:0.
    Yuv420p,
    /// Packed 10-bit 4:2:2; unpack with [`crate::v210_unpack_to_8b`] before pushing.
    V210,
}

/// A single fingerprinting stream: fixed geometry, reused across frames.
///
/// `Context` is `Send` but not `Sync` — it has no internal synchronization and is
/// meant to be driven by a single caller at a time, one context per stream.
#[derive(Debug)]
pub struct Context {
    colorspace: Colorspace,
    video: VideoState,
    audio: AudioState,
    sequence_counter: u8,
    picture_rate_code: u8,
    verbose: u8,
}

impl Context {
    /// Allocates a context for one fingerprinting stream.
    ///
    /// `bitdepth` must be `8` or `10`; `progressive` must be `true` (interlaced
    /// geometries are rejected — see [`crate::video::VideoState::new`]).
    pub fn alloc(
        colorspace: Colorspace,
        progressive: bool,
        width: u32,
        height: u32,
        bitdepth: u32,
    ) -> Result<Self> {
        if bitdepth != 8 && bitdepth != 10 {
            return Err(Error::InvalidArgument(format!(
                "alloc: bitdepth must be 8 or 10, got {bitdepth}"
            )));
        }
        let video = VideoState::new(progressive, width, height)?;
        tracing::span!(tracing::Level::DEBUG, "smpte2064_context_alloc", width, height).in_scope(
            || {
                tracing::debug!(colorspace = ?colorspace, bitdepth, "context allocated");
            },
        );
        Ok(Self {
            colorspace,
            video,
            audio: AudioState::new(),
            sequence_counter: 0,
            picture_rate_code: DEFAULT_PICTURE_RATE_CODE,
            verbose: 0,
        })
    }

    /// Sets the diagnostic verbosity level. `0` disables the per-frame debug events.
    pub fn set_verbose(&mut self, level: u8) {
        self.verbose = level;
    }

    /// The colorspace this context was allocated for.
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Runs one frame of planar 8-bit luma through the video pipeline.
    pub fn video_push(&mut self, luma: &[u8]) -> Result<()> {
        self.video.push(luma, self.verbose)
    }

    /// Runs one audio window through the audio pipeline, and updates the picture
    /// rate used by the next `pack` call if `(timebase_num, timebase_den)` resolves
    /// to a tabulated frame rate.
    pub fn audio_push(
        &mut self,
        audio_type: AudioType,
        timebase_num: u32,
        timebase_den: u32,
        planes: &[&[i32]],
        sample_count: usize,
    ) -> Result<()> {
        self.audio
            .push(audio_type, timebase_num, timebase_den, planes, sample_count)?;
        if let Some(t3) = tables::lookup_t3_timebase(timebase_num, timebase_den) {
            self.picture_rate_code = t3.picture_rate_code;
        }
        Ok(())
    }

    /// Packs the current state into `buf`, returning the number of bytes used.
    pub fn pack(&mut self, buf: &mut [u8]) -> Result<usize> {
        let used = container::pack(
            buf,
            &self.video,
            &self.audio,
            self.sequence_counter,
            self.picture_rate_code,
        )?;
        self.sequence_counter = self.sequence_counter.wrapping_add(1);
        Ok(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warm_up(ctx: &mut Context, width: u32, height: u32) {
        let frame = vec![128u8; (width * height) as usize];
        for _ in 0..3 {
            ctx.video_push(&frame).unwrap();
        }
    }

    #[test]
    fn pack_refuses_until_three_frames() {
        let mut ctx = Context::alloc(Colorspace::Yuv420p, true, 1280, 720, 8).unwrap();
        let mut buf = [0u8; 256];
        let frame = vec![128u8; 1280 * 720];
        assert_eq!(ctx.pack(&mut buf), Err(Error::NoData));
        ctx.video_push(&frame).unwrap();
        assert_eq!(ctx.pack(&mut buf), Err(Error::NoData));
        ctx.video_push(&frame).unwrap();
        assert_eq!(ctx.pack(&mut buf), Err(Error::NoData));
        ctx.video_push(&frame).unwrap();
        assert!(ctx.pack(&mut buf).is_ok());
    }

    #[test]
    fn sequence_counter_increments_and_wraps() {
        let mut ctx = Context::alloc(Colorspace::Yuv420p, true, 1280, 720, 8).unwrap();
        warm_up(&mut ctx, 1280, 720);
        let mut buf = [0u8; 256];
        let used = ctx.pack(&mut buf).unwrap();
        assert_eq!(buf[1], 0);
        let used2 = ctx.pack(&mut buf).unwrap();
        assert_eq!(buf[1], 1);
        assert_eq!(used, used2);
    }

    #[test]
    fn picture_rate_falls_back_without_audio() {
        let mut ctx = Context::alloc(Colorspace::Yuv420p, true, 1280, 720, 8).unwrap();
        warm_up(&mut ctx, 1280, 720);
        let mut buf = [0u8; 256];
        ctx.pack(&mut buf).unwrap();
        let rate_code = (buf[3] >> 4) & 0x0F;
        assert_eq!(rate_code, DEFAULT_PICTURE_RATE_CODE);
    }

    #[test]
    fn picture_rate_follows_most_recent_audio_push() {
        let mut ctx = Context::alloc(Colorspace::Yuv420p, true, 1280, 720, 8).unwrap();
        warm_up(&mut ctx, 1280, 720);
        let l = vec![0i32; 100];
        let r = vec![0i32; 100];
        ctx.audio_push(AudioType::StereoS16P, 1, 25, &[&l, &r], 100)
            .unwrap();
        let mut buf = [0u8; 256];
        ctx.pack(&mut buf).unwrap();
        let rate_code = (buf[3] >> 4) & 0x0F;
        assert_eq!(rate_code, 3); // 25fps
    }

    #[test]
    fn rejects_bad_bitdepth() {
        assert!(Context::alloc(Colorspace::Yuv420p, true, 1280, 720, 12).is_err());
    }
}
