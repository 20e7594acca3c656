//! Video fingerprinting pipeline: horizontal pre-filter, 16x60 window sub-sample,
//! and motion pixel counting.

use crate::error::{Error, Result};
use crate::tables::{self, PreFilter, Window, WSS_ROWS, WSS_SAMPLES_PER_ROW};

/// Strict motion threshold from section 5.2.3: a sub-sample only counts as "changed"
/// when the absolute luma delta exceeds this value.
const MOTION_THRESHOLD: i32 = 32;

type SubSampleGrid = [[u8; WSS_SAMPLES_PER_ROW]; WSS_ROWS];

/// Per-context video pipeline state.
///
/// Carries two independent three-deep rings, named after the reference `ctx_s`
/// layout rather than cycled through an index: the windowed sub-sample grid
/// (`sub_f2`/`sub_f3`/`sub_f4`) and the derived per-frame fingerprint byte
/// (`fp_f2`/`fp_f3`/`fp_f4`). Motion is always the tape-delay comparison of the
/// newest window sample against the one two frames behind it.
#[derive(Debug)]
pub struct VideoState {
    width: u32,
    height: u32,
    t1: &'static PreFilter,
    t2: &'static Window,
    prefiltered: Vec<u8>,
    sub_f2: Box<SubSampleGrid>,
    sub_f3: Box<SubSampleGrid>,
    sub_f4: Box<SubSampleGrid>,
    fp_f2: u8,
    fp_f3: u8,
    fp_f4: u8,
    fingerprints_calculated: u64,
}

impl VideoState {
    /// Resolves T1/T2 for `(progressive, width, height)` and allocates scratch state.
    ///
    /// `progressive` must be `true`; interlaced geometries are present in the format
    /// tables for completeness but this pipeline only processes progressive video.
    pub fn new(progressive: bool, width: u32, height: u32) -> Result<Self> {
        if !progressive {
            return Err(Error::InvalidArgument(
                "video pipeline requires progressive = true; interlaced geometries are not supported".into(),
            ));
        }
        let t1 = tables::lookup_t1(progressive, width, height).ok_or_else(|| {
            Error::FormatUnsupported(format!(
                "no pre-filter table entry for {width}x{height} progressive={progressive}"
            ))
        })?;
        let t2 = tables::lookup_t2(progressive, width, height).ok_or_else(|| {
            Error::FormatUnsupported(format!(
                "no window table entry for {width}x{height} progressive={progressive}"
            ))
        })?;

        Ok(Self {
            width,
            height,
            t1,
            t2,
            prefiltered: vec![0u8; (width as usize) * (height as usize)],
            sub_f2: Box::new([[0u8; WSS_SAMPLES_PER_ROW]; WSS_ROWS]),
            sub_f3: Box::new([[0u8; WSS_SAMPLES_PER_ROW]; WSS_ROWS]),
            sub_f4: Box::new([[0u8; WSS_SAMPLES_PER_ROW]; WSS_ROWS]),
            fp_f2: 0,
            fp_f3: 0,
            fp_f4: 0,
            fingerprints_calculated: 0,
        })
    }

    /// Number of frames for which a fingerprint byte has been computed.
    pub fn fingerprints_calculated(&self) -> u64 {
        self.fingerprints_calculated
    }

    /// The most recently computed video fingerprint byte, in `0..=240`.
    pub fn fingerprint_byte(&self) -> u8 {
        self.fp_f4
    }

    /// Runs one planar 8-bit luma frame through pre-filter, window sub-sample, and
    /// motion counting, updating all ring state.
    pub fn push(&mut self, luma: &[u8], verbose: u8) -> Result<()> {
        let expected_len = (self.width as usize) * (self.height as usize);
        if luma.len() != expected_len {
            return Err(Error::InvalidArgument(format!(
                "video_push: expected {expected_len} luma bytes, got {}",
                luma.len()
            )));
        }

        self.prefilter(luma);

        // Age the window ring before sampling the new frame into f4.
        *self.sub_f2 = *self.sub_f3;
        *self.sub_f3 = *self.sub_f4;
        self.sample_window();

        let mut above_threshold: u32 = 0;
        for r in 0..WSS_ROWS {
            for c in 0..WSS_SAMPLES_PER_ROW {
                let delta = self.sub_f4[r][c] as i32 - self.sub_f2[r][c] as i32;
                if delta.abs() > MOTION_THRESHOLD {
                    above_threshold += 1;
                }
            }
        }
        let fingerprint_byte = (above_threshold / 4) as u8;

        self.fp_f2 = self.fp_f3;
        self.fp_f3 = self.fp_f4;
        self.fp_f4 = fingerprint_byte;
        self.fingerprints_calculated += 1;

        if verbose >= 1 {
            tracing::debug!(
                frame = self.fingerprints_calculated,
                fingerprint = fingerprint_byte,
                changed_pixels = above_threshold,
                total_pixels = (WSS_ROWS * WSS_SAMPLES_PER_ROW) as u32,
                "video fingerprint computed"
            );
        }

        Ok(())
    }

    fn prefilter(&mut self, luma: &[u8]) {
        let width = self.width as usize;
        let height = self.height as usize;
        let taps = &self.t1.taps[..self.t1.tap_count];

        for row in 0..height {
            let src_row = &luma[row * width..(row + 1) * width];
            let dst_row = &mut self.prefiltered[row * width..(row + 1) * width];

            if taps.is_empty() {
                dst_row.copy_from_slice(src_row);
                continue;
            }

            for x in 0..width {
                let mut sum: u32 = 0;
                let mut count: u32 = 0;
                for &off in taps {
                    let xx = x as i32 + off;
                    if xx >= 0 && (xx as usize) < width {
                        sum += src_row[xx as usize] as u32;
                        count += 1;
                    }
                }
                dst_row[x] = (sum / count) as u8;
            }
        }
    }

    fn sample_window(&mut self) {
        let width = self.width as usize;
        let t2 = self.t2;
        for r in 0..WSS_ROWS {
            let v = t2.vstart_f1 + (r as i32) * t2.vstep;
            let row = &self.prefiltered[(v as usize) * width..(v as usize + 1) * width];
            for c in 0..WSS_SAMPLES_PER_ROW {
                let h = t2.hstart + (c as i32) * t2.hstep;
                self.sub_f4[r][c] = row[h as usize];
            }
        }
    }
}
