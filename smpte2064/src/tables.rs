//! Static format descriptors: per-geometry pre-filter taps, per-geometry window
//! coordinates, and per-frame-rate audio decimator factors.
//!
//! These tables are transcribed from SMPTE ST 2064-1's published tables 1-3 and are
//! immutable for the life of the program; there is no reason to ever mutate them.

/// Table 1: per-geometry horizontal pre-filter taps (section 5.2.1).
#[derive(Debug, Clone, Copy)]
pub struct PreFilter {
    pub progressive: bool,
    pub width: u32,
    pub height: u32,
    /// Number of valid entries in `taps`.
    pub tap_count: usize,
    /// Signed horizontal pixel offsets averaged to produce each output pixel.
    pub taps: [i32; 6],
}

/// Table 2: per-geometry windowing coordinates (section 5.2.2).
///
/// The 16x60 sub-sample grid is taken at `hstart + c*hstep` for `c in 0..60` and
/// `vstart + r*vstep` for `r in 0..16`; `vstart_f2`/`vstop_f2` are reserved for the
/// second field of interlaced geometries, which this crate does not process (see
/// `Non-goals`).
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub progressive: bool,
    pub width: u32,
    pub height: u32,
    pub hstart: i32,
    pub hstep: i32,
    pub hstop: i32,
    pub vstart_f1: i32,
    pub vstart_f2: i32,
    pub vstep: i32,
    pub vstop_f1: i32,
    pub vstop_f2: i32,
}

/// Table 3: per-frame-rate audio decimator factor (section 5.3.6) plus the timebase
/// and SMPTE S253 `Picture_Rate` code that identify it.
#[derive(Debug, Clone, Copy)]
pub struct AudioDecimator {
    pub frame_rate: f64,
    pub timebase_num: u32,
    pub timebase_den: u32,
    pub decimator_factor: u32,
    pub bits_per_second: u32,
    /// SMPTE S253 4-bit `Picture_Rate` code for this frame rate.
    pub picture_rate_code: u8,
}

pub const WSS_ROWS: usize = 16;
pub const WSS_SAMPLES_PER_ROW: usize = 60;
pub const WSS_SAMPLES_PER_FRAME: usize = WSS_ROWS * WSS_SAMPLES_PER_ROW;

/// Table 1 entries. The SD rows carry `tap_count = 0`, meaning "copy the row unfiltered".
static TABLE1: &[PreFilter] = &[
    PreFilter { progressive: true, width: 4096, height: 2160, tap_count: 6, taps: [-3, -2, -1, 0, 1, 2] },
    PreFilter { progressive: true, width: 3840, height: 2160, tap_count: 6, taps: [-3, -2, -1, 0, 1, 2] },
    PreFilter { progressive: true, width: 2048, height: 1080, tap_count: 3, taps: [-1, 0, 1, 0, 0, 0] },
    PreFilter { progressive: false, width: 1920, height: 1080, tap_count: 3, taps: [-1, 0, 1, 0, 0, 0] },
    PreFilter { progressive: true, width: 1920, height: 1080, tap_count: 3, taps: [-1, 0, 1, 0, 0, 0] },
    PreFilter { progressive: true, width: 1280, height: 720, tap_count: 2, taps: [-1, 0, 0, 0, 0, 0] },
    PreFilter { progressive: false, width: 720, height: 485, tap_count: 0, taps: [0; 6] },
    PreFilter { progressive: true, width: 720, height: 576, tap_count: 0, taps: [0; 6] },
];

/// Table 2 entries. `vstart_f2`/`vstop_f2` of `-1` mean "not applicable" (progressive-only
/// geometries); interlaced geometries populate both fields.
static TABLE2: &[Window] = &[
    Window { progressive: false, width: 720, height: 485, hstart: 123, hstep: 8, hstop: 595, vstart_f1: 60, vstart_f2: 323, vstep: 10, vstop_f1: 210, vstop_f2: 473 },
    Window { progressive: false, width: 720, height: 576, hstart: 123, hstep: 8, hstop: 595, vstart_f1: 68, vstart_f2: 381, vstep: 12, vstop_f1: 248, vstop_f2: 561 },
    Window { progressive: true, width: 1280, height: 720, hstart: 256, hstep: 13, hstop: 1023, vstart_f1: 117, vstart_f2: -1, vstep: 32, vstop_f1: 597, vstop_f2: -1 },
    Window { progressive: false, width: 1920, height: 1080, hstart: 399, hstep: 19, hstop: 1520, vstart_f1: 89, vstart_f2: 652, vstep: 24, vstop_f1: 449, vstop_f2: 1012 },
    Window { progressive: true, width: 1920, height: 1080, hstart: 399, hstep: 19, hstop: 1520, vstart_f1: 178, vstart_f2: -1, vstep: 48, vstop_f1: 898, vstop_f2: -1 },
    Window { progressive: true, width: 3840, height: 2160, hstart: 798, hstep: 38, hstop: 3040, vstart_f1: 412, vstart_f2: -1, vstep: 92, vstop_f1: 1792, vstop_f2: -1 },
    Window { progressive: true, width: 2048, height: 1080, hstart: 463, hstep: 19, hstop: 1584, vstart_f1: 206, vstart_f2: -1, vstep: 46, vstop_f1: 896, vstop_f2: -1 },
    Window { progressive: true, width: 4096, height: 2160, hstart: 926, hstep: 38, hstop: 3168, vstart_f1: 412, vstart_f2: -1, vstep: 92, vstop_f1: 1792, vstop_f2: -1 },
];

/// Table 3 entries. Note that 47.95 and 48/1.001 are intentionally absent: the published
/// reference carries them commented out, and this crate preserves that omission.
static TABLE3: &[AudioDecimator] = &[
    AudioDecimator { frame_rate: 23.976, timebase_num: 1001, timebase_den: 24000, decimator_factor: 52, bits_per_second: 923, picture_rate_code: 1 },
    AudioDecimator { frame_rate: 29.97, timebase_num: 1001, timebase_den: 30000, decimator_factor: 52, bits_per_second: 923, picture_rate_code: 4 },
    AudioDecimator { frame_rate: 59.94, timebase_num: 1001, timebase_den: 60000, decimator_factor: 52, bits_per_second: 923, picture_rate_code: 7 },
    AudioDecimator { frame_rate: 24.0, timebase_num: 1, timebase_den: 24, decimator_factor: 50, bits_per_second: 960, picture_rate_code: 2 },
    AudioDecimator { frame_rate: 25.0, timebase_num: 1, timebase_den: 25, decimator_factor: 50, bits_per_second: 960, picture_rate_code: 3 },
    AudioDecimator { frame_rate: 30.0, timebase_num: 1, timebase_den: 30, decimator_factor: 50, bits_per_second: 960, picture_rate_code: 5 },
    AudioDecimator { frame_rate: 50.0, timebase_num: 1, timebase_den: 50, decimator_factor: 50, bits_per_second: 960, picture_rate_code: 6 },
    AudioDecimator { frame_rate: 60.0, timebase_num: 1, timebase_den: 60, decimator_factor: 50, bits_per_second: 960, picture_rate_code: 8 },
];

/// Fallback `Picture_Rate` code used when a container is packed before any audio has been
/// pushed on the stream (see REDESIGN FLAGS in SPEC_FULL.md).
pub const DEFAULT_PICTURE_RATE_CODE: u8 = 7;

/// Looks up Table 1 by exact `(progressive, width, height)` match.
pub fn lookup_t1(progressive: bool, width: u32, height: u32) -> Option<&'static PreFilter> {
    TABLE1
        .iter()
        .find(|t| t.progressive == progressive && t.width == width && t.height == height)
}

/// Looks up Table 2 by exact `(progressive, width, height)` match.
pub fn lookup_t2(progressive: bool, width: u32, height: u32) -> Option<&'static Window> {
    TABLE2
        .iter()
        .find(|t| t.progressive == progressive && t.width == width && t.height == height)
}

/// Looks up Table 3 by exact frame rate match. Rate comparison uses the tabulated
/// floating-point literal directly, with no tolerance window: callers must supply the
/// same rate (e.g. `23.976`, not `23.9760001`) used to author the table.
pub fn lookup_t3_rate(frame_rate: f64) -> Option<&'static AudioDecimator> {
    TABLE3.iter().find(|t| t.frame_rate == frame_rate)
}

/// Looks up Table 3 by exact timebase match.
pub fn lookup_t3_timebase(num: u32, den: u32) -> Option<&'static AudioDecimator> {
    TABLE3
        .iter()
        .find(|t| t.timebase_num == num && t.timebase_den == den)
}

/// Returns the SMPTE S253 `Picture_Rate` code for a tabulated frame rate, or `None` if
/// the rate has no Table 3 entry.
pub fn picture_rate_code(frame_rate: f64) -> Option<u8> {
    lookup_t3_rate(frame_rate).map(|t| t.picture_rate_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_t1_known_geometry() {
        let t = lookup_t1(true, 1920, 1080).unwrap();
        assert_eq!(t.tap_count, 3);
        assert_eq!(&t.taps[..3], &[-1, 0, 1]);
    }

    #[test]
    fn lookup_t1_unknown_geometry() {
        assert!(lookup_t1(true, 640, 480).is_none());
    }

    #[test]
    fn lookup_t2_progressive_has_no_second_field() {
        let t = lookup_t2(true, 1280, 720).unwrap();
        assert_eq!(t.vstart_f2, -1);
    }

    #[test]
    fn lookup_t3_excludes_undefined_rates() {
        assert!(lookup_t3_rate(47.95).is_none());
        assert!(lookup_t3_rate(48.0 / 1.001).is_none());
    }

    #[test]
    fn picture_rate_codes_match_smpte_s253() {
        assert_eq!(picture_rate_code(23.976), Some(1));
        assert_eq!(picture_rate_code(24.0), Some(2));
        assert_eq!(picture_rate_code(25.0), Some(3));
        assert_eq!(picture_rate_code(29.97), Some(4));
        assert_eq!(picture_rate_code(30.0), Some(5));
        assert_eq!(picture_rate_code(50.0), Some(6));
        assert_eq!(picture_rate_code(59.94), Some(7));
        assert_eq!(picture_rate_code(60.0), Some(8));
        assert_eq!(picture_rate_code(29.976), None);
    }

    #[test]
    fn lookup_t3_timebase_round_trips() {
        let t = lookup_t3_timebase(1001, 60000).unwrap();
        assert_eq!(t.frame_rate, 59.94);
        assert_eq!(t.decimator_factor, 52);
    }
}
