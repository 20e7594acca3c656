//! Audio fingerprinting pipeline: stereo down-mix, envelope/local-mean IIR
//! detectors, threshold comparator, and decimation into a bit-packed fingerprint.

use crate::error::{Error, Result};
use crate::tables;

/// Fast-attack envelope coefficient (section 5.3.3).
const ALPHA: f32 = 0.25;
/// Local-mean smoothing coefficient (section 5.3.4).
const BETA: f32 = 0.005;
/// Comparator hysteresis margin (section 5.3.5).
const DELTA: f32 = 0.015;
/// Equal-power L/R downmix coefficient, matching the reference's hard-coded
/// `0.7071f` rather than a computed `1/sqrt(2)` (section 5.3.2).
const DOWNMIX_COEFF: f32 = 0.7071;

/// Which input shape an audio push carries, and how it downmixes to a comparable
/// mono stereo-pair signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioType {
    /// Two planes of signed 16-bit PCM, one sample per channel per plane.
    StereoS16P = 1,
    /// One plane of 32-bit words, 16-channel interleave; channels 0/1 are L/R.
    StereoS32Ch16Decklink = 2,
    /// One plane of 32-bit words, 16-channel interleave carrying a SMPTE 312M
    /// discrete 5.1 layout; only channels 0/1 (L/R) feed this fingerprint.
    Smpte312S32Ch16Decklink = 3,
}

impl AudioType {
    /// All variants, in enum declaration order (used when packing `AFP_present`).
    pub const ALL: [AudioType; 3] = [
        AudioType::StereoS16P,
        AudioType::StereoS32Ch16Decklink,
        AudioType::Smpte312S32Ch16Decklink,
    ];

    /// Zero-based index used as `audio_fingerprint_id` in the container.
    pub fn index(self) -> u8 {
        match self {
            AudioType::StereoS16P => 0,
            AudioType::StereoS32Ch16Decklink => 1,
            AudioType::Smpte312S32Ch16Decklink => 2,
        }
    }

    /// The `AudioMixType` container field: 2 for either stereo shape, 5 for the
    /// 5.1 discrete shape.
    pub fn mix_type(self) -> u8 {
        match self {
            AudioType::StereoS16P | AudioType::StereoS32Ch16Decklink => 2,
            AudioType::Smpte312S32Ch16Decklink => 5,
        }
    }
}

fn pcm16_to_float(sample: i16) -> f32 {
    if sample >= 0 {
        sample as f32 / 32767.0
    } else {
        sample as f32 / 32768.0
    }
}

fn downmix(l: f32, r: f32) -> f32 {
    (l * DOWNMIX_COEFF + r * DOWNMIX_COEFF) / 2.0
}

/// Down-mixes one audio push's input planes to a mono `f32` signal, per the shape
/// implied by `audio_type`.
fn downmix_planes(audio_type: AudioType, planes: &[&[i32]], sample_count: usize) -> Result<Vec<f32>> {
    let mut mono = Vec::with_capacity(sample_count);
    match audio_type {
        AudioType::StereoS16P => {
            if planes.len() != 2 {
                return Err(Error::InvalidArgument(format!(
                    "StereoS16P requires exactly 2 planes, got {}",
                    planes.len()
                )));
            }
            let (l_plane, r_plane) = (planes[0], planes[1]);
            if l_plane.len() < sample_count || r_plane.len() < sample_count {
                return Err(Error::InvalidArgument(
                    "audio_push: plane shorter than sample_count".into(),
                ));
            }
            for i in 0..sample_count {
                let l = pcm16_to_float(l_plane[i] as i16);
                let r = pcm16_to_float(r_plane[i] as i16);
                mono.push(downmix(l, r));
            }
        }
        AudioType::StereoS32Ch16Decklink | AudioType::Smpte312S32Ch16Decklink => {
            if planes.len() != 1 {
                return Err(Error::InvalidArgument(format!(
                    "{audio_type:?} requires exactly 1 interleaved plane, got {}",
                    planes.len()
                )));
            }
            let plane = planes[0];
            if plane.len() < sample_count * 16 {
                return Err(Error::InvalidArgument(
                    "audio_push: 16-channel plane too short for sample_count".into(),
                ));
            }
            for i in 0..sample_count {
                let base = i * 16;
                let l = pcm16_to_float((plane[base] >> 16) as i16);
                let r = pcm16_to_float((plane[base + 1] >> 16) as i16);
                mono.push(downmix(l, r));
            }
        }
    }
    Ok(mono)
}

fn pseudo_abs(mono: &mut [f32]) {
    for s in mono.iter_mut() {
        *s = s.abs();
    }
}

/// Shipped envelope/local-mean/comparator form: fixed-coefficient normalised IIRs.
fn comparator_bits(mono: &[f32]) -> Vec<bool> {
    if mono.is_empty() {
        return Vec::new();
    }
    let mut bits = Vec::with_capacity(mono.len());
    let mut e = mono[0];
    let mut m = mono[0];
    bits.push(m + DELTA < e);
    for &a in &mono[1..] {
        e = ALPHA * a + (1.0 - ALPHA) * e;
        m = BETA * a + (1.0 - BETA) * m;
        bits.push(m + DELTA < e);
    }
    bits
}

/// Original, non-normalised recurrence from the published reference, carried for
/// bit-for-bit parity with that implementation rather than the shipped behaviour.
#[cfg(feature = "legacy-iir")]
fn comparator_bits_legacy(mono: &[f32]) -> Vec<bool> {
    const KM: i64 = 8192;
    const KE: i64 = 1024;
    if mono.is_empty() {
        return Vec::new();
    }
    // The reference operates on fixed-point samples; mono values here are already
    // scaled to roughly [-1, 1], so this mirrors its integer recurrence in floating
    // point, floor-dividing exactly as the original does.
    let a: Vec<i64> = mono.iter().map(|&v| v.round() as i64).collect();
    let mut es = vec![0i64; a.len()];
    let mut ms = vec![0i64; a.len()];
    for i in 1..a.len() {
        es[i] = (a[i] * KM) / KE + es[i - 1] - es[i - 1].div_euclid(KE);
        ms[i] = a[i] + ms[i - 1] - ms[i - 1].div_euclid(KM);
    }
    (0..a.len()).map(|i| ms[i] < es[i]).collect()
}

fn decimate(bits: &[bool], decimator_factor: u32) -> Vec<bool> {
    bits.iter()
        .step_by(decimator_factor as usize)
        .copied()
        .collect()
}

fn pack_bits_msb_first(bits: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }
    out
}

/// Per-context audio pipeline state: one fingerprint buffer per [`AudioType`].
#[derive(Default, Debug)]
pub struct AudioState {
    fingerprints: [Option<AudioFingerprint>; 3],
}

/// A completed audio fingerprint: the decimated comparator bits, MSB-first packed.
#[derive(Debug, Clone)]
pub struct AudioFingerprint {
    /// Number of decimated comparator bits this fingerprint holds (50 or 52).
    pub bit_count: usize,
    /// The bits, MSB-first packed into whole bytes.
    pub bytes: Vec<u8>,
}

impl AudioState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one audio push: down-mix, pseudo-abs, IIR detectors, comparator,
    /// decimate, and store the resulting fingerprint for `audio_type`.
    pub fn push(
        &mut self,
        audio_type: AudioType,
        timebase_num: u32,
        timebase_den: u32,
        planes: &[&[i32]],
        sample_count: usize,
    ) -> Result<()> {
        let t3 = tables::lookup_t3_timebase(timebase_num, timebase_den).ok_or_else(|| {
            Error::FormatUnsupported(format!(
                "no audio decimator table entry for timebase {timebase_num}/{timebase_den}"
            ))
        })?;

        let mut mono = downmix_planes(audio_type, planes, sample_count)?;
        pseudo_abs(&mut mono);

        #[cfg(feature = "legacy-iir")]
        let bits = comparator_bits_legacy(&mono);
        #[cfg(not(feature = "legacy-iir"))]
        let bits = comparator_bits(&mono);

        let decimated = decimate(&bits, t3.decimator_factor);
        let bytes = pack_bits_msb_first(&decimated);

        self.fingerprints[audio_type.index() as usize] = Some(AudioFingerprint {
            bit_count: decimated.len(),
            bytes,
        });
        Ok(())
    }

    /// The fingerprint currently resident for `audio_type`, if any push has produced one.
    pub fn fingerprint(&self, audio_type: AudioType) -> Option<&AudioFingerprint> {
        self.fingerprints[audio_type.index() as usize].as_ref()
    }

    /// Number of audio types with a resident fingerprint.
    pub fn available_count(&self) -> usize {
        self.fingerprints.iter().filter(|f| f.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_abs_is_nonnegative() {
        let mut mono = vec![-1.0, 0.5, -0.25, 0.0];
        pseudo_abs(&mut mono);
        assert!(mono.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn silence_produces_all_zero_bits() {
        let mono = vec![0.0f32; 800];
        let bits = comparator_bits(&mono);
        assert!(bits.iter().all(|&b| !b));
    }

    #[test]
    fn loud_onset_after_quiet_eventually_sets_a_bit() {
        // Quiet baseline lets the slow local-mean settle low, then a loud run lets
        // the fast envelope overtake it while the mean is still catching up.
        let mut mono = vec![0.01f32; 200];
        mono.extend(std::iter::repeat(0.9f32).take(600));
        let bits = comparator_bits(&mono);
        assert!(bits.iter().any(|&b| b));
    }

    #[test]
    fn decimation_size_matches_ceil_division() {
        let bits = vec![true; 801];
        let decimated = decimate(&bits, 52);
        assert_eq!(decimated.len(), 801usize.div_ceil(52));
    }

    #[test]
    fn stereo_s16p_silence_yields_empty_fingerprint_bytes_all_zero() {
        let mut state = AudioState::new();
        let l = vec![0i32; 800];
        let r = vec![0i32; 800];
        state
            .push(AudioType::StereoS16P, 1001, 60000, &[&l, &r], 800)
            .unwrap();
        let fp = state.fingerprint(AudioType::StereoS16P).unwrap();
        assert!(fp.bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn rejects_unknown_timebase() {
        let mut state = AudioState::new();
        let l = vec![0i32; 10];
        let r = vec![0i32; 10];
        assert!(state
            .push(AudioType::StereoS16P, 7, 13, &[&l, &r], 10)
            .is_err());
    }

    #[test]
    fn rejects_wrong_plane_count() {
        let mut state = AudioState::new();
        let l = vec![0i32; 10];
        assert!(state
            .push(AudioType::StereoS16P, 1, 24, &[&l], 10)
            .is_err());
    }
}
