//! Bit-packed encapsulation container: assembles the ID, video fingerprint, and
//! audio fingerprint sub-containers into a single checksummed buffer.

use crate::audio::{AudioState, AudioType};
use crate::bitstream::BitWriter;
use crate::error::{Error, Result};
use crate::video::VideoState;

/// Minimum caller-supplied buffer size `pack` will accept.
pub const MIN_BUFFER_LEN: usize = 256;

/// Packs one container into `buf`, returning the number of bytes used.
///
/// `sequence_counter` is the caller-owned, wrapping counter value to emit as-is
/// (callers typically own one per [`crate::Context`] and post-increment it only
/// after a successful `pack`, so the first container emitted carries `0`).
/// `picture_rate_code` is the SMPTE S253 4-bit code to emit, already resolved by
/// the caller from the most recent audio push (or the documented fallback).
pub fn pack(
    buf: &mut [u8],
    video: &VideoState,
    audio: &AudioState,
    sequence_counter: u8,
    picture_rate_code: u8,
) -> Result<usize> {
    if video.fingerprints_calculated() < 3 {
        return Err(Error::NoData);
    }
    if buf.len() < MIN_BUFFER_LEN {
        return Err(Error::InvalidArgument(format!(
            "pack: buffer must be at least {MIN_BUFFER_LEN} bytes, got {}",
            buf.len()
        )));
    }

    let afp_count = audio.available_count();
    let mut w = BitWriter::new();

    w.write_bits(0, 8)?; // FP_protocol_version
    w.write_bits(sequence_counter as u32, 8)?;
    w.write_bits(0, 8)?; // Length, patched below
    w.write_bits(picture_rate_code as u32, 4)?;
    w.write_bits(1, 1)?; // Reserved
    w.write_bits(1, 1)?; // ID_present
    w.write_bits(1, 1)?; // VFP_present
    w.write_bits((afp_count > 0) as u32, 1)?; // AFP_present

    // ID sub-container.
    w.write_bits(1, 5)?; // Reserved
    w.write_bits(0, 3)?; // SCType
    w.write_bits(1, 3)?; // Reserved
    w.write_bits(2, 5)?; // Length
    w.write_bits(b'K' as u32, 8)?;
    w.write_bits(b'L' as u32, 8)?;

    // Video fingerprint sub-container (progressive only: one VF_Data_Count byte).
    w.write_bits(1, 3)?; // Reserved
    w.write_bits(1, 2)?; // VF_Data_Count
    w.write_bits(1, 3)?; // SCType
    w.write_bits(video.fingerprint_byte() as u32, 8)?;

    // Audio fingerprint sub-container.
    if afp_count > 0 {
        w.write_bits(afp_count as u32, 5)?; // AF_count
        w.write_bits(2, 3)?; // SCType
        for audio_type in AudioType::ALL {
            let Some(fp) = audio.fingerprint(audio_type) else {
                continue;
            };
            w.write_bits(audio_type.index() as u32, 5)?;
            w.write_bits(audio_type.mix_type() as u32, 3)?;
            w.write_bits(fp.bytes.len() as u32, 5)?;
            w.write_bits(1, 3)?; // Reserved
            for &byte in &fp.bytes {
                w.write_bits(byte as u32, 8)?;
            }
        }
    }

    // The checksum byte closes the sum mod 256; its value is the two's-complement
    // negation of every byte written so far, including the not-yet-patched length.
    let partial = w.into_bytes();
    let sum_without_checksum: u32 = partial.iter().map(|&b| b as u32).sum();
    let checksum = (256 - (sum_without_checksum % 256)) % 256;

    let used = partial.len() + 1;
    if used > buf.len() {
        return Err(Error::InvalidArgument(format!(
            "pack: buffer too small, needs {used} bytes, have {}",
            buf.len()
        )));
    }

    buf[..partial.len()].copy_from_slice(&partial);
    buf[partial.len()] = checksum as u8;
    buf[2] = used as u8; // patch Length

    let total: u32 = buf[..used].iter().map(|&b| b as u32).sum();
    if total % 256 != 0 {
        tracing::warn!(
            sum = total % 256,
            "encapsulation checksum did not close to zero mod 256"
        );
    }

    Ok(used)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warmed_up_video() -> VideoState {
        let mut v = VideoState::new(true, 1280, 720).unwrap();
        let frame = vec![128u8; 1280 * 720];
        for _ in 0..3 {
            v.push(&frame, 0).unwrap();
        }
        v
    }

    #[test]
    fn refuses_before_warmup() {
        let v = VideoState::new(true, 1280, 720).unwrap();
        let audio = AudioState::new();
        let mut buf = [0u8; MIN_BUFFER_LEN];
        assert_eq!(pack(&mut buf, &v, &audio, 0, 7), Err(Error::NoData));
    }

    #[test]
    fn checksum_closes_and_length_is_self_consistent() {
        let v = warmed_up_video();
        let audio = AudioState::new();
        let mut buf = [0u8; MIN_BUFFER_LEN];
        let used = pack(&mut buf, &v, &audio, 3, 7).unwrap();
        assert_eq!(buf[2] as usize, used);
        let sum: u32 = buf[..used].iter().map(|&b| b as u32).sum();
        assert_eq!(sum % 256, 0);
    }

    #[test]
    fn id_subcontainer_carries_kl() {
        let v = warmed_up_video();
        let audio = AudioState::new();
        let mut buf = [0u8; MIN_BUFFER_LEN];
        pack(&mut buf, &v, &audio, 0, 7).unwrap();
        // Bytes 0-3: FP_protocol_version, Sequence_Counter, Length, and the
        // Picture_Rate/flags byte. Bytes 4-5: the ID sub-container's own
        // Reserved/SCType/Reserved/Length header. Bytes 6-7: 'K', 'L'.
        assert_eq!(buf[6], b'K');
        assert_eq!(buf[7], b'L');
    }

    #[test]
    fn rejects_undersized_buffer() {
        let v = warmed_up_video();
        let audio = AudioState::new();
        let mut buf = [0u8; 10];
        assert!(pack(&mut buf, &v, &audio, 0, 7).is_err());
    }

    #[test]
    fn sequence_counter_round_trips_into_byte1() {
        let v = warmed_up_video();
        let audio = AudioState::new();
        let mut buf = [0u8; MIN_BUFFER_LEN];
        pack(&mut buf, &v, &audio, 42, 7).unwrap();
        assert_eq!(buf[1], 42);
    }
}
