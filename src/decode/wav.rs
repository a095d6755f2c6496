//! WAV decoding with hound.

use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::error::{DecodeError, DecodeResult};
use super::{CancelFlag, DecodedAudio, SourceInfo};
use crate::waveform::{Normalization, SampleBuffer};

/// Samples read between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 1 << 16;

/// Decodes a WAV file into a normalized sample buffer.
///
/// # Errors
/// - If the file cannot be opened or is not valid WAV
/// - If the sample format is not supported
/// - `Cancelled` if `cancel` is raised while reading
pub fn decode_wav(
    path: &Path,
    normalization: Normalization,
    cancel: &CancelFlag,
) -> DecodeResult<DecodedAudio> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let reader = WavReader::new(BufReader::new(file))?;
    decode_wav_reader(reader, file_len, normalization, cancel)
}

/// Decodes WAV data from any reader.
///
/// `byte_len` bounds the up-front allocation; the sample count in the header
/// is not trusted, since streaming writers leave a placeholder there.
fn decode_wav_reader<R: Read>(
    mut reader: WavReader<R>,
    byte_len: u64,
    normalization: Normalization,
    cancel: &CancelFlag,
) -> DecodeResult<DecodedAudio> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    let capacity = initial_capacity(reader.len(), byte_len, spec.bits_per_sample);
    tracing::debug!(
        "WAV spec: {} channels, {}Hz, {} bits, {:?}",
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let buffer = match spec.sample_format {
        SampleFormat::Int => {
            let mut raw: Vec<i32> = Vec::with_capacity(capacity);
            for (i, sample) in reader.samples::<i32>().enumerate() {
                if i % CANCEL_CHECK_INTERVAL == 0 {
                    cancel.check()?;
                }
                raw.push(sample?);
            }
            SampleBuffer::from_int_samples(
                &raw,
                spec.bits_per_sample,
                channels,
                spec.sample_rate,
                normalization,
            )?
        }
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(DecodeError::UnsupportedFormat(format!(
                    "{}-bit float WAV",
                    spec.bits_per_sample
                )));
            }
            let mut samples: Vec<f32> = Vec::with_capacity(capacity);
            for (i, sample) in reader.samples::<f32>().enumerate() {
                if i % CANCEL_CHECK_INTERVAL == 0 {
                    cancel.check()?;
                }
                samples.push(sample?);
            }
            SampleBuffer::new(samples, channels, spec.sample_rate)?
        }
    };

    cancel.check()?;

    Ok(DecodedAudio {
        buffer,
        source: SourceInfo {
            bits_per_sample: spec.bits_per_sample,
            float: spec.sample_format == SampleFormat::Float,
            converted: false,
        },
    })
}

/// Samples to reserve: the header's count, capped by what `byte_len` holds.
fn initial_capacity(declared_samples: u32, byte_len: u64, bits_per_sample: u16) -> usize {
    let bytes_per_sample = u64::from(bits_per_sample.div_ceil(8).max(1));
    let fits = byte_len / bytes_per_sample;
    usize::try_from(u64::from(declared_samples).min(fits)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_support::{temp_wav_path, write_wav};
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Reader that raises `cancel` once `limit` bytes have been read.
    struct CancelAfter<R> {
        inner: R,
        cancel: CancelFlag,
        limit: usize,
        read: Arc<AtomicUsize>,
    }

    impl<R: Read> Read for CancelAfter<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.inner.read(buf)?;
            let total = self.read.fetch_add(n, Ordering::Relaxed) + n;
            if total >= self.limit {
                self.cancel.cancel();
            }
            Ok(n)
        }
    }

    #[test]
    fn test_decode_stereo_int_wav_with_peak_normalization() {
        let path = write_wav("stereo_int", 2, 8000, &[16384, -8192, -32768, 0, 0, 4096]);

        let decoded = decode_wav(&path, Normalization::Peak, &CancelFlag::new()).unwrap();
        std::fs::remove_file(&path).ok();

        let buffer = &decoded.buffer;
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.frame_count(), 3);
        assert_eq!(buffer.samples(), &[0.5, -0.25, -1.0, 0.0, 0.0, 0.125]);
        assert_eq!(decoded.source.bits_per_sample, 16);
        assert!(!decoded.source.float);
    }

    #[test]
    fn test_decode_full_scale() {
        let path = write_wav("full_scale", 1, 8000, &[8192, -8192]);

        let decoded = decode_wav(&path, Normalization::FullScale, &CancelFlag::new()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.buffer.samples(), &[0.25, -0.25]);
    }

    #[test]
    fn test_decode_float_wav() {
        let path = temp_wav_path("float");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.25f32, -0.75, 0.5] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let decoded = decode_wav(&path, Normalization::Peak, &CancelFlag::new()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.buffer.samples(), &[0.25, -0.75, 0.5]);
        assert!(decoded.source.float);
    }

    #[test]
    fn test_empty_wav_is_valid() {
        let path = write_wav("empty", 2, 8000, &[]);

        let decoded = decode_wav(&path, Normalization::Peak, &CancelFlag::new()).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(decoded.buffer.is_empty());
        assert_eq!(decoded.buffer.channel_count(), 2);
    }

    #[test]
    fn test_cancelled_decode() {
        let path = write_wav("cancelled", 1, 8000, &[1, 2, 3, 4]);

        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = decode_wav(&path, Normalization::Peak, &cancel);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(DecodeError::Cancelled)));
    }

    #[test]
    fn test_not_a_wav() {
        let path = temp_wav_path("garbage");
        std::fs::write(&path, b"definitely not RIFF data").unwrap();

        let result = decode_wav(&path, Normalization::Peak, &CancelFlag::new());
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(DecodeError::Wav(_))));
    }

    #[test]
    fn test_placeholder_data_length_is_an_error() {
        let path = write_wav("placeholder_len", 1, 8000, &[1, 2, 3, 4]);
        let mut bytes = std::fs::read(&path).unwrap();
        // data chunk size of a canonical 16-bit PCM header
        bytes[40..44].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let result = decode_wav(&path, Normalization::Peak, &CancelFlag::new());
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(DecodeError::Wav(_))));
    }

    #[test]
    fn test_initial_capacity_is_bounded_by_file_length() {
        assert_eq!(initial_capacity(0xFFFF_FFF0, 52, 16), 26);
        assert_eq!(initial_capacity(4, 1_000, 16), 4);
        assert_eq!(initial_capacity(10, 30, 24), 10);
        assert_eq!(initial_capacity(100, 0, 32), 0);
    }

    #[test]
    fn test_cancel_while_decoding_stops_early() {
        let total = CANCEL_CHECK_INTERVAL * 4;
        let path = write_wav("cancel_midway", 1, 8000, &vec![100i16; total]);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let cancel = CancelFlag::new();
        let read = Arc::new(AtomicUsize::new(0));
        let source = CancelAfter {
            inner: Cursor::new(bytes.clone()),
            cancel: cancel.clone(),
            // past the header and a few samples, before the first interval ends
            limit: 256,
            read: Arc::clone(&read),
        };
        let reader = WavReader::new(source).unwrap();
        let result = decode_wav_reader(reader, bytes.len() as u64, Normalization::Peak, &cancel);

        assert!(matches!(result, Err(DecodeError::Cancelled)));
        // stopped at the next check instead of reading the whole file
        assert!(read.load(Ordering::Relaxed) < bytes.len() / 2);
    }
}
