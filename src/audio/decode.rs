//! Audio file decoding to mono PCM at the model sample rate

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{self, Result};

/// Decode `path`, downmix to mono and resample to `target_rate`
pub fn decode_file(path: &Path, target_rate: u32) -> Result<Vec<f32>> {
    let fail = |reason: String| error::analysis::decode_failed(path.display().to_string(), reason);

    let file = File::open(path).map_err(|e| fail(e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| fail(format!("probe: {e}")))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| fail("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| fail("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| fail(format!("codec: {e}")))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(fail(format!("packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(fail(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }
        let channels = spec.channels.count().max(1);

        let mut buffer = SampleBuffer::<f32>::new(frames as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        if channels > 1 {
            samples.extend(
                buffer
                    .samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        } else {
            samples.extend_from_slice(buffer.samples());
        }
    }

    if samples.is_empty() {
        return Err(fail("no audio samples decoded".to_string()));
    }

    if source_rate != target_rate {
        samples = resample(&samples, source_rate, target_rate)?;
    }

    tracing::debug!(
        file = %path.display(),
        source_rate,
        samples = samples.len(),
        duration_secs = samples.len() as f32 / target_rate as f32,
        "Audio decoded"
    );

    Ok(samples)
}

/// Band-limited resampling of a mono signal
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let chunk_size = 1024;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| error::analysis::resample_failed(format!("init: {e}")))?;

    let expected_len = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(delay + expected_len + chunk_size);
    let resample_err = |e: rubato::ResampleError| error::analysis::resample_failed(e.to_string());

    for chunk in samples.chunks(chunk_size) {
        let result = if chunk.len() == chunk_size {
            resampler.process(&[chunk], None).map_err(resample_err)?
        } else {
            resampler
                .process_partial(Some(&[chunk][..]), None)
                .map_err(resample_err)?
        };
        if let Some(channel) = result.first() {
            output.extend_from_slice(channel);
        }
    }

    // Flush the filter tail so the delayed samples come out
    while output.len() < delay + expected_len {
        let result = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(resample_err)?;
        match result.first() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
            _ => break,
        }
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected_len, 0.0);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{tone, write_wav};
    use tempfile::TempDir;

    #[test]
    fn test_decode_mono_wav_at_target_rate() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clip.wav");
        write_wav(&path, 44_100, 1, &tone(440.0, 44_100, 0.5, 0.5));

        let samples = decode_file(&path, 44_100).unwrap();
        assert_eq!(samples.len(), 22_050);
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.01, "peak {peak}");
    }

    #[test]
    fn test_decode_downmixes_stereo() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stereo.wav");
        // Left at +0.5, right at -0.5: the mono mix is silence
        let interleaved: Vec<f32> = (0..8_000).flat_map(|_| [0.5, -0.5]).collect();
        write_wav(&path, 8_000, 2, &interleaved);

        let samples = decode_file(&path, 8_000).unwrap();
        assert_eq!(samples.len(), 8_000);
        assert!(samples.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn test_decode_resamples() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("low.wav");
        write_wav(&path, 22_050, 1, &tone(220.0, 22_050, 1.0, 0.5));

        let samples = decode_file(&path, 44_100).unwrap();
        assert_eq!(samples.len(), 44_100);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("noise.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let err = decode_file(&path, 44_100).unwrap_err();
        assert!(err.to_string().contains("Failed to decode audio"));
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_file(Path::new("/nonexistent/clip.wav"), 44_100).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/clip.wav"));
    }

    #[test]
    fn test_resample_is_aligned() {
        // A step from silence to a constant at 0.5 s must stay at 0.5 s after upsampling
        let mut input = vec![0.0f32; 8_000];
        input.extend(std::iter::repeat_n(0.5f32, 8_000));

        let output = resample(&input, 16_000, 32_000).unwrap();
        assert_eq!(output.len(), 32_000);

        let edge = output.iter().position(|s| *s > 0.25).unwrap();
        assert!((15_980..=16_020).contains(&edge), "step found at {edge}");
        // The end of the signal is real output, not padding
        assert!(output[30_000..31_500].iter().all(|s| (s - 0.5).abs() < 0.05));
    }

    #[test]
    fn test_resample_identity() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&input, 16_000, 16_000).unwrap(), input);
    }
}
