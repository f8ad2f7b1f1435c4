use std::path::Path;

/// A decoded drum sample: stereo frames at the engine's sample rate.
#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    frames: Vec<[f32; 2]>,
}

impl SampleBuffer {
    pub fn from_frames(frames: Vec<[f32; 2]>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, i: usize) -> Option<[f32; 2]> {
        self.frames.get(i).copied()
    }

    /// Decode a WAV from disk and resample it to the device rate so the
    /// engine can play it back one frame per output frame.
    pub fn from_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<_, _>>()?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let frames: Vec<[f32; 2]> = if channels == 1 {
            samples.into_iter().map(|x| [x, x]).collect()
        } else {
            // first two channels of each frame; anything extra is dropped
            samples
                .chunks_exact(channels)
                .map(|c| [c[0], c[1]])
                .collect()
        };

        let frames = if spec.sample_rate == target_rate {
            frames
        } else {
            resample_linear(&frames, spec.sample_rate, target_rate)
        };

        Ok(Self { frames })
    }
}

// Linear interpolation is plenty for one-shot drum hits.
fn resample_linear(frames: &[[f32; 2]], source_rate: u32, target_rate: u32) -> Vec<[f32; 2]> {
    if source_rate == target_rate || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);
    let last = frames.len() - 1;

    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        if idx >= last {
            out.push(frames[last]);
            continue;
        }
        let t = (src_pos - idx as f64) as f32;
        let a = frames[idx];
        let b = frames[idx + 1];
        out.push([
            a[0] * (1.0 - t) + b[0] * t,
            a[1] * (1.0 - t) + b[1] * t,
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsampling_doubles_length() {
        let frames = vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0], [-1.0, -1.0]];
        let out = resample_linear(&frames, 22050, 44100);
        assert_eq!(out.len(), 8);
        // midpoint between the first two source frames
        assert!((out[1][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn same_rate_is_a_copy() {
        let frames = vec![[0.25, -0.25]];
        let out = resample_linear(&frames, 44100, 44100);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], [0.25, -0.25]);
    }

    #[test]
    fn wav_roundtrip_mono_int() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0i16, 16384, -16384, 0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let buf = SampleBuffer::from_wav(&path, 44100).unwrap();
        assert_eq!(buf.len(), 4);
        let f = buf.frame(1).unwrap();
        // mono spreads to both channels
        assert!((f[0] - 0.5).abs() < 1e-3);
        assert_eq!(f[0], f[1]);
    }

    #[test]
    fn missing_wav_is_an_error() {
        assert!(SampleBuffer::from_wav(Path::new("/nonexistent/nope.wav"), 44100).is_err());
    }
}
