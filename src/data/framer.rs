// ============================================================
// Layer 4 - Audio Framer
// ============================================================
// Splits a sample buffer into overlapping analysis windows.
//
// Example with window=5, hop=2:
//   Samples: s0 s1 s2 s3 s4 s5 s6 s7 s8
//   Frame 1: s0 .. s4
//   Frame 2: s2 .. s6
//   Frame 3: s4 .. s8
//
// Two tail policies:
//   - `frames`        drops samples that do not fill a whole
//                     window (spectrogram convention)
//   - `padded_frames` zero-pads the tail so every sample lands
//                     in at least one frame (MFCC convention)
//
// Reference: Rust Book §8 (Slices)

#[derive(Debug, Clone, Copy)]
pub struct Framer {
    /// Samples per frame
    window: usize,
    /// Samples between frame starts
    hop:    usize,
}

impl Framer {
    /// # Panics
    /// Panics if `window` or `hop` is zero, since the frame count
    /// would be undefined.
    pub fn new(window: usize, hop: usize) -> Self {
        assert!(window > 0 && hop > 0, "window ({window}) and hop ({hop}) must be positive");
        Self { window, hop }
    }

    /// Number of whole windows that fit in `len` samples.
    pub fn num_frames(&self, len: usize) -> usize {
        if len < self.window {
            return 0;
        }
        (len - self.window) / self.hop + 1
    }

    /// Whole windows only; trailing samples that cannot fill a
    /// window are dropped.
    pub fn frames<'a>(&self, samples: &'a [f32]) -> Vec<&'a [f32]> {
        (0..self.num_frames(samples.len()))
            .map(|i| {
                let start = i * self.hop;
                &samples[start..start + self.window]
            })
            .collect()
    }

    /// Number of frames when the tail is zero-padded. Always at
    /// least one, even for an empty buffer.
    pub fn num_padded_frames(&self, len: usize) -> usize {
        if len <= self.window {
            1
        } else {
            1 + (len - self.window).div_ceil(self.hop)
        }
    }

    /// Every sample covered; the last frame is zero-padded.
    pub fn padded_frames(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let count      = self.num_padded_frames(samples.len());
        let padded_len = (count - 1) * self.hop + self.window;

        let mut padded = samples.to_vec();
        padded.resize(padded_len, 0.0);

        (0..count)
            .map(|i| {
                let start = i * self.hop;
                padded[start..start + self.window].to_vec()
            })
            .collect()
    }
}
