// Naive (non-bandlimited) oscillators.

/// Oscillator shape, selected by the `osctype` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Square,
    Saw,
}

impl Waveform {
    /// Map a stored parameter value to a shape; rounds to the nearest choice.
    pub fn from_param(value: f32) -> Self {
        if value.round() >= 1.0 {
            Waveform::Saw
        } else {
            Waveform::Square
        }
    }
}

/// Equal-tempered frequency of a note number, A4 (69) = 440 Hz.
#[inline]
pub fn note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

// ═══════════════════════════════════════════════════════════════════
// Oscillator
// ═══════════════════════════════════════════════════════════════════

pub struct Oscillator {
    phase: f32,
    freq: f32,
    inc: f32,
    sample_rate: f32,
}

impl Oscillator {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            freq: 440.0,
            inc: 440.0 / 48_000.0,
            sample_rate: 48_000.0,
        }
    }

    pub fn configure(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate as f32;
        self.set_frequency(self.freq);
    }

    pub fn set_frequency(&mut self, freq: f32) {
        self.freq = freq;
        self.inc = freq / self.sample_rate;
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Next sample in [-1, 1].
    ///
    /// `pwm` is the square's high fraction of each cycle; saw ignores it.
    #[inline]
    pub fn next(&mut self, waveform: Waveform, pwm: f32) -> f32 {
        let out = match waveform {
            Waveform::Square => {
                if self.phase < pwm {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * self.phase - 1.0,
        };
        self.phase = (self.phase + self.inc).fract();
        out
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn note_frequencies() {
        assert_relative_eq!(note_to_freq(69), 440.0);
        assert_relative_eq!(note_to_freq(81), 880.0, max_relative = 1e-6);
        assert_relative_eq!(note_to_freq(60), 261.625_58, max_relative = 1e-5);
    }

    #[test]
    fn waveform_from_param_rounds() {
        assert_eq!(Waveform::from_param(0.0), Waveform::Square);
        assert_eq!(Waveform::from_param(0.4), Waveform::Square);
        assert_eq!(Waveform::from_param(0.6), Waveform::Saw);
        assert_eq!(Waveform::from_param(1.0), Waveform::Saw);
    }

    #[test]
    fn square_duty_cycle_follows_pwm() {
        let mut osc = Oscillator::new();
        osc.configure(1000.0);
        osc.set_frequency(10.0); // 100 samples per cycle

        let high = (0..100)
            .filter(|_| osc.next(Waveform::Square, 0.25) > 0.0)
            .count();
        assert!((24..=26).contains(&high), "high samples: {high}");
    }

    #[test]
    fn saw_stays_in_range() {
        let mut osc = Oscillator::new();
        osc.configure(48_000.0);
        osc.set_frequency(1234.0);
        for _ in 0..10_000 {
            let s = osc.next(Waveform::Saw, 0.5);
            assert!((-1.0..=1.0).contains(&s));
        }
    }
}
