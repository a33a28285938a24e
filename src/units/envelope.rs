// Envelope generators.

// ═══════════════════════════════════════════════════════════════════
// ADSR Envelope
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq)]
enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear ADSR. Times are in seconds, sustain is a 0-1 level.
pub struct AdsrEnvelope {
    stage: EnvelopeStage,
    level: f32,

    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,

    sample_rate: f32,
    release_level: f32,
}

impl AdsrEnvelope {
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            attack: 0.25,
            decay: 0.25,
            sustain: 0.5,
            release: 0.25,
            sample_rate: 48_000.0,
            release_level: 0.0,
        }
    }

    pub fn configure(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate as f32;
    }

    pub fn set_shape(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.attack = attack.max(0.001);
        self.decay = decay.max(0.001);
        self.sustain = sustain.clamp(0.0, 1.0);
        self.release = release.max(0.001);
    }

    /// Gate on: restart the attack from silence.
    pub fn trigger(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
    }

    /// Gate off: fade from the current level.
    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Idle && self.stage != EnvelopeStage::Release {
            self.release_level = self.level;
            self.stage = EnvelopeStage::Release;
        }
    }

    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => 0.0,

            EnvelopeStage::Attack => {
                let rate = 1.0 / (self.attack * self.sample_rate).max(1.0);
                self.level += rate;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
                self.level
            }

            EnvelopeStage::Decay => {
                let rate = (1.0 - self.sustain) / (self.decay * self.sample_rate).max(1.0);
                self.level -= rate;
                if self.level <= self.sustain {
                    self.level = self.sustain;
                    self.stage = EnvelopeStage::Sustain;
                }
                self.level
            }

            EnvelopeStage::Sustain => self.sustain,

            EnvelopeStage::Release => {
                let rate = self.release_level / (self.release * self.sample_rate).max(1.0);
                self.level -= rate;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
                self.level
            }
        }
    }
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn env(sample_rate: f64) -> AdsrEnvelope {
        let mut env = AdsrEnvelope::new();
        env.configure(sample_rate);
        env
    }

    #[test]
    fn attack_reaches_peak_then_settles_on_sustain() {
        let mut env = env(1000.0);
        env.set_shape(0.01, 0.01, 0.5, 0.01);
        env.trigger();

        let peak = (0..10).map(|_| env.next()).fold(0.0f32, f32::max);
        assert_relative_eq!(peak, 1.0, epsilon = 1e-5);

        for _ in 0..20 {
            env.next();
        }
        assert_relative_eq!(env.next(), 0.5);
    }

    #[test]
    fn release_returns_to_idle() {
        let mut env = env(1000.0);
        env.set_shape(0.01, 0.01, 0.5, 0.02);
        env.trigger();
        for _ in 0..50 {
            env.next();
        }
        env.release();
        for _ in 0..21 {
            env.next();
        }
        assert!(env.is_idle());
        assert_eq!(env.next(), 0.0);
    }

    #[test]
    fn release_before_any_output_goes_idle() {
        let mut env = env(48_000.0);
        env.trigger();
        env.release();
        assert_eq!(env.next(), 0.0);
        assert!(env.is_idle());
    }
}
