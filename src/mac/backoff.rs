//! MILD (multiplicative increase, linear decrease) contention window.

use rand::Rng;

/// Contention window in slot units, always within `[min, max]`.
#[derive(Debug, Clone)]
pub struct Backoff {
    window: u32,
    min: u32,
    max: u32,
}

impl Backoff {
    pub fn new(min: u32, max: u32) -> Self {
        let min = min.max(1);
        let max = max.max(min);
        Self {
            window: min,
            min,
            max,
        }
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Failed handshake: `window := min(round(window * 1.5), max)`.
    pub fn increase(&mut self) {
        // round-half-up of w * 1.5
        let grown = (self.window as u64 * 3 + 1) / 2;
        self.window = grown.min(self.max as u64) as u32;
    }

    /// Successful reservation: `window := max(window - 1, min)`.
    pub fn decrease(&mut self) {
        self.window = self.window.saturating_sub(1).max(self.min);
    }

    pub fn reset(&mut self) {
        self.window = self.min;
    }

    /// Copy a window overheard on the air.
    pub fn sync(&mut self, overheard: u32) {
        self.window = overheard.clamp(self.min, self.max);
    }

    /// Random wait in slots, uniform over `1..=window`.
    pub fn draw_slots<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.window)
    }
}
