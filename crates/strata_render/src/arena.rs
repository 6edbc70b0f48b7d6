//! Per-worker scratch memory for shading-time allocations.

use bumpalo::Bump;

/// Default size past which the arena is reset in the middle of a pixel.
pub const DEFAULT_RESET_THRESHOLD: usize = 16 * 1024 * 1024;

/// A bump arena owned by one worker.
///
/// BSDFs for a path are allocated here and dropped all at once. The caller
/// resets after every pixel, and between samples once the arena has grown
/// past its threshold.
pub struct ScratchArena {
    bump: Bump,
    reset_threshold: usize,
}

impl ScratchArena {
    pub fn new(reset_threshold: usize) -> Self {
        Self {
            bump: Bump::new(),
            reset_threshold,
        }
    }

    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    pub fn reset(&mut self) {
        self.bump.reset();
    }

    /// Reset only when past the threshold. Returns true if it did.
    pub fn reset_if_full(&mut self) -> bool {
        if self.bump.allocated_bytes() > self.reset_threshold {
            self.bump.reset();
            true
        } else {
            false
        }
    }
}

impl Default for ScratchArena {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_if_full() {
        let mut arena = ScratchArena::new(64);
        for i in 0..256u64 {
            arena.bump().alloc(i);
        }
        assert!(arena.allocated_bytes() > 64);
        assert!(arena.reset_if_full());
        assert!(!ScratchArena::new(usize::MAX).reset_if_full());
    }
}
