//! Sample generators.
//!
//! One immutable prototype sampler is configured per render. Each grid task
//! clones it with a seed derived from the task's position, so results do not
//! depend on which worker ran the task.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use strata_math::{Vec2, Vec3};

use crate::error::{ConfigError, ConfigResult};

/// Source of uniform numbers in `[0, 1)` for one pixel at a time.
///
/// Usage per pixel is do-while shaped: call [`Sampler::start_pixel`], draw
/// samples, then [`Sampler::next_sample`] until it returns false.
pub trait Sampler: Send + Sync {
    /// Independent sampler with the same configuration, mixed with `seed`.
    fn clone_seeded(&self, seed: u64) -> Box<dyn Sampler>;

    fn start_pixel(&mut self, x: i32, y: i32);

    /// Advance to the next sample of the current pixel; false when done.
    fn next_sample(&mut self) -> bool;

    fn samples_per_pixel(&self) -> u32;

    fn sample1(&mut self) -> f32;

    fn sample2(&mut self) -> Vec2 {
        let x = self.sample1();
        Vec2::new(x, self.sample1())
    }

    fn sample3(&mut self) -> Vec3 {
        let x = self.sample1();
        let y = self.sample1();
        Vec3::new(x, y, self.sample1())
    }

    fn sample5(&mut self) -> [f32; 5] {
        std::array::from_fn(|_| self.sample1())
    }
}

/// Independent uniform sampler driven by xoshiro256++.
#[derive(Debug, Clone)]
pub struct NativeSampler {
    rng: Xoshiro256PlusPlus,
    seed: u64,
    spp: u32,
    index: u32,
}

impl NativeSampler {
    pub fn new(spp: i32, seed: u64) -> ConfigResult<Self> {
        if spp <= 0 {
            return Err(ConfigError::InvalidSamplesPerPixel(spp));
        }
        Ok(Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            seed,
            spp: spp as u32,
            index: 0,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Sampler for NativeSampler {
    fn clone_seeded(&self, seed: u64) -> Box<dyn Sampler> {
        // splitmix-style mixing keeps nearby task seeds uncorrelated
        let mixed = (self.seed ^ seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)).rotate_left(17);
        Box::new(Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(mixed),
            seed: mixed,
            spp: self.spp,
            index: 0,
        })
    }

    fn start_pixel(&mut self, _x: i32, _y: i32) {
        self.index = 0;
    }

    fn next_sample(&mut self) -> bool {
        self.index += 1;
        self.index < self.spp
    }

    fn samples_per_pixel(&self) -> u32 {
        self.spp
    }

    #[inline]
    fn sample1(&mut self) -> f32 {
        // gen::<f32>() is in [0, 1)
        self.rng.gen::<f32>()
    }
}
