//! Filtered film and the per-task film grids merged into it.
//!
//! Pixel `(x, y)` covers `[x, x + 1) × [y, y + 1)` in film space, with its
//! centre at `(x + 0.5, y + 0.5)`. A sample contributes to every pixel whose
//! centre lies within the filter support, but a grid only stores the pixels
//! it owns; samples near its border are therefore drawn from a footprint
//! slightly larger than the grid.

use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};

use strata_math::{Spectrum, Vec2, Vec3};

use crate::buffer::ImageBuffer;
use crate::error::{ConfigError, ConfigResult};
use crate::filter::Filter;

/// First-hit auxiliary data recorded alongside radiance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GBufferPixel {
    pub albedo: Spectrum,
    pub position: Vec3,
    pub normal: Vec3,
    pub depth: f32,
    /// 1 where the camera ray hit a surface, 0 where it escaped.
    pub mask: f32,
}

impl GBufferPixel {
    fn add_weighted(&mut self, other: &GBufferPixel, w: f32) {
        self.albedo += other.albedo * w;
        self.position += other.position * w;
        self.normal += other.normal * w;
        self.depth += other.depth * w;
        self.mask += other.mask * w;
    }

    fn scaled(&self, s: f32) -> GBufferPixel {
        GBufferPixel {
            albedo: self.albedo * s,
            position: self.position * s,
            normal: self.normal * s,
            depth: self.depth * s,
            mask: self.mask * s,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FilmPixel {
    value: Spectrum,
    weight: f32,
    gbuffer: GBufferPixel,
}

impl FilmPixel {
    fn merge(&mut self, other: &FilmPixel) {
        self.value += other.value;
        self.weight += other.weight;
        self.gbuffer.add_weighted(&other.gbuffer, 1.0);
    }
}

/// Tile-local accumulation buffer for the pixels `[x0, x1) × [y0, y1)`.
pub struct FilmGrid {
    x0: i32,
    x1: i32,
    y0: i32,
    y1: i32,
    sample_x: Range<i32>,
    sample_y: Range<i32>,
    filter: Arc<dyn Filter>,
    pixels: Vec<FilmPixel>,
}

impl FilmGrid {
    pub fn new(x0: i32, x1: i32, y0: i32, y1: i32, filter: Arc<dyn Filter>) -> Self {
        let r = filter.radius();
        let sample_x = (x0 as f32 + 0.5 - r).floor() as i32..(x1 as f32 - 0.5 + r).ceil() as i32;
        let sample_y = (y0 as f32 + 0.5 - r).floor() as i32..(y1 as f32 - 0.5 + r).ceil() as i32;
        let size = ((x1 - x0).max(0) * (y1 - y0).max(0)) as usize;
        Self {
            x0,
            x1,
            y0,
            y1,
            sample_x,
            sample_y,
            filter,
            pixels: vec![FilmPixel::default(); size],
        }
    }

    /// Pixel columns whose samples can reach this grid.
    pub fn sample_x_range(&self) -> Range<i32> {
        self.sample_x.clone()
    }

    /// Pixel rows whose samples can reach this grid.
    pub fn sample_y_range(&self) -> Range<i32> {
        self.sample_y.clone()
    }

    pub fn x_range(&self) -> Range<i32> {
        self.x0..self.x1
    }

    pub fn y_range(&self) -> Range<i32> {
        self.y0..self.y1
    }

    /// Splat a sample at film position `pos` with extra weight `w`.
    pub fn add_sample(&mut self, pos: Vec2, value: Spectrum, gpixel: &GBufferPixel, w: f32) {
        let r = self.filter.radius();
        let x_begin = ((pos.x - r - 0.5).ceil() as i32).max(self.x0);
        let y_begin = ((pos.y - r - 0.5).ceil() as i32).max(self.y0);
        let x_end = ((pos.x + r - 0.5).floor() as i32 + 1).min(self.x1);
        let y_end = ((pos.y + r - 0.5).floor() as i32 + 1).min(self.y1);

        let width = (self.x1 - self.x0) as usize;
        for y in y_begin..y_end {
            let dy = pos.y - (y as f32 + 0.5);
            for x in x_begin..x_end {
                let dx = pos.x - (x as f32 + 0.5);
                let weight = w * self.filter.eval(dx, dy);
                if weight == 0.0 {
                    continue;
                }
                let index = (y - self.y0) as usize * width + (x - self.x0) as usize;
                let pixel = &mut self.pixels[index];
                pixel.value += value * weight;
                pixel.weight += weight;
                pixel.gbuffer.add_weighted(gpixel, weight);
            }
        }
    }
}

/// Auxiliary images normalized by filter weight.
#[derive(Debug, Clone)]
pub struct GBuffer {
    pub albedo: ImageBuffer<Spectrum>,
    pub position: ImageBuffer<Vec3>,
    pub normal: ImageBuffer<Vec3>,
    pub depth: ImageBuffer<f32>,
    pub mask: ImageBuffer<f32>,
}

/// The shared render target. Grids are merged under a lock.
pub struct Film {
    width: u32,
    height: u32,
    filter: Arc<dyn Filter>,
    pixels: Mutex<Vec<FilmPixel>>,
}

impl Film {
    pub fn new(width: u32, height: u32, filter: Arc<dyn Filter>) -> ConfigResult<Self> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidFilmSize { width, height });
        }
        Ok(Self {
            width,
            height,
            filter,
            pixels: Mutex::new(vec![FilmPixel::default(); width as usize * height as usize]),
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn filter(&self) -> &dyn Filter {
        self.filter.as_ref()
    }

    /// A grid over `[x0, x1) × [y0, y1)` clipped to the film.
    pub fn new_grid(&self, x0: i32, x1: i32, y0: i32, y1: i32) -> FilmGrid {
        let (w, h) = (self.width as i32, self.height as i32);
        FilmGrid::new(
            x0.clamp(0, w),
            x1.clamp(0, w),
            y0.clamp(0, h),
            y1.clamp(0, h),
            Arc::clone(&self.filter),
        )
    }

    /// Add a grid's accumulated pixels to the film.
    pub fn merge_grid(&self, grid: &FilmGrid) {
        let mut pixels = self.pixels.lock().unwrap_or_else(PoisonError::into_inner);
        let grid_width = (grid.x1 - grid.x0) as usize;
        for y in grid.y0..grid.y1 {
            for x in grid.x0..grid.x1 {
                let local = (y - grid.y0) as usize * grid_width + (x - grid.x0) as usize;
                let global = y as usize * self.width as usize + x as usize;
                pixels[global].merge(&grid.pixels[local]);
            }
        }
    }

    /// Reset every pixel.
    pub fn clear(&self) {
        let mut pixels = self.pixels.lock().unwrap_or_else(PoisonError::into_inner);
        pixels.fill(FilmPixel::default());
    }

    /// Reconstructed radiance: value / weight, zero where nothing landed.
    pub fn image(&self) -> ImageBuffer<Spectrum> {
        let pixels = self.pixels.lock().unwrap_or_else(PoisonError::into_inner);
        let mut image = ImageBuffer::new(self.width, self.height);
        for (out, p) in image.pixels.iter_mut().zip(pixels.iter()) {
            if p.weight != 0.0 {
                *out = p.value / p.weight;
            }
        }
        image
    }

    /// Weight accumulated per pixel.
    pub fn weights(&self) -> ImageBuffer<f32> {
        let pixels = self.pixels.lock().unwrap_or_else(PoisonError::into_inner);
        let mut image = ImageBuffer::new(self.width, self.height);
        for (out, p) in image.pixels.iter_mut().zip(pixels.iter()) {
            *out = p.weight;
        }
        image
    }

    pub fn gbuffer(&self) -> GBuffer {
        let pixels = self.pixels.lock().unwrap_or_else(PoisonError::into_inner);
        let (w, h) = (self.width, self.height);
        let mut gbuffer = GBuffer {
            albedo: ImageBuffer::new(w, h),
            position: ImageBuffer::new(w, h),
            normal: ImageBuffer::new(w, h),
            depth: ImageBuffer::new(w, h),
            mask: ImageBuffer::new(w, h),
        };
        for (i, p) in pixels.iter().enumerate() {
            if p.weight == 0.0 {
                continue;
            }
            let g = p.gbuffer.scaled(1.0 / p.weight);
            gbuffer.albedo.pixels[i] = g.albedo;
            gbuffer.position.pixels[i] = g.position;
            gbuffer.normal.pixels[i] = g.normal.normalize_or_zero();
            gbuffer.depth.pixels[i] = g.depth;
            gbuffer.mask.pixels[i] = g.mask;
        }
        gbuffer
    }
}
