//! Division of the image into grid tasks.
//!
//! Tasks are square tiles rendered independently, handed out from the image
//! centre outward so the most important part of the frame appears first.

/// Default task edge length in pixels.
pub const DEFAULT_TASK_GRID_SIZE: i32 = 32;

/// A rectangular block of pixels `[x_begin, x_end) × [y_begin, y_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridTask {
    /// Position of this task in the render order.
    pub index: usize,
    pub x_begin: i32,
    pub x_end: i32,
    pub y_begin: i32,
    pub y_end: i32,
}

impl GridTask {
    pub fn width(&self) -> i32 {
        self.x_end - self.x_begin
    }

    pub fn height(&self) -> i32 {
        self.y_end - self.y_begin
    }

    /// Get the total number of pixels in this task.
    pub fn pixel_count(&self) -> usize {
        (self.width() * self.height()) as usize
    }

    /// Sampler seed derived from the task position only.
    pub fn seed(&self, image_width: u32) -> u64 {
        self.y_begin as u64 * image_width as u64 + self.x_begin as u64
    }

    fn center(&self) -> (f32, f32) {
        (
            (self.x_begin + self.x_end) as f32 / 2.0,
            (self.y_begin + self.y_end) as f32 / 2.0,
        )
    }
}

/// Split a `width × height` image into `grid_size`-pixel tasks in centre-out
/// order. Edge tasks are clipped to the image.
pub fn divide_into_tasks(width: u32, height: u32, grid_size: i32) -> Vec<GridTask> {
    let (w, h) = (width as i32, height as i32);
    let grid_size = grid_size.max(1);
    let mut tasks = Vec::new();

    let mut y = 0;
    while y < h {
        let mut x = 0;
        while x < w {
            tasks.push(GridTask {
                index: tasks.len(),
                x_begin: x,
                x_end: (x + grid_size).min(w),
                y_begin: y,
                y_end: (y + grid_size).min(h),
            });
            x += grid_size;
        }
        y += grid_size;
    }

    sort_spiral(&mut tasks, width, height);

    // Update indices after sorting
    for (i, task) in tasks.iter_mut().enumerate() {
        task.index = i;
    }

    tasks
}

/// Sort tasks by distance from the image centre.
///
/// The sort is stable, so ties keep their row-major order and the result is
/// the same on every run.
fn sort_spiral(tasks: &mut [GridTask], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let dist = |t: &GridTask| {
        let (x, y) = t.center();
        (x - center_x).powi(2) + (y - center_y).powi(2)
    };
    tasks.sort_by(|a, b| dist(a).total_cmp(&dist(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divide_exact_fit() {
        let tasks = divide_into_tasks(128, 128, 64);
        assert_eq!(tasks.len(), 4); // 2x2 grid

        // Total pixels should equal image size
        let total: usize = tasks.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total, 128 * 128);
    }

    #[test]
    fn test_divide_partial_fit() {
        let tasks = divide_into_tasks(100, 70, 32);
        assert_eq!(tasks.len(), 4 * 3);
        let total: usize = tasks.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total, 100 * 70);
        assert!(tasks.iter().all(|t| t.x_end <= 100 && t.y_end <= 70));
    }

    #[test]
    fn test_spiral_order() {
        let tasks = divide_into_tasks(192, 192, 64);
        assert_eq!(tasks.len(), 9); // 3x3 grid

        // First task should be the center one
        let first = &tasks[0];
        assert_eq!(first.x_begin, 64);
        assert_eq!(first.y_begin, 64);
        assert!(tasks.iter().enumerate().all(|(i, t)| t.index == i));
    }

    #[test]
    fn test_tasks_are_disjoint() {
        let (w, h) = (75u32, 41u32);
        let tasks = divide_into_tasks(w, h, 16);
        let mut covered = vec![0u8; (w * h) as usize];
        for t in &tasks {
            for y in t.y_begin..t.y_end {
                for x in t.x_begin..t.x_end {
                    covered[(y as u32 * w + x as u32) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_seed_from_position() {
        let t = GridTask {
            index: 3,
            x_begin: 32,
            x_end: 64,
            y_begin: 64,
            y_end: 96,
        };
        assert_eq!(t.seed(100), 64 * 100 + 32);
    }
}
