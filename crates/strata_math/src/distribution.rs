/// Discrete distribution proportional to a list of non-negative weights.
///
/// Used for picking triangles by area and lights by power.
#[derive(Debug, Clone)]
pub struct Distribution1D {
    cdf: Vec<f32>,
    total: f32,
}

impl Distribution1D {
    /// Returns `None` when there is nothing to sample: no weights, a
    /// non-positive total, or non-finite weights.
    pub fn new(weights: &[f32]) -> Option<Self> {
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return None;
        }
        let total: f32 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }

        let mut cdf = Vec::with_capacity(weights.len());
        let mut running = 0.0_f64;
        for &w in weights {
            running += w as f64;
            cdf.push((running / total as f64) as f32);
        }
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        Some(Self { cdf, total })
    }

    /// Pick an index for `u` in `[0, 1)`; returns the index and its probability.
    pub fn sample(&self, u: f32) -> (usize, f32) {
        let index = self
            .cdf
            .partition_point(|&c| c <= u)
            .min(self.cdf.len() - 1);
        (index, self.pmf(index))
    }

    /// Probability of picking `index`.
    pub fn pmf(&self, index: usize) -> f32 {
        let hi = self.cdf[index];
        let lo = if index == 0 { 0.0 } else { self.cdf[index - 1] };
        hi - lo
    }

    /// Sum of the weights the distribution was built from.
    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.cdf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cdf.is_empty()
    }
}
