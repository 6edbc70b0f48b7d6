/// A closed range of real values, used for box extents along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Midpoint of the interval.
    pub fn center(&self) -> f32 {
        0.5 * (self.min + self.max)
    }

    /// Returns true if `other` lies inside this interval, allowing `eps` of slack.
    pub fn contains_interval(&self, other: &Interval, eps: f32) -> bool {
        self.min - eps <= other.min && other.max <= self.max + eps
    }

    /// Grow the interval so that it contains x.
    pub fn include(&self, x: f32) -> Interval {
        Interval::new(self.min.min(x), self.max.max(x))
    }

    /// Creates an interval that surrounds two other intervals.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };
}
