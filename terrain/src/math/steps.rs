use num_traits::Float;

/// One sample position along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<T> {
    /// Distance from the viewpoint.
    pub distance: T,
    /// Distance from the previous sample.
    pub length: T,
}

/// Sample distances that start at `min_step` apart and grow
/// geometrically with `growth` once `distance * growth` exceeds
/// `min_step`.
///
/// Angular resolution requirements relax with distance, so far
/// samples can be sparser than near ones.
#[derive(Debug, Clone)]
pub struct AdaptiveSteps<T> {
    distance: T,
    min_step: T,
    growth: T,
    max_distance: T,
}

impl<T: Float> AdaptiveSteps<T> {
    pub fn new(min_step: T, growth: T, max_distance: T) -> Self {
        Self {
            distance: T::zero(),
            min_step,
            growth,
            max_distance,
        }
    }
}

impl<T: Float> Iterator for AdaptiveSteps<T> {
    type Item = Step<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let length = (self.distance * self.growth).max(self.min_step);
        let distance = self.distance + length;
        if distance > self.max_distance {
            None
        } else {
            self.distance = distance;
            Some(Step { distance, length })
        }
    }
}

impl<T: Float> std::iter::FusedIterator for AdaptiveSteps<T> {}
