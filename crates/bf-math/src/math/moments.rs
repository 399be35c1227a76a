//! Sample moments (Welford).

/// Running sample moments.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleMoments {
    count: u64,
    mean: f64,
    m2: f64,
}

impl SampleMoments {
    pub fn from_slice(values: &[f64]) -> Self {
        let mut moments = SampleMoments::default();
        for v in values {
            moments.push(*v);
        }
        moments
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample mean; `None` before the first observation.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Unbiased sample variance (n - 1); `None` below two observations.
    pub fn variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_moments() {
        let m = SampleMoments::from_slice(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(m.count(), 8);
        assert!((m.mean().unwrap() - 5.0).abs() < 1e-12);
        assert!((m.variance().unwrap() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        let empty = SampleMoments::default();
        assert_eq!(empty.mean(), None);
        assert_eq!(empty.variance(), None);

        let single = SampleMoments::from_slice(&[3.0]);
        assert_eq!(single.mean(), Some(3.0));
        assert_eq!(single.std_dev(), None);
    }
}
