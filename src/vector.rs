use std::ops::Deref;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector(Vec<f64>);

impl Vector {
    pub fn zeros(dimension: usize) -> Self {
        Self(vec![0.0; dimension])
    }

    /// Components drawn uniformly from [-1, 1).
    pub fn random<R: Rng + ?Sized>(rng: &mut R, dimension: usize) -> Self {
        Self((0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect())
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn scale(&mut self, factor: f64) {
        for x in &mut self.0 {
            *x *= factor;
        }
    }

    /// `self += factor * other`
    pub fn add_scaled(&mut self, other: &Vector, factor: f64) {
        for (x, y) in self.0.iter_mut().zip(&other.0) {
            *x += factor * y;
        }
    }
}

impl From<Vec<f64>> for Vector {
    fn from(components: Vec<f64>) -> Self {
        Self(components)
    }
}

impl Deref for Vector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Cosine of the angle between `a` and `b`, clamped to [-1, 1].
/// Zero-norm inputs score 0.
pub fn cosine_similarity(a: &Vector, b: &Vector) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0)
}
