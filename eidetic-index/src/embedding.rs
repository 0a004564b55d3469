//! Fixed-dimension embedding vectors and their similarity arithmetic.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Dimensionality of every embedding handled by this crate.
///
/// Matches the output of `text-embedding-ada-002`.
pub const EMBEDDING_DIM: usize = 1536;

/// A vector of `f32` components, serialized transparently as a JSON array.
///
/// A well-formed embedding has exactly [`EMBEDDING_DIM`] components, all
/// finite. The arithmetic below refuses malformed vectors with a typed
/// error instead of letting NaN propagate into similarity scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wrap a raw component vector without validating it.
    pub fn new(components: Vec<f32>) -> Self {
        Self(components)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the vector has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw components.
    pub fn components(&self) -> &[f32] {
        &self.0
    }

    /// True if the vector cannot participate in similarity math: wrong
    /// length, or any non-finite component.
    pub fn is_malformed(&self) -> bool {
        self.0.len() != EMBEDDING_DIM || self.0.iter().any(|c| !c.is_finite())
    }

    pub(crate) fn ensure_well_formed(&self) -> Result<()> {
        if self.0.len() != EMBEDDING_DIM {
            return Err(IndexError::MalformedVector {
                reason: format!("{} components, expected {EMBEDDING_DIM}", self.0.len()),
            });
        }
        if self.0.iter().any(|c| !c.is_finite()) {
            return Err(IndexError::MalformedVector { reason: "non-finite component".to_string() });
        }
        Ok(())
    }

    /// Euclidean norm.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MalformedVector`] if the vector is malformed.
    pub fn magnitude(&self) -> Result<f32> {
        self.ensure_well_formed()?;
        Ok(self.0.iter().map(|c| c * c).sum::<f32>().sqrt())
    }

    /// Scale the vector to unit length in place.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MalformedVector`] if the vector is malformed
    /// or has zero magnitude (there is no direction to keep).
    pub fn normalize(&mut self) -> Result<()> {
        let magnitude = self.magnitude()?;
        if magnitude == 0.0 {
            return Err(IndexError::MalformedVector { reason: "zero magnitude".to_string() });
        }
        for c in &mut self.0 {
            *c /= magnitude;
        }
        Ok(())
    }

    /// Inner product with another vector.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DimensionMismatch`] if the lengths differ,
    /// and [`IndexError::MalformedVector`] if either vector is malformed.
    pub fn dot(&self, other: &Embedding) -> Result<f32> {
        if self.0.len() != other.0.len() {
            return Err(IndexError::DimensionMismatch {
                left: self.0.len(),
                right: other.0.len(),
            });
        }
        self.ensure_well_formed()?;
        other.ensure_well_formed()?;
        Ok(self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum())
    }

    /// Cosine similarity: the dot product scaled by both magnitudes.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`dot`](Embedding::dot) and
    /// [`magnitude`](Embedding::magnitude), plus when either vector has
    /// zero magnitude.
    pub fn cosine(&self, other: &Embedding) -> Result<f32> {
        let dot = self.dot(other)?;
        let mag_a = self.magnitude()?;
        let mag_b = other.magnitude()?;
        if mag_a == 0.0 || mag_b == 0.0 {
            return Err(IndexError::MalformedVector { reason: "zero magnitude".to_string() });
        }
        Ok(dot / (mag_a * mag_b))
    }
}
