//! Vector math over embeddings.
//!
//! All embeddings compared in one process come from the same model, so a
//! length mismatch means bad data and is reported instead of truncated.

use crate::error::{AppError, AppResult};

fn ensure_same_len(a: &[f64], b: &[f64]) -> AppResult<()> {
    if a.len() != b.len() {
        return Err(AppError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Cosine similarity in [-1, 1]; 0 when either vector has zero magnitude
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> AppResult<f64> {
    ensure_same_len(a, b)?;

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Component-wise mean. `None` for an empty input.
pub fn mean_vector<'a, I>(vectors: I) -> AppResult<Option<Vec<f64>>>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut iter = vectors.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };

    let mut sum = first.to_vec();
    let mut count = 1usize;
    for vector in iter {
        ensure_same_len(&sum, vector)?;
        for (acc, x) in sum.iter_mut().zip(vector) {
            *acc += x;
        }
        count += 1;
    }

    let n = count as f64;
    Ok(Some(sum.into_iter().map(|x| x / n).collect()))
}

/// `weight_a * a + (1 - weight_a) * b`, element-wise
pub fn blend(a: &[f64], b: &[f64], weight_a: f64) -> AppResult<Vec<f64>> {
    ensure_same_len(a, b)?;
    let weight_b = 1.0 - weight_a;
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| weight_a * x + weight_b * y)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, -1.2, 4.0];
        assert!(approx(cosine_similarity(&v, &v).unwrap(), 1.0));
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert!(approx(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0));
        assert!(approx(cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap(), -1.0));
    }

    #[test]
    fn test_zero_vector_similarity_is_zero() {
        let zero = [0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &[1.0, 2.0, 3.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_fails_fast() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, AppError::DimensionMismatch { left: 2, right: 3 }));
    }

    #[test]
    fn test_mean_vector() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let mean = mean_vector([a.as_slice(), b.as_slice()]).unwrap().unwrap();
        assert_eq!(mean, vec![0.5, 0.5]);
    }

    #[test]
    fn test_mean_vector_empty() {
        let empty: Vec<&[f64]> = Vec::new();
        assert_eq!(mean_vector(empty).unwrap(), None);
    }

    #[test]
    fn test_mean_vector_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0];
        assert!(mean_vector([a.as_slice(), b.as_slice()]).is_err());
    }

    #[test]
    fn test_blend_weights() {
        let blended = blend(&[1.0, 0.0], &[0.0, 1.0], 0.6).unwrap();
        assert!(approx(blended[0], 0.6));
        assert!(approx(blended[1], 0.4));
    }
}
