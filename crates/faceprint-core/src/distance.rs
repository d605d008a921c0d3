//! Shape distances between landmark point sets.
//!
//! Procrustes disparity for index-corresponding shapes of fixed cardinality,
//! Dynamic Time Warping for open contours whose sampling may differ, and the
//! symmetric Hausdorff distance for unordered point sets.

use crate::types::Point;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistanceError {
    #[error("shape mismatch: {left} points vs {right} points")]
    ShapeMismatch { left: usize, right: usize },
    #[error("shape must contain at least two distinct points")]
    DegenerateShape,
    #[error("shape has no points")]
    EmptyShape,
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Metric used to compare the shape of a landmark region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeMetric {
    Procrustes,
    Dtw,
}

impl ShapeMetric {
    pub fn distance(self, a: &[Point], b: &[Point]) -> Result<f64, DistanceError> {
        match self {
            ShapeMetric::Procrustes => procrustes_disparity(a, b),
            ShapeMetric::Dtw => dtw_distance(a, b),
        }
    }
}

/// Centre a shape on its centroid and scale it to unit Frobenius norm.
fn standardize(points: &[Point]) -> Result<Vec<(f64, f64)>, DistanceError> {
    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .map(|p| p.as_f64())
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (mean_x, mean_y) = (sum_x / n, sum_y / n);

    let centred: Vec<(f64, f64)> = points
        .iter()
        .map(|p| {
            let (x, y) = p.as_f64();
            (x - mean_x, y - mean_y)
        })
        .collect();

    let norm = centred.iter().map(|(x, y)| x * x + y * y).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Err(DistanceError::DegenerateShape);
    }

    Ok(centred.into_iter().map(|(x, y)| (x / norm, y / norm)).collect())
}

/// Residual disparity after optimal superimposition of `b` onto `a`.
///
/// Both shapes are centred and scaled to unit norm, then `b` is rotated
/// (reflections included, as in standard Procrustes analysis) and uniformly
/// scaled to best fit `a`. The result is the sum of squared residuals,
/// in `[0, 1]`.
pub fn procrustes_disparity(a: &[Point], b: &[Point]) -> Result<f64, DistanceError> {
    if a.len() != b.len() {
        return Err(DistanceError::ShapeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(DistanceError::EmptyShape);
    }

    let a = standardize(a)?;
    let b = standardize(b)?;

    // Cross-covariance M = Aᵀ B (2×2).
    let (mut m00, mut m01, mut m10, mut m11) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for (&(ax, ay), &(bx, by)) in a.iter().zip(b.iter()) {
        m00 += ax * bx;
        m01 += ax * by;
        m10 += ay * bx;
        m11 += ay * by;
    }

    // The optimal scale is the nuclear norm σ₁ + σ₂ of M, and the residual is
    // 1 − (σ₁ + σ₂)². For a 2×2 matrix (σ₁ + σ₂)² = ‖M‖²_F + 2·|det M|.
    let frobenius_sq = m00 * m00 + m01 * m01 + m10 * m10 + m11 * m11;
    let det = m00 * m11 - m01 * m10;
    let nuclear_sq = frobenius_sq + 2.0 * det.abs();

    Ok((1.0 - nuclear_sq).max(0.0))
}

/// Minimum cumulative Euclidean cost over all monotonic alignments.
pub fn dtw_distance(a: &[Point], b: &[Point]) -> Result<f64, DistanceError> {
    if a.is_empty() || b.is_empty() {
        return Err(DistanceError::EmptyShape);
    }

    let (n, m) = (a.len(), b.len());
    let mut cost = Array2::<f64>::from_elem((n + 1, m + 1), f64::INFINITY);
    cost[[0, 0]] = 0.0;

    for i in 1..=n {
        for j in 1..=m {
            let step = a[i - 1].distance(b[j - 1]);
            let best = cost[[i - 1, j]]
                .min(cost[[i, j - 1]])
                .min(cost[[i - 1, j - 1]]);
            cost[[i, j]] = step + best;
        }
    }

    Ok(cost[[n, m]])
}

/// Largest nearest-neighbour distance from a point of `a` to the set `b`.
fn directed_hausdorff(a: &[Point], b: &[Point]) -> f64 {
    a.iter()
        .map(|p| {
            b.iter()
                .map(|q| p.distance(*q))
                .fold(f64::INFINITY, f64::min)
        })
        .fold(0.0, f64::max)
}

/// Symmetric Hausdorff distance between two point sets.
///
/// Library primitive only: no matching or comparison operation calls it.
pub fn hausdorff_distance(a: &[Point], b: &[Point]) -> Result<f64, DistanceError> {
    if a.is_empty() || b.is_empty() {
        return Err(DistanceError::EmptyShape);
    }
    Ok(directed_hausdorff(a, b).max(directed_hausdorff(b, a)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().copied().map(Point::from).collect()
    }

    fn eye() -> Vec<Point> {
        shape(&[(0, 3), (2, 1), (5, 0), (8, 1), (10, 3), (5, 5)])
    }

    #[test]
    fn test_procrustes_identical_is_zero() {
        let a = eye();
        assert!(procrustes_disparity(&a, &a).unwrap() < 1e-12);
    }

    #[test]
    fn test_procrustes_similarity_invariant() {
        let a = eye();
        // Rotate 90°, scale by 3 and translate.
        let b: Vec<Point> = a
            .iter()
            .map(|p| Point::new(-3 * p.y + 40, 3 * p.x - 7))
            .collect();
        assert!(procrustes_disparity(&a, &b).unwrap() < 1e-12);
    }

    #[test]
    fn test_procrustes_allows_reflection() {
        let a = eye();
        let b: Vec<Point> = a.iter().map(|p| Point::new(-p.x, p.y)).collect();
        assert!(procrustes_disparity(&a, &b).unwrap() < 1e-12);
    }

    #[test]
    fn test_procrustes_symmetric() {
        let a = eye();
        let b = shape(&[(0, 2), (3, 0), (5, 1), (7, 0), (11, 4), (4, 6)]);
        let ab = procrustes_disparity(&a, &b).unwrap();
        let ba = procrustes_disparity(&b, &a).unwrap();
        assert!(ab > 0.0);
        assert!(ab <= 1.0);
        assert!((ab - ba).abs() < 1e-12, "ab = {ab}, ba = {ba}");
    }

    #[test]
    fn test_procrustes_shape_mismatch() {
        let a = eye();
        let err = procrustes_disparity(&a, &a[..5]).unwrap_err();
        assert_eq!(err, DistanceError::ShapeMismatch { left: 6, right: 5 });
    }

    #[test]
    fn test_procrustes_degenerate_shape() {
        let a = eye();
        let b = vec![Point::new(4, 4); 6];
        assert_eq!(
            procrustes_disparity(&a, &b).unwrap_err(),
            DistanceError::DegenerateShape
        );
        assert_eq!(
            procrustes_disparity(&[], &[]).unwrap_err(),
            DistanceError::EmptyShape
        );
    }

    #[test]
    fn test_dtw_identical_is_zero() {
        let a = eye();
        assert_eq!(dtw_distance(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_dtw_known_alignment() {
        let a = shape(&[(0, 0), (1, 0), (2, 0)]);
        let b = shape(&[(0, 0), (2, 0)]);
        assert!((dtw_distance(&a, &b).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dtw_symmetric_different_lengths() {
        let a = shape(&[(0, 0), (3, 1), (6, 4), (9, 4), (12, 2)]);
        let b = shape(&[(1, 1), (5, 3), (11, 3)]);
        let ab = dtw_distance(&a, &b).unwrap();
        let ba = dtw_distance(&b, &a).unwrap();
        assert!(ab > 0.0);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn test_dtw_empty() {
        assert_eq!(
            dtw_distance(&eye(), &[]).unwrap_err(),
            DistanceError::EmptyShape
        );
    }

    #[test]
    fn test_hausdorff_known_value() {
        let a = shape(&[(0, 0), (1, 0)]);
        let b = shape(&[(0, 0), (4, 0)]);
        assert!((hausdorff_distance(&a, &b).unwrap() - 3.0).abs() < 1e-12);
        assert!((hausdorff_distance(&b, &a).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_hausdorff_zero_for_same_set() {
        let a = shape(&[(0, 0), (1, 2), (5, 5)]);
        let b = shape(&[(5, 5), (0, 0), (1, 2), (1, 2)]);
        assert_eq!(hausdorff_distance(&a, &b).unwrap(), 0.0);

        let c = shape(&[(0, 0), (1, 2), (5, 6)]);
        assert!(hausdorff_distance(&a, &c).unwrap() > 0.0);
    }

    #[test]
    fn test_shape_metric_dispatch() {
        let a = eye();
        let b: Vec<Point> = a.iter().map(|p| Point::new(p.x + 1, p.y)).collect();
        assert!(ShapeMetric::Procrustes.distance(&a, &b).unwrap() < 1e-12);
        assert!((ShapeMetric::Dtw.distance(&a, &b).unwrap() - 6.0).abs() < 1e-12);
    }
}
