//! Shared test fixtures.

use crate::types::{Artifacts, Embedding, Landmarks, Point, Profile};

/// A deterministic 68-point sequence with distinct points in every region.
pub(crate) fn sample_landmarks() -> Landmarks {
    let points: Vec<Point> = (0..68)
        .map(|i| Point::new(10 + 3 * i, 20 + (i * i) % 17))
        .collect();
    Landmarks::try_from(points).unwrap()
}

/// Same as [`sample_landmarks`] with every point moved by `(dx, dy)`.
pub(crate) fn shifted_landmarks(dx: i32, dy: i32) -> Landmarks {
    let points: Vec<Point> = sample_landmarks()
        .iter()
        .map(|p| Point::new(p.x + dx, p.y + dy))
        .collect();
    Landmarks::try_from(points).unwrap()
}

pub(crate) fn profile_with_embedding(values: &[f32]) -> Profile {
    Profile::new(
        "fixture".into(),
        Embedding::new(values.to_vec()),
        Artifacts::default(),
        sample_landmarks(),
    )
}
