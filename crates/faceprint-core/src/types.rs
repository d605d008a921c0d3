use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of points in the 68-point landmark scheme.
pub const LANDMARK_COUNT: usize = 68;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("expected {expected} landmarks, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Integer pixel coordinate of a single facial landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn as_f64(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        let (ax, ay) = self.as_f64();
        let (bx, by) = other.as_f64();
        (ax - bx).hypot(ay - by)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Ordered 68-point landmark sequence.
///
/// Index order is fixed by the detector scheme: 0–16 jaw, 17–21 left eyebrow,
/// 22–26 right eyebrow, 27–35 nose, 36–41 left eye, 42–47 right eye, 48–67 mouth.
/// The length is checked at construction, so region slicing never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Landmarks {
    points: Vec<Point>,
}

impl Landmarks {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }
}

impl TryFrom<Vec<Point>> for Landmarks {
    type Error = LandmarkError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        if points.len() != LANDMARK_COUNT {
            return Err(LandmarkError::InvalidLength {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }
}

impl From<Landmarks> for Vec<Point> {
    fn from(landmarks: Landmarks) -> Self {
        landmarks.points
    }
}

impl std::ops::Index<usize> for Landmarks {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}

/// Face identity embedding (128-dimensional for the dlib ResNet model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Compute Euclidean distance between two embeddings.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Elementwise equality, used for exact identity lookup.
    ///
    /// Embeddings from separate inferences are rarely bit-identical, so this
    /// only finds a profile when the very same vector is presented again.
    pub fn is_identical(&self, other: &Embedding) -> bool {
        self.values == other.values
    }
}

/// Image-level heuristics, each in its own native unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    pub lighting_inconsistency: f64,
    pub blur_measure: f64,
    pub asymmetry_score: f64,
    pub texture_score: f64,
    pub high_freq_artifacts: f64,
    pub gaze_direction: f64,
}

/// Absolute per-field differences between two [`Artifacts`] records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDistance {
    pub lighting_inconsistency: f64,
    pub blur_measure: f64,
    pub asymmetry_score: f64,
    pub texture_score: f64,
    pub high_freq_artifacts: f64,
    pub gaze_direction: f64,
}

impl ArtifactDistance {
    pub fn between(a: &Artifacts, b: &Artifacts) -> Self {
        Self {
            lighting_inconsistency: (a.lighting_inconsistency - b.lighting_inconsistency).abs(),
            blur_measure: (a.blur_measure - b.blur_measure).abs(),
            asymmetry_score: (a.asymmetry_score - b.asymmetry_score).abs(),
            texture_score: (a.texture_score - b.texture_score).abs(),
            high_freq_artifacts: (a.high_freq_artifacts - b.high_freq_artifacts).abs(),
            gaze_direction: (a.gaze_direction - b.gaze_direction).abs(),
        }
    }
}

/// A face profile. `id` is `None` until the profile is inserted into a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<u64>,
    pub description: String,
    pub embedding: Embedding,
    pub artifacts: Artifacts,
    pub landmarks: Landmarks,
}

impl Profile {
    pub fn new(
        description: String,
        embedding: Embedding,
        artifacts: Artifacts,
        landmarks: Landmarks,
    ) -> Self {
        Self {
            id: None,
            description,
            embedding,
            artifacts,
            landmarks,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.id.is_some()
    }
}

/// Result of a nearest-profile search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileMatch {
    pub query: Profile,
    pub matched: Profile,
    pub distance: f64,
}

/// Per-channel distances between two profiles. No aggregate is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDistance {
    pub embedding: f64,
    pub artifacts: ArtifactDistance,
    /// DTW, summed over both eyebrows.
    pub eyebrows: f64,
    /// Procrustes disparity, summed over both eyes.
    pub eyes: f64,
    pub nose: f64,
    pub mouth: f64,
    /// DTW over the jaw contour.
    pub jaw: f64,
}

/// Distance record for one stored profile in a full-store scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileComparison {
    pub profile_id: Option<u64>,
    pub description: String,
    pub distance: ProfileDistance,
}
