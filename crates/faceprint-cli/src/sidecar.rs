//! Sidecar-file model adapter.
//!
//! Landmarks and embeddings are produced offline by an external detector and
//! saved next to each image as JSON: `<image><landmarks suffix>` holds an
//! array of `[x, y]` pairs and `<image><embeddings suffix>` an array of
//! vectors, one per face. A missing sidecar means no face was found.

use anyhow::{Context, Result};
use faceprint_core::{
    AdapterError, Embedding, FaceEmbedder, LandmarkDetector, Landmarks, Point,
};
use image::DynamicImage;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
struct Sidecar {
    landmarks: Option<Landmarks>,
    embeddings: Vec<Embedding>,
}

/// Model adapter backed by sidecar files of previously opened images.
///
/// Images are recognised by a hash of their dimensions and pixel data, so
/// detection only works for images loaded through [`SidecarModels::open`].
#[derive(Debug, Default)]
pub struct SidecarModels {
    landmarks_suffix: String,
    embeddings_suffix: String,
    entries: HashMap<u64, Sidecar>,
}

impl SidecarModels {
    pub fn new(landmarks_suffix: &str, embeddings_suffix: &str) -> Self {
        Self {
            landmarks_suffix: landmarks_suffix.to_string(),
            embeddings_suffix: embeddings_suffix.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Decode an image and register its sidecar data.
    pub fn open(&mut self, path: &Path) -> Result<DynamicImage> {
        let image =
            image::open(path).with_context(|| format!("decoding image {}", path.display()))?;

        let landmarks_path = with_suffix(path, &self.landmarks_suffix);
        let landmarks = match read_json::<Vec<(i32, i32)>>(&landmarks_path)? {
            Some(pairs) => {
                let points: Vec<Point> = pairs.into_iter().map(Point::from).collect();
                Some(
                    Landmarks::try_from(points)
                        .with_context(|| format!("invalid landmarks in {}", landmarks_path.display()))?,
                )
            }
            None => None,
        };

        let embeddings_path = with_suffix(path, &self.embeddings_suffix);
        let embeddings: Vec<Embedding> = read_json::<Vec<Vec<f32>>>(&embeddings_path)?
            .unwrap_or_default()
            .into_iter()
            .map(Embedding::new)
            .collect();

        tracing::debug!(
            image = %path.display(),
            has_landmarks = landmarks.is_some(),
            embeddings = embeddings.len(),
            "sidecar loaded"
        );

        self.entries.insert(
            fingerprint(&image),
            Sidecar {
                landmarks,
                embeddings,
            },
        );
        Ok(image)
    }

    fn lookup(&self, image: &DynamicImage) -> Option<&Sidecar> {
        self.entries.get(&fingerprint(image))
    }
}

impl LandmarkDetector for &SidecarModels {
    fn detect(&mut self, image: &DynamicImage) -> Result<Option<Landmarks>, AdapterError> {
        Ok(self.lookup(image).and_then(|s| s.landmarks.clone()))
    }
}

impl FaceEmbedder for &SidecarModels {
    fn embed(&mut self, image: &DynamicImage) -> Result<Vec<Embedding>, AdapterError> {
        Ok(self
            .lookup(image)
            .map(|s| s.embeddings.clone())
            .unwrap_or_default())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("reading sidecar {}", path.display()))?;
    let value = serde_json::from_str(&src)
        .with_context(|| format!("parsing sidecar {}", path.display()))?;
    Ok(Some(value))
}

fn fingerprint(image: &DynamicImage) -> u64 {
    let mut hasher = DefaultHasher::new();
    image.width().hash(&mut hasher);
    image.height().hash(&mut hasher);
    image.as_bytes().hash(&mut hasher);
    hasher.finish()
}
