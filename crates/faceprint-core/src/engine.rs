//! Profile service: ties the external models, the artifact bank, the store
//! and the matching functions together into image-level operations.

use crate::adapter::{FaceEmbedder, LandmarkDetector};
use crate::annotate;
use crate::description;
use crate::error::ProfileError;
use crate::matcher;
use crate::regions::Region;
use crate::store::ProfileStore;
use crate::types::{
    Artifacts, Landmarks, Profile, ProfileComparison, ProfileDistance, ProfileMatch,
};
use image::{DynamicImage, RgbImage};
use std::sync::Arc;

/// Image-level profile operations over a shared [`ProfileStore`].
pub struct ProfileEngine<D, E> {
    detector: D,
    embedder: E,
    store: Arc<ProfileStore>,
}

impl<D: LandmarkDetector, E: FaceEmbedder> ProfileEngine<D, E> {
    pub fn new(detector: D, embedder: E, store: Arc<ProfileStore>) -> Self {
        Self {
            detector,
            embedder,
            store,
        }
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    /// Landmarks of the first detected face.
    pub fn detect_landmarks(&mut self, image: &DynamicImage) -> Result<Landmarks, ProfileError> {
        self.detector
            .detect(image)?
            .ok_or(ProfileError::NoFaceDetected)
    }

    /// Build a transient (unstored) profile from an image.
    pub fn build_profile(&mut self, image: &DynamicImage) -> Result<Profile, ProfileError> {
        let landmarks = self.detect_landmarks(image)?;

        let embeddings = self.embedder.embed(image)?;
        if embeddings.len() > 1 {
            tracing::warn!(faces = embeddings.len(), "multiple faces embedded; using the first");
        }
        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or(ProfileError::NoFaceDetected)?;

        let artifacts = Artifacts::measure(image, &landmarks);
        let description = description::describe(image, &landmarks);
        tracing::debug!(%description, dim = embedding.dim(), "profile built");

        Ok(Profile::new(description, embedding, artifacts, landmarks))
    }

    /// Build a profile and append it to the store.
    pub fn create_profile(&mut self, image: &DynamicImage) -> Result<Profile, ProfileError> {
        let profile = self.build_profile(image)?;
        Ok(self.store.insert(profile))
    }

    /// Stored profile whose embedding is identical to the image's.
    pub fn find_profile(&mut self, image: &DynamicImage) -> Result<Profile, ProfileError> {
        let query = self.build_profile(image)?;
        self.store.find_by_embedding(&query.embedding)
    }

    /// Closest stored profile by embedding distance.
    pub fn match_profile(&mut self, image: &DynamicImage) -> Result<ProfileMatch, ProfileError> {
        let query = self.build_profile(image)?;
        let (matched, distance) = self.store.with_profiles(|profiles| {
            matcher::match_embedding(&query.embedding, profiles)
                .map(|(matched, distance)| (matched.clone(), distance))
        })?;

        tracing::info!(id = ?matched.id, distance, "profile matched by embedding");
        Ok(ProfileMatch {
            query,
            matched,
            distance,
        })
    }

    /// Closest stored profile by the shape of one named region.
    ///
    /// The feature name is validated before any detection work is done.
    pub fn match_feature(
        &mut self,
        image: &DynamicImage,
        feature: &str,
    ) -> Result<ProfileMatch, ProfileError> {
        let region: Region = feature.parse()?;
        let query = self.build_profile(image)?;
        let (matched, distance) = self.store.with_profiles(|profiles| {
            matcher::match_feature(region, query.landmarks.region(region), profiles)
                .map(|(matched, distance)| (matched.clone(), distance))
        })?;

        tracing::info!(%region, id = ?matched.id, distance, "profile matched by feature");
        Ok(ProfileMatch {
            query,
            matched,
            distance,
        })
    }

    /// Per-channel distances between the faces of two images.
    pub fn compare_images(
        &mut self,
        first: &DynamicImage,
        second: &DynamicImage,
    ) -> Result<ProfileDistance, ProfileError> {
        let a = self.build_profile(first)?;
        let b = self.build_profile(second)?;
        matcher::profile_distance(&a, &b)
    }

    /// Per-channel distances between an image and one stored profile.
    pub fn compare_to_stored(
        &mut self,
        image: &DynamicImage,
        id: u64,
    ) -> Result<ProfileDistance, ProfileError> {
        let stored = self.store.get(id)?;
        let query = self.build_profile(image)?;
        matcher::profile_distance(&query, &stored)
    }

    /// Per-channel distances against every stored profile, in store order.
    pub fn scan(&mut self, image: &DynamicImage) -> Result<Vec<ProfileComparison>, ProfileError> {
        let query = self.build_profile(image)?;
        let comparisons = self
            .store
            .with_profiles(|profiles| matcher::scan_distances(&query, profiles))?;
        tracing::info!(compared = comparisons.len(), "store scanned");
        Ok(comparisons)
    }

    /// The image with its detected landmarks drawn on.
    pub fn show_landmarks(&mut self, image: &DynamicImage) -> Result<RgbImage, ProfileError> {
        let landmarks = self.detect_landmarks(image)?;
        Ok(annotate::draw_landmarks(image, &landmarks))
    }

    pub fn get(&self, id: u64) -> Result<Profile, ProfileError> {
        self.store.get(id)
    }

    pub fn list(&self) -> Vec<Profile> {
        self.store.list()
    }

    pub fn delete(&self, id: u64) -> Result<Profile, ProfileError> {
        self.store.delete(id)
    }

    pub fn delete_all(&self) -> usize {
        self.store.delete_all()
    }
}
