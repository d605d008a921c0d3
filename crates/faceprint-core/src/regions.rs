//! Named anatomical regions of the 68-point landmark scheme.

use crate::distance::ShapeMetric;
use crate::error::ProfileError;
use crate::types::{Landmarks, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// One of the seven landmark regions used for shape comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Jaw,
    LeftEyebrow,
    RightEyebrow,
    Nose,
    LeftEye,
    RightEye,
    Mouth,
}

impl Region {
    /// All regions, in landmark index order.
    pub const ALL: [Region; 7] = [
        Region::Jaw,
        Region::LeftEyebrow,
        Region::RightEyebrow,
        Region::Nose,
        Region::LeftEye,
        Region::RightEye,
        Region::Mouth,
    ];

    /// Landmark index range covered by this region.
    pub fn range(self) -> Range<usize> {
        match self {
            Region::Jaw => 0..17,
            Region::LeftEyebrow => 17..22,
            Region::RightEyebrow => 22..27,
            Region::Nose => 27..36,
            Region::LeftEye => 36..42,
            Region::RightEye => 42..48,
            Region::Mouth => 48..68,
        }
    }

    /// Open contours are compared elastically, fixed-cardinality regions rigidly.
    pub fn metric(self) -> ShapeMetric {
        match self {
            Region::Jaw | Region::LeftEyebrow | Region::RightEyebrow => ShapeMetric::Dtw,
            Region::Nose | Region::LeftEye | Region::RightEye | Region::Mouth => {
                ShapeMetric::Procrustes
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Jaw => "jaw",
            Region::LeftEyebrow => "left_eyebrow",
            Region::RightEyebrow => "right_eyebrow",
            Region::Nose => "nose",
            Region::LeftEye => "left_eye",
            Region::RightEye => "right_eye",
            Region::Mouth => "mouth",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.as_str() == s)
            .ok_or_else(|| ProfileError::InvalidFeature(s.to_string()))
    }
}

impl Landmarks {
    /// Slice out the points of a single region.
    pub fn region(&self, region: Region) -> &[Point] {
        &self.points()[region.range()]
    }

    /// All seven regions with their points, in index order.
    pub fn regions(&self) -> [(Region, &[Point]); 7] {
        Region::ALL.map(|region| (region, self.region(region)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_landmarks;

    #[test]
    fn test_regions_partition_all_indices() {
        let mut covered = [0u32; 68];
        for region in Region::ALL {
            for i in region.range() {
                covered[i] += 1;
            }
        }
        assert!(covered.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_region_point_counts_sum_to_68() {
        let landmarks = sample_landmarks();
        let regions = landmarks.regions();
        assert_eq!(regions.len(), 7);
        let total: usize = regions.iter().map(|(_, points)| points.len()).sum();
        assert_eq!(total, 68);
    }

    #[test]
    fn test_region_slices_by_index() {
        let landmarks = sample_landmarks();
        assert_eq!(landmarks.region(Region::Jaw).len(), 17);
        assert_eq!(landmarks.region(Region::LeftEye)[0], landmarks[36]);
        assert_eq!(landmarks.region(Region::Mouth)[19], landmarks[67]);
    }

    #[test]
    fn test_parse_region_names() {
        for region in Region::ALL {
            assert_eq!(region.as_str().parse::<Region>().unwrap(), region);
        }
    }

    #[test]
    fn test_parse_invalid_feature() {
        let err = "chin".parse::<Region>().unwrap_err();
        assert!(matches!(err, ProfileError::InvalidFeature(ref name) if name == "chin"));
        assert!("Left_Eye".parse::<Region>().is_err());
        assert!("".parse::<Region>().is_err());
    }

    #[test]
    fn test_region_metrics() {
        assert_eq!(Region::Jaw.metric(), ShapeMetric::Dtw);
        assert_eq!(Region::LeftEyebrow.metric(), ShapeMetric::Dtw);
        assert_eq!(Region::RightEyebrow.metric(), ShapeMetric::Dtw);
        assert_eq!(Region::Nose.metric(), ShapeMetric::Procrustes);
        assert_eq!(Region::LeftEye.metric(), ShapeMetric::Procrustes);
        assert_eq!(Region::Mouth.metric(), ShapeMetric::Procrustes);
    }

    #[test]
    fn test_region_serde_names() {
        let json = serde_json::to_string(&Region::LeftEyebrow).unwrap();
        assert_eq!(json, "\"left_eyebrow\"");
    }
}
