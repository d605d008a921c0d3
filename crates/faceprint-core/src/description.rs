//! Human-readable profile description from face geometry and eye colour.

use crate::types::Landmarks;
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;

const OVAL_HEIGHT_TO_WIDTH: f64 = 1.5;
const HIGH_CHEEKBONE_PX: i64 = 10;
/// OpenCV 8-bit hue range (degrees / 2).
const HUE_BINS: usize = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceShape {
    Oval,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cheekbones {
    High,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EyeColor {
    Brown,
    LightBrown,
    Green,
    Blue,
    Mixed,
    Unknown,
}

impl fmt::Display for FaceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FaceShape::Oval => "Oval",
            FaceShape::Round => "Round",
            FaceShape::Square => "Square",
        })
    }
}

impl fmt::Display for Cheekbones {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cheekbones::High => "High cheekbones",
            Cheekbones::Average => "Average cheekbones",
        })
    }
}

impl fmt::Display for EyeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EyeColor::Brown => "Brown",
            EyeColor::LightBrown => "Light Brown",
            EyeColor::Green => "Green",
            EyeColor::Blue => "Blue",
            EyeColor::Mixed => "Mixed",
            EyeColor::Unknown => "Unknown",
        })
    }
}

/// Classify the face outline from jaw width, cheekbone width and face height.
///
/// Differences are taken in `i64` so extreme coordinates cannot overflow.
pub fn face_shape(landmarks: &Landmarks) -> FaceShape {
    let span = |a: i32, b: i32| i64::from(a) - i64::from(b);
    let jaw_width = span(landmarks[16].x, landmarks[0].x);
    let face_height = span(landmarks[8].y, landmarks[19].y);
    let cheekbone_width = span(landmarks[15].x, landmarks[1].x);

    if jaw_width != 0 && face_height as f64 / jaw_width as f64 > OVAL_HEIGHT_TO_WIDTH {
        FaceShape::Oval
    } else if cheekbone_width > jaw_width {
        FaceShape::Round
    } else {
        FaceShape::Square
    }
}

pub fn cheekbones(landmarks: &Landmarks) -> Cheekbones {
    if i64::from(landmarks[14].y) - i64::from(landmarks[3].y) > HIGH_CHEEKBONE_PX {
        Cheekbones::High
    } else {
        Cheekbones::Average
    }
}

/// OpenCV-style 8-bit hue (0..180) of an RGB pixel, or `None` when it would
/// round to 180 and fall outside the histogram range.
fn hue(rgb: [u8; 3]) -> Option<usize> {
    let [r, g, b] = rgb.map(f64::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let mut degrees = if diff == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if degrees < 0.0 {
        degrees += 360.0;
    }

    let bin = (degrees / 2.0).round() as usize;
    (bin < HUE_BINS).then_some(bin)
}

/// Most frequent hue bin in a pixel rectangle; the first maximum wins.
fn dominant_hue(rgb: &RgbImage, rows: (i32, i32), cols: (i32, i32)) -> Option<usize> {
    let clamp_rows = |v: i32| v.clamp(0, rgb.height() as i32) as u32;
    let clamp_cols = |v: i32| v.clamp(0, rgb.width() as i32) as u32;
    let (top, bottom) = (clamp_rows(rows.0), clamp_rows(rows.1));
    let (left, right) = (clamp_cols(cols.0), clamp_cols(cols.1));
    if top >= bottom || left >= right {
        return None;
    }

    let mut histogram = [0u32; HUE_BINS];
    for y in top..bottom {
        for x in left..right {
            if let Some(bin) = hue(rgb.get_pixel(x, y).0) {
                histogram[bin] += 1;
            }
        }
    }

    let mut best = 0;
    for (bin, &count) in histogram.iter().enumerate() {
        if count > histogram[best] {
            best = bin;
        }
    }
    Some(best)
}

/// Map an 8-bit hue bin to a coarse eye colour.
pub fn interpret_hue(hue: usize) -> EyeColor {
    if !(20..=160).contains(&hue) {
        EyeColor::Brown
    } else if !(30..=150).contains(&hue) {
        EyeColor::LightBrown
    } else if hue < 90 {
        EyeColor::Green
    } else {
        EyeColor::Blue
    }
}

/// Dominant colour of both eyes, or `Mixed` if they disagree.
pub fn eye_color(image: &DynamicImage, landmarks: &Landmarks) -> EyeColor {
    let rgb = image.to_rgb8();
    let left = dominant_hue(
        &rgb,
        (landmarks[37].y, landmarks[41].y),
        (landmarks[36].x, landmarks[39].x),
    );
    let right = dominant_hue(
        &rgb,
        (landmarks[43].y, landmarks[47].y),
        (landmarks[42].x, landmarks[45].x),
    );

    match (left.map(interpret_hue), right.map(interpret_hue)) {
        (Some(l), Some(r)) if l == r => l,
        (Some(_), Some(_)) => EyeColor::Mixed,
        _ => EyeColor::Unknown,
    }
}

/// One-sentence summary stored as the profile description.
pub fn describe(image: &DynamicImage, landmarks: &Landmarks) -> String {
    format!(
        "Face with {}, {} shape, and {} eyes.",
        cheekbones(landmarks),
        face_shape(landmarks),
        eye_color(image, landmarks)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use image::Rgb;

    /// Landmarks with only the indices used here set explicitly.
    fn landmarks_with(overrides: &[(usize, (i32, i32))]) -> Landmarks {
        let mut points = vec![Point::new(0, 0); 68];
        for &(i, p) in overrides {
            points[i] = Point::from(p);
        }
        Landmarks::try_from(points).unwrap()
    }

    #[test]
    fn test_face_shape_oval() {
        let lm = landmarks_with(&[(0, (0, 0)), (16, (100, 0)), (19, (0, 0)), (8, (0, 200))]);
        assert_eq!(face_shape(&lm), FaceShape::Oval);
    }

    #[test]
    fn test_face_shape_round_and_square() {
        let round = landmarks_with(&[
            (0, (10, 0)),
            (16, (110, 0)),
            (1, (0, 0)),
            (15, (120, 0)),
            (8, (0, 100)),
        ]);
        assert_eq!(face_shape(&round), FaceShape::Round);

        let square = landmarks_with(&[
            (0, (0, 0)),
            (16, (100, 0)),
            (1, (5, 0)),
            (15, (95, 0)),
            (8, (0, 100)),
        ]);
        assert_eq!(face_shape(&square), FaceShape::Square);
    }

    #[test]
    fn test_face_shape_zero_jaw_width() {
        let lm = landmarks_with(&[(8, (0, 100))]);
        assert_eq!(face_shape(&lm), FaceShape::Square);
    }

    #[test]
    fn test_cheekbones() {
        assert_eq!(
            cheekbones(&landmarks_with(&[(3, (0, 10)), (14, (0, 21))])),
            Cheekbones::High
        );
        assert_eq!(
            cheekbones(&landmarks_with(&[(3, (0, 10)), (14, (0, 20))])),
            Cheekbones::Average
        );
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let lm = landmarks_with(&[
            (0, (i32::MIN, 0)),
            (16, (i32::MAX, 0)),
            (1, (i32::MAX, 0)),
            (15, (i32::MIN, 0)),
            (19, (0, i32::MAX)),
            (8, (0, i32::MIN)),
            (3, (0, i32::MIN)),
            (14, (0, i32::MAX)),
        ]);
        assert_eq!(face_shape(&lm), FaceShape::Square);
        assert_eq!(cheekbones(&lm), Cheekbones::High);
    }

    #[test]
    fn test_hue_primaries() {
        assert_eq!(hue([255, 0, 0]), Some(0));
        assert_eq!(hue([0, 255, 0]), Some(60));
        assert_eq!(hue([0, 0, 255]), Some(120));
        assert_eq!(hue([40, 40, 40]), Some(0));
    }

    #[test]
    fn test_interpret_hue_bands() {
        assert_eq!(interpret_hue(10), EyeColor::Brown);
        assert_eq!(interpret_hue(170), EyeColor::Brown);
        assert_eq!(interpret_hue(25), EyeColor::LightBrown);
        assert_eq!(interpret_hue(155), EyeColor::LightBrown);
        assert_eq!(interpret_hue(60), EyeColor::Green);
        assert_eq!(interpret_hue(120), EyeColor::Blue);
    }

    #[test]
    fn test_eye_color_from_regions() {
        let mut rgb = RgbImage::from_pixel(40, 20, Rgb([0, 0, 255]));
        // Left eye rectangle green, right eye rectangle blue.
        for y in 5..10 {
            for x in 2..8 {
                rgb.put_pixel(x, y, Rgb([0, 255, 0]));
            }
        }
        let image = DynamicImage::ImageRgb8(rgb);
        let lm = landmarks_with(&[
            (36, (2, 7)),
            (37, (4, 5)),
            (39, (8, 7)),
            (41, (4, 10)),
            (42, (22, 7)),
            (43, (24, 5)),
            (45, (28, 7)),
            (47, (24, 10)),
        ]);
        assert_eq!(eye_color(&image, &lm), EyeColor::Mixed);

        let blue = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([0, 0, 255])));
        assert_eq!(eye_color(&blue, &lm), EyeColor::Blue);
    }

    #[test]
    fn test_eye_color_empty_region() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let lm = landmarks_with(&[]);
        assert_eq!(eye_color(&image, &lm), EyeColor::Unknown);
    }

    #[test]
    fn test_describe_sentence() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let lm = landmarks_with(&[(0, (0, 0)), (16, (100, 0)), (19, (0, 0)), (8, (0, 200))]);
        assert_eq!(
            describe(&image, &lm),
            "Face with Average cheekbones, Oval shape, and Unknown eyes."
        );
    }
}
