//! Landmark overlay rendering.

use crate::types::Landmarks;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

const LANDMARK_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LANDMARK_RADIUS: i32 = 1;

/// Copy of `image` with a small green dot on every landmark.
pub fn draw_landmarks(image: &DynamicImage, landmarks: &Landmarks) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for point in landmarks.iter() {
        draw_filled_circle_mut(&mut canvas, (point.x, point.y), LANDMARK_RADIUS, LANDMARK_COLOR);
    }
    canvas
}
