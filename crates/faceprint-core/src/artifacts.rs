//! Artifact measurement bank.
//!
//! Six independent heuristics over the grayscale image and the landmark
//! sequence. Every measurement is a pure function; image-based ones return
//! `0.0` for an image with no pixels.

use crate::regions::Region;
use crate::types::{Artifacts, Landmarks, Point};
use image::DynamicImage;
use ndarray::{Array2, Axis};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;

// --- Filter kernels ---
const SOBEL5_DERIVATIVE: [f64; 5] = [-1.0, -2.0, 0.0, 2.0, 1.0];
const SOBEL5_SMOOTHING: [f64; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
const SECOND_DERIVATIVE: [f64; 3] = [1.0, -2.0, 1.0];

// --- Uniform LBP parameters ---
const LBP_POINTS: usize = 8;
const LBP_RADIUS: f64 = 1.0;
/// Histogram edges are 0..=9, so there are nine bins and the last one is
/// closed: codes 8 and 9 (non-uniform) share it.
const LBP_BINS: usize = 9;
const HISTOGRAM_EPSILON: f64 = 1e-6;

// --- Rec.601 luma in 14-bit fixed point (coefficients sum to 1 << 14) ---
const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

impl Artifacts {
    /// Run the whole measurement bank on one image and its landmarks.
    pub fn measure(image: &DynamicImage, landmarks: &Landmarks) -> Self {
        let gray = grayscale(image);
        let artifacts = Self {
            lighting_inconsistency: lighting_inconsistency(&gray),
            blur_measure: blur_measure(&gray),
            asymmetry_score: asymmetry_score(landmarks),
            texture_score: texture_score(&gray),
            high_freq_artifacts: high_freq_artifacts(&gray),
            gaze_direction: gaze_direction(landmarks),
        };
        tracing::debug!(?artifacts, width = image.width(), height = image.height(), "artifacts measured");
        artifacts
    }
}

/// Convert any image to a row-major `(height, width)` luma matrix.
///
/// Colour input uses Rec.601 weights (0.299, 0.587, 0.114) with rounded
/// fixed-point arithmetic; grayscale input is passed through.
pub fn grayscale(image: &DynamicImage) -> Array2<f64> {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => {
            let luma = image.to_luma8();
            let (width, height) = luma.dimensions();
            Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
                luma.get_pixel(x as u32, y as u32)[0] as f64
            })
        }
        _ => {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
                luma601(rgb.get_pixel(x as u32, y as u32).0) as f64
            })
        }
    }
}

fn luma601([r, g, b]: [u8; 3]) -> u8 {
    let weighted = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B;
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge
/// sample (`dcb|abcd|cba`).
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let n = len as isize;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Correlate every row (`Axis(1)`) or column (`Axis(0)`) with a centred 1-D kernel.
fn correlate_axis(src: &Array2<f64>, kernel: &[f64], axis: Axis) -> Array2<f64> {
    let (height, width) = src.dim();
    let half = (kernel.len() / 2) as isize;

    Array2::from_shape_fn((height, width), |(y, x)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                let offset = k as isize - half;
                let (sy, sx) = if axis == Axis(0) {
                    (reflect_101(y as isize + offset, height), x)
                } else {
                    (y, reflect_101(x as isize + offset, width))
                };
                weight * src[[sy, sx]]
            })
            .sum()
    })
}

/// Mean gradient magnitude from 5×5 Sobel derivatives on both axes.
pub fn lighting_inconsistency(gray: &Array2<f64>) -> f64 {
    if gray.is_empty() {
        return 0.0;
    }
    let gx = correlate_axis(
        &correlate_axis(gray, &SOBEL5_SMOOTHING, Axis(0)),
        &SOBEL5_DERIVATIVE,
        Axis(1),
    );
    let gy = correlate_axis(
        &correlate_axis(gray, &SOBEL5_SMOOTHING, Axis(1)),
        &SOBEL5_DERIVATIVE,
        Axis(0),
    );

    let magnitude = ndarray::Zip::from(&gx)
        .and(&gy)
        .map_collect(|&dx, &dy| (dx * dx + dy * dy).sqrt());
    magnitude.mean().unwrap_or(0.0)
}

/// Variance of the 3×3 Laplacian. Lower means blurrier.
pub fn blur_measure(gray: &Array2<f64>) -> f64 {
    if gray.is_empty() {
        return 0.0;
    }
    let laplacian = correlate_axis(gray, &SECOND_DERIVATIVE, Axis(0))
        + correlate_axis(gray, &SECOND_DERIVATIVE, Axis(1));
    laplacian.var(0.0)
}

/// Mean distance between the first half of the landmarks and the reversed
/// second half.
///
/// Splitting the 68-point sequence at index 34 does not pair mirror-image
/// points of the face (the jaw, eyebrows and nose all fall in the first
/// half), so this is not a true bilateral symmetry measure. The formula is
/// kept as-is because stored scores depend on it.
pub fn asymmetry_score(landmarks: &Landmarks) -> f64 {
    let points = landmarks.points();
    let (left, right) = points.split_at(points.len() / 2);

    let total: f64 = left
        .iter()
        .zip(right.iter().rev())
        .map(|(l, r)| l.distance(*r))
        .sum();
    total / left.len() as f64
}

fn bilinear_or_zero(gray: &Array2<f64>, row: f64, col: f64) -> f64 {
    let (height, width) = gray.dim();
    let pixel = |r: f64, c: f64| -> f64 {
        if r < 0.0 || c < 0.0 || r >= height as f64 || c >= width as f64 {
            0.0
        } else {
            gray[[r as usize, c as usize]]
        }
    };

    let (min_r, max_r) = (row.floor(), row.ceil());
    let (min_c, max_c) = (col.floor(), col.ceil());
    let (dr, dc) = (row - min_r, col - min_c);

    let top = (1.0 - dc) * pixel(min_r, min_c) + dc * pixel(min_r, max_c);
    let bottom = (1.0 - dc) * pixel(max_r, min_c) + dc * pixel(max_r, max_c);
    (1.0 - dr) * top + dr * bottom
}

/// Rotation-invariant uniform LBP code image (P = 8, R = 1), values 0..=9.
pub fn uniform_lbp(gray: &Array2<f64>) -> Array2<u8> {
    let offsets: Vec<(f64, f64)> = (0..LBP_POINTS)
        .map(|p| {
            let angle = 2.0 * PI * p as f64 / LBP_POINTS as f64;
            (round5(-LBP_RADIUS * angle.sin()), round5(LBP_RADIUS * angle.cos()))
        })
        .collect();

    Array2::from_shape_fn(gray.dim(), |(r, c)| {
        let centre = gray[[r, c]];
        let mut bits = [false; LBP_POINTS];
        for (bit, &(dr, dc)) in bits.iter_mut().zip(offsets.iter()) {
            *bit = bilinear_or_zero(gray, r as f64 + dr, c as f64 + dc) - centre >= 0.0;
        }

        let transitions = bits.windows(2).filter(|pair| pair[0] != pair[1]).count();
        if transitions <= 2 {
            bits.iter().filter(|&&b| b).count() as u8
        } else {
            (LBP_POINTS + 1) as u8
        }
    })
}

fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

/// Raw counts of LBP codes over nine bins; codes 8 and 9 share the last.
fn lbp_histogram(codes: &Array2<u8>) -> [f64; LBP_BINS] {
    let mut histogram = [0.0f64; LBP_BINS];
    for &code in codes.iter() {
        histogram[(code as usize).min(LBP_BINS - 1)] += 1.0;
    }
    histogram
}

/// Mean of the L1-normalised uniform LBP histogram.
///
/// The mean of a normalised histogram is close to `1 / bins` for any image;
/// the literal mean is reported so scores stay comparable with stored ones.
pub fn texture_score(gray: &Array2<f64>) -> f64 {
    if gray.is_empty() {
        return 0.0;
    }
    let histogram = lbp_histogram(&uniform_lbp(gray));
    let total: f64 = histogram.iter().sum();
    let normalizer = total + HISTOGRAM_EPSILON;
    histogram.iter().map(|count| count / normalizer).sum::<f64>() / LBP_BINS as f64
}

/// Centred magnitude spectrum `|F|` of the 2-D discrete Fourier transform.
pub fn magnitude_spectrum(gray: &Array2<f64>) -> Array2<f64> {
    let (height, width) = gray.dim();
    if gray.is_empty() {
        return Array2::zeros((height, width));
    }

    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft_forward(width);
    let col_fft = planner.plan_fft_forward(height);

    let mut rows = gray.mapv(|v| Complex::new(v, 0.0));
    for mut row in rows.rows_mut() {
        if let Some(buffer) = row.as_slice_mut() {
            row_fft.process(buffer);
        }
    }

    // Columns become rows of the transposed copy.
    let mut cols = rows.t().as_standard_layout().into_owned();
    for mut col in cols.rows_mut() {
        if let Some(buffer) = col.as_slice_mut() {
            col_fft.process(buffer);
        }
    }

    // cols is (width, height); shift zero frequency to the centre while
    // transposing back.
    Array2::from_shape_fn((height, width), |(y, x)| {
        let sy = (y + height - height / 2) % height;
        let sx = (x + width - width / 2) % width;
        cols[[sx, sy]].norm()
    })
}

/// Mean of the log-magnitude spectrum `20·log10|F|`.
///
/// Zero-magnitude bins are floored at `f64::MIN_POSITIVE` so the mean stays finite.
pub fn high_freq_artifacts(gray: &Array2<f64>) -> f64 {
    if gray.is_empty() {
        return 0.0;
    }
    magnitude_spectrum(gray)
        .mapv(|m| 20.0 * m.max(f64::MIN_POSITIVE).log10())
        .mean()
        .unwrap_or(0.0)
}

fn centroid(points: &[Point]) -> (f64, f64) {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .map(|p| p.as_f64())
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    (sx / n, sy / n)
}

/// Angle in radians of the line from the left-eye centroid to the right-eye
/// centroid. This reflects head roll rather than true gaze.
pub fn gaze_direction(landmarks: &Landmarks) -> f64 {
    let (lx, ly) = centroid(landmarks.region(Region::LeftEye));
    let (rx, ry) = centroid(landmarks.region(Region::RightEye));
    (ry - ly).atan2(rx - lx)
}
