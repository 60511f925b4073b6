//! Forward 2D Haar wavelet transform over three-channel coefficients.
//!
//! The transform runs on a YCbCr copy of the input, one pass over the rows
//! and then one pass over the columns. Each pass repeatedly folds pairs into
//! their sum and difference, normalized by √2, halving the working span
//! until only the scaling coefficient remains. The (0, 0) entry of the
//! result is the DC term, proportional to the mean colour of the image; all
//! other entries are detail coefficients.

use std::f64::consts::SQRT_2;
use std::ops::{AddAssign, Index, IndexMut, SubAssign};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::util::pixel::ycbcr;

/// Number of colour channels carried per coefficient (Y, Cb, Cr).
pub const CHANNELS: usize = 3;

/// The union of coefficients for all colour channels of one position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coef([f64; CHANNELS]);

impl Coef {
    /// Creates a coefficient from per-channel values.
    pub fn new(values: [f64; CHANNELS]) -> Self {
        Self(values)
    }

    /// Divides all channels by a value, in place.
    pub fn divide(&mut self, value: f64) {
        let factor = 1.0 / value;
        for channel in &mut self.0 {
            *channel *= factor;
        }
    }
}

impl AddAssign for Coef {
    fn add_assign(&mut self, rhs: Self) {
        for (channel, offset) in self.0.iter_mut().zip(rhs.0) {
            *channel += offset;
        }
    }
}

impl SubAssign for Coef {
    fn sub_assign(&mut self, rhs: Self) {
        for (channel, offset) in self.0.iter_mut().zip(rhs.0) {
            *channel -= offset;
        }
    }
}

impl Index<usize> for Coef {
    type Output = f64;

    fn index(&self, channel: usize) -> &f64 {
        &self.0[channel]
    }
}

impl IndexMut<usize> for Coef {
    fn index_mut(&mut self, channel: usize) -> &mut f64 {
        &mut self.0[channel]
    }
}

/// The result of the transform, a two-dimensional matrix of coefficients.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    /// Coefficients in row-major order; position (x, y) is `y * width + x`.
    pub coefs: Vec<Coef>,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

/// Performs a forward 2D Haar transform on the image after converting it to
/// YCbCr.
///
/// Dimensions greater than two are clipped to even values; the dropped last
/// row or column is never sampled. There are no failure modes.
pub fn transform(img: &RgbImage) -> Matrix {
    let mut width = img.width() as usize;
    let mut height = img.height() as usize;
    if width > 2 {
        width &= !1;
    }
    if height > 2 {
        height &= !1;
    }

    let mut coefs = vec![Coef::default(); width * height];
    for row in 0..height {
        for column in 0..width {
            let (y, cb, cr) = ycbcr(img.get_pixel(column as u32, row as u32));
            coefs[row * width + column] =
                Coef::new([f64::from(y), f64::from(cb), f64::from(cr)]);
        }
    }

    let mut temp = vec![Coef::default(); width.max(height)];

    // Rows first.
    for row in 0..height {
        let mut step = width / 2;
        while step >= 1 {
            for column in 0..step {
                let mut high = coefs[row * width + 2 * column];
                let mut low = high;
                let offset = coefs[row * width + 2 * column + 1];
                high += offset;
                low -= offset;
                high.divide(SQRT_2);
                low.divide(SQRT_2);
                temp[column] = high;
                temp[column + step] = low;
            }
            coefs[row * width..(row + 1) * width].copy_from_slice(&temp[..width]);
            step /= 2;
        }
    }

    // Then columns.
    for column in 0..width {
        let mut step = height / 2;
        while step >= 1 {
            for row in 0..step {
                let mut high = coefs[(2 * row) * width + column];
                let mut low = high;
                let offset = coefs[(2 * row + 1) * width + column];
                high += offset;
                low -= offset;
                high.divide(SQRT_2);
                low.divide(SQRT_2);
                temp[row] = high;
                temp[row + step] = low;
            }
            for row in 0..height {
                coefs[row * width + column] = temp[row];
            }
            step /= 2;
        }
    }

    Matrix {
        coefs,
        width,
        height,
    }
}
