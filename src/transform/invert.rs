//! Per-pixel channel inversion.

use image::RgbaImage;

/// Replace red, green and blue with their complement against `u8::MAX`.
/// Alpha is left as decoded; no gamma or premultiplication is applied.
pub fn invert_channels(raster: &mut RgbaImage) {
    for pixel in raster.pixels_mut() {
        let [r, g, b, _] = &mut pixel.0;
        *r = u8::MAX - *r;
        *g = u8::MAX - *g;
        *b = u8::MAX - *b;
    }
}
