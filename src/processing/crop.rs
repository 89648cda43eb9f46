use image::{RgbaImage, imageops};

/// Largest centered square inside a `width` x `height` buffer, as `(x, y, size)`.
///
/// Offsets use floor division, so an odd difference leaves the extra pixel on
/// the right/bottom edge.
pub fn square_crop_rect(width: u32, height: u32) -> (u32, u32, u32) {
    let size = width.min(height);
    let (x, y) = center_offset(size, size, width, height);
    (x, y, size)
}

pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}

pub fn crop_to_square(source: &RgbaImage) -> RgbaImage {
    let (x, y, size) = square_crop_rect(source.width(), source.height());
    imageops::crop_imm(source, x, y, size, size).to_image()
}
