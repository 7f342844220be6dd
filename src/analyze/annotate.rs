//! Overlay drawing on raw RGB frames.

use image::{ImageBuffer, Rgb};

use super::detector::Region;

const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const OVERLAY_THICKNESS: i64 = 3;

/// Draws each region as a hollow rectangle onto the frame pixels. Regions
/// are clamped to the image borders; a region entirely off-image is skipped.
pub fn draw_regions(pixels: &mut [u8], width: u32, height: u32, regions: &[Region]) {
    let Some(mut image) = ImageBuffer::<Rgb<u8>, &mut [u8]>::from_raw(width, height, pixels)
    else {
        return;
    };

    for region in regions {
        let left = i64::from(region.x);
        let top = i64::from(region.y);
        let right = left + i64::from(region.width) - 1;
        let bottom = top + i64::from(region.height) - 1;
        for inset in 0..OVERLAY_THICKNESS {
            draw_rectangle(
                &mut image,
                left + inset,
                top + inset,
                right - inset,
                bottom - inset,
                OVERLAY_COLOR,
            );
        }
    }
}

fn draw_rectangle(
    image: &mut ImageBuffer<Rgb<u8>, &mut [u8]>,
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
    color: Rgb<u8>,
) {
    let width = i64::from(image.width());
    let height = i64::from(image.height());
    if right < left || bottom < top || right < 0 || bottom < 0 || left >= width || top >= height {
        return;
    }

    let l = left.clamp(0, width - 1);
    let r = right.clamp(0, width - 1);
    let t = top.clamp(0, height - 1);
    let b = bottom.clamp(0, height - 1);

    for x in l..=r {
        image.put_pixel(x as u32, t as u32, color);
        image.put_pixel(x as u32, b as u32, color);
    }
    for y in t..=b {
        image.put_pixel(l as u32, y as u32, color);
        image.put_pixel(r as u32, y as u32, color);
    }
}
