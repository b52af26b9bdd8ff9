use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{Error, Result};
use crate::geometry::{fit_dimensions, CellRect};

/// Cut `rect` out of `sheet`, refusing rects that leave the sheet
pub fn crop_cell(sheet: &DynamicImage, rect: CellRect) -> Result<DynamicImage> {
    if !rect.fits_within(sheet.width(), sheet.height()) {
        return Err(Error::OutOfBoundsCrop {
            rect,
            width: sheet.width(),
            height: sheet.height(),
        });
    }
    Ok(sheet.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

/// Resize image to fit inside `target_width`x`target_height` without distortion.
/// Uses Catmull-Rom interpolation; the pixel format of the input is kept.
pub fn resize_to_fit(
    img: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<DynamicImage> {
    let (width, height) = fit_dimensions(img.width(), img.height(), target_width, target_height)?;
    Ok(img.resize_exact(width, height, FilterType::CatmullRom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sheet(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        }))
    }

    #[test]
    fn test_crop_cell_copies_pixels() {
        let img = sheet(100, 80);
        let rect = CellRect {
            x: 10,
            y: 20,
            width: 30,
            height: 40,
        };
        let crop = crop_cell(&img, rect).unwrap().to_rgba8();
        assert_eq!(crop.dimensions(), (30, 40));
        assert_eq!(*crop.get_pixel(0, 0), Rgba([10, 20, 0, 255]));
        assert_eq!(*crop.get_pixel(29, 39), Rgba([39, 59, 0, 255]));
    }

    #[test]
    fn test_crop_cell_out_of_bounds() {
        let img = sheet(100, 80);
        let rect = CellRect {
            x: 80,
            y: 0,
            width: 30,
            height: 10,
        };
        assert!(matches!(
            crop_cell(&img, rect),
            Err(Error::OutOfBoundsCrop { width: 100, height: 80, .. })
        ));
    }

    #[test]
    fn test_resize_to_fit() {
        let resized = resize_to_fit(&sheet(200, 100), 750, 1050).unwrap();
        assert_eq!((resized.width(), resized.height()), (750, 375));

        let resized = resize_to_fit(&sheet(100, 400), 750, 1050).unwrap();
        assert_eq!((resized.width(), resized.height()), (263, 1050));
    }

    #[test]
    fn test_resize_degenerate() {
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 5));
        assert!(matches!(
            resize_to_fit(&empty, 750, 1050),
            Err(Error::DegenerateResizeInput { .. })
        ));
    }
}
