//! Cropping a logical selection out of a captured output

use image::RgbaImage;

use crate::domain::Rect;

/// The part of an output image handed to text recognition
#[derive(Clone, Debug)]
pub struct CroppedImage {
    /// Region of the source image, in pixels
    pub region: Rect,
    pub image: RgbaImage,
}

/// Crop `selection`, given in output-local logical coordinates, from `image`.
///
/// The pixel scale comes from the ratio between the image size and the
/// output's logical size, so fractional and HiDPI scaling both map onto the
/// captured buffer. Returns `None` when nothing of the selection lies on
/// the image.
pub fn crop_logical(
    image: &RgbaImage,
    logical_size: (u32, u32),
    selection: Rect,
) -> Option<CroppedImage> {
    let (logical_w, logical_h) = logical_size;
    if logical_w == 0 || logical_h == 0 {
        return None;
    }

    let scale_x = image.width() as f32 / logical_w as f32;
    let scale_y = image.height() as f32 / logical_h as f32;
    let region = selection
        .scale(scale_x, scale_y)
        .intersect(Rect::from_size(image.width(), image.height()))?;
    let dims = region.dimensions()?;

    log::debug!(
        "Cropping logical {:?} to pixels {:?} (scale {:.2}x{:.2})",
        selection,
        region,
        scale_x,
        scale_y
    );

    let cropped = image::imageops::crop_imm(
        image,
        region.left as u32,
        region.top as u32,
        dims.width(),
        dims.height(),
    )
    .to_image();

    Some(CroppedImage {
        region,
        image: cropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn marked_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_crop_at_unit_scale() {
        let img = marked_image(100, 50);
        let cropped = crop_logical(&img, (100, 50), Rect::new(10, 5, 30, 25)).unwrap();

        assert_eq!(cropped.region, Rect::new(10, 5, 30, 25));
        assert_eq!(cropped.image.dimensions(), (20, 20));
        assert_eq!(cropped.image.get_pixel(0, 0), &Rgba([10, 5, 0, 255]));
    }

    #[test]
    fn test_crop_on_hidpi_output() {
        let img = marked_image(200, 100);
        let cropped = crop_logical(&img, (100, 50), Rect::new(10, 5, 30, 25)).unwrap();

        assert_eq!(cropped.region, Rect::new(20, 10, 60, 50));
        assert_eq!(cropped.image.dimensions(), (40, 40));
        assert_eq!(cropped.image.get_pixel(0, 0), &Rgba([20, 10, 0, 255]));
    }

    #[test]
    fn test_crop_is_clamped_to_image() {
        let img = marked_image(100, 50);
        let cropped = crop_logical(&img, (100, 50), Rect::new(80, 40, 140, 90)).unwrap();
        assert_eq!(cropped.region, Rect::new(80, 40, 100, 50));
    }

    #[test]
    fn test_crop_outside_image() {
        let img = marked_image(100, 50);
        assert!(crop_logical(&img, (100, 50), Rect::new(120, 60, 140, 90)).is_none());
    }

    #[test]
    fn test_crop_with_zero_logical_size() {
        let img = marked_image(10, 10);
        assert!(crop_logical(&img, (0, 10), Rect::new(0, 0, 5, 5)).is_none());
    }
}
