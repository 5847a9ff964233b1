//! Raster image handling for PDF documents

use crate::{PdfError, Result};
use image::DynamicImage;
use lopdf::{Dictionary, Stream};
use std::io::Write;

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Largest uniform scale keeping `width x height` inside the target box
pub fn fit_box_scale(width: u32, height: u32, target_width: f64, target_height: f64) -> f64 {
    let width_ratio = target_width / width as f64;
    let height_ratio = target_height / height as f64;
    width_ratio.min(height_ratio)
}

/// Image XObject for PDF embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Color space ("DeviceRGB", "DeviceGray")
    pub color_space: String,
    /// Bits per component
    pub bits_per_component: u8,
    /// PDF filter
    pub filter: String,
    /// Raw image data (compressed)
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Create XObject from a decoded raster
    ///
    /// Pixels are re-encoded as 8-bit samples with FlateDecode. Alpha
    /// channels are blended onto a white background; grayscale stays gray.
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PdfError::ImageError("Image has zero size".to_string()));
        }

        let (raw_data, color_space) = match image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => {
                (image.to_luma8().into_raw(), "DeviceGray")
            }
            DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
                let la = image.to_luma_alpha8();
                let gray = la
                    .pixels()
                    .map(|p| blend_on_white(p[0], p[1]))
                    .collect::<Vec<_>>();
                (gray, "DeviceGray")
            }
            _ if image.color().has_alpha() => {
                let rgba = image.to_rgba8();
                let mut rgb = Vec::with_capacity(rgba.pixels().len() * 3);
                for pixel in rgba.pixels() {
                    rgb.push(blend_on_white(pixel[0], pixel[3]));
                    rgb.push(blend_on_white(pixel[1], pixel[3]));
                    rgb.push(blend_on_white(pixel[2], pixel[3]));
                }
                (rgb, "DeviceRGB")
            }
            _ => (image.to_rgb8().into_raw(), "DeviceRGB"),
        };

        // Compress with FlateDecode (zlib)
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw_data)?;
        let data = encoder.finish()?;

        Ok(Self {
            width: image.width(),
            height: image.height(),
            color_space: color_space.to_string(),
            bits_per_component: 8,
            filter: "FlateDecode".to_string(),
            data,
        })
    }

    /// Convert to lopdf Stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();

        dict.set("Type", lopdf::Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", lopdf::Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set(
            "ColorSpace",
            lopdf::Object::Name(self.color_space.as_bytes().to_vec()),
        );
        dict.set("BitsPerComponent", self.bits_per_component as i64);
        dict.set(
            "Filter",
            lopdf::Object::Name(self.filter.as_bytes().to_vec()),
        );
        dict.set("Length", self.data.len() as i64);

        // Already compressed; keep lopdf from compressing again
        Stream::new(dict, self.data.clone()).with_compression(false)
    }
}

fn blend_on_white(value: u8, alpha: u8) -> u8 {
    let alpha = alpha as f32 / 255.0;
    (value as f32 * alpha + 255.0 * (1.0 - alpha)) as u8
}

/// Generate operators to draw image at position
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Im1")
/// * `x` - X coordinate in points
/// * `y` - Y coordinate in points (from bottom, PDF coordinates)
/// * `width` - Image width in points
/// * `height` - Image height in points
///
/// # Returns
/// PDF content stream operators as bytes
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    // q                         - Save graphics state
    // width 0 0 height x y cm   - Concatenate transformation matrix
    // /Im1 Do                   - Draw image
    // Q                         - Restore graphics state
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}
