//! Bitmap tools shared by wasm bindings and unit tests: format conversion,
//! resize, compress, crop, rotate, favicons and the region redaction helpers.
//!
//! JPEG and BMP are written from RGB pixels; PNG, WebP and GIF keep the alpha
//! channel. Operations that mirror a canvas redraw (resize, crop, rotate,
//! favicons, redaction) always emit PNG.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageFormat, ImageReader,
    Rgba, RgbaImage,
};
use serde::{Deserialize, Serialize};

/// Canvas `toBlob` default for lossy encoders.
pub const DEFAULT_QUALITY: f32 = 0.92;
pub const FAVICON_SIZES: [u32; 8] = [16, 32, 48, 64, 128, 180, 192, 512];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PictureFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    Bmp,
}

impl PictureFormat {
    /// Accepts a bare extension or a mime type such as `image/webp`.
    pub(crate) fn parse(input: &str) -> Result<Self, String> {
        let normalized = input.trim().to_ascii_lowercase();
        match normalized.trim_start_matches("image/") {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "gif" => Ok(Self::Gif),
            "bmp" | "x-ms-bmp" => Ok(Self::Bmp),
            other => Err(format!("unsupported image format: {other}")),
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::WebP => Some(Self::Webp),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Bmp => Some(Self::Bmp),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPG",
            Self::Webp => "WebP",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    pub(crate) fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
            Self::Gif => ImageFormat::Gif,
            Self::Bmp => ImageFormat::Bmp,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageConversionResult {
    pub format: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub data_base64: String,
    pub data_url: String,
    pub download_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect_ratio: bool,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompressOptions {
    /// 0.0-1.0, ignored when the source is PNG.
    pub quality: f32,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            quality: 0.8,
            max_width: None,
            max_height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Middle half of the bitmap on both axes.
    pub fn centered(width: u32, height: u32) -> Self {
        Self {
            x: width / 4,
            y: height / 4,
            width: width / 2,
            height: height / 2,
        }
    }

    /// Shrinks the region so it lies inside a `width` by `height` bitmap.
    fn clamp_to(self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clamped = Self {
            x: self.x,
            y: self.y,
            width: self.width.min(width - self.x),
            height: self.height.min(height - self.y),
        };
        (clamped.width > 0 && clamped.height > 0).then_some(clamped)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RotateOptions {
    /// Degrees, clockwise.
    pub angle: f64,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpscaleOptions {
    pub scale: u32,
    pub enhance_quality: bool,
}

impl Default for UpscaleOptions {
    fn default() -> Self {
        Self {
            scale: 2,
            enhance_quality: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Favicon {
    pub size: u32,
    pub image: ImageConversionResult,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DecodedBase64 {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Re-encodes image bytes as png, jpeg, webp, gif or bmp. `quality` (0.0-1.0,
/// default 0.92) only affects JPEG and WebP.
pub fn convert_image_format(
    bytes: &[u8],
    to: &str,
    quality: Option<f32>,
) -> Result<ImageConversionResult, String> {
    let target = PictureFormat::parse(to)?;
    let decoded = decode_image(bytes)?;
    let encoded = encode_image(&decoded, target, quality.unwrap_or(DEFAULT_QUALITY))?;
    let (width, height) = decoded.dimensions();
    Ok(encoded_result(
        target,
        encoded,
        width,
        height,
        format!("converted.{}", target.extension()),
    ))
}

/// With one dimension the other follows the aspect ratio; with both and the
/// aspect lock on, the result fits inside the box.
///
/// # Example
/// ```
/// use wcag_core::images::{resize_image, ResizeOptions};
/// # let mut png = Vec::new();
/// # image::DynamicImage::new_rgba8(400, 200)
/// #     .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
/// #     .map_err(|e| e.to_string())?;
/// let out = resize_image(&png, &ResizeOptions { width: Some(100), ..Default::default() })?;
/// assert_eq!((out.width, out.height), (100, 50));
/// # Ok::<(), String>(())
/// ```
pub fn resize_image(bytes: &[u8], options: &ResizeOptions) -> Result<ImageConversionResult, String> {
    let image = decode_image(bytes)?;
    let (natural_w, natural_h) = image.dimensions();
    let (width, height) = resize_target(natural_w, natural_h, options);
    if width == 0 || height == 0 {
        return Err("target dimensions must be greater than zero".into());
    }
    let resized = image.resize_exact(width, height, FilterType::Lanczos3);
    png_from_image(&resized, "resized.png")
}

fn resize_target(natural_w: u32, natural_h: u32, options: &ResizeOptions) -> (u32, u32) {
    let width = options.width.filter(|w| *w > 0);
    let height = options.height.filter(|h| *h > 0);
    let mut target = (width.unwrap_or(natural_w), height.unwrap_or(natural_h));
    if !options.maintain_aspect_ratio || natural_h == 0 {
        return target;
    }
    let aspect = f64::from(natural_w) / f64::from(natural_h);
    match (width, height) {
        (Some(w), None) => target.1 = (f64::from(w) / aspect).round() as u32,
        (None, Some(h)) => target.0 = (f64::from(h) * aspect).round() as u32,
        (Some(w), Some(h)) => {
            if aspect > f64::from(w) / f64::from(h) {
                target.1 = (f64::from(w) / aspect).round() as u32;
            } else {
                target.0 = (f64::from(h) * aspect).round() as u32;
            }
        }
        (None, None) => {}
    }
    target
}

/// Downscales to fit `max_width`/`max_height`, then re-encodes: PNG sources
/// stay PNG, everything else becomes JPEG at `quality`.
pub fn compress_image(
    bytes: &[u8],
    options: &CompressOptions,
) -> Result<ImageConversionResult, String> {
    let image = decode_image(bytes)?;
    let (mut width, mut height) = image.dimensions();
    if let Some(max_w) = options.max_width.filter(|m| *m > 0 && width > *m) {
        height = ((f64::from(height) * f64::from(max_w)) / f64::from(width)).round() as u32;
        width = max_w;
    }
    if let Some(max_h) = options.max_height.filter(|m| *m > 0 && height > *m) {
        width = ((f64::from(width) * f64::from(max_h)) / f64::from(height)).round() as u32;
        height = max_h;
    }
    let width = width.max(1);
    let height = height.max(1);
    let scaled = if (width, height) == image.dimensions() {
        image
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    };
    let target = match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => PictureFormat::Png,
        _ => PictureFormat::Jpeg,
    };
    let encoded = encode_image(&scaled, target, options.quality)?;
    Ok(encoded_result(
        target,
        encoded,
        width,
        height,
        format!("compressed.{}", target.extension()),
    ))
}

/// Crops to `region`, clamped to the bitmap bounds.
pub fn crop_image(bytes: &[u8], region: Region) -> Result<ImageConversionResult, String> {
    let image = decode_image(bytes)?;
    let (width, height) = image.dimensions();
    let area = region
        .clamp_to(width, height)
        .ok_or_else(|| "crop area lies outside the image".to_string())?;
    let cropped = image.crop_imm(area.x, area.y, area.width, area.height);
    png_from_image(&cropped, "cropped.png")
}

/// Rotates by an arbitrary angle around the center. The canvas grows to the
/// rotated bounding box and uncovered pixels stay transparent. Sampling is
/// nearest-neighbour so right-angle rotations are lossless.
pub fn rotate_image(bytes: &[u8], options: &RotateOptions) -> Result<ImageConversionResult, String> {
    let source = decode_image(bytes)?.to_rgba8();
    let rotated = rotate_rgba(&source, options);
    png_from_image(&DynamicImage::ImageRgba8(rotated), "rotated.png")
}

fn rotate_rgba(source: &RgbaImage, options: &RotateOptions) -> RgbaImage {
    let (src_w, src_h) = source.dimensions();
    let radians = options.angle.to_radians();
    let (sin, cos) = radians.sin_cos();
    let out_w = (f64::from(src_w) * cos.abs() + f64::from(src_h) * sin.abs()).round() as u32;
    let out_h = (f64::from(src_w) * sin.abs() + f64::from(src_h) * cos.abs()).round() as u32;
    let flip_x = if options.flip_horizontal { -1.0 } else { 1.0 };
    let flip_y = if options.flip_vertical { -1.0 } else { 1.0 };
    let (half_src_w, half_src_h) = (f64::from(src_w) / 2.0, f64::from(src_h) / 2.0);
    let (half_out_w, half_out_h) = (f64::from(out_w) / 2.0, f64::from(out_h) / 2.0);

    RgbaImage::from_fn(out_w.max(1), out_h.max(1), |x, y| {
        let dx = f64::from(x) + 0.5 - half_out_w;
        let dy = f64::from(y) + 0.5 - half_out_h;
        // inverse rotation, then the (self-inverse) flip
        let rx = dx * cos + dy * sin;
        let ry = -dx * sin + dy * cos;
        let sx = (rx * flip_x + half_src_w).floor();
        let sy = (ry * flip_y + half_src_h).floor();
        if sx < 0.0 || sy < 0.0 || sx >= f64::from(src_w) || sy >= f64::from(src_h) {
            Rgba([0, 0, 0, 0])
        } else {
            *source.get_pixel(sx as u32, sy as u32)
        }
    })
}

/// Wraps raw bytes in a data URL. The mime falls back to the sniffed image
/// format, then to `application/octet-stream`.
pub fn image_to_base64(bytes: &[u8], mime: Option<&str>) -> String {
    let mime = mime
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or_else(|| {
            image::guess_format(bytes)
                .ok()
                .and_then(PictureFormat::from_image_format)
                .map(|f| f.mime().to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Accepts a `data:` URL or bare base64. The mime comes from the header and
/// defaults to `image/png`.
pub fn base64_to_image(input: &str) -> Result<DecodedBase64, String> {
    let trimmed = input.trim();
    let (header, payload) = match trimmed.split_once(',') {
        Some((header, payload)) => (Some(header), payload),
        None => (None, trimmed),
    };
    let mime = header
        .and_then(|h| h.strip_prefix("data:"))
        .and_then(|h| h.split(';').next())
        .filter(|m| !m.is_empty())
        .unwrap_or("image/png")
        .to_string();
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|err| format!("invalid base64 image: {err}"))?;
    Ok(DecodedBase64 { mime, bytes })
}

/// Square PNGs at every size in [`FAVICON_SIZES`]; the source is stretched,
/// not letterboxed.
pub fn generate_favicons(bytes: &[u8]) -> Result<Vec<Favicon>, String> {
    let image = decode_image(bytes)?;
    FAVICON_SIZES
        .iter()
        .map(|&size| {
            let scaled = image.resize_exact(size, size, FilterType::Lanczos3);
            Ok(Favicon {
                size,
                image: png_from_image(&scaled, &format!("favicon-{size}x{size}.png"))?,
            })
        })
        .collect()
}

pub fn image_dimensions(bytes: &[u8]) -> Result<ImageDimensions, String> {
    let (width, height) = decode_image(bytes)?.dimensions();
    Ok(ImageDimensions { width, height })
}

/// Gaussian blur over `region`, or over the centered default region.
pub fn blur_region(
    bytes: &[u8],
    region: Option<Region>,
    sigma: f32,
) -> Result<ImageConversionResult, String> {
    let mut image = decode_image(bytes)?;
    let area = redaction_area(&image, region)?;
    let patch = image
        .crop_imm(area.x, area.y, area.width, area.height)
        .blur(sigma.max(0.1));
    imageops::replace(&mut image, &patch, i64::from(area.x), i64::from(area.y));
    png_from_image(&image, "blurred.png")
}

/// Replaces `region` with flat blocks of `block_size` pixels, each filled with
/// its average color.
pub fn pixelate_region(
    bytes: &[u8],
    region: Option<Region>,
    block_size: u32,
) -> Result<ImageConversionResult, String> {
    let image = decode_image(bytes)?;
    let area = redaction_area(&image, region)?;
    let mut pixels = image.to_rgba8();
    let block = block_size.max(1);
    for block_y in (area.y..area.y + area.height).step_by(block as usize) {
        for block_x in (area.x..area.x + area.width).step_by(block as usize) {
            let end_x = (block_x + block).min(area.x + area.width);
            let end_y = (block_y + block).min(area.y + area.height);
            let mut sum = [0u64; 4];
            for y in block_y..end_y {
                for x in block_x..end_x {
                    for (acc, channel) in sum.iter_mut().zip(pixels.get_pixel(x, y).0) {
                        *acc += u64::from(channel);
                    }
                }
            }
            let count = u64::from((end_x - block_x) * (end_y - block_y));
            let average = Rgba(sum.map(|total| (total / count) as u8));
            for y in block_y..end_y {
                for x in block_x..end_x {
                    pixels.put_pixel(x, y, average);
                }
            }
        }
    }
    png_from_image(&DynamicImage::ImageRgba8(pixels), "pixelated.png")
}

/// Paints `region` solid black.
pub fn black_bar_region(
    bytes: &[u8],
    region: Option<Region>,
) -> Result<ImageConversionResult, String> {
    let image = decode_image(bytes)?;
    let area = redaction_area(&image, region)?;
    let mut pixels = image.to_rgba8();
    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            pixels.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    png_from_image(&DynamicImage::ImageRgba8(pixels), "redacted.png")
}

fn redaction_area(image: &DynamicImage, region: Option<Region>) -> Result<Region, String> {
    let (width, height) = image.dimensions();
    region
        .unwrap_or_else(|| Region::centered(width, height))
        .clamp_to(width, height)
        .ok_or_else(|| "region lies outside the image".to_string())
}

/// Plain Lanczos enlargement; `scale` is clamped to 1-4 and
/// `enhance_quality` adds an unsharp mask.
pub fn upscale_image(
    bytes: &[u8],
    options: &UpscaleOptions,
) -> Result<ImageConversionResult, String> {
    let scale = options.scale.clamp(1, 4);
    let image = decode_image(bytes)?;
    let (width, height) = image.dimensions();
    let mut scaled = image.resize_exact(width * scale, height * scale, FilterType::Lanczos3);
    if options.enhance_quality && scale > 1 {
        scaled = scaled.unsharpen(0.8, 2);
    }
    png_from_image(&scaled, &format!("upscaled-{scale}x.png"))
}

pub(crate) fn decode_image(bytes: &[u8]) -> Result<DynamicImage, String> {
    if bytes.is_empty() {
        return Err("input image is empty".into());
    }
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| err.to_string())?
        .decode()
        .map_err(|err| format!("failed to decode image: {err}"))
}

fn encode_image(
    image: &DynamicImage,
    target: PictureFormat,
    quality: f32,
) -> Result<Vec<u8>, String> {
    let quality = if quality.is_finite() {
        quality.clamp(0.0, 1.0)
    } else {
        DEFAULT_QUALITY
    };
    let mut buffer = Vec::new();
    match target {
        PictureFormat::Jpeg => {
            let percent = ((quality * 100.0).round() as u8).clamp(1, 100);
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(
                Cursor::new(&mut buffer),
                percent,
            );
            enc.encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|err| format!("failed to encode {}: {err}", target.label()))?;
        }
        PictureFormat::Png => return encode_png(image),
        PictureFormat::Webp => {
            // The pure-Rust encoder is lossless only, so lower qualities are
            // emulated by quantizing RGB before encoding.
            let percent = ((quality * 100.0).round() as u8).clamp(1, 100);
            let mut rgba = image.to_rgba8();
            quantize_rgb_for_webp(rgba.as_mut(), percent);
            let (width, height) = rgba.dimensions();
            let enc = image::codecs::webp::WebPEncoder::new_lossless(Cursor::new(&mut buffer));
            enc.encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|err| format!("failed to encode {}: {err}", target.label()))?;
        }
        PictureFormat::Gif => {
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut Cursor::new(&mut buffer), target.image_format())
                .map_err(|err| format!("failed to encode {}: {err}", target.label()))?;
        }
        PictureFormat::Bmp => {
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_to(&mut Cursor::new(&mut buffer), target.image_format())
                .map_err(|err| format!("failed to encode {}: {err}", target.label()))?;
        }
    }
    Ok(buffer)
}

pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, String> {
    use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buffer),
        CompressionType::Default,
        PngFilter::Adaptive,
    );
    let (width, height) = image.dimensions();
    match image {
        DynamicImage::ImageLuma8(gray) => {
            encoder.write_image(gray.as_raw(), width, height, ExtendedColorType::L8)
        }
        DynamicImage::ImageRgb8(rgb) => {
            encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
        other => encoder.write_image(
            other.to_rgba8().as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    }
    .map_err(|err| format!("failed to encode PNG: {err}"))?;
    Ok(buffer)
}

fn png_from_image(image: &DynamicImage, download_name: &str) -> Result<ImageConversionResult, String> {
    let (width, height) = image.dimensions();
    Ok(png_result(encode_png(image)?, width, height, download_name))
}

pub(crate) fn png_result(
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    download_name: &str,
) -> ImageConversionResult {
    encoded_result(PictureFormat::Png, bytes, width, height, download_name.to_string())
}

fn encoded_result(
    format: PictureFormat,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    download_name: String,
) -> ImageConversionResult {
    let data_base64 = STANDARD.encode(&bytes);
    let data_url = format!("data:{};base64,{}", format.mime(), data_base64);
    ImageConversionResult {
        format: format.extension().into(),
        mime: format.mime().into(),
        width,
        height,
        data_base64,
        data_url,
        download_name,
    }
}

/// Maps a WebP quality (1-100) to a reduced RGB palette in place. Alpha is
/// left untouched.
fn quantize_rgb_for_webp(data: &mut [u8], quality: u8) {
    if quality >= 100 {
        return;
    }
    let levels = webp_levels_from_quality(quality);
    let step = 255.0 / (levels as f32 - 1.0);
    for pixel in data.chunks_exact_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            let bucket = (f32::from(*channel) / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn webp_levels_from_quality(quality: u8) -> u16 {
    if quality >= 100 {
        return 256;
    }
    let normalized = (quality as f32).clamp(1.0, 100.0) / 100.0;
    let levels = 2.0 + normalized * normalized * 254.0;
    levels.round().clamp(2.0, 256.0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    fn sample_rgba() -> DynamicImage {
        // 2x2 with a transparent pixel so alpha handling is visible.
        let buf: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(2, 2, |x, y| match (x, y) {
            (0, 0) => Rgba([255, 0, 0, 255]),
            (1, 0) => Rgba([0, 255, 0, 255]),
            (0, 1) => Rgba([0, 0, 255, 128]),
            _ => Rgba([255, 255, 255, 0]),
        });
        DynamicImage::ImageRgba8(buf)
    }

    fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
        let buf: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
            let r = ((x * 5 + y * 3) % 256) as u8;
            let g = ((x * 7 + y * 11) % 256) as u8;
            let b = ((x * 13 + y * 17) % 256) as u8;
            Rgba([r, g, b, 255])
        });
        DynamicImage::ImageRgba8(buf)
    }

    fn noisy_rgba(width: u32, height: u32) -> DynamicImage {
        // Deterministic pseudo-random colors keep the size comparison stable.
        let mut seed: u32 = 0x4d59_5df4;
        let buf: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |_x, _y| {
            seed = seed
                .wrapping_mul(1_664_525)
                .wrapping_add(1_013_904_223)
                .rotate_left(5);
            Rgba([
                (seed & 0xff) as u8,
                ((seed >> 8) & 0xff) as u8,
                ((seed >> 16) & 0xff) as u8,
                255,
            ])
        });
        DynamicImage::ImageRgba8(buf)
    }

    fn encode_as(image: &DynamicImage, format: PictureFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        let image = if format == PictureFormat::Jpeg {
            DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            image.clone()
        };
        image
            .write_to(&mut Cursor::new(&mut bytes), format.image_format())
            .expect("encode fixture");
        bytes
    }

    fn decode_result(result: &ImageConversionResult) -> RgbaImage {
        let bytes = STANDARD
            .decode(result.data_base64.as_bytes())
            .expect("decode base64");
        image::load_from_memory(&bytes).expect("decode").to_rgba8()
    }

    #[test]
    fn png_to_webp_preserves_alpha_channel() {
        let png = encode_as(&sample_rgba(), PictureFormat::Png);
        let result = convert_image_format(&png, "webp", Some(1.0)).expect("png -> webp");
        let decoded = decode_result(&result);
        assert_eq!(decoded.get_pixel(1, 1).0[3], 0);
        assert_eq!(result.mime, "image/webp");
        assert_eq!(result.format, "webp");
        assert_eq!(result.download_name, "converted.webp");
    }

    #[test]
    fn every_target_format_round_trips_dimensions() {
        let png = encode_as(&gradient_rgba(9, 5), PictureFormat::Png);
        for target in ["png", "jpeg", "image/webp", "gif", "bmp"] {
            let result = convert_image_format(&png, target, None).expect(target);
            assert_eq!((result.width, result.height), (9, 5), "{target}");
            let decoded = decode_result(&result);
            assert_eq!(decoded.dimensions(), (9, 5), "{target}");
            assert!(result.data_url.starts_with(&format!("data:{};base64,", result.mime)));
        }
        assert!(convert_image_format(&png, "avif", None).is_err());
        assert!(convert_image_format(&[], "png", None).is_err());
    }

    #[test]
    fn webp_full_quality_stays_lossless() {
        let fixture = gradient_rgba(8, 8);
        let png = encode_as(&fixture, PictureFormat::Png);
        let result = convert_image_format(&png, "webp", Some(1.0)).expect("webp q100");
        assert_eq!(decode_result(&result), fixture.to_rgba8());
    }

    #[test]
    fn webp_quality_controls_size() {
        let png = encode_as(&noisy_rgba(64, 64), PictureFormat::Png);
        let lossless = convert_image_format(&png, "webp", Some(1.0)).expect("webp q100");
        let lossy = convert_image_format(&png, "webp", Some(0.35)).expect("webp q35");
        assert!(
            lossy.data_base64.len() < lossless.data_base64.len(),
            "reduced quality should shrink WebP payload ({} -> {})",
            lossless.data_base64.len(),
            lossy.data_base64.len()
        );
    }

    #[test]
    fn resize_follows_aspect_rules() {
        let cases = [
            (ResizeOptions { width: Some(100), ..Default::default() }, (100, 50)),
            (ResizeOptions { height: Some(50), ..Default::default() }, (100, 50)),
            (
                ResizeOptions { width: Some(100), height: Some(100), ..Default::default() },
                (100, 50),
            ),
            (
                ResizeOptions {
                    width: Some(100),
                    height: Some(100),
                    maintain_aspect_ratio: false,
                },
                (100, 100),
            ),
        ];
        for (options, expected) in cases {
            assert_eq!(resize_target(400, 200, &options), expected, "{options:?}");
        }
        let png = encode_as(&gradient_rgba(40, 20), PictureFormat::Png);
        let out = resize_image(&png, &ResizeOptions { height: Some(10), ..Default::default() })
            .expect("resize");
        assert_eq!((out.width, out.height), (20, 10));
        assert_eq!(out.format, "png");
    }

    #[test]
    fn compress_keeps_png_and_turns_others_into_jpeg() {
        let fixture = gradient_rgba(200, 100);
        let png = encode_as(&fixture, PictureFormat::Png);
        let out = compress_image(
            &png,
            &CompressOptions { max_width: Some(50), ..Default::default() },
        )
        .expect("compress png");
        assert_eq!(out.format, "png");
        assert_eq!((out.width, out.height), (50, 25));

        let bmp = encode_as(&fixture, PictureFormat::Bmp);
        let out = compress_image(
            &bmp,
            &CompressOptions { quality: 0.5, max_width: None, max_height: Some(40) },
        )
        .expect("compress bmp");
        assert_eq!(out.mime, "image/jpeg");
        assert_eq!((out.width, out.height), (80, 40));
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let png = encode_as(&gradient_rgba(10, 10), PictureFormat::Png);
        let out = crop_image(&png, Region { x: 6, y: 2, width: 20, height: 3 }).expect("crop");
        assert_eq!((out.width, out.height), (4, 3));
        let decoded = decode_result(&out);
        assert_eq!(decoded.get_pixel(0, 0), gradient_rgba(10, 10).to_rgba8().get_pixel(6, 2));
        assert!(crop_image(&png, Region { x: 10, y: 0, width: 1, height: 1 }).is_err());
    }

    #[test]
    fn rotate_right_angle_moves_pixels_exactly() {
        let buf: RgbaImage = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 255, 0, 255]) }
        });
        let rotated = rotate_rgba(&buf, &RotateOptions { angle: 90.0, ..Default::default() });
        assert_eq!(rotated.dimensions(), (1, 2));
        assert_eq!(rotated.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(rotated.get_pixel(0, 1).0, [0, 255, 0, 255]);

        let flipped = rotate_rgba(&buf, &RotateOptions { flip_horizontal: true, ..Default::default() });
        assert_eq!(flipped.get_pixel(0, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn rotate_arbitrary_angle_grows_canvas() {
        let png = encode_as(&gradient_rgba(100, 50), PictureFormat::Png);
        let out = rotate_image(&png, &RotateOptions { angle: 45.0, ..Default::default() })
            .expect("rotate");
        // 100*cos45 + 50*sin45 = 106.07
        assert_eq!((out.width, out.height), (106, 106));
        let decoded = decode_result(&out);
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0, "corners are transparent");
    }

    #[test]
    fn base64_helpers_handle_data_urls() {
        let png = encode_as(&sample_rgba(), PictureFormat::Png);
        let url = image_to_base64(&png, None);
        assert!(url.starts_with("data:image/png;base64,"));
        let decoded = base64_to_image(&url).expect("data url");
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, png);

        let bare = base64_to_image("aGk=").expect("bare");
        assert_eq!(bare.mime, "image/png");
        assert_eq!(bare.bytes, b"hi");
        assert_eq!(
            base64_to_image("data:image/gif;base64,aGk=").expect("gif").mime,
            "image/gif"
        );
        assert!(base64_to_image("not base64!").is_err());
        assert_eq!(
            image_to_base64(b"plain", Some("text/plain")),
            "data:text/plain;base64,cGxhaW4="
        );
    }

    #[test]
    fn favicons_cover_every_size() {
        let png = encode_as(&gradient_rgba(64, 32), PictureFormat::Png);
        let icons = generate_favicons(&png).expect("favicons");
        let sizes: Vec<u32> = icons.iter().map(|f| f.size).collect();
        assert_eq!(sizes, FAVICON_SIZES.to_vec());
        for icon in icons {
            assert_eq!((icon.image.width, icon.image.height), (icon.size, icon.size));
            assert_eq!(
                icon.image.download_name,
                format!("favicon-{0}x{0}.png", icon.size)
            );
        }
    }

    #[test]
    fn dimensions_report_source_size() {
        let jpg = encode_as(&gradient_rgba(13, 7), PictureFormat::Jpeg);
        assert_eq!(
            image_dimensions(&jpg).expect("dims"),
            ImageDimensions { width: 13, height: 7 }
        );
    }

    #[test]
    fn redaction_only_touches_the_region() {
        let fixture = noisy_rgba(16, 16);
        let png = encode_as(&fixture, PictureFormat::Png);
        let original = fixture.to_rgba8();

        let pixelated = decode_result(&pixelate_region(&png, None, 4).expect("pixelate"));
        assert_eq!(pixelated.get_pixel(0, 0), original.get_pixel(0, 0));
        assert_eq!(pixelated.get_pixel(4, 4), pixelated.get_pixel(7, 7));
        assert_ne!(pixelated.get_pixel(4, 4), original.get_pixel(4, 4));

        let region = Region { x: 0, y: 0, width: 3, height: 3 };
        let barred = decode_result(&black_bar_region(&png, Some(region)).expect("bar"));
        assert_eq!(barred.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(barred.get_pixel(3, 3), original.get_pixel(3, 3));

        let blurred = decode_result(&blur_region(&png, None, 3.0).expect("blur"));
        assert_eq!(blurred.get_pixel(15, 15), original.get_pixel(15, 15));
        assert_eq!(Region::centered(16, 16), Region { x: 4, y: 4, width: 8, height: 8 });
    }

    #[test]
    fn upscale_multiplies_dimensions() {
        let png = encode_as(&gradient_rgba(5, 3), PictureFormat::Png);
        let out = upscale_image(&png, &UpscaleOptions { scale: 4, enhance_quality: true })
            .expect("upscale");
        assert_eq!((out.width, out.height), (20, 12));
        assert_eq!(out.download_name, "upscaled-4x.png");
    }

    #[test]
    fn upscale_clamps_the_factor() {
        let png = encode_as(&gradient_rgba(5, 3), PictureFormat::Png);
        let big = upscale_image(&png, &UpscaleOptions { scale: 8, enhance_quality: false })
            .expect("clamped high");
        assert_eq!((big.width, big.height), (20, 12));
        assert_eq!(big.download_name, "upscaled-4x.png");
        let none = upscale_image(&png, &UpscaleOptions { scale: 0, enhance_quality: true })
            .expect("clamped low");
        assert_eq!((none.width, none.height), (5, 3));
    }
}
