use console_error_panic_hook::set_once as set_panic_hook;
use js_sys::{Array, Date, Uint8Array};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

pub mod accessibility;
pub mod archive;
pub mod color;
pub mod convert;
pub mod documents;
pub mod files;
pub mod generators;
pub mod images;

use convert::text::CsvOptions;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    set_panic_hook();
}

pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), String> {
    getrandom::fill(buf).map_err(|err| err.to_string())
}

/// Uniform-ish index in `0..n` from four CSPRNG bytes.
pub(crate) fn random_below(n: usize) -> Result<usize, String> {
    if n == 0 {
        return Err("empty range".into());
    }
    let mut bytes = [0u8; 4];
    fill_random(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes) as usize % n)
}

fn js_err(err: String) -> JsValue {
    JsValue::from_str(&err)
}

/// Plain objects instead of `Map`s so JSON values round-trip to JS as-is.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Missing or `null` options fall back to defaults.
fn options_from_js<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn byte_arrays(items: &Array) -> Vec<Vec<u8>> {
    items
        .iter()
        .map(|item| Uint8Array::new(&item).to_vec())
        .collect()
}

fn now_iso() -> String {
    Date::new_0().to_iso_string().into()
}

// Text and markup

#[wasm_bindgen]
pub fn markdown_to_html(input: &str) -> String {
    convert::markdown::markdown_to_html(input)
}

#[wasm_bindgen]
pub fn html_to_markdown(input: &str) -> String {
    convert::markdown::html_to_markdown(input)
}

#[wasm_bindgen]
pub fn html_to_text(input: &str) -> String {
    convert::markdown::html_to_text(input)
}

#[wasm_bindgen]
pub fn text_to_html(input: &str) -> String {
    convert::text::text_to_html(input)
}

#[wasm_bindgen]
pub fn format_json(input: &str, indent: Option<usize>) -> Result<String, JsValue> {
    convert::text::format_json(input, indent.unwrap_or(2)).map_err(js_err)
}

#[wasm_bindgen]
pub fn minify_json(input: &str) -> Result<String, JsValue> {
    convert::text::minify_json(input).map_err(js_err)
}

#[wasm_bindgen]
pub fn validate_json(input: &str) -> Result<JsValue, JsValue> {
    to_js(&convert::text::validate_json(input))
}

#[wasm_bindgen]
pub fn json_to_csv(input: &str, options: JsValue) -> Result<String, JsValue> {
    let options: CsvOptions = options_from_js(options)?;
    convert::text::json_to_csv(input, &options).map_err(js_err)
}

#[wasm_bindgen]
pub fn csv_to_json(input: &str, options: JsValue) -> Result<String, JsValue> {
    let options: CsvOptions = options_from_js(options)?;
    let value = convert::text::csv_to_json(input, &options).map_err(js_err)?;
    serde_json::to_string_pretty(&value).map_err(|err| JsValue::from_str(&err.to_string()))
}

#[wasm_bindgen]
pub fn xml_to_json(input: &str) -> Result<String, JsValue> {
    let value = convert::xml::xml_to_json(input).map_err(js_err)?;
    serde_json::to_string_pretty(&value).map_err(|err| JsValue::from_str(&err.to_string()))
}

#[wasm_bindgen]
pub fn yaml_to_json(input: &str) -> Result<String, JsValue> {
    convert::text::yaml_to_json_text(input).map_err(js_err)
}

#[wasm_bindgen]
pub fn json_to_yaml(input: &str) -> Result<String, JsValue> {
    convert::text::json_to_yaml(input).map_err(js_err)
}

#[wasm_bindgen]
pub fn url_encode(input: &str, full: bool) -> String {
    convert::text::url_encode(input, full)
}

#[wasm_bindgen]
pub fn url_decode(input: &str, full: bool) -> Result<String, JsValue> {
    convert::text::url_decode(input, full).map_err(js_err)
}

#[wasm_bindgen]
pub fn base64_encode(input: &str) -> String {
    convert::text::base64_encode(input)
}

#[wasm_bindgen]
pub fn base64_decode(input: &str) -> Result<String, JsValue> {
    convert::text::base64_decode(input).map_err(js_err)
}

// Code

#[wasm_bindgen]
pub fn minify_html(input: &str) -> String {
    convert::code::minify_html(input)
}

#[wasm_bindgen]
pub fn minify_css(input: &str) -> String {
    convert::code::minify_css(input)
}

#[wasm_bindgen]
pub fn minify_js(input: &str) -> String {
    convert::code::minify_js(input)
}

#[wasm_bindgen]
pub fn format_sql(input: &str, uppercase: Option<bool>, indent: Option<usize>) -> String {
    convert::code::format_sql(input, uppercase.unwrap_or(true), indent.unwrap_or(2))
}

// Generators

#[wasm_bindgen]
pub fn generate_hash(input: &str, algorithm: &str) -> Result<String, JsValue> {
    generators::generate_hash(input, algorithm).map_err(js_err)
}

#[wasm_bindgen]
pub fn generate_file_hash(data: &[u8], algorithm: &str) -> Result<String, JsValue> {
    generators::generate_file_hash(data, algorithm).map_err(js_err)
}

#[wasm_bindgen]
pub fn hash_all(data: &[u8]) -> Result<JsValue, JsValue> {
    to_js(&generators::hash_all(data))
}

#[wasm_bindgen]
pub fn generate_uuid() -> Result<String, JsValue> {
    generators::generate_uuid().map_err(js_err)
}

#[wasm_bindgen]
pub fn generate_uuids(count: usize) -> Result<JsValue, JsValue> {
    let uuids = generators::generate_uuids(count).map_err(js_err)?;
    to_js(&uuids)
}

#[wasm_bindgen]
pub fn generate_lorem_ipsum(kind: &str, count: usize) -> Result<String, JsValue> {
    let kind = generators::LoremKind::parse(kind).map_err(js_err)?;
    generators::generate_lorem_ipsum(kind, count).map_err(js_err)
}

#[wasm_bindgen]
pub fn generate_password(options: JsValue) -> Result<String, JsValue> {
    let options: generators::PasswordOptions = options_from_js(options)?;
    generators::generate_password(&options).map_err(js_err)
}

#[wasm_bindgen]
pub fn calculate_password_strength(password: &str) -> Result<JsValue, JsValue> {
    to_js(&generators::calculate_password_strength(password))
}

#[wasm_bindgen]
pub fn generate_qr_code(content: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options: generators::QrOptions = options_from_js(options)?;
    let result = generators::generate_qr_code(content, &options).map_err(js_err)?;
    to_js(&result)
}

#[wasm_bindgen]
pub fn generate_qr_svg(content: &str, options: JsValue) -> Result<String, JsValue> {
    let options: generators::QrOptions = options_from_js(options)?;
    generators::generate_qr_svg(content, &options).map_err(js_err)
}

// Images

#[wasm_bindgen]
pub fn convert_image_format(
    data: &[u8],
    target_format: &str,
    quality: Option<f32>,
) -> Result<JsValue, JsValue> {
    let result = images::convert_image_format(data, target_format, quality).map_err(js_err)?;
    to_js(&result)
}

#[wasm_bindgen]
pub fn resize_image(data: &[u8], options: JsValue) -> Result<JsValue, JsValue> {
    let options: images::ResizeOptions = options_from_js(options)?;
    to_js(&images::resize_image(data, &options).map_err(js_err)?)
}

#[wasm_bindgen]
pub fn compress_image(data: &[u8], options: JsValue) -> Result<JsValue, JsValue> {
    let options: images::CompressOptions = options_from_js(options)?;
    to_js(&images::compress_image(data, &options).map_err(js_err)?)
}

#[wasm_bindgen]
pub fn crop_image(data: &[u8], x: u32, y: u32, width: u32, height: u32) -> Result<JsValue, JsValue> {
    let region = images::Region {
        x,
        y,
        width,
        height,
    };
    to_js(&images::crop_image(data, region).map_err(js_err)?)
}

#[wasm_bindgen]
pub fn rotate_image(data: &[u8], options: JsValue) -> Result<JsValue, JsValue> {
    let options: images::RotateOptions = options_from_js(options)?;
    to_js(&images::rotate_image(data, &options).map_err(js_err)?)
}

#[wasm_bindgen]
pub fn image_to_base64(data: &[u8], mime: Option<String>) -> String {
    images::image_to_base64(data, mime.as_deref())
}

#[wasm_bindgen]
pub fn base64_to_image(input: &str) -> Result<JsValue, JsValue> {
    let decoded = images::base64_to_image(input).map_err(js_err)?;
    let result = js_sys::Object::new();
    js_sys::Reflect::set(&result, &"mime".into(), &JsValue::from_str(&decoded.mime))?;
    js_sys::Reflect::set(
        &result,
        &"bytes".into(),
        &Uint8Array::from(decoded.bytes.as_slice()).into(),
    )?;
    Ok(result.into())
}

#[wasm_bindgen]
pub fn generate_favicons(data: &[u8]) -> Result<JsValue, JsValue> {
    to_js(&images::generate_favicons(data).map_err(js_err)?)
}

#[wasm_bindgen]
pub fn image_dimensions(data: &[u8]) -> Result<JsValue, JsValue> {
    to_js(&images::image_dimensions(data).map_err(js_err)?)
}

/// `style` is `gaussian`, `pixelate` or `blackbar`; `region` may be omitted
/// for the centered default.
#[wasm_bindgen]
pub fn redact_region(
    data: &[u8],
    style: &str,
    region: JsValue,
    strength: Option<f32>,
) -> Result<JsValue, JsValue> {
    let region: Option<images::Region> = if region.is_undefined() || region.is_null() {
        None
    } else {
        Some(serde_wasm_bindgen::from_value(region).map_err(|err| JsValue::from_str(&err.to_string()))?)
    };
    let result = match style {
        "gaussian" | "blur" => images::blur_region(data, region, strength.unwrap_or(10.0)),
        "pixelate" => images::pixelate_region(data, region, strength.unwrap_or(12.0) as u32),
        "blackbar" => images::black_bar_region(data, region),
        other => Err(format!("Unknown redaction style: {other}")),
    }
    .map_err(js_err)?;
    to_js(&result)
}

#[wasm_bindgen]
pub fn upscale_image(data: &[u8], options: JsValue) -> Result<JsValue, JsValue> {
    let options: images::UpscaleOptions = options_from_js(options)?;
    to_js(&images::upscale_image(data, &options).map_err(js_err)?)
}

// Documents

#[wasm_bindgen]
pub fn text_to_pdf(text: &str, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let options: documents::TextPdfOptions = options_from_js(options)?;
    documents::text_to_pdf(text, &options).map_err(js_err)
}

#[wasm_bindgen]
pub fn images_to_pdf(pictures: Array, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let options: documents::ImagesPdfOptions = options_from_js(options)?;
    documents::images_to_pdf(&byte_arrays(&pictures), &options).map_err(js_err)
}

#[wasm_bindgen]
pub fn merge_pdfs(pdfs: Array) -> Result<Vec<u8>, JsValue> {
    documents::merge_pdfs(&byte_arrays(&pdfs)).map_err(js_err)
}

#[wasm_bindgen]
pub fn split_pdf(data: &[u8], ranges: JsValue) -> Result<Array, JsValue> {
    let ranges: Vec<documents::PageRange> =
        serde_wasm_bindgen::from_value(ranges).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let parts = documents::split_pdf(data, &ranges).map_err(js_err)?;
    Ok(parts
        .iter()
        .map(|part| JsValue::from(Uint8Array::from(part.as_slice())))
        .collect())
}

#[wasm_bindgen]
pub fn extract_pdf_pages(data: &[u8], pages: Vec<u32>) -> Result<Vec<u8>, JsValue> {
    documents::extract_pdf_pages(data, &pages).map_err(js_err)
}

#[wasm_bindgen]
pub fn pdf_page_count(data: &[u8]) -> Result<u32, JsValue> {
    documents::pdf_page_count(data).map_err(js_err)
}

#[wasm_bindgen]
pub fn extract_pdf_text(data: &[u8]) -> Result<String, JsValue> {
    documents::extract_pdf_text(data).map_err(js_err)
}

// Color

#[wasm_bindgen]
pub fn convert_color(input: &str) -> Result<JsValue, JsValue> {
    to_js(&color::convert_color(input).map_err(js_err)?)
}

#[wasm_bindgen]
pub fn hex_to_rgb(input: &str) -> Result<JsValue, JsValue> {
    to_js(&color::hex_to_rgb(input).map_err(js_err)?)
}

#[wasm_bindgen]
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    color::rgb_to_hex(color::Rgb { r, g, b })
}

// Archives

fn archive_files(names: Vec<String>, contents: &Array) -> Result<Vec<archive::ArchiveFile>, JsValue> {
    let bytes = byte_arrays(contents);
    if names.len() != bytes.len() {
        return Err(JsValue::from_str("names and contents must have the same length"));
    }
    Ok(names
        .into_iter()
        .zip(bytes)
        .map(|(name, bytes)| archive::ArchiveFile { name, bytes })
        .collect())
}

#[wasm_bindgen]
pub fn create_zip(names: Vec<String>, contents: Array) -> Result<Vec<u8>, JsValue> {
    let files = archive_files(names, &contents)?;
    archive::create_zip(&files).map_err(js_err)
}

#[wasm_bindgen]
pub fn add_to_zip(data: &[u8], names: Vec<String>, contents: Array) -> Result<Vec<u8>, JsValue> {
    let files = archive_files(names, &contents)?;
    archive::add_to_zip(data, &files).map_err(js_err)
}

#[wasm_bindgen]
pub fn list_zip(data: &[u8]) -> Result<JsValue, JsValue> {
    to_js(&archive::list_zip(data).map_err(js_err)?)
}

#[wasm_bindgen]
pub fn extract_zip(data: &[u8]) -> Result<Array, JsValue> {
    let files = archive::extract_zip(data).map_err(js_err)?;
    files
        .into_iter()
        .map(|file| {
            let entry = js_sys::Object::new();
            js_sys::Reflect::set(&entry, &"path".into(), &JsValue::from_str(&file.path))?;
            js_sys::Reflect::set(&entry, &"mime".into(), &JsValue::from_str(&file.mime))?;
            js_sys::Reflect::set(
                &entry,
                &"bytes".into(),
                &Uint8Array::from(file.bytes.as_slice()).into(),
            )?;
            Ok(JsValue::from(entry))
        })
        .collect()
}

#[wasm_bindgen]
pub fn gzip_compress(data: &[u8], level: Option<u32>) -> Result<Vec<u8>, JsValue> {
    archive::gzip_compress(data, level.unwrap_or(6)).map_err(js_err)
}

#[wasm_bindgen]
pub fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>, JsValue> {
    archive::gzip_decompress(data).map_err(js_err)
}

#[wasm_bindgen]
pub fn compression_ratio(original: f64, compressed: f64) -> i32 {
    archive::compression_ratio(original as u64, compressed as u64) as i32
}

// Files

#[wasm_bindgen]
pub fn format_file_size(bytes: f64) -> String {
    files::format_file_size(bytes as u64)
}

#[wasm_bindgen]
pub fn file_extension(name: &str) -> String {
    files::file_extension(name)
}

#[wasm_bindgen]
pub fn mime_type(name: &str) -> String {
    files::mime_type(name).to_string()
}

#[wasm_bindgen]
pub fn validate_file_type(name: &str, accepted: Vec<String>) -> bool {
    files::validate_file_type(name, &accepted)
}

#[wasm_bindgen]
pub fn validate_file_size(size_bytes: f64, max_size_mb: f64) -> bool {
    files::validate_file_size(size_bytes as u64, max_size_mb)
}

// Accessibility

#[wasm_bindgen]
pub fn analyze_accessibility(html: &str) -> Result<JsValue, JsValue> {
    to_js(&accessibility::analyze_html(html))
}

/// Processes results from axe-core (or [`analyze_accessibility`]) into the
/// report shape, stamped with the current time.
#[wasm_bindgen]
pub fn process_accessibility_results(
    url: &str,
    raw: JsValue,
    page_metadata: JsValue,
) -> Result<JsValue, JsValue> {
    let raw: accessibility::AxeResults =
        serde_wasm_bindgen::from_value(raw).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let metadata: Option<accessibility::PageMetadata> = if page_metadata.is_undefined() || page_metadata.is_null() {
        None
    } else {
        Some(
            serde_wasm_bindgen::from_value(page_metadata)
                .map_err(|err| JsValue::from_str(&err.to_string()))?,
        )
    };
    to_js(&accessibility::process_results(url, &now_iso(), &raw, metadata))
}

#[cfg(test)]
mod lib_tests;
