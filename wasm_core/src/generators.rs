//! Hash, UUID, Lorem Ipsum, password and QR code generators.
//!
//! Randomness always comes from the operating system (or `crypto.getRandomValues`
//! in the browser) through `getrandom`; nothing here is seedable.

use std::collections::BTreeMap;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use md5::Md5;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::images::{ImageConversionResult, encode_png, png_result};
use crate::{fill_random, random_below};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    pub fn parse(input: &str) -> Result<Self, String> {
        match input.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(format!("Unknown algorithm: {input}")),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    fn digest_hex(self, data: &[u8]) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(data)),
            Self::Sha1 => hex::encode(Sha1::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }
}

/// Lowercase hex digest of UTF-8 text.
///
/// # Example
/// ```
/// use wcag_core::generators::generate_hash;
/// assert_eq!(generate_hash("abc", "md5")?, "900150983cd24fb0d6963f7d28e17f72");
/// # Ok::<(), String>(())
/// ```
pub fn generate_hash(text: &str, algorithm: &str) -> Result<String, String> {
    generate_file_hash(text.as_bytes(), algorithm)
}

/// Lowercase hex digest of raw file bytes, read fully into memory by the caller.
pub fn generate_file_hash(data: &[u8], algorithm: &str) -> Result<String, String> {
    Ok(HashAlgorithm::parse(algorithm)?.digest_hex(data))
}

/// Every supported digest at once, keyed by algorithm name.
pub fn hash_all(data: &[u8]) -> BTreeMap<String, String> {
    HashAlgorithm::ALL
        .iter()
        .map(|alg| (alg.label().to_string(), alg.digest_hex(data)))
        .collect()
}

pub fn generate_uuid() -> Result<String, String> {
    let mut bytes = [0u8; 16];
    fill_random(&mut bytes)?;
    Ok(uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string())
}

pub const MAX_UUID_BATCH: usize = 1000;

/// Generates `count` v4 UUIDs; `count` is clamped to `1..=1000`.
pub fn generate_uuids(count: usize) -> Result<Vec<String>, String> {
    (0..count.clamp(1, MAX_UUID_BATCH))
        .map(|_| generate_uuid())
        .collect()
}

const LOREM_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in",
    "reprehenderit", "voluptate", "velit", "esse", "cillum", "fugiat", "nulla", "pariatur",
    "excepteur", "sint", "occaecat", "cupidatat", "non", "proident", "sunt", "culpa", "qui",
    "officia", "deserunt", "mollit", "anim", "id", "est", "laborum", "perspiciatis", "unde",
    "omnis", "iste", "natus", "error", "voluptatem", "accusantium", "doloremque", "laudantium",
    "totam", "rem", "aperiam", "eaque", "ipsa", "quae", "ab", "illo", "inventore", "veritatis",
    "quasi", "architecto", "beatae", "vitae", "dicta",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoremKind {
    Words,
    Sentences,
    Paragraphs,
}

impl LoremKind {
    pub fn parse(input: &str) -> Result<Self, String> {
        match input.trim().to_ascii_lowercase().as_str() {
            "words" => Ok(Self::Words),
            "sentences" => Ok(Self::Sentences),
            "paragraphs" => Ok(Self::Paragraphs),
            other => Err(format!("Unknown type: {other}")),
        }
    }
}

/// Builds placeholder text: words joined by spaces, sentences of 8–17 words,
/// paragraphs of 4–7 sentences separated by blank lines.
pub fn generate_lorem_ipsum(kind: LoremKind, count: usize) -> Result<String, String> {
    let parts: Vec<String> = (0..count)
        .map(|_| match kind {
            LoremKind::Words => random_word().map(str::to_string),
            LoremKind::Sentences => random_sentence(),
            LoremKind::Paragraphs => random_paragraph(),
        })
        .collect::<Result<_, _>>()?;
    let separator = if kind == LoremKind::Paragraphs { "\n\n" } else { " " };
    Ok(parts.join(separator))
}

fn random_word() -> Result<&'static str, String> {
    Ok(LOREM_WORDS[random_below(LOREM_WORDS.len())?])
}

fn random_sentence() -> Result<String, String> {
    let word_count = 8 + random_below(10)?;
    let mut words = Vec::with_capacity(word_count);
    for _ in 0..word_count {
        words.push(random_word()?.to_string());
    }
    if let Some(first) = words.first_mut() {
        let mut chars = first.chars();
        if let Some(initial) = chars.next() {
            *first = initial.to_uppercase().chain(chars).collect();
        }
    }
    Ok(format!("{}.", words.join(" ")))
}

fn random_paragraph() -> Result<String, String> {
    let sentence_count = 4 + random_below(4)?;
    let sentences = (0..sentence_count)
        .map(|_| random_sentence())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sentences.join(" "))
}

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UPPERCASE_UNAMBIGUOUS: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const LOWERCASE_UNAMBIGUOUS: &str = "abcdefghjkmnpqrstuvwxyz";
const DIGITS: &str = "0123456789";
const DIGITS_UNAMBIGUOUS: &str = "23456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub numbers: bool,
    pub symbols: bool,
    /// Drops look-alike characters such as `I`, `l`, `O` and `0`.
    pub exclude_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            numbers: true,
            symbols: true,
            exclude_ambiguous: false,
        }
    }
}

impl PasswordOptions {
    fn alphabet(&self) -> Vec<char> {
        let ambiguous = self.exclude_ambiguous;
        let mut chars = String::new();
        if self.uppercase {
            chars.push_str(if ambiguous { UPPERCASE_UNAMBIGUOUS } else { UPPERCASE });
        }
        if self.lowercase {
            chars.push_str(if ambiguous { LOWERCASE_UNAMBIGUOUS } else { LOWERCASE });
        }
        if self.numbers {
            chars.push_str(if ambiguous { DIGITS_UNAMBIGUOUS } else { DIGITS });
        }
        if self.symbols {
            chars.push_str(SYMBOLS);
        }
        chars.chars().collect()
    }
}

/// Draws `length` characters from the selected classes using one random `u32`
/// per character reduced modulo the alphabet size.
///
/// # Example
/// ```
/// use wcag_core::generators::{generate_password, PasswordOptions};
/// let pw = generate_password(&PasswordOptions { length: 24, symbols: false, ..Default::default() })?;
/// assert_eq!(pw.chars().count(), 24);
/// assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
/// # Ok::<(), String>(())
/// ```
pub fn generate_password(options: &PasswordOptions) -> Result<String, String> {
    let alphabet = options.alphabet();
    if alphabet.is_empty() {
        return Err("At least one character type must be selected".into());
    }
    let mut raw = vec![0u8; options.length * 4];
    fill_random(&mut raw)?;
    Ok(raw
        .chunks_exact(4)
        .map(|chunk| {
            let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            alphabet[value as usize % alphabet.len()]
        })
        .collect())
}

pub const STRENGTH_LABELS: [&str; 5] = ["Very Weak", "Weak", "Fair", "Strong", "Very Strong"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0 (very weak) to 4 (very strong).
    pub score: u8,
    pub feedback: String,
}

/// Heuristic strength score; not an entropy estimate.
pub fn calculate_password_strength(password: &str) -> PasswordStrength {
    let length = password.chars().count();
    let mut score: i32 = 0;
    score += [8, 12, 16].iter().filter(|min| length >= **min).count() as i32;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        score += 1;
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_alphabetic()) {
        score -= 1;
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        score -= 1;
    }
    if has_triple_repeat(password) {
        score -= 1;
    }
    let score = score.clamp(0, 4) as u8;
    PasswordStrength {
        score,
        feedback: STRENGTH_LABELS[score as usize].to_string(),
    }
}

fn has_triple_repeat(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QrOptions {
    /// Output edge length in pixels for PNG output.
    pub size: u32,
    /// Quiet zone in modules.
    pub margin: u32,
    /// One of `L`, `M`, `Q`, `H`.
    pub error_correction_level: String,
    pub dark: String,
    pub light: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 256,
            margin: 4,
            error_correction_level: "M".into(),
            dark: "#000000".into(),
            light: "#ffffff".into(),
        }
    }
}

fn parse_ec_level(input: &str) -> Result<EcLevel, String> {
    match input.trim().to_ascii_uppercase().as_str() {
        "L" => Ok(EcLevel::L),
        "M" | "" => Ok(EcLevel::M),
        "Q" => Ok(EcLevel::Q),
        "H" => Ok(EcLevel::H),
        other => Err(format!("unsupported error correction level: {other}")),
    }
}

fn encode_qr(content: &str, options: &QrOptions) -> Result<QrCode, String> {
    if content.is_empty() {
        return Err("QR content cannot be empty".into());
    }
    let level = parse_ec_level(&options.error_correction_level)?;
    QrCode::with_error_correction_level(content.as_bytes(), level).map_err(|err| err.to_string())
}

/// Renders a QR code as a PNG exactly `size` pixels wide (or the smallest
/// size that still fits one pixel per module), returned with its data URL.
pub fn generate_qr_code(content: &str, options: &QrOptions) -> Result<ImageConversionResult, String> {
    let code = encode_qr(content, options)?;
    let dark = crate::color::hex_to_rgb(&options.dark)?;
    let light = crate::color::hex_to_rgb(&options.light)?;
    let total_modules = (code.width() as u32).saturating_add(options.margin.saturating_mul(2));
    let edge = options.size.max(total_modules);
    let module_px = (edge / total_modules).max(1);
    let margin_px = i64::from(options.margin * module_px);

    // The renderer's quiet zone is fixed at four modules, so the margin is
    // painted here and the result scaled to the exact edge.
    let symbol = code
        .render::<Rgb<u8>>()
        .quiet_zone(false)
        .module_dimensions(module_px, module_px)
        .dark_color(Rgb([dark.r, dark.g, dark.b]))
        .light_color(Rgb([light.r, light.g, light.b]))
        .build();
    let padded = module_px * total_modules;
    let mut canvas = RgbImage::from_pixel(padded, padded, Rgb([light.r, light.g, light.b]));
    imageops::overlay(&mut canvas, &symbol, margin_px, margin_px);
    let canvas = if padded == edge {
        canvas
    } else {
        imageops::resize(&canvas, edge, edge, FilterType::Nearest)
    };

    let is_grey = dark.r == dark.g && dark.g == dark.b && light.r == light.g && light.g == light.b;
    let image = if is_grey {
        DynamicImage::ImageLuma8(DynamicImage::ImageRgb8(canvas).to_luma8())
    } else {
        DynamicImage::ImageRgb8(canvas)
    };
    let bytes = encode_png(&image)?;
    Ok(png_result(bytes, edge, edge, "qrcode.png"))
}

/// Renders a QR code as a scalable SVG document, one unit per module.
pub fn generate_qr_svg(content: &str, options: &QrOptions) -> Result<String, String> {
    let code = encode_qr(content, options)?;
    let symbol = code
        .render::<svg::Color<'_>>()
        .quiet_zone(false)
        .module_dimensions(1, 1)
        .dark_color(svg::Color(&options.dark))
        .light_color(svg::Color(&options.light))
        .build();
    // drop the XML declaration so the symbol nests inside the framed document
    let symbol = symbol.find("<svg").map_or(symbol.as_str(), |at| &symbol[at..]);
    let margin = options.margin as usize;
    let total = code.width() + 2 * margin;
    Ok(format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {total} {total}\" ",
            "shape-rendering=\"crispEdges\">",
            "<rect width=\"{total}\" height=\"{total}\" fill=\"{light}\"/>",
            "<g transform=\"translate({margin} {margin})\">{symbol}</g></svg>\n"
        ),
        total = total,
        light = options.light,
        margin = margin,
        symbol = symbol,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn hashes_match_known_vectors() {
        assert_eq!(
            generate_hash("abc", "sha1").expect("sha1"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            generate_hash("abc", "SHA256").expect("sha256"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(generate_hash("", "sha512").expect("sha512").len(), 128);
        assert_eq!(
            generate_hash("x", "crc32").unwrap_err(),
            "Unknown algorithm: crc32"
        );
        let all = hash_all(b"abc");
        assert_eq!(all.len(), 4);
        assert_eq!(all["md5"], "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn uuids_are_v4_and_unique() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let id = generate_uuid().expect("uuid");
            let bytes = id.as_bytes();
            assert_eq!(id.len(), 36);
            assert_eq!(bytes[14], b'4', "{id}");
            assert!(matches!(bytes[19], b'8' | b'9' | b'a' | b'b'), "{id}");
            assert!(
                id.chars().all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c)),
                "{id}"
            );
            assert!(seen.insert(id), "duplicate uuid generated");
        }
        assert_eq!(generate_uuids(0).expect("batch").len(), 1);
        assert_eq!(generate_uuids(5000).expect("batch").len(), MAX_UUID_BATCH);
    }

    #[test]
    fn lorem_shapes_follow_kind() {
        let words = generate_lorem_ipsum(LoremKind::Words, 12).expect("words");
        assert_eq!(words.split(' ').count(), 12);
        assert!(words.split(' ').all(|w| LOREM_WORDS.contains(&w)));

        let sentences = generate_lorem_ipsum(LoremKind::Sentences, 3).expect("sentences");
        assert_eq!(sentences.matches('.').count(), 3);
        assert!(sentences.chars().next().is_some_and(|c| c.is_ascii_uppercase()));

        let paragraphs = generate_lorem_ipsum(LoremKind::Paragraphs, 4).expect("paragraphs");
        let blocks: Vec<&str> = paragraphs.split("\n\n").collect();
        assert_eq!(blocks.len(), 4);
        for block in blocks {
            let count = block.matches('.').count();
            assert!((4..=7).contains(&count), "{count} sentences");
        }
        assert!(LoremKind::parse("lines").is_err());
    }

    #[test]
    fn password_respects_length_and_classes() {
        for length in [1usize, 8, 16, 64, 128] {
            let options = PasswordOptions {
                length,
                uppercase: false,
                symbols: false,
                ..Default::default()
            };
            let pw = generate_password(&options).expect("password");
            assert_eq!(pw.chars().count(), length);
            assert!(pw.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
        let unambiguous = PasswordOptions {
            length: 200,
            exclude_ambiguous: true,
            symbols: false,
            ..Default::default()
        };
        let pw = generate_password(&unambiguous).expect("password");
        assert!(!pw.contains(['I', 'O', 'i', 'l', 'o', '0', '1']));
        let symbols_only = PasswordOptions {
            length: 40,
            uppercase: false,
            lowercase: false,
            numbers: false,
            ..Default::default()
        };
        let pw = generate_password(&symbols_only).expect("symbols");
        assert!(pw.chars().all(|c| SYMBOLS.contains(c)));
    }

    #[test]
    fn password_requires_a_class() {
        let options = PasswordOptions {
            uppercase: false,
            lowercase: false,
            numbers: false,
            symbols: false,
            ..Default::default()
        };
        assert_eq!(
            generate_password(&options).unwrap_err(),
            "At least one character type must be selected"
        );
    }

    #[test]
    fn strength_scores_follow_heuristic() {
        assert_eq!(calculate_password_strength("").score, 0);
        assert_eq!(calculate_password_strength("password").feedback, "Very Weak");
        // length earns a point that the all-digits penalty takes back
        assert_eq!(calculate_password_strength("12345678").score, 1);
        assert_eq!(calculate_password_strength("1234567").score, 0);
        assert_eq!(calculate_password_strength("Passw0rd").score, 3);
        assert_eq!(calculate_password_strength("aaaBBB111!!!xyz").score, 4);
        assert_eq!(calculate_password_strength("aB3!aB3!aB3!").score, 4);
        let strong = calculate_password_strength("C0rrect-Horse-Battery");
        assert_eq!(strong.score, 4);
        assert_eq!(strong.feedback, "Very Strong");
    }

    #[test]
    fn qr_png_has_requested_size_and_signature() {
        use base64::Engine;
        let qr = generate_qr_code("https://thewcag.com", &QrOptions::default()).expect("qr");
        assert_eq!((qr.width, qr.height), (256, 256));
        assert!(qr.data_url.starts_with("data:image/png;base64,"));
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(qr.data_base64.as_bytes())
            .expect("b64");
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
        assert!(generate_qr_code("", &QrOptions::default()).is_err());
    }

    #[test]
    fn qr_svg_includes_quiet_zone() {
        let svg = generate_qr_svg("hello", &QrOptions::default()).expect("svg");
        assert!(svg.starts_with("<svg"));
        // version 1 code is 21 modules plus 4 on each side
        assert!(svg.contains("viewBox=\"0 0 29 29\""), "{svg}");
        assert!(svg.contains("translate(4 4)"), "{svg}");
        assert!(!svg.contains("<?xml"));
        assert!(svg.contains("fill=\"#000000\""), "{svg}");

        let tight = QrOptions { margin: 0, ..QrOptions::default() };
        let svg = generate_qr_svg("hello", &tight).expect("svg");
        assert!(svg.contains("viewBox=\"0 0 21 21\""), "{svg}");
    }

    #[test]
    fn qr_png_keeps_margin_light_and_exact_edge() {
        use base64::Engine;
        let options = QrOptions { size: 200, dark: "#d97706".into(), ..QrOptions::default() };
        let qr = generate_qr_code("hello", &options).expect("qr");
        assert_eq!((qr.width, qr.height), (200, 200));
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(qr.data_base64.as_bytes())
            .expect("b64");
        let image = image::load_from_memory(&bytes).expect("png").to_rgb8();
        assert_eq!(image.dimensions(), (200, 200));
        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 255, 255]));
        // the finder pattern's top-left module sits just inside the margin
        let module = 200.0 / 29.0;
        let inside = (4.0 * module + module / 2.0) as u32;
        assert_eq!(image.get_pixel(inside, inside), &Rgb([0xd9, 0x77, 0x06]));
    }
}
