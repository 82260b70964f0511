use super::*;

// Wrappers that take or build a `JsValue` only run under wasm; those live in
// tests/e2e_wasm.rs. The plain-typed exports are exercised here.

#[test]
fn fill_random_changes_buffer() {
    let mut first = [0u8; 32];
    let mut second = [0u8; 32];
    fill_random(&mut first).expect("random bytes");
    fill_random(&mut second).expect("random bytes");
    assert_ne!(first, second);
}

#[test]
fn random_below_stays_in_range() {
    for bound in [1usize, 2, 7, 62, 1000] {
        for _ in 0..200 {
            assert!(random_below(bound).expect("index") < bound);
        }
    }
    assert!(random_below(0).is_err());
}

#[test]
fn random_below_reaches_every_slot() {
    let mut seen = [false; 4];
    for _ in 0..400 {
        seen[random_below(4).expect("index")] = true;
    }
    assert!(seen.iter().all(|hit| *hit), "{seen:?}");
}

#[test]
fn text_exports_delegate_to_converters() {
    assert_eq!(markdown_to_html("**bold**").trim(), "<p><strong>bold</strong></p>");
    assert_eq!(html_to_text("<p>a</p><p>b</p>").trim(), "a\n\nb");
    assert_eq!(text_to_html("a & b"), "<p>a &amp; b</p>");
    assert_eq!(url_encode("a b", false), "a%20b");
    assert_eq!(url_decode("a%20b", false).expect("decode"), "a b");
    assert_eq!(base64_encode("WCAG"), "V0NBRw==");
    assert_eq!(base64_decode("V0NBRw==").expect("decode"), "WCAG");
}

#[test]
fn format_json_defaults_to_two_spaces() {
    assert_eq!(
        format_json(r#"{"a":[1]}"#, None).expect("format"),
        "{\n  \"a\": [\n    1\n  ]\n}"
    );
    assert_eq!(minify_json("{ \"a\" : 1 }").expect("minify"), r#"{"a":1}"#);
}

#[test]
fn format_sql_defaults_to_uppercase_keywords() {
    let formatted = format_sql("select id from users where a = 1", None, None);
    assert!(formatted.starts_with("SELECT id"));
    assert!(formatted.contains("\nFROM users"));
    assert!(formatted.contains("\nWHERE a = 1"));
}

#[test]
fn hash_export_matches_known_digest() {
    assert_eq!(
        generate_hash("abc", "SHA256").expect("sha256"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(
        generate_file_hash(b"abc", "md5").expect("md5"),
        "900150983cd24fb0d6963f7d28e17f72"
    );
}

#[test]
fn uuid_export_is_v4() {
    let id = generate_uuid().expect("uuid");
    assert_eq!(id.len(), 36);
    assert_eq!(id.as_bytes()[14], b'4');
}

#[test]
fn file_exports() {
    assert_eq!(format_file_size(1536.0), "1.5 KB");
    assert_eq!(file_extension("index.HTML"), "html");
    assert_eq!(mime_type("clip.mp4"), "video/mp4");
    assert!(validate_file_type("a.pdf", vec!["pdf".into()]));
    assert!(!validate_file_size(11.0 * 1024.0 * 1024.0, 10.0));
    assert_eq!(compression_ratio(200.0, 50.0), 75);
}

#[test]
fn color_and_archive_exports() {
    assert_eq!(rgb_to_hex(217, 119, 6), "#d97706");
    let packed = gzip_compress(b"aaaaaaaaaaaaaaaa", None).expect("gzip");
    assert_eq!(gzip_decompress(&packed).expect("gunzip"), b"aaaaaaaaaaaaaaaa");
}

#[test]
fn pdf_exports_round_trip_page_count() {
    let pdf = documents::text_to_pdf("hello", &documents::TextPdfOptions::default()).expect("pdf");
    assert_eq!(pdf_page_count(&pdf).expect("count"), 1);
    let merged = documents::merge_pdfs(&[pdf.clone(), pdf.clone()]).expect("merge");
    assert_eq!(pdf_page_count(&merged).expect("count"), 2);
    let picked = extract_pdf_pages(&merged, vec![2, 2, 3]).expect("extract");
    assert_eq!(pdf_page_count(&picked).expect("count"), 2);
    let parts = documents::split_pdf(&merged, &[documents::PageRange { start: 1, end: 2 }]).expect("split");
    assert_eq!(pdf_page_count(&parts[0]).expect("count"), 2);
    let text = extract_pdf_text(&pdf).expect("text");
    assert!(text.contains("hello"), "{text}");
}

#[test]
fn lorem_export_parses_kind() {
    let words = generate_lorem_ipsum("WORDS", 5).expect("lorem");
    assert_eq!(words.split_whitespace().count(), 5);
}
