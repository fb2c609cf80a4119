//! End-to-end tests: acquire text from files, then extract a record.

use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use image::{DynamicImage, RgbImage};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use rcpt_core::models::config::PdfConfig;
use rcpt_core::{
    Category, Currency, OcrBackend, OcrError, PdfError, RcptError, ReceiptExtractor, SourceKind,
    TextAcquirer,
};

/// OCR backend returning canned text and counting calls.
struct FakeOcr {
    text: &'static str,
    calls: AtomicUsize,
}

impl FakeOcr {
    fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            text,
            calls: AtomicUsize::new(0),
        })
    }
}

impl OcrBackend for FakeOcr {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.to_string())
    }
}

struct SlowOcr;

impl OcrBackend for SlowOcr {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        thread::sleep(Duration::from_secs(2));
        Ok(String::new())
    }
}

const SCANNED: &str = "BIG BAZAAR\nFuture Retail Ltd\n02-11-2023\nSugar 1kg 48.00\nTOTAL 2,150.75\n";

fn write_png(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 16, image::Rgb([255, 255, 255])))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}

#[test]
fn text_file_is_read_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("receipt.txt");
    let content = "  Reliance Fresh\r\n\tTotal: 1,234.50  \n";
    std::fs::write(&path, content).unwrap();

    let ocr = FakeOcr::new("unused");
    let acquirer = TextAcquirer::new(ocr.clone());
    let acquisition = acquirer.acquire(&path).unwrap();

    assert_eq!(acquisition.text, content);
    assert_eq!(acquisition.source, SourceKind::Text);
    assert_eq!(acquisition.pages, 1);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn image_is_recognized_and_extracted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "scan.PNG");

    let ocr = FakeOcr::new(SCANNED);
    let acquirer = TextAcquirer::new(ocr.clone());
    let text = acquirer.acquire_text(&path).unwrap();
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);

    let record = ReceiptExtractor::new().extract(&text);
    assert_eq!(record.vendor, "Big Bazaar");
    assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 11, 2));
    assert_eq!(record.amount, Decimal::from_str("2150.75").unwrap());
    assert_eq!(record.category, Category::Groceries);
    assert_eq!(record.currency, Currency::Inr);
}

#[test]
fn unsupported_extension_is_rejected_before_reading() {
    let acquirer = TextAcquirer::new(FakeOcr::new(""));
    let err = acquirer
        .acquire(Path::new("/does/not/exist/receipt.docx"))
        .unwrap_err();
    assert!(matches!(err, RcptError::UnsupportedFormat(_)));
}

#[test]
fn missing_supported_file_is_io_error() {
    let acquirer = TextAcquirer::new(FakeOcr::new(""));
    let err = acquirer
        .acquire(Path::new("/does/not/exist/receipt.txt"))
        .unwrap_err();
    assert!(matches!(err, RcptError::Io(_)));
}

#[test]
fn slow_ocr_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "slow.png");

    let acquirer = TextAcquirer::new(Arc::new(SlowOcr)).with_timeout(Duration::from_millis(100));
    let err = acquirer.acquire(&path).unwrap_err();
    assert!(matches!(err, RcptError::Ocr(OcrError::Timeout { millis: 100 })));
}

#[test]
fn invalid_pdf_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"%PDF-1.4 truncated").unwrap();

    let acquirer = TextAcquirer::new(FakeOcr::new(""));
    let err = acquirer.acquire(&path).unwrap_err();
    assert!(matches!(err, RcptError::Pdf(PdfError::Parse(_))));
}

/// OCR backend answering "p1", "p2", ... in call order.
struct CountingOcr {
    calls: AtomicUsize,
}

impl OcrBackend for CountingOcr {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("p{}", n))
    }
}

/// One page of a generated PDF: drawn text, a placed raster image, or both.
struct TestPage {
    text: Option<&'static str>,
    image: bool,
}

fn write_pdf(path: &Path, pages: &[TestPage]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for test_page in pages {
        let mut operations = Vec::new();
        let mut resources = dictionary! { "Font" => dictionary! { "F1" => font } };

        if test_page.image {
            let image = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 1,
                    "Height" => 1,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![0],
            ));
            resources.set("XObject", dictionary! { "Im0" => image });
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new("cm", vec![100.into(), 0.into(), 0.into(), 100.into(), 72.into(), 72.into()]),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ]);
        }

        if let Some(text) = test_page.text {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = doc.add_object(Stream::new(
            dictionary! {},
            Content { operations }.encode().unwrap(),
        ));
        let page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => content,
            "Resources" => resources,
        });
        kids.push(Object::from(page));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog);
    doc.save(path).unwrap();
}

const SCAN_PAGE: TestPage = TestPage {
    text: None,
    image: true,
};

#[test]
fn pdf_pages_are_recognized_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    write_pdf(&path, &[SCAN_PAGE, SCAN_PAGE, SCAN_PAGE]);

    let ocr = Arc::new(CountingOcr {
        calls: AtomicUsize::new(0),
    });
    let acquirer = TextAcquirer::new(ocr.clone()).with_pdf_config(PdfConfig {
        max_pages: 2,
        ..PdfConfig::default()
    });
    let acquisition = acquirer.acquire(&path).unwrap();

    assert_eq!(acquisition.source, SourceKind::Pdf);
    assert_eq!(acquisition.pages, 2);
    assert_eq!(acquisition.text, "p1p2");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn pdf_text_only_page_is_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ereceipt.pdf");
    write_pdf(
        &path,
        &[TestPage {
            text: Some("DMART TOTAL 50"),
            image: false,
        }],
    );

    // Rendered pages go through OCR; without pdfium the text layer is read
    let ocr = FakeOcr::new("DMART\nTOTAL 50\n");
    let acquirer = TextAcquirer::new(ocr.clone());
    let text = acquirer.acquire_text(&path).unwrap();
    assert!(text.contains("DMART"), "{:?}", text);

    let record = ReceiptExtractor::new().extract(&text);
    assert_eq!(record.vendor, "Dmart");
    assert_eq!(record.amount, Decimal::from(50));
    assert_eq!(record.category, Category::Groceries);
}

#[test]
fn pdf_embedded_text_is_used_when_long_enough() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.pdf");
    write_pdf(
        &path,
        &[TestPage {
            text: Some("DMART TOTAL 50"),
            image: true,
        }],
    );

    let ocr = FakeOcr::new("from ocr");
    let acquirer = TextAcquirer::new(ocr.clone()).with_pdf_config(PdfConfig {
        prefer_embedded_text: true,
        min_text_length: 10,
        ..PdfConfig::default()
    });
    let acquisition = acquirer.acquire(&path).unwrap();

    assert!(acquisition.text.contains("DMART TOTAL 50"), "{:?}", acquisition.text);
    assert_eq!(acquisition.pages, 1);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn pdf_short_embedded_text_falls_back_to_ocr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.pdf");
    write_pdf(
        &path,
        &[TestPage {
            text: Some("DMART TOTAL 50"),
            image: true,
        }],
    );

    let ocr = FakeOcr::new("from ocr");
    let acquirer = TextAcquirer::new(ocr.clone()).with_pdf_config(PdfConfig {
        prefer_embedded_text: true,
        min_text_length: 100,
        ..PdfConfig::default()
    });
    let acquisition = acquirer.acquire(&path).unwrap();

    assert_eq!(acquisition.text, "from ocr");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
}
