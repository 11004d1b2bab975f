//! PDF text and image extraction using lopdf and pdf-extract.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use crate::error::IngestError;
use crate::models::Page;

/// PDF content extractor.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a PDF from bytes, decrypting documents with an empty password.
    pub fn load(&mut self, data: &[u8]) -> Result<(), IngestError> {
        let mut doc = Document::load_mem(data).map_err(|e| IngestError::Pdf(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(IngestError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes.
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| IngestError::Pdf(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(IngestError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    pub fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn document(&self) -> Result<&Document, IngestError> {
        self.document
            .as_ref()
            .ok_or_else(|| IngestError::Pdf("no document loaded".to_string()))
    }

    /// Whole-document text via pdf-extract.
    pub fn extract_text(&self) -> Result<String, IngestError> {
        pdf_extract::extract_text_from_mem(&self.raw_data).map_err(|e| IngestError::Pdf(e.to_string()))
    }

    /// Text of every page, numbered from 1.
    ///
    /// Uses lopdf's per-page extraction. When that yields nothing, the
    /// pdf-extract text is split across pages proportionally by line.
    pub fn extract_pages(&self) -> Result<Vec<Page>, IngestError> {
        let doc = self.document()?;
        let page_count = self.page_count();

        let pages: Vec<Page> = (1..=page_count)
            .map(|n| Page::new(n, doc.extract_text(&[n]).unwrap_or_default()))
            .collect();

        if pages.iter().any(|p| !p.text.trim().is_empty()) {
            return Ok(pages);
        }

        let full_text = match self.extract_text() {
            Ok(text) => text,
            Err(e) => {
                debug!("pdf-extract fallback failed: {}", e);
                return Ok(pages);
            }
        };
        Ok(split_by_lines(&full_text, page_count))
    }

    /// Embedded images of a page (JPEG and raw 8-bit RGB/Gray).
    pub fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>, IngestError> {
        let doc = self.document()?;
        let pages = doc.get_pages();
        let page_id = pages
            .get(&page)
            .ok_or_else(|| IngestError::Pdf(format!("invalid page number: {}", page)))?;

        let mut images = Vec::new();
        let Some(resources) = page_resources(doc, *page_id) else {
            return Ok(images);
        };

        if let Ok(xobjects) = resources.get(b"XObject") {
            if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                for (_name, obj_ref) in xobj_dict.iter() {
                    if let Ok((_, obj)) = doc.dereference(obj_ref) {
                        if let Some(img) = decode_image(obj) {
                            images.push(img);
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn split_by_lines(text: &str, page_count: u32) -> Vec<Page> {
    let lines: Vec<&str> = text.lines().collect();
    let count = page_count.max(1) as usize;
    let per_page = lines.len().div_ceil(count).max(1);

    (0..count)
        .map(|i| {
            let start = (i * per_page).min(lines.len());
            let end = ((i + 1) * per_page).min(lines.len());
            Page::new(i as u32 + 1, lines[start..end].join("\n"))
        })
        .collect()
}

/// Resources of a page, following `Parent` links for inherited ones.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut node_id = page_id;
    loop {
        let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
            return None;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res))) = doc.dereference(resources) {
                return Some(res.clone());
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => return None,
        }
    }
}

fn decode_image(obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
    if width == 0 || height == 0 {
        return None;
    }

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            trace!("Decoding JPEG image {}x{}", width, height);
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok();
        }
        Some(b"FlateDecode") | None => {}
        Some(other) => {
            trace!("Unsupported image filter {}", String::from_utf8_lossy(other));
            return None;
        }
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return None;
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| o.as_name().ok())
        .unwrap_or(b"DeviceRGB");

    let pixels = (width as usize).checked_mul(height as usize)?;
    match color_space {
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        b"DeviceRGB" | b"RGB" => {
            let len = pixels.checked_mul(3)?;
            if data.len() < len {
                return None;
            }
            RgbImage::from_raw(width, height, data[..len].to_vec()).map(DynamicImage::ImageRgb8)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(matches!(extractor.load(b"not a pdf"), Err(IngestError::Pdf(_))));
    }

    fn image_stream(width: i64, height: i64, color_space: &str, content: Vec<u8>) -> Object {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(width));
        dict.set("Height", Object::Integer(height));
        dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        Object::Stream(lopdf::Stream::new(dict, content))
    }

    #[test]
    fn test_decode_raw_gray_image() {
        let image = decode_image(&image_stream(2, 2, "DeviceGray", vec![0, 64, 128, 255])).unwrap();
        assert_eq!((image.width(), image.height()), (2, 2));
    }

    #[test]
    fn test_decode_rejects_bad_dimensions() {
        assert!(decode_image(&image_stream(70_000, 70_000, "DeviceGray", vec![0; 16])).is_none());
        assert!(decode_image(&image_stream(70_000, 70_000, "DeviceRGB", vec![0; 16])).is_none());
        assert!(decode_image(&image_stream(-4, 4, "DeviceGray", vec![0; 16])).is_none());
        assert!(decode_image(&image_stream(0, 4, "DeviceRGB", vec![0; 16])).is_none());
    }

    #[test]
    fn test_decode_rejects_short_data() {
        assert!(decode_image(&image_stream(4, 4, "DeviceRGB", vec![0; 16])).is_none());
    }

    #[test]
    fn test_split_by_lines() {
        let pages = split_by_lines("a\nb\nc", 2);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_no, 1);
        assert_eq!(pages[0].text, "a\nb");
        assert_eq!(pages[1].text, "c");
    }

    #[test]
    fn test_split_more_pages_than_lines() {
        let pages = split_by_lines("only", 3);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].text, "only");
        assert_eq!(pages[2].text, "");
    }
}
