//! PDF Document wrapper

use crate::image::{generate_image_operators, ImageXObject};
use crate::{PdfError, Result};
use image::DynamicImage;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Page dimensions in points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4 portrait
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// ISO A5 portrait
    pub const A5: PageSize = PageSize {
        width: 419.53,
        height: 595.28,
    };

    /// Create a page size from points
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Swap width and height
    pub fn landscape(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Guard against cyclic Parent chains in malformed page trees
const MAX_TREE_DEPTH: usize = 32;

/// PDF Document wrapper providing high-level operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Embedded images (pixel hash -> PDF object ID)
    embedded_images: HashMap<u64, ObjectId>,
    /// Page image resources (page number -> image name -> object ID)
    page_image_resources: HashMap<usize, HashMap<String, ObjectId>>,
    /// Next image resource number
    next_image_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDocument {
    /// Create an empty document with a catalog and no pages
    ///
    /// # Example
    /// ```
    /// use pdf_core::{PageSize, PdfDocument};
    ///
    /// let mut doc = PdfDocument::new();
    /// assert_eq!(doc.page_count(), 0);
    /// doc.add_blank_page(PageSize::A4).unwrap();
    /// assert_eq!(doc.page_count(), 1);
    /// ```
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.5");

        let pages_id = inner.add_object(Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        }));
        let catalog_id = inner.add_object(Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }));
        inner.trailer.set("Root", catalog_id);

        Self::from_inner(inner)
    }

    /// Open a PDF document from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_inner(inner))
    }

    fn from_inner(inner: Document) -> Self {
        Self {
            inner,
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            page_content_buffer: HashMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Draw an image into the given box, stretched to fill it
    ///
    /// The caller decides the box; use [`crate::fit_box_scale`] to keep the
    /// aspect ratio.
    ///
    /// # Arguments
    /// * `image` - Decoded raster
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate in points (from top)
    /// * `width` - Drawn width in points
    /// * `height` - Drawn height in points
    pub fn insert_image(
        &mut self,
        image: &DynamicImage,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        // Top-origin to PDF bottom-origin
        let page_height = self.page_size(page)?.height;
        let pdf_y = page_height - y - height;

        let resource_name = self.get_or_create_image_ref(image, page)?;
        let operators = generate_image_operators(&resource_name, x, pdf_y, width, height);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;
        self.inner.compress();

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Page size in points, from the page's own or inherited MediaBox
    pub fn page_size(&self, page: usize) -> Result<PageSize> {
        let [x0, y0, x1, y1] = self.media_box(self.page_id(page)?)?;
        Ok(PageSize::new(x1 - x0, y1 - y0))
    }

    /// Add a blank page of the given size to the end of the document
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_blank_page(&mut self, size: PageSize) -> Result<usize> {
        let pages_id = self.pages_root_id()?;

        let contents_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), Vec::new()));
        let page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width as _),
                Object::Real(size.height as _),
            ],
            "Resources" => Dictionary::new(),
            "Contents" => contents_id,
        });

        let mut pages = self.dict(pages_id)?.clone();
        let mut kids = pages
            .get(b"Kids")
            .and_then(Object::as_array)
            .cloned()
            .unwrap_or_default();
        kids.push(Object::Reference(page_id));
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0) + 1;
        pages.set("Kids", kids);
        pages.set("Count", count);
        self.inner.objects.insert(pages_id, Object::Dictionary(pages));

        Ok(self.page_count())
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        u32::try_from(page)
            .ok()
            .and_then(|n| pages.get(&n).copied())
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    fn dict(&self, id: ObjectId) -> Result<&Dictionary> {
        self.inner.get_object(id)?.as_dict().map_err(|_| {
            PdfError::ParseError(format!("Object {} {} is not a dictionary", id.0, id.1))
        })
    }

    /// MediaBox corners, walking up the page tree when the page inherits it
    fn media_box(&self, page_id: ObjectId) -> Result<[f64; 4]> {
        let mut node = page_id;
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.dict(node)?;
            if let Ok(value) = dict.get(b"MediaBox") {
                let array = match value {
                    Object::Reference(id) => self.inner.get_object(*id)?.as_array(),
                    other => other.as_array(),
                }
                .map_err(|_| PdfError::ParseError("MediaBox is not an array".to_string()))?;
                return parse_rect(array);
            }
            match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => node = parent,
                Err(_) => break,
            }
        }
        Err(PdfError::ParseError("Page has no MediaBox".to_string()))
    }

    fn buffer_content(&mut self, page: usize, operators: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(operators);
    }

    /// Write buffered operators as one extra content stream per page
    ///
    /// Existing streams stay in place; the new stream goes last in the
    /// page's Contents array so it paints on top.
    fn flush_content_buffers(&mut self) -> Result<()> {
        let mut pending: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();
        pending.sort_by_key(|(page, _)| *page);

        for (page, operators) in pending {
            let page_id = self.page_id(page)?;
            let stream_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), operators));

            let mut page_dict = self.dict(page_id)?.clone();
            let mut contents = match page_dict.get(b"Contents") {
                Ok(Object::Array(items)) => items.clone(),
                Ok(existing) => vec![existing.clone()],
                Err(_) => Vec::new(),
            };
            contents.push(Object::Reference(stream_id));
            page_dict.set("Contents", contents);
            self.inner.objects.insert(page_id, Object::Dictionary(page_dict));
        }

        Ok(())
    }

    /// Resource name for `image` on `page`, embedding it on first use
    ///
    /// XObjects are shared across pages, keyed by a hash of the pixels.
    fn get_or_create_image_ref(&mut self, image: &DynamicImage, page: usize) -> Result<String> {
        let key = pixel_hash(image);
        let object_id = match self.embedded_images.get(&key) {
            Some(id) => *id,
            None => {
                let xobject = ImageXObject::from_image(image)?;
                let id = self.inner.add_object(xobject.to_pdf_stream());
                self.embedded_images.insert(key, id);
                id
            }
        };

        let names = self.page_image_resources.entry(page).or_default();
        if let Some((name, _)) = names.iter().find(|(_, id)| **id == object_id) {
            return Ok(name.clone());
        }
        let name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;
        names.insert(name.clone(), object_id);

        self.register_xobject(page, &name, object_id)?;
        Ok(name)
    }

    /// Add `/name` to the page's XObject resources
    fn register_xobject(&mut self, page: usize, name: &str, object_id: ObjectId) -> Result<()> {
        let page_id = self.page_id(page)?;
        let mut page_dict = self.dict(page_id)?.clone();

        let mut resources = match page_dict.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => self.dict(*id)?.clone(),
            _ => Dictionary::new(),
        };
        let mut xobjects = resources
            .get(b"XObject")
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_else(|_| Dictionary::new());
        xobjects.set(name, Object::Reference(object_id));
        resources.set("XObject", xobjects);
        page_dict.set("Resources", resources);

        self.inner.objects.insert(page_id, Object::Dictionary(page_dict));
        Ok(())
    }

    /// Object ID of the root Pages node
    fn pages_root_id(&self) -> Result<ObjectId> {
        let catalog_id = self
            .inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?;

        self.dict(catalog_id)?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))
    }
}

fn parse_rect(array: &[Object]) -> Result<[f64; 4]> {
    if array.len() != 4 {
        return Err(PdfError::ParseError("MediaBox must have 4 entries".to_string()));
    }
    let mut rect = [0.0; 4];
    for (slot, value) in rect.iter_mut().zip(array) {
        *slot = match value {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => *r as f64,
            _ => return Err(PdfError::ParseError("MediaBox entry is not a number".to_string())),
        };
    }
    Ok(rect)
}

fn pixel_hash(image: &DynamicImage) -> u64 {
    let mut hasher = DefaultHasher::new();
    (image.width(), image.height()).hash(&mut hasher);
    (image.color().channel_count(), image.color().bits_per_pixel()).hash(&mut hasher);
    image.as_bytes().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn test_new_document_is_empty() {
        let doc = PdfDocument::new();
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_add_blank_page_sizes() {
        let mut doc = PdfDocument::new();
        assert_eq!(doc.add_blank_page(PageSize::A4).unwrap(), 1);
        assert_eq!(doc.add_blank_page(PageSize::A5.landscape()).unwrap(), 2);

        let a4 = doc.page_size(1).unwrap();
        assert!((a4.width - 595.28).abs() < 0.01);
        assert!((a4.height - 841.89).abs() < 0.01);

        let a5 = doc.page_size(2).unwrap();
        assert!((a5.width - 595.28).abs() < 0.01);
        assert!((a5.height - 419.53).abs() < 0.01);
    }

    #[test]
    fn test_insert_image_invalid_page() {
        let mut doc = PdfDocument::new();
        let img = solid(2, 2, [0, 0, 0]);
        let err = doc.insert_image(&img, 1, 0.0, 0.0, 10.0, 10.0).unwrap_err();
        assert!(matches!(err, PdfError::InvalidPage(1, 0)));
    }

    #[test]
    fn test_identical_images_share_one_xobject() {
        let mut doc = PdfDocument::new();
        doc.add_blank_page(PageSize::A4).unwrap();
        doc.add_blank_page(PageSize::A4).unwrap();

        let img = solid(4, 4, [200, 10, 10]);
        doc.insert_image(&img, 1, 0.0, 0.0, 10.0, 10.0).unwrap();
        doc.insert_image(&img, 2, 0.0, 0.0, 10.0, 10.0).unwrap();
        doc.insert_image(&solid(4, 4, [0, 0, 0]), 2, 0.0, 20.0, 10.0, 10.0)
            .unwrap();

        assert_eq!(doc.embedded_images.len(), 2);
    }

    #[test]
    fn test_page_size_invalid_page() {
        let doc = PdfDocument::new();
        assert!(matches!(doc.page_size(3), Err(PdfError::InvalidPage(3, 0))));
    }
}
