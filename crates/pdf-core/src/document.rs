//! PDF Document builder

use crate::image::{generate_image_operators, ImageXObject};
use crate::{PageSize, PdfError, Result};
use log::debug;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Handle to an image XObject embedded in a [`PdfDocument`]
///
/// One embedded image can be placed on any number of pages; the image data
/// is stored in the file once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(usize);

/// PDF Document builder providing high-level operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Root Pages object
    pages_id: ObjectId,
    /// Size of every page in the document
    page_size: PageSize,
    /// Page object IDs in order (page N is at index N - 1)
    page_ids: Vec<ObjectId>,
    /// Embedded images (handle index -> PDF object ID)
    images: Vec<ObjectId>,
    /// Embedded images (data hash -> handle index)
    embedded_images: HashMap<u64, usize>,
    /// Page image resources (page number -> image name -> object ID)
    page_image_resources: HashMap<usize, HashMap<String, ObjectId>>,
    /// Next image resource number
    next_image_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
    /// Document information (Title, Producer)
    info: Dictionary,
    /// Info dictionary object, once written
    info_id: Option<ObjectId>,
}

impl PdfDocument {
    /// Create an empty document whose pages all share `page_size`
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::new(PageSize::A4);
    /// assert_eq!(doc.page_count(), 0);
    /// ```
    pub fn new(page_size: PageSize) -> Self {
        let mut inner = Document::with_version("1.5");

        let pages_id = inner.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        let mut info = Dictionary::new();
        info.set(
            "Producer",
            Object::string_literal(concat!("pdf-core ", env!("CARGO_PKG_VERSION"))),
        );

        Self {
            inner,
            pages_id,
            page_size,
            page_ids: Vec::new(),
            images: Vec::new(),
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            page_content_buffer: HashMap::new(),
            info,
            info_id: None,
        }
    }

    /// Get the size shared by all pages
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Set the document title shown by PDF viewers
    pub fn set_title(&mut self, title: &str) {
        self.info.set("Title", Object::string_literal(title));
    }

    /// Add a blank page to the end of the document
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_blank_page(&mut self) -> Result<usize> {
        let contents_id = self
            .inner
            .add_object(Object::Stream(Stream::new(Dictionary::new(), vec![])));

        let page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                self.page_size.width.into(),
                self.page_size.height.into(),
            ],
            "Resources" => Dictionary::new(),
            "Contents" => contents_id,
        });

        let pages_dict = self
            .inner
            .get_object(self.pages_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;

        let mut kids_array = pages_dict
            .get(b"Kids")
            .map_err(|_| PdfError::ParseError("Pages object missing Kids array".to_string()))?
            .as_array()
            .map_err(|_| PdfError::ParseError("Kids is not an array".to_string()))?
            .clone();
        kids_array.push(Object::Reference(page_id));

        let mut new_pages_dict = pages_dict.clone();
        new_pages_dict.set(b"Count", Object::Integer(kids_array.len() as i64));
        new_pages_dict.set(b"Kids", Object::Array(kids_array));
        self.inner.objects.insert(self.pages_id, new_pages_dict.into());

        self.page_ids.push(page_id);
        Ok(self.page_ids.len())
    }

    /// Embed an image XObject once and return a handle for placing it
    ///
    /// Embedding identical image data twice returns the same handle.
    pub fn embed_image(&mut self, xobject: ImageXObject) -> Result<ImageHandle> {
        let mut hasher = DefaultHasher::new();
        xobject.width.hash(&mut hasher);
        xobject.height.hash(&mut hasher);
        xobject.filter.hash(&mut hasher);
        xobject.data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if let Some(index) = self.embedded_images.get(&data_hash) {
            return Ok(ImageHandle(*index));
        }

        debug!(
            "embedding {}x{} image ({}, {} bytes)",
            xobject.width,
            xobject.height,
            xobject.filter,
            xobject.data.len()
        );

        let object_id = self.inner.add_object(xobject.to_pdf_stream());
        let index = self.images.len();
        self.images.push(object_id);
        self.embedded_images.insert(data_hash, index);

        Ok(ImageHandle(index))
    }

    /// Place an embedded image on a page, clipped to the page box
    ///
    /// # Arguments
    /// * `image` - Handle returned by [`PdfDocument::embed_image`]
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate of the image's top edge in points (from the page top; may be negative)
    /// * `width` - Image width in points
    /// * `height` - Image height in points
    pub fn place_image(
        &mut self,
        image: ImageHandle,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        let object_id = *self
            .images
            .get(image.0)
            .ok_or(PdfError::UnknownImage(image.0))?;

        let resource_name = self.get_or_create_image_ref(object_id, page)?;

        // Convert Y coordinate from top-origin to PDF bottom-origin
        let page_height = self.page_size.height;
        let pdf_y = page_height - y - height;

        let operators = generate_image_operators(
            &resource_name,
            x,
            pdf_y,
            width,
            height,
            (0.0, 0.0, self.page_size.width, page_height),
        );

        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Save the document to a file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        // 1. Flush buffered content streams to pages
        self.flush_content_buffers()?;

        // 2. Write the Info dictionary
        self.write_info();

        // 3. Compress content streams (image streams opt out)
        self.inner.compress();

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Write (or rewrite) the Info dictionary and link it from the trailer
    fn write_info(&mut self) {
        let info = Object::Dictionary(self.info.clone());
        match self.info_id {
            Some(id) => {
                self.inner.objects.insert(id, info);
            }
            None => {
                let id = self.inner.add_object(info);
                self.inner.trailer.set("Info", id);
                self.info_id = Some(id);
            }
        }
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    ///
    /// Each page's (empty) content stream object is replaced in place, so no
    /// orphan stream objects are left behind.
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();

        for (page, content) in buffers {
            if content.is_empty() {
                continue;
            }

            let page_id = self.page_id(page)?;
            let contents_id = self
                .inner
                .get_object(page_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
                .get(b"Contents")
                .and_then(Object::as_reference)
                .map_err(|_| PdfError::ParseError("Page Contents is not a reference".to_string()))?;

            debug!("page {page}: {} content bytes", content.len());
            self.inner.objects.insert(
                contents_id,
                Object::Stream(Stream::new(Dictionary::new(), content)),
            );
        }

        Ok(())
    }

    /// Get the object ID of a page (1-indexed)
    fn page_id(&self, page: usize) -> Result<ObjectId> {
        page.checked_sub(1)
            .and_then(|index| self.page_ids.get(index))
            .copied()
            .ok_or(PdfError::InvalidPage(page, self.page_ids.len()))
    }

    /// Get or create the resource name of an image on a specific page
    fn get_or_create_image_ref(&mut self, object_id: ObjectId, page: usize) -> Result<String> {
        let page_resources = self.page_image_resources.entry(page).or_default();

        for (name, id) in page_resources.iter() {
            if *id == object_id {
                return Ok(name.clone());
            }
        }

        let resource_name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;

        page_resources.insert(resource_name.clone(), object_id);

        self.add_image_to_page_resources(page, &resource_name, object_id)?;

        Ok(resource_name)
    }

    /// Add image to a specific page's Resources dictionary
    fn add_image_to_page_resources(
        &mut self,
        page: usize,
        resource_name: &str,
        object_id: ObjectId,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        let page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;

        let mut resources_dict = match page_dict.get(b"Resources") {
            Ok(resources) => resources.as_dict().cloned().unwrap_or_default(),
            Err(_) => Dictionary::new(),
        };

        let mut xobject_dict = match resources_dict.get(b"XObject") {
            Ok(xobject) => xobject.as_dict().cloned().unwrap_or_default(),
            Err(_) => Dictionary::new(),
        };
        xobject_dict.set(resource_name.as_bytes(), Object::Reference(object_id));
        resources_dict.set(b"XObject", Object::Dictionary(xobject_dict));

        let mut new_page_dict = page_dict.clone();
        new_page_dict.set(b"Resources", Object::Dictionary(resources_dict));
        self.inner.objects.insert(page_id, new_page_dict.into());

        Ok(())
    }
}
