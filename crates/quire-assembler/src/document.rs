use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use quire_types::DocumentRole;
use tracing::debug;

use crate::config::{AssemblerConfig, PageSize};
use crate::embed::{prepare, EmbeddedImage};
use crate::error::{AssembleError, AssembleResult};
use crate::sniff::ImageFormat;

const PDF_VERSION: &str = "1.7";

/// Descriptive metadata for a new document's Info dictionary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// A PDF being assembled, plus the id of its root page tree node.
pub struct PdfDocument {
    inner: Document,
    pages_id: ObjectId,
}

impl PdfDocument {
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// The underlying lopdf document, for inspection.
    pub fn as_lopdf(&self) -> &Document {
        &self.inner
    }
}

/// Builds document versions one page at a time.
#[derive(Clone, Debug, Default)]
pub struct Assembler {
    config: AssemblerConfig,
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Parse `prev` as an existing version, or start an empty document when
    /// there is none.
    ///
    /// `meta` only applies to new documents; an existing document keeps its
    /// own Info dictionary.
    pub fn load_or_create(
        &self,
        prev: Option<&[u8]>,
        meta: &DocumentMeta,
    ) -> AssembleResult<PdfDocument> {
        match prev {
            Some(bytes) => load(bytes),
            None => Ok(self.create(meta)),
        }
    }

    /// Add one page of `role`'s size showing `image` edge to edge.
    ///
    /// The image is stretched to exactly fill the page.
    pub fn append_image_page(
        &self,
        doc: &mut PdfDocument,
        role: DocumentRole,
        image: &[u8],
    ) -> AssembleResult<ImageFormat> {
        let min = self.config.min_image_bytes;
        if image.len() < min {
            return Err(AssembleError::ImageTooSmall {
                len: image.len(),
                min,
            });
        }
        let size = self.config.page_sizes.for_role(role);
        if !size.is_valid() {
            return Err(AssembleError::Codec(format!(
                "invalid page size {}x{} for {role}",
                size.width, size.height
            )));
        }

        let prepared = prepare(image)?;
        let format = prepared.format;
        debug!(
            %format,
            width = prepared.width,
            height = prepared.height,
            "embedding page image"
        );
        add_page(doc, prepared, size)?;
        Ok(format)
    }

    /// Encode `doc` as PDF bytes.
    pub fn serialize(&self, doc: &mut PdfDocument) -> AssembleResult<Vec<u8>> {
        let mut out = Vec::new();
        doc.inner
            .save_to(&mut out)
            .map_err(|e| AssembleError::Codec(format!("failed to write pdf: {e}")))?;
        Ok(out)
    }

    fn create(&self, meta: &DocumentMeta) -> PdfDocument {
        let mut inner = Document::with_version(PDF_VERSION);
        let pages_id = inner.new_object_id();
        inner.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        let mut info = Dictionary::new();
        if let Some(title) = &meta.title {
            info.set("Title", text_string(title));
        }
        if let Some(author) = &meta.author {
            info.set("Author", text_string(author));
        }
        info.set("Producer", text_string(&self.config.producer));
        let info_id = inner.add_object(info);
        inner.trailer.set("Info", info_id);

        PdfDocument { inner, pages_id }
    }
}

fn load(bytes: &[u8]) -> AssembleResult<PdfDocument> {
    let inner = Document::load_mem(bytes)?;
    let pages_id = page_tree_root(&inner)?;
    Ok(PdfDocument { inner, pages_id })
}

fn page_tree_root(doc: &Document) -> AssembleResult<ObjectId> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_object(root_id)?.as_dict()?;
    Ok(catalog.get(b"Pages")?.as_reference()?)
}

fn add_page(doc: &mut PdfDocument, image: EmbeddedImage, size: PageSize) -> AssembleResult<()> {
    let inner = &mut doc.inner;

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.width),
        "Height" => i64::from(image.height),
        "ColorSpace" => Object::Name(image.color_space.as_bytes().to_vec()),
        "BitsPerComponent" => 8,
        "Filter" => Object::Name(image.filter.as_bytes().to_vec()),
    };
    if let Some(alpha) = image.alpha {
        let mask = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let mask_id = inner.add_object(raw_stream(mask, alpha));
        image_dict.set("SMask", mask_id);
    }
    let image_id = inner.add_object(raw_stream(image_dict, image.data));

    let name = format!("Im{}", image_id.0);
    let content = format!(
        "q\n{} 0 0 {} 0 0 cm\n/{} Do\nQ\n",
        size.width, size.height, name
    );
    let content_id = inner.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let page_id = inner.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => doc.pages_id,
        "MediaBox" => vec![0.into(), 0.into(), Object::Real(size.width), Object::Real(size.height)],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                name.as_str() => image_id,
            },
        },
        "Contents" => content_id,
    });

    let pages = inner.get_object_mut(doc.pages_id)?.as_dict_mut()?;
    pages.get_mut(b"Kids")?.as_array_mut()?.push(page_id.into());
    let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    pages.set("Count", count + 1);
    Ok(())
}

/// A stream whose content is already encoded and must not be recompressed.
fn raw_stream(dict: Dictionary, content: Vec<u8>) -> Stream {
    Stream::new(dict, content).with_compression(false)
}

/// PDF text string: literal for ASCII, UTF-16BE with a byte-order mark
/// otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
