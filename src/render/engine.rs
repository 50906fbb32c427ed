//! PDF field renderer.
//!
//! Takes a template's field list plus a data record and paints each field
//! onto a page, either a blank/image-backed page or the first page of a
//! background PDF. Fields are painted in document order, so later fields
//! overlay earlier ones deterministically.
//!
//! Field positions arrive in template pixel space with the origin at the
//! top-left (the convention of the visual builder); PDF user space puts the
//! origin at the bottom-left, so every y coordinate is flipped on the way
//! in. Missing or broken assets degrade to a log line and a skipped field,
//! never a failed document.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde_json::Value;
use thiserror::Error;

use super::assets::{self, ImageXObject};
use super::color::{self, parse_hex_color};
use super::common::{field_visible, resolve_field_value};
use super::fonts::{encode_win_ansi, text_width, FontVariant};
use crate::template::merge::resolve_path;
use crate::template::{Field, FieldType, TextAlign};

/// Errors from PDF assembly itself. Asset problems never appear here; they
/// degrade to warnings.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode page content stream: {0}")]
    EncodeContent(#[source] lopdf::Error),
    #[error("failed to assemble PDF page tree: {0}")]
    Assemble(#[source] lopdf::Error),
    #[error("failed to serialize PDF: {0}")]
    Save(#[source] std::io::Error),
}

/// Page size in template pixel units (1 unit = 1 PDF point).
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub width: f32,
    pub height: f32,
}

/// Optional base layer under the fields.
#[derive(Debug, Clone)]
pub enum Background {
    /// First page of this PDF becomes the base layer.
    Pdf(PathBuf),
    /// This image is scaled to exactly fill the page.
    Image(PathBuf),
}

enum Base {
    Fresh { background_image: Option<PathBuf> },
    Existing { page_id: ObjectId },
}

/// Stateless renderer for mapped/canvas templates.
pub struct PdfFieldRenderer;

impl PdfFieldRenderer {
    /// Render fields over an optional background into PDF bytes.
    ///
    /// `qr_image` is the pre-generated verification QR PNG, painted by any
    /// `qrcode` field. Output is byte-identical across calls with the same
    /// inputs: no timestamps or random identifiers are embedded.
    pub fn render(
        fields: &[Field],
        data: &Value,
        page: PageSpec,
        background: Option<&Background>,
        qr_image: Option<&Path>,
    ) -> Result<Vec<u8>, RenderError> {
        let (mut doc, base) = open_base(background);

        let mut ops: Vec<Operation> = Vec::new();
        let mut xobjects: Vec<(String, ObjectId)> = Vec::new();

        if let Base::Fresh {
            background_image: Some(path),
        } = &base
        {
            match assets::image_xobject(path) {
                Ok(xobject) => {
                    let name = register_xobject(&mut doc, &mut xobjects, xobject);
                    ops.extend(draw_image_ops(&name, 0.0, 0.0, page.width, page.height));
                }
                Err(e) => log::warn!(
                    "skipping background image {}: {e}",
                    path.display()
                ),
            }
        }

        for field in fields {
            if !field_visible(field, data) {
                continue;
            }
            match field.field_type {
                FieldType::Text | FieldType::Number | FieldType::Date => {
                    let value = resolve_field_value(field, data);
                    if !value.is_empty() {
                        ops.extend(text_operations(&value, field, &page));
                    }
                }
                FieldType::Qrcode => match qr_image {
                    Some(path) => {
                        embed_image_field(&mut doc, &mut xobjects, &mut ops, path, field, &page)
                    }
                    None => log::warn!(
                        "qrcode field '{}' skipped: no QR image for this document",
                        field.name
                    ),
                },
                FieldType::Image => match resolve_path(data, &field.name)
                    .and_then(Value::as_str)
                {
                    Some(path) => embed_image_field(
                        &mut doc,
                        &mut xobjects,
                        &mut ops,
                        Path::new(path),
                        field,
                        &page,
                    ),
                    None => log::warn!(
                        "image field '{}' skipped: no path in data record",
                        field.name
                    ),
                },
                // Leniency for templates saved by a newer builder.
                FieldType::Unknown => {
                    log::debug!("field '{}' has an unknown type, skipped", field.name)
                }
            }
        }

        match base {
            Base::Fresh { .. } => assemble_fresh(doc, ops, xobjects, page),
            Base::Existing { page_id } => overlay_existing(doc, page_id, ops, xobjects),
        }
    }
}

/// Decide the base document. A background PDF that cannot be loaded
/// degrades to a blank page so certificate delivery is never blocked by a
/// missing asset.
fn open_base(background: Option<&Background>) -> (Document, Base) {
    let fresh = |bg: Option<PathBuf>| {
        (
            Document::with_version("1.5"),
            Base::Fresh {
                background_image: bg,
            },
        )
    };

    match background {
        Some(Background::Pdf(path)) => match Document::load(path) {
            Ok(mut doc) => {
                let pages = doc.get_pages();
                match pages.values().next().copied() {
                    Some(first) => {
                        if pages.len() > 1 {
                            let extra: Vec<u32> = pages.keys().skip(1).copied().collect();
                            doc.delete_pages(&extra);
                        }
                        (doc, Base::Existing { page_id: first })
                    }
                    None => {
                        log::warn!(
                            "background PDF {} has no pages, rendering blank page",
                            path.display()
                        );
                        fresh(None)
                    }
                }
            }
            Err(e) => {
                log::warn!(
                    "failed to load background PDF {}: {e}, rendering blank page",
                    path.display()
                );
                fresh(None)
            }
        },
        Some(Background::Image(path)) => fresh(Some(path.clone())),
        None => fresh(None),
    }
}

/// Content-stream operations for one text field.
///
/// The y flip happens here: a field authored at top-left `y` paints its
/// baseline at `page.height - y - font_size` in PDF space.
pub fn text_operations(text: &str, field: &Field, page: &PageSpec) -> Vec<Operation> {
    let size = if field.style.font_size > 0.0 {
        field.style.font_size
    } else {
        12.0
    };
    let variant = FontVariant::select(&field.style);
    let rgb = parse_hex_color(&field.style.color).unwrap_or_else(|e| {
        log::warn!("field '{}': {e}, painting black", field.name);
        color::BLACK
    });

    let measured = text_width(text, variant, size);
    let x = match field.style.align {
        TextAlign::Left => field.position.x,
        TextAlign::Center => field.position.x + (field.position.width - measured) / 2.0,
        TextAlign::Right => field.position.x + field.position.width - measured,
    };
    let y = page.height - field.position.y - size;

    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![variant.resource_name().into(), size.into()]),
        Operation::new("rg", vec![rgb.r.into(), rgb.g.into(), rgb.b.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Operations placing a registered image XObject in a page-space box whose
/// y is already flipped.
fn draw_image_ops(name: &str, x: f32, y: f32, width: f32, height: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                width.into(),
                0f32.into(),
                0f32.into(),
                height.into(),
                x.into(),
                y.into(),
            ],
        ),
        Operation::new("Do", vec![name.into()]),
        Operation::new("Q", vec![]),
    ]
}

fn register_xobject(
    doc: &mut Document,
    xobjects: &mut Vec<(String, ObjectId)>,
    xobject: ImageXObject,
) -> String {
    let id = doc.add_object(xobject.stream);
    let name = format!("CmIm{}", xobjects.len());
    xobjects.push((name.clone(), id));
    name
}

/// Paint an image or QR file at a field's box; failures log and skip.
fn embed_image_field(
    doc: &mut Document,
    xobjects: &mut Vec<(String, ObjectId)>,
    ops: &mut Vec<Operation>,
    path: &Path,
    field: &Field,
    page: &PageSpec,
) {
    match assets::image_xobject(path) {
        Ok(xobject) => {
            let name = register_xobject(doc, xobjects, xobject);
            let y = page.height - field.position.y - field.position.height;
            ops.extend(draw_image_ops(
                &name,
                field.position.x,
                y,
                field.position.width,
                field.position.height,
            ));
        }
        Err(e) => log::warn!(
            "field '{}' skipped, cannot embed {}: {e}",
            field.name,
            path.display()
        ),
    }
}

fn set_font_resources(fonts: &mut Dictionary) {
    for variant in FontVariant::ALL {
        fonts.set(
            variant.resource_name(),
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => variant.base_font(),
                "Encoding" => "WinAnsiEncoding",
            },
        );
    }
}

fn font_resources() -> Dictionary {
    let mut fonts = Dictionary::new();
    set_font_resources(&mut fonts);
    fonts
}

/// Build a single-page document around the collected operations.
fn assemble_fresh(
    mut doc: Document,
    ops: Vec<Operation>,
    xobjects: Vec<(String, ObjectId)>,
    page: PageSpec,
) -> Result<Vec<u8>, RenderError> {
    let encoded = Content { operations: ops }
        .encode()
        .map_err(RenderError::EncodeContent)?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let mut resources = dictionary! { "Font" => font_resources() };
    if !xobjects.is_empty() {
        let mut xobject_dict = Dictionary::new();
        for (name, id) in &xobjects {
            xobject_dict.set(name.as_str(), Object::Reference(*id));
        }
        resources.set("XObject", xobject_dict);
    }

    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0f32.into(), 0f32.into(), page.width.into(), page.height.into()],
        "Resources" => resources,
        "Contents" => Object::Reference(content_id),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);

    save(doc)
}

/// Overlay the collected operations onto the first page of a loaded
/// background document.
fn overlay_existing(
    mut doc: Document,
    page_id: ObjectId,
    ops: Vec<Operation>,
    xobjects: Vec<(String, ObjectId)>,
) -> Result<Vec<u8>, RenderError> {
    // Wrapping in q/Q shields the overlay from most graphics state the
    // background content leaves behind.
    let mut wrapped = Vec::with_capacity(ops.len() + 2);
    wrapped.push(Operation::new("q", vec![]));
    wrapped.extend(ops);
    wrapped.push(Operation::new("Q", vec![]));

    let encoded = Content {
        operations: wrapped,
    }
    .encode()
    .map_err(RenderError::EncodeContent)?;
    let overlay_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    append_page_content(&mut doc, page_id, overlay_id)?;
    merge_page_resources(&mut doc, page_id, &xobjects)?;

    save(doc)
}

fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    overlay_id: ObjectId,
) -> Result<(), RenderError> {
    let existing = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(RenderError::Assemble)?
        .get(b"Contents")
        .ok()
        .cloned();

    let merged = match existing {
        Some(Object::Array(mut streams)) => {
            streams.push(Object::Reference(overlay_id));
            Object::Array(streams)
        }
        Some(Object::Reference(old)) => {
            Object::Array(vec![Object::Reference(old), Object::Reference(overlay_id)])
        }
        Some(other) => {
            // Inline content object: give it an id so it can share an array
            // with the overlay.
            let old_id = doc.add_object(other);
            Object::Array(vec![Object::Reference(old_id), Object::Reference(overlay_id)])
        }
        None => Object::Reference(overlay_id),
    };

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(RenderError::Assemble)?
        .set("Contents", merged);
    Ok(())
}

/// Add our font and image names to the page's resource dictionary without
/// disturbing what the background page already declares.
fn merge_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    xobjects: &[(String, ObjectId)],
) -> Result<(), RenderError> {
    let resources_obj = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(RenderError::Assemble)?
        .get(b"Resources")
        .ok()
        .cloned();

    // Resolve to an owned dictionary we can edit; a referenced dictionary is
    // updated in place, an inline or absent one is set back on the page.
    let (mut resources, target) = match resources_obj {
        Some(Object::Dictionary(dict)) => (dict, None),
        Some(Object::Reference(id)) => {
            let dict = doc
                .get_object(id)
                .and_then(Object::as_dict)
                .map(Dictionary::clone)
                .unwrap_or_default();
            (dict, Some(id))
        }
        _ => (Dictionary::new(), None),
    };

    let mut fonts = resolve_subdict(doc, &resources, b"Font");
    set_font_resources(&mut fonts);
    resources.set("Font", fonts);

    if !xobjects.is_empty() {
        let mut xobject_dict = resolve_subdict(doc, &resources, b"XObject");
        for (name, id) in xobjects {
            xobject_dict.set(name.as_str(), Object::Reference(*id));
        }
        resources.set("XObject", xobject_dict);
    }

    match target {
        Some(id) => {
            *doc.get_object_mut(id).map_err(RenderError::Assemble)? =
                Object::Dictionary(resources);
        }
        None => {
            doc.get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(RenderError::Assemble)?
                .set("Resources", resources);
        }
    }
    Ok(())
}

/// Fetch a resource sub-dictionary as an editable copy, following one level
/// of indirection.
fn resolve_subdict(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key).ok() {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_dict)
            .map(Dictionary::clone)
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

fn save(mut doc: Document) -> Result<Vec<u8>, RenderError> {
    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(RenderError::Save)?;
    Ok(bytes)
}
