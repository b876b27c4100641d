//! Content codec
//!
//! Typed payloads are written to canonical XML through their serde mapping
//! (`@`-prefixed names are attributes), parsed into an [`Element`] and then
//! emitted as XML or JSON. Responses take the reverse path: the body is
//! parsed per its declared content type into an [`Element`], checked
//! against the target type's root element name and mapped onto the type.

pub mod content_type;
pub mod document;
pub mod json;
pub mod schema;
pub mod xml;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use content_type::WireFormat;
pub use document::{Element, XMLNS_XSD, XMLNS_XSI, XSD_NAMESPACE, XSI_NAMESPACE, XSI_NIL};
pub use schema::{SchemaCache, TypeSchema};

use crate::error::{CommonError, CommonResult};

/// Prefix of the root element wrapping a sequence of payloads.
pub const ARRAY_ROOT_PREFIX: &str = "ArrayOf";

/// Bidirectional translator between typed payloads and wire bodies.
///
/// Owns the per-type schema cache, so one instance should be shared by all
/// calls of a client.
#[derive(Debug, Default)]
pub struct Codec {
    schemas: SchemaCache,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }

    /// Serialize `payload` into a body of the given wire format.
    ///
    /// # Errors
    /// Returns `CommonError::Encoding` when the payload has no XML form.
    pub fn encode<T: Serialize>(&self, payload: &T, format: WireFormat) -> CommonResult<Vec<u8>> {
        let document = self.to_element(payload)?;
        self.encode_document(&document, format)
    }

    /// Serialize a sequence of payloads under an `ArrayOf<Element>` root.
    ///
    /// # Errors
    /// Returns `CommonError::Encoding` when an item has no XML form.
    pub fn encode_many<T: Serialize>(
        &self,
        payloads: &[T],
        format: WireFormat,
    ) -> CommonResult<Vec<u8>> {
        let mut items = payloads
            .iter()
            .map(|payload| self.to_element(payload))
            .collect::<CommonResult<Vec<_>>>()?;
        for item in &mut items {
            item.remove_attribute(XMLNS_XSI);
            item.remove_attribute(XMLNS_XSD);
        }

        let item_name = items
            .first()
            .map_or_else(|| short_type_name::<T>().to_string(), |item| item.name.clone());
        let mut root = Element::new(format!("{ARRAY_ROOT_PREFIX}{item_name}"));
        add_namespace_declarations(&mut root);
        root.children = items;

        self.encode_document(&root, format)
    }

    /// Write a canonical tree in the given wire format.
    ///
    /// # Errors
    /// Returns `CommonError::Encoding` if the writer fails.
    pub fn encode_document(&self, document: &Element, format: WireFormat) -> CommonResult<Vec<u8>> {
        match format {
            WireFormat::Xml => xml::write_document(document),
            WireFormat::Json => json::write(document),
        }
    }

    /// Parse a body according to its declared content type.
    ///
    /// # Errors
    /// Returns `CommonError::UnsupportedContentType` for media types outside
    /// the XML and JSON families, or `CommonError::MalformedDocument` when
    /// the body does not parse.
    pub fn decode_document(&self, body: &[u8], content_type: &str) -> CommonResult<Element> {
        match WireFormat::from_content_type(content_type)? {
            WireFormat::Xml => xml::parse(body),
            WireFormat::Json => json::parse(body),
        }
    }

    /// Parse a body and map it onto `T`.
    ///
    /// # Errors
    /// See [`Codec::decode_document`] and [`Codec::from_element`].
    pub fn decode<T: DeserializeOwned + 'static>(
        &self,
        body: &[u8],
        content_type: &str,
    ) -> CommonResult<T> {
        let document = self.decode_document(body, content_type)?;
        self.from_element(&document)
    }

    /// Typed payload to canonical tree, with the namespace declarations the
    /// canonical form carries on its root.
    ///
    /// A `None` field serializes as an empty element; it is marked
    /// `xsi:nil="true"` so that it reads back as `None` rather than as an
    /// empty value. An empty string field is indistinguishable from `None`
    /// at this point and is marked the same way.
    ///
    /// # Errors
    /// Returns `CommonError::Encoding` when the payload has no XML form.
    pub fn to_element<T: Serialize>(&self, payload: &T) -> CommonResult<Element> {
        let text = quick_xml::se::to_string(payload)
            .map_err(|e| CommonError::encoding_format("XML", e.to_string()))?;
        let mut document = xml::parse(text.as_bytes())
            .map_err(|e| CommonError::encoding_format("XML", e.to_string()))?;
        mark_nil_children(&mut document);
        add_namespace_declarations(&mut document);
        Ok(document)
    }

    /// Map a canonical tree onto `T`.
    ///
    /// # Errors
    /// Returns `CommonError::MalformedDocument` when the root element does
    /// not match the type's element name or the content does not fit the
    /// type's fields.
    pub fn from_element<T: DeserializeOwned + 'static>(
        &self,
        document: &Element,
    ) -> CommonResult<T> {
        let schema = self.schemas.get::<T>();
        if let Some(expected) = schema.element_name {
            if document.name != expected {
                return Err(CommonError::malformed(format!(
                    "expected root element <{expected}> for {}, found <{}>",
                    schema.type_name, document.name
                )));
            }
        }

        let text = xml::to_string(document)?;
        quick_xml::de::from_str(&text).map_err(|e| {
            CommonError::malformed(format!(
                "cannot map <{}> onto {}: {e}",
                document.name, schema.type_name
            ))
        })
    }
}

fn mark_nil_children(element: &mut Element) {
    for child in &mut element.children {
        if child.is_empty() {
            child.set_attribute(XSI_NIL, "true");
        } else {
            mark_nil_children(child);
        }
    }
}

fn add_namespace_declarations(document: &mut Element) {
    document.prepend_attribute(XMLNS_XSD, XSD_NAMESPACE);
    document.prepend_attribute(XMLNS_XSI, XSI_NAMESPACE);
}

/// Last path segment of a type name, without generic arguments.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
