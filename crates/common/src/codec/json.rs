//! Canonical tree <-> JSON transform
//!
//! Attributes become `@`-prefixed keys, text next to attributes or children
//! goes under `#text`, a text-only element becomes a string and an empty one
//! `null`, and repeated siblings collapse into an array. The document is a
//! single-property object keyed by the root element name.

use serde_json::{Map, Value};

use super::document::{Element, XMLNS_XSD, XMLNS_XSI, XSI_NAMESPACE};
use crate::error::{CommonError, CommonResult};

const FORMAT: &str = "JSON";
const TEXT_KEY: &str = "#text";
const CDATA_KEY: &str = "#cdata-section";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Convert a canonical tree to its JSON form.
///
/// `xmlns:xsd` is dropped everywhere. `xmlns:xsi` is dropped too unless some
/// `xsi:*` attribute still needs it.
pub fn to_value(element: &Element) -> Value {
    let mut element = element.clone();
    element.strip_attribute(XMLNS_XSD);
    if !element.uses_xsi() {
        element.strip_attribute(XMLNS_XSI);
    }

    let mut document = Map::new();
    document.insert(element.name.clone(), element_value(&element));
    Value::Object(document)
}

/// # Errors
/// Returns `CommonError::Encoding` if serialization fails.
pub fn write(element: &Element) -> CommonResult<Vec<u8>> {
    serde_json::to_vec(&to_value(element))
        .map_err(|e| CommonError::encoding_format(FORMAT, e.to_string()))
}

/// Parse a JSON document into a canonical tree. A leading UTF-8 byte order
/// mark is skipped.
///
/// # Errors
/// Returns `CommonError::MalformedDocument` for invalid JSON or for JSON
/// that does not describe a single root element.
pub fn parse(bytes: &[u8]) -> CommonResult<Element> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let value: Value = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
    from_value(value)
}

/// # Errors
/// See [`parse`].
pub fn from_value(mut value: Value) -> CommonResult<Element> {
    ensure_xsi_declaration(&mut value);

    let Value::Object(document) = value else {
        return Err(malformed("document must be a JSON object"));
    };

    // `?xml` style keys carry the declaration, not content
    let mut roots = document.into_iter().filter(|(key, _)| !key.starts_with('?'));
    let (name, content) = roots.next().ok_or_else(|| malformed("document has no root element"))?;
    if let Some((extra, _)) = roots.next() {
        return Err(malformed(format!(
            "document must have a single root property, found '{name}' and '{extra}'"
        )));
    }
    if content.is_array() {
        return Err(malformed(format!("root element '{name}' cannot be an array")));
    }

    element_from(name, content)
}

fn element_value(element: &Element) -> Value {
    if element.attributes.is_empty() && element.children.is_empty() {
        return element.text.clone().map_or(Value::Null, Value::String);
    }

    let mut map = Map::new();
    for (key, value) in &element.attributes {
        map.insert(format!("@{key}"), Value::String(value.clone()));
    }
    if let Some(text) = &element.text {
        map.insert(TEXT_KEY.to_string(), Value::String(text.clone()));
    }
    for child in &element.children {
        let value = element_value(child);
        match map.get_mut(&child.name) {
            // element_value never yields an array, so an array here is a group
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(child.name.clone(), value);
            }
        }
    }
    Value::Object(map)
}

fn element_from(name: String, value: Value) -> CommonResult<Element> {
    let mut element = Element::new(name);

    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                if let Some(attribute) = key.strip_prefix('@') {
                    let text = scalar_text(&key, value)?;
                    element.attributes.push((attribute.to_string(), text));
                } else if key == TEXT_KEY || key == CDATA_KEY {
                    let text = scalar_text(&key, value)?;
                    append_text(&mut element, &text);
                } else if key.starts_with('#') || key.starts_with('?') {
                    // comments and other node kinds have no canonical form
                } else if let Value::Array(items) = value {
                    for item in items {
                        if item.is_array() {
                            return Err(malformed(format!("nested array under '{key}'")));
                        }
                        element.children.push(element_from(key.clone(), item)?);
                    }
                } else {
                    element.children.push(element_from(key, value)?);
                }
            }
        }
        Value::Array(_) => {
            return Err(malformed(format!("unexpected array for element '{}'", element.name)));
        }
        scalar => {
            let text = scalar_text(&element.name, scalar)?;
            append_text(&mut element, &text);
        }
    }

    Ok(element)
}

fn scalar_text(key: &str, value: Value) -> CommonResult<String> {
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => {
            Err(malformed(format!("'{key}' must be a scalar value")))
        }
    }
}

fn append_text(element: &mut Element, text: &str) {
    if text.is_empty() {
        return;
    }
    match &mut element.text {
        Some(existing) => existing.push_str(text),
        None => element.text = Some(text.to_string()),
    }
}

/// Re-insert the `xmlns:xsi` declaration when the document uses `xsi:*`
/// attributes but the sender omitted it. The key goes first in the root
/// element's object.
fn ensure_xsi_declaration(document: &mut Value) {
    let declaration_key = format!("@{XMLNS_XSI}");
    let uses_xsi = any_key(document, &|key: &str| key.starts_with("@xsi:"));
    if !uses_xsi || any_key(document, &|key: &str| key == declaration_key) {
        return;
    }

    let Value::Object(roots) = document else {
        return;
    };
    let Some(Value::Object(root)) =
        roots.iter_mut().find(|(key, _)| !key.starts_with('?')).map(|(_, value)| value)
    else {
        return;
    };

    let mut rebuilt = Map::new();
    rebuilt.insert(declaration_key, Value::String(XSI_NAMESPACE.to_string()));
    rebuilt.extend(std::mem::take(root));
    *root = rebuilt;
}

fn any_key(value: &Value, predicate: &dyn Fn(&str) -> bool) -> bool {
    match value {
        Value::Object(map) => {
            map.iter().any(|(key, child)| predicate(key) || any_key(child, predicate))
        }
        Value::Array(items) => items.iter().any(|item| any_key(item, predicate)),
        _ => false,
    }
}

fn malformed(message: impl Into<String>) -> CommonError {
    CommonError::malformed_format(FORMAT, message)
}
