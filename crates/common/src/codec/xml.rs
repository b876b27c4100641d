//! XML reader and writer for the canonical tree

use std::borrow::Cow;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use super::document::Element;
use crate::error::{CommonError, CommonResult};

const FORMAT: &str = "XML";

/// Parse an XML document into its root element.
///
/// Comments, processing instructions and the declaration are dropped, as is
/// whitespace-only text in elements that have children. Text of a leaf
/// element is kept verbatim, whitespace included.
///
/// # Errors
/// Returns `CommonError::MalformedDocument` carrying the parser's message.
pub fn parse(bytes: &[u8]) -> CommonResult<Element> {
    let source = std::str::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;
    let source = source.trim_start_matches('\u{feff}');

    let mut reader = Reader::from_str(source);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("{e} at position {}", reader.buffer_position())))?;

        match event {
            Event::Start(start) => {
                ensure_single_root(&root)?;
                stack.push(open_element(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&root)?;
                let element = open_element(&start)?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                let element =
                    stack.pop().ok_or_else(|| malformed("closing tag without matching open tag"))?;
                close_element(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(e.to_string()))?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                append_text(&mut stack, &String::from_utf8_lossy(&data))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unexpected end of document inside <{}>", open.name)));
    }
    root.ok_or_else(|| malformed("document has no root element"))
}

/// Serialize an element as a complete document with an XML declaration.
///
/// # Errors
/// Returns `CommonError::Encoding` if the writer fails.
pub fn write_document(element: &Element) -> CommonResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(encode_error)?;
    write_element(&mut writer, element, TextStyle::Escaped)?;
    Ok(writer.into_inner())
}

/// Serialize an element as a bare XML fragment (no declaration).
///
/// Text with leading or trailing whitespace is written as CDATA, which
/// readers that trim character data leave untouched.
///
/// # Errors
/// Returns `CommonError::Encoding` if the writer fails.
pub fn to_string(element: &Element) -> CommonResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element, TextStyle::PaddedAsCData)?;
    String::from_utf8(writer.into_inner()).map_err(encode_error)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextStyle {
    Escaped,
    PaddedAsCData,
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    style: TextStyle,
) -> CommonResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        return writer.write_event(Event::Empty(start)).map_err(encode_error);
    }

    writer.write_event(Event::Start(start)).map_err(encode_error)?;
    if let Some(text) = &element.text {
        write_text(writer, text, style)?;
    }
    for child in &element.children {
        write_element(writer, child, style)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(encode_error)
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str, style: TextStyle) -> CommonResult<()> {
    let padded = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
    if style == TextStyle::Escaped || !padded {
        return writer.write_event(Event::Text(BytesText::new(text))).map_err(encode_error);
    }
    for section in BytesCData::escaped(text) {
        writer.write_event(Event::CData(section)).map_err(encode_error)?;
    }
    Ok(())
}

fn open_element(start: &BytesStart<'_>) -> CommonResult<Element> {
    let mut element = Element::new(decode_name(start.name().as_ref()));
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(e.to_string()))?;
        let value = attribute.unescape_value().map_err(|e| malformed(e.to_string()))?;
        element
            .attributes
            .push((decode_name(attribute.key.as_ref()).into_owned(), value.into_owned()));
    }
    Ok(element)
}

fn close_element(mut element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    // indentation around child elements
    let blank = element.text.as_deref().is_some_and(|text| text.trim().is_empty());
    if blank && !element.children.is_empty() {
        element.text = None;
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn append_text(stack: &mut [Element], text: &str) -> CommonResult<()> {
    let Some(current) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(malformed("text outside the root element"));
    };
    match &mut current.text {
        Some(existing) => existing.push_str(text),
        None => current.text = Some(text.to_string()),
    }
    Ok(())
}

fn ensure_single_root(root: &Option<Element>) -> CommonResult<()> {
    match root {
        Some(existing) => Err(malformed(format!("second root element after <{}>", existing.name))),
        None => Ok(()),
    }
}

fn decode_name(raw: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(raw)
}

fn encode_error(error: impl std::fmt::Display) -> CommonError {
    CommonError::encoding_format(FORMAT, error.to_string())
}

fn malformed(message: impl Into<String>) -> CommonError {
    CommonError::malformed_format(FORMAT, message)
}
