//! Canonical document tree
//!
//! Both wire formats are translated through [`Element`]: a named node with
//! ordered attributes, ordered children and optional text.

/// Namespace bound to the `xsi` prefix in canonical XML.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Namespace bound to the `xsd` prefix in canonical XML.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

pub const XMLNS_XSI: &str = "xmlns:xsi";
pub const XMLNS_XSD: &str = "xmlns:xsd";

/// Marks an element whose value is absent.
pub const XSI_NIL: &str = "xsi:nil";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Replace the value of an existing attribute in place, or append it.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Insert an attribute ahead of all others unless it is already present.
    pub fn prepend_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.attribute(&name).is_none() {
            self.attributes.insert(0, (name, value.into()));
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Text of the first direct child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|child| child.text.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty() && self.text.is_none()
    }

    /// Whether this element or any descendant carries an attribute for which
    /// `predicate` holds.
    pub fn any_attribute(&self, predicate: &impl Fn(&str) -> bool) -> bool {
        self.attributes.iter().any(|(key, _)| predicate(key))
            || self.children.iter().any(|child| child.any_attribute(predicate))
    }

    /// Remove the attribute `name` from this element and every descendant.
    pub fn strip_attribute(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
        for child in &mut self.children {
            child.strip_attribute(name);
        }
    }

    pub fn uses_xsi(&self) -> bool {
        self.any_attribute(&|key: &str| key.starts_with("xsi:"))
    }
}
