//! Resource links returned by create and list operations

use serde::{Deserialize, Serialize};

/// Typed reference to a server resource.
///
/// Wire form: `<Link Title=".." Href=".." Rel=".." TargetType=".." />`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Link")]
pub struct Link {
    #[serde(rename = "@Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "@Href")]
    pub href: String,
    #[serde(rename = "@Rel", default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// Type tag naming the DTO kind the link points at.
    #[serde(rename = "@TargetType", default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into(), ..Self::default() }
    }

    /// Last non-empty path segment of the href (`/Employer/ER001` -> `ER001`).
    pub fn key(&self) -> Option<&str> {
        self.path_segments().last()
    }

    /// Path segment following `segment`
    /// (`/Report/PAYSLIP/run`, `"Report"` -> `PAYSLIP`).
    pub fn key_after(&self, segment: &str) -> Option<&str> {
        let mut segments = self.path_segments();
        segments.find(|candidate| candidate.eq_ignore_ascii_case(segment))?;
        segments.next()
    }

    fn path_segments(&self) -> impl Iterator<Item = &str> {
        let path = self.href.split(['?', '#']).next().unwrap_or_default();
        path.split('/').filter(|segment| !segment.is_empty())
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.href)
    }
}

/// Inner `<Links>` element of a [`LinkCollection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkList {
    #[serde(rename = "Link", default)]
    pub items: Vec<Link>,
}

/// Ordered set of links, e.g. the children of a collection resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "LinkCollection")]
pub struct LinkCollection {
    #[serde(rename = "@Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "Links", default)]
    pub links: LinkList,
}

impl LinkCollection {
    pub fn links(&self) -> &[Link] {
        &self.links.items
    }

    pub fn len(&self) -> usize {
        self.links.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.items.iter()
    }
}

impl<'a> IntoIterator for &'a LinkCollection {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
