use std::fmt;
use tapline_common::tree::NodeEntry;

/// How label text is compared. Comparison is always case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMatch {
    Exact,
    #[default]
    Substring,
}

impl TextMatch {
    pub fn matches(self, haystack: &str, needle: &str) -> bool {
        let haystack = haystack.to_lowercase();
        let needle = needle.to_lowercase();
        match self {
            TextMatch::Exact => haystack == needle,
            TextMatch::Substring => haystack.contains(&needle),
        }
    }
}

/// Criteria for finding a node.
///
/// Identification keys select candidates; flag filters narrow them. A `None`
/// filter means "don't care", `Some(b)` requires the flag to equal `b`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    pub resource_id: Option<String>,
    pub text: Option<String>,
    pub content_description: Option<String>,
    pub text_match: TextMatch,
    pub clickable: Option<bool>,
    pub focusable: Option<bool>,
    pub editable: Option<bool>,
    pub visible: Option<bool>,
}

impl Selector {
    pub fn by_resource_id(id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn by_content_description(desc: impl Into<String>) -> Self {
        Self {
            content_description: Some(desc.into()),
            ..Self::default()
        }
    }

    /// Selector from whichever of the three keys are present.
    pub fn from_keys(
        resource_id: Option<&str>,
        text: Option<&str>,
        content_description: Option<&str>,
    ) -> Self {
        Self {
            resource_id: resource_id.map(str::to_string),
            text: text.map(str::to_string),
            content_description: content_description.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn exact(mut self) -> Self {
        self.text_match = TextMatch::Exact;
        self
    }

    pub fn clickable(mut self, value: bool) -> Self {
        self.clickable = Some(value);
        self
    }

    pub fn focusable(mut self, value: bool) -> Self {
        self.focusable = Some(value);
        self
    }

    pub fn editable(mut self, value: bool) -> Self {
        self.editable = Some(value);
        self
    }

    pub fn visible(mut self, value: bool) -> Self {
        self.visible = Some(value);
        self
    }

    pub fn resource_id(&self) -> Option<&str> {
        non_blank(self.resource_id.as_deref())
    }

    pub fn text(&self) -> Option<&str> {
        non_blank(self.text.as_deref())
    }

    pub fn content_description(&self) -> Option<&str> {
        non_blank(self.content_description.as_deref())
    }

    /// At least one identification key is non-empty.
    pub fn has_criteria(&self) -> bool {
        self.resource_id().is_some() || self.text().is_some() || self.content_description().is_some()
    }

    /// Whether a node passes every requested flag filter.
    pub fn accepts(&self, node: &NodeEntry) -> bool {
        let wanted = |filter: Option<bool>, actual: bool| filter.is_none_or(|w| w == actual);
        wanted(self.clickable, node.flags.clickable)
            && wanted(self.focusable, node.flags.focusable)
            && wanted(self.editable, node.flags.editable)
            && wanted(self.visible, node.flags.visible)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(id) = self.resource_id() {
            parts.push(format!("id={id}"));
        }
        if let Some(text) = self.text() {
            parts.push(format!("text=\"{text}\""));
        }
        if let Some(desc) = self.content_description() {
            parts.push(format!("desc=\"{desc}\""));
        }
        if parts.is_empty() {
            f.write_str("<no criteria>")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}
