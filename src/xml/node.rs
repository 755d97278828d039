use std::collections::BTreeMap;

/// An untyped XML element.
///
/// `content` holds only the text that sits directly inside this element,
/// with entities and CDATA sections decoded. Text inside descendants lives on
/// the descendants, so an element may carry both `content` and `children`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub content: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Trimmed text content, or `None` when it is blank.
    pub fn text(&self) -> Option<&str> {
        Some(self.content.trim()).filter(|text| !text.is_empty())
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }
}
