//! XML data model

use indexmap::IndexMap;

use crate::error::Span;

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// XML element
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
    /// From the `<` of the start tag through the `>` closing the element
    pub span: Span,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
}

impl Element {
    /// Decoded value of attribute `name`, if present
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Markup of this element exactly as it appears in `source`.
    ///
    /// `source` must be the text the element was parsed from.
    pub fn source_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.span.start.offset..self.span.end.offset)
    }

    /// Child elements, skipping text
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }

    /// This element and every nested element in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

impl Drop for Element {
    // Deep trees are torn down from a heap stack rather than by recursion.
    fn drop(&mut self) {
        let mut pending: Vec<Self> = Vec::new();
        take_child_elements(&mut self.children, &mut pending);
        while let Some(mut element) = pending.pop() {
            take_child_elements(&mut element.children, &mut pending);
        }
    }
}

fn take_child_elements(children: &mut Vec<Content>, pending: &mut Vec<Element>) {
    pending.extend(children.drain(..).filter_map(|child| match child {
        Content::Element(element) => Some(element),
        Content::Text(_) => None,
    }));
}

/// Depth-first, pre-order walk over an element subtree
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        let children = element.child_elements().collect::<Vec<_>>();
        self.stack.extend(children.into_iter().rev());
        Some(element)
    }
}
