//! Minimal generic XML tree used by the dialect parsers.
//!
//! Feeds in the wild represent the same logical string three different
//! ways: plain text, CDATA, or text nested under markup. [`XmlElement::text`]
//! is the single coercion point every field read goes through.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::app::{FreshetError, Result};

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
}

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `content:encoded`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Name with any namespace prefix removed.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element matching `name` (qualified or local).
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name || e.local_name() == name)
    }

    /// All child elements matching `name` (qualified or local).
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements()
            .filter(move |e| e.name == name || e.local_name() == name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Text coercion with the full fallback order: direct text nodes,
    /// then CDATA payloads, then text nested under child markup, then
    /// the empty string. Entity-decoded and trimmed.
    pub fn text(&self) -> String {
        let direct: String = self
            .children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();

        let raw = if !direct.trim().is_empty() {
            direct
        } else {
            let cdata: String = self
                .children
                .iter()
                .filter_map(|n| match n {
                    XmlNode::CData(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect();
            if !cdata.trim().is_empty() {
                cdata
            } else {
                let mut nested = String::new();
                self.collect_text(&mut nested);
                nested
            }
        };

        html_escape::decode_html_entities(raw.trim()).into_owned()
    }

    /// Text coercion that maps the empty string to `None`.
    pub fn text_opt(&self) -> Option<String> {
        let text = self.text();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// Parse a raw XML body into a generic element tree, returning the root
/// element. Syntax errors become [`FreshetError::FeedParse`].
pub fn parse_tree(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(element_from_start(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| {
                    FreshetError::FeedParse("unbalanced closing tag".into())
                })?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(e.as_ref()).into_owned());
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::CData(text));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(FreshetError::FeedParse(e.to_string())),
        }
    }

    root.ok_or_else(|| FreshetError::FeedParse("document has no root element".into()))
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| FreshetError::FeedParse(err.to_string()))?
        .to_string();

    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push((key, value));
    }

    Ok(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
