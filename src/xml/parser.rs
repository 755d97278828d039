use std::io::{BufRead, Read};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use super::node::Node;
use crate::error::{DecodeError, IngestError};

// Wrapping the input in a synthetic root lets documents with several
// top-level elements, or with none at all, decode as a single element.
const SYNTHETIC_ROOT_OPEN: &[u8] = b"<junit-ingest-root>";
const SYNTHETIC_ROOT_CLOSE: &[u8] = b"</junit-ingest-root>";

/// Parses `xml` into the ordered list of its top-level elements.
///
/// Text, comments and declarations around the top-level elements are
/// dropped. Nothing is returned unless the whole input is well-formed.
pub fn parse_document<R: BufRead>(xml: R) -> Result<Vec<Node>, IngestError> {
    let mut reader = Reader::from_reader(SYNTHETIC_ROOT_OPEN.chain(xml).chain(SYNTHETIC_ROOT_CLOSE));

    let mut builder = ForestBuilder::default();
    let mut buf = Vec::new();
    loop {
        let step = reader
            .read_event_into(&mut buf)
            .map_err(DecodeError::from)
            .and_then(|event| builder.match_event(event));
        match step {
            Ok(true) => (),
            Ok(false) => break,
            Err(err) => {
                let position = input_position(&reader);
                log::debug!("rejecting malformed document at byte {}: {}", position, err);
                return Err(IngestError::from_decode(position, err));
            }
        }
        buf.clear();
    }

    Ok(builder.into_forest())
}

fn input_position<R>(reader: &Reader<R>) -> u64 {
    // Syntax errors record their own position; decoding errors raised while
    // handling an event only have the reader's current offset.
    let position = match reader.error_position() {
        0 => reader.buffer_position(),
        position => position,
    };
    position.saturating_sub(SYNTHETIC_ROOT_OPEN.len() as u64)
}

#[derive(Debug, Default)]
struct ForestBuilder {
    open: Vec<Node>,
    forest: Vec<Node>,
}

impl ForestBuilder {
    fn match_event(&mut self, event: Event) -> Result<bool, DecodeError> {
        match event {
            Event::Eof => return Ok(false),
            Event::Start(e) => {
                let node = open_node(&e)?;
                self.open.push(node);
            }
            Event::Empty(e) => {
                let node = open_node(&e)?;
                self.close_node(node);
            }
            Event::End(_) => {
                // The reader checks end names, so this always matches the
                // innermost open element.
                if let Some(node) = self.open.pop() {
                    self.close_node(node);
                }
            }
            Event::Text(e) => self.push_content(&e.unescape()?),
            Event::CData(e) => self.push_content(std::str::from_utf8(&e)?),
            _ => (),
        };
        Ok(true)
    }

    fn push_content(&mut self, text: &str) {
        if let Some(node) = self.open.last_mut() {
            node.content.push_str(text);
        }
    }

    fn close_node(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            // Only the synthetic root closes with nothing left open. Its
            // children are the document's top-level elements and its own
            // content is noise between them.
            None => self.forest.extend(node.children),
        }
    }

    fn into_forest(self) -> Vec<Node> {
        self.forest
    }
}

fn open_node(e: &BytesStart) -> Result<Node, DecodeError> {
    let mut node = Node::new(std::str::from_utf8(e.local_name().as_ref())?);

    let mut attributes = e.attributes();
    attributes.with_checks(false);
    for attr in attributes {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.local_name().as_ref())?.to_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attributes.insert(key, value);
    }

    Ok(node)
}
