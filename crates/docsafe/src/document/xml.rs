//! Namespace-aware event walk over WordprocessingML parts.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

const WORDPROCESSING_NS: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A WordprocessingML element or text event.
///
/// Elements from other namespaces are checked for well-formedness but never
/// surfaced.
pub(crate) enum Node<'e> {
    Start(&'e BytesStart<'e>),
    Empty(&'e BytesStart<'e>),
    End(&'e [u8]),
    Text(&'e str),
}

/// Walks `xml`, handing WordprocessingML nodes to `visit`.
///
/// Fails on the first syntax error, on unbalanced elements, and on input
/// without a root element.
pub(crate) fn walk<F>(xml: &[u8], mut visit: F) -> Result<(), String>
where
    F: FnMut(Node<'_>) -> Result<(), String>,
{
    let mut reader = NsReader::from_reader(xml);
    let mut buf = Vec::new();
    let mut depth = 0_usize;
    let mut saw_root = false;

    loop {
        buf.clear();
        let (namespace, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|error| error.to_string())?;
        let wordprocessing = is_wordprocessing(&namespace);
        match event {
            Event::Start(element) => {
                depth += 1;
                saw_root = true;
                if wordprocessing {
                    visit(Node::Start(&element))?;
                }
            }
            Event::Empty(element) => {
                saw_root = true;
                if wordprocessing {
                    visit(Node::Empty(&element))?;
                }
            }
            Event::End(element) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "closing tag without an opening tag".to_owned())?;
                if wordprocessing {
                    visit(Node::End(element.local_name().as_ref()))?;
                }
            }
            Event::Text(text) => {
                let decoded = text.unescape().map_err(|error| error.to_string())?;
                visit(Node::Text(&decoded))?;
            }
            Event::CData(data) => {
                visit(Node::Text(&String::from_utf8_lossy(&data)))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(format!("input ended with {depth} unclosed element(s)"));
    }
    if !saw_root {
        return Err("no root element".to_owned());
    }
    Ok(())
}

/// Checks that `xml` is well-formed.
pub(crate) fn check_well_formed(xml: &[u8]) -> Result<(), String> {
    walk(xml, |_| Ok(()))
}

/// Reads an attribute by local name, ignoring its prefix.
pub(crate) fn attribute(element: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, String> {
    for entry in element.attributes() {
        let attr = entry.map_err(|error| error.to_string())?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(|error| error.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn is_wordprocessing(namespace: &ResolveResult<'_>) -> bool {
    matches!(namespace, ResolveResult::Bound(Namespace(uri)) if *uri == WORDPROCESSING_NS)
}
