//! Streaming parser for snapshot documents.
//!
//! A snapshot is an attribute-only document: one `<tree>` root, zero or more
//! window tags, each holding exactly one element subtree. The parser makes a
//! single pass over the `quick-xml` event stream and keeps an explicit build
//! state instead of recursing, so arbitrarily deep hierarchies are fine.

use super::model::{Element, OsKind, Tree, Visibility, Window, WindowKind};
use crate::geometry::Rect;
use crate::result::{ParseCause, TreeParsingError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Parse one snapshot document.
///
/// Never returns a partially built tree: the first structural, attribute or
/// markup violation aborts the parse.
///
/// # Errors
///
/// Returns [`TreeParsingError`] positioned at the scanner offset where the
/// violation was detected.
pub fn parse_tree(xml: &str) -> Result<Tree, TreeParsingError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut builder = TreeBuilder::default();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let offset = offset_of(reader.error_position());
                return Err(
                    TreeParsingError::at_offset(xml.as_bytes(), offset, err.to_string())
                        .with_cause(err),
                );
            }
        };

        let step = match event {
            Event::Start(start) => Tag::read(&start).and_then(|tag| builder.open(&tag)),
            Event::Empty(start) => Tag::read(&start)
                .and_then(|tag| builder.open(&tag))
                .and_then(|()| builder.close()),
            Event::End(_) => builder.close(),
            Event::Text(text) => reject_text(&text),
            Event::CData(data) => Err(Violation::new(format!(
                "Unexpected CDATA: {}",
                String::from_utf8_lossy(&data)
            ))),
            Event::Eof => break,
            _ => Ok(()),
        };

        if let Err(violation) = step {
            return Err(violation.locate(xml, offset_of(reader.buffer_position())));
        }
    }

    builder
        .finish()
        .map_err(|violation| violation.locate(xml, xml.len()))
}

/// Parse a snapshot received as raw bytes, rejecting invalid UTF-8.
///
/// # Errors
///
/// Returns [`TreeParsingError`] positioned at the first invalid byte, or any
/// error [`parse_tree`] reports.
pub fn parse_tree_bytes(bytes: &[u8]) -> Result<Tree, TreeParsingError> {
    let xml = std::str::from_utf8(bytes).map_err(|err| {
        TreeParsingError::at_offset(bytes, err.valid_up_to(), format!("Invalid UTF-8: {err}"))
            .with_cause(err)
    })?;
    parse_tree(xml)
}

fn offset_of(position: u64) -> usize {
    usize::try_from(position).unwrap_or(usize::MAX)
}

/// XML whitespace only; other Unicode spaces count as character data
fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn reject_text(text: &[u8]) -> Check<()> {
    let text = String::from_utf8_lossy(text);
    let text = text.trim_matches(is_xml_whitespace);
    if text.is_empty() {
        Ok(())
    } else {
        Err(Violation::new(format!("Unexpected text: {text}")))
    }
}

// =============================================================================
// VIOLATIONS
// =============================================================================

/// A failure detected before the scanner position is known
#[derive(Debug)]
struct Violation {
    message: String,
    cause: Option<ParseCause>,
}

type Check<T> = Result<T, Violation>;

impl Violation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    fn markup(err: quick_xml::Error) -> Self {
        Self {
            message: err.to_string(),
            cause: Some(Box::new(err)),
        }
    }

    fn locate(self, xml: &str, offset: usize) -> TreeParsingError {
        let mut err = TreeParsingError::at_offset(xml.as_bytes(), offset, self.message);
        err.cause = self.cause;
        err
    }
}

// =============================================================================
// TAGS AND ATTRIBUTE DECODING
// =============================================================================

/// An opening tag with its decoded attributes
#[derive(Debug)]
struct Tag {
    name: String,
    attributes: HashMap<String, String>,
}

impl Tag {
    fn read(start: &BytesStart<'_>) -> Check<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = HashMap::new();
        for attribute in start.attributes() {
            let attribute =
                attribute.map_err(|err| Violation::markup(quick_xml::Error::from(err)))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(Violation::markup)?
                .into_owned();
            attributes.insert(key, value);
        }
        Ok(Self { name, attributes })
    }

    fn optional(&self, attribute: &str) -> Option<String> {
        self.attributes.get(attribute).cloned()
    }

    fn expected(&self, attribute: &str) -> Check<&str> {
        self.attributes.get(attribute).map(String::as_str).ok_or_else(|| {
            Violation::new(format!(
                "Expected {attribute} to be present on {}",
                self.name
            ))
        })
    }

    fn expected_int(&self, attribute: &str) -> Check<u32> {
        let raw = self.expected(attribute)?;
        raw.trim().parse().map_err(|_| {
            Violation::new(format!(
                "Expected {attribute} to be a non-negative integer, found '{raw}'"
            ))
        })
    }

    fn expected_bool(&self, attribute: &str) -> Check<bool> {
        let raw = self.expected(attribute)?;
        parse_bool(attribute, raw)
    }

    fn optional_bool(&self, attribute: &str) -> Check<Option<bool>> {
        self.attributes
            .get(attribute)
            .map(|raw| parse_bool(attribute, raw))
            .transpose()
    }

    fn bounds(&self) -> Check<Rect> {
        Ok(Rect::new(
            self.expected_int("x")?,
            self.expected_int("y")?,
            self.expected_int("width")?,
            self.expected_int("height")?,
        ))
    }
}

fn parse_bool(attribute: &str, raw: &str) -> Check<bool> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Violation::new(format!(
            "Expected {attribute} to be a boolean ('true' or 'false'), found '{raw}'"
        ))),
    }
}

fn parse_root(tag: &Tag) -> Check<Tree> {
    if tag.name != "tree" {
        return Err(Violation::new(format!(
            "Expected root node to be <tree>, found <{}>",
            tag.name
        )));
    }
    let raw_os = tag.expected("osType")?;
    let os = OsKind::from_attribute(raw_os).ok_or_else(|| {
        Violation::new(format!(
            "Expected osType to be 'ios' or 'android', found '{raw_os}'"
        ))
    })?;
    let session_id = tag.optional("sessionId").unwrap_or_default();
    Ok(Tree::new(session_id, os))
}

fn parse_window(tag: &Tag) -> Check<WindowHeader> {
    let package_name = tag.expected("packageName")?.to_string();
    let raw_kind = tag.expected("type")?;
    let kind = WindowKind::from_attribute(raw_kind).ok_or_else(|| {
        let known: Vec<_> = WindowKind::ALL.iter().map(|k| format!("'{k}'")).collect();
        Violation::new(format!(
            "Expected type to be one of {}, found '{raw_kind}'",
            known.join(", ")
        ))
    })?;
    Ok(WindowHeader {
        kind,
        package_name,
        bounds: tag.bounds()?,
    })
}

fn parse_element(tag: &Tag) -> Check<Element> {
    let visibility = match tag.attributes.get("visibility") {
        None => Visibility::Unknown,
        Some(raw) => Visibility::from_attribute(raw).ok_or_else(|| {
            Violation::new(format!(
                "Expected visibility to be one of 'visible', 'transparent', 'hidden' or 'unknown', found '{raw}'"
            ))
        })?,
    };

    Ok(Element {
        index: tag.expected_int("index")?,
        element_type: tag.expected("type")?.to_string(),
        id: tag.optional("id"),
        text: tag.optional("text"),
        placeholder: tag.optional("placeholder"),
        accessibility_id: tag.optional("accessibilityId"),
        checkable: tag.expected_bool("checkable")?,
        clickable: tag.expected_bool("clickable")?,
        focusable: tag.expected_bool("focusable")?,
        long_clickable: tag.expected_bool("long-clickable")?,
        scrollable: tag.expected_bool("scrollable")?,
        checked: tag.expected_bool("checked")?,
        focused: tag.expected_bool("focused")?,
        password: tag.expected_bool("password")?,
        visibility,
        bounds: tag.bounds()?,
        important: tag.optional_bool("important")?,
        children: Vec::new(),
    })
}

// =============================================================================
// BUILD STATE MACHINE
// =============================================================================

/// A window whose root element has not been completed yet
#[derive(Debug)]
struct WindowHeader {
    kind: WindowKind,
    package_name: String,
    bounds: Rect,
}

impl WindowHeader {
    fn into_window(self, root: Element) -> Window {
        Window {
            kind: self.kind,
            package_name: self.package_name,
            bounds: self.bounds,
            root,
        }
    }
}

/// Where the parser is in the document.
///
/// Each state corresponds to a nesting depth: `AwaitingRoot`/`Finished` are
/// depth 0, `AwaitingWindow` depth 1, `AwaitingWindowRoot` and
/// `AwaitingWindowEnd` depth 2, `InsideSubtree` depth 3 and more.
#[derive(Debug, Default)]
#[allow(clippy::large_enum_variant)]
enum BuildState {
    #[default]
    AwaitingRoot,
    AwaitingWindow(Tree),
    AwaitingWindowRoot(Tree, WindowHeader),
    /// Holds the open-element stack; never empty
    InsideSubtree(Tree, WindowHeader, Vec<Element>),
    AwaitingWindowEnd(Tree, Window),
    Finished(Tree),
}

#[derive(Debug, Default)]
struct TreeBuilder {
    state: BuildState,
}

impl TreeBuilder {
    fn open(&mut self, tag: &Tag) -> Check<()> {
        self.state = match std::mem::take(&mut self.state) {
            BuildState::AwaitingRoot => BuildState::AwaitingWindow(parse_root(tag)?),
            BuildState::Finished(_) => {
                return Err(Violation::new(format!(
                    "Unexpected second root node: <{}>",
                    tag.name
                )));
            }
            BuildState::AwaitingWindow(tree) => {
                BuildState::AwaitingWindowRoot(tree, parse_window(tag)?)
            }
            BuildState::AwaitingWindowRoot(tree, header) => {
                let root = parse_element(tag)?;
                BuildState::InsideSubtree(tree, header, vec![root])
            }
            BuildState::InsideSubtree(tree, header, mut stack) => {
                stack.push(parse_element(tag)?);
                BuildState::InsideSubtree(tree, header, stack)
            }
            BuildState::AwaitingWindowEnd(_, window) => {
                return Err(Violation::new(format!(
                    "Expected only one root element in window {}",
                    window.kind
                )));
            }
        };
        Ok(())
    }

    fn close(&mut self) -> Check<()> {
        self.state = match std::mem::take(&mut self.state) {
            BuildState::AwaitingWindow(tree) => BuildState::Finished(tree),
            BuildState::AwaitingWindowRoot(_, header) => {
                return Err(Violation::new(format!(
                    "Expected root element in window {}",
                    header.kind
                )));
            }
            BuildState::InsideSubtree(tree, header, mut stack) => {
                let completed = stack
                    .pop()
                    .ok_or_else(|| Violation::new("Expected element in stack"))?;
                match stack.last_mut() {
                    Some(parent) => {
                        parent.children.push(completed);
                        BuildState::InsideSubtree(tree, header, stack)
                    }
                    None => BuildState::AwaitingWindowEnd(tree, header.into_window(completed)),
                }
            }
            BuildState::AwaitingWindowEnd(mut tree, window) => {
                tree.windows.push(window);
                BuildState::AwaitingWindow(tree)
            }
            BuildState::AwaitingRoot | BuildState::Finished(_) => {
                return Err(Violation::new("Unexpected closing tag outside of <tree>"));
            }
        };
        Ok(())
    }

    fn finish(self) -> Check<Tree> {
        match self.state {
            BuildState::Finished(tree) => Ok(tree),
            BuildState::AwaitingRoot => Err(Violation::new("Expected root node <tree>")),
            _ => Err(Violation::new("Unexpected end of document: unclosed tags")),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
