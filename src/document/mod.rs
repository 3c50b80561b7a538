/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod error;
mod iterators;
mod parser;

use std::borrow::Cow;
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::entities::escape_into;
use crate::entities::escaped_size;
use crate::parser::Encoding;
use crate::parser::ErrorId;
use crate::parser::Location;
use crate::parser::ParseError;

pub use error::DocumentError;
use error::description;
pub use iterators::Attributes;
pub use iterators::Children;
pub use iterators::DescendantOrSelf;

const DEFAULT_TAB_SIZE: i32 = 4;

/// Stable handle of a node inside its [Document].
///
/// Handles stay valid for the lifetime of the document; removing a node
/// only unlinks it from the tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NodeId(pub(crate) usize);

/// The kind of a tree node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    Declaration,
    Unknown,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Document,
    Element {
        name: Vec<u8>,
        attributes: AttributeSet,
    },
    Text {
        value: Vec<u8>,
        cdata: bool,
    },
    Comment {
        value: Vec<u8>,
    },
    Declaration {
        version: Vec<u8>,
        encoding: Vec<u8>,
        standalone: Vec<u8>,
    },
    Unknown {
        value: Vec<u8>,
    },
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) previous: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) location: Location,
    pub(crate) kind: NodeKind,
}

impl NodeData {
    pub(crate) fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Document => NodeType::Document,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text { .. } => NodeType::Text,
            NodeKind::Comment { .. } => NodeType::Comment,
            NodeKind::Declaration { .. } => NodeType::Declaration,
            NodeKind::Unknown { .. } => NodeType::Unknown,
        }
    }
}

/// A single name/value attribute of an element.
#[derive(Debug)]
pub struct Attribute {
    pub(crate) name: Vec<u8>,
    pub(crate) value: Vec<u8>,
    pub(crate) location: Location,
}

impl Attribute {
    pub(crate) fn new() -> Attribute {
        Attribute {
            name: Vec::new(),
            value: Vec::new(),
            location: Location::cleared(),
        }
    }

    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn value(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }

    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    pub fn value_bytes(&self) -> &[u8] {
        &self.value
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

/// The attributes of one element, in insertion order, with unique
/// names.
#[derive(Debug)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub(crate) fn new() -> AttributeSet {
        AttributeSet {
            attributes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn find(&self, name: &[u8]) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.iter()
    }

    pub(crate) fn add(&mut self, attribute: Attribute) -> Result<(), DocumentError> {
        if self.find(&attribute.name).is_some() {
            return Err(DocumentError::BadXml(description::DUPLICATE_ATTRIBUTE));
        }
        self.attributes.push(attribute);
        Ok(())
    }

    pub(crate) fn set(&mut self, name: &[u8], value: &[u8]) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attribute) => attribute.value = value.to_vec(),
            None => {
                let mut attribute = Attribute::new();
                attribute.name = name.to_vec();
                attribute.value = value.to_vec();
                self.attributes.push(attribute);
            }
        }
    }

    pub(crate) fn remove(&mut self, name: &[u8]) {
        self.attributes.retain(|a| a.name != name);
    }
}

/// An XML document: the root of the node tree, the parse knobs, and the
/// latched error state.
///
/// The document owns every node in an index arena; nodes are reached
/// through [NodeId] handles and the read-only [Cursor]. Parsing never
/// fails with a panic or an early return: structural problems latch the
/// first [ParseError] on the document and leave the partial tree in
/// place for diagnostics.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    error: Option<ParseError>,
    tab_size: i32,
    condense_white_space: bool,
    bom: bool,
    encoding: Encoding,
}

impl Document {
    pub(crate) const ROOT: NodeId = NodeId(0);

    pub fn new() -> Document {
        Document {
            nodes: vec![NodeData {
                parent: None,
                first_child: None,
                last_child: None,
                previous: None,
                next: None,
                location: Location::cleared(),
                kind: NodeKind::Document,
            }],
            error: None,
            tab_size: DEFAULT_TAB_SIZE,
            condense_white_space: true,
            bom: false,
            encoding: Encoding::Unknown,
        }
    }

    //
    // Parse knobs
    //

    pub fn tab_size(&self) -> i32 {
        self.tab_size
    }

    /// Sets the column width of a tab stop for position reporting.
    /// A size of zero disables row/column tracking entirely.
    pub fn set_tab_size(&mut self, tab_size: i32) {
        self.tab_size = tab_size;
    }

    pub fn condense_white_space(&self) -> bool {
        self.condense_white_space
    }

    /// Controls whether runs of whitespace in text content collapse to
    /// a single space while parsing. Defaults to true.
    pub fn set_condense_white_space(&mut self, condense: bool) {
        self.condense_white_space = condense;
    }

    /// True when the parsed input started with a UTF-8 byte-order mark.
    pub fn bom(&self) -> bool {
        self.bom
    }

    /// The encoding detected by the last parse.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub(crate) fn set_bom(&mut self) {
        self.bom = true;
    }

    pub(crate) fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    //
    // Error latch
    //

    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub(crate) fn set_error(&mut self, id: ErrorId, location: Location) {
        // The first error in a chain is the accurate one.
        if self.error.is_none() {
            self.error = Some(ParseError::new(id, location));
        }
    }

    //
    // Parsing
    //

    /// Parses `bytes` and appends the parsed nodes as children of the
    /// document root. Detects the encoding from the input. Problems are
    /// latched and visible through [error()](Document::error).
    pub fn parse_bytes(&mut self, bytes: &[u8]) {
        self.parse_bytes_with_encoding(bytes, Encoding::Unknown);
    }

    /// Like [parse_bytes()](Document::parse_bytes) with an explicit
    /// encoding instead of detection.
    pub fn parse_bytes_with_encoding(&mut self, bytes: &[u8], encoding: Encoding) {
        parser::Parser::new(self, bytes, encoding).parse_document();
    }

    /// Reads and parses a whole file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Document, ParseError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => {
                return Err(ParseError::new(ErrorId::OpeningFile, Location::cleared()));
            }
        };
        if memchr::memchr(0, &bytes).is_some() {
            return Err(ParseError::new(ErrorId::EmbeddedNull, Location::cleared()));
        }
        let mut doc = Document::new();
        doc.parse_bytes(&bytes);
        match doc.error {
            Some(error) => Err(error),
            None => Ok(doc),
        }
    }

    //
    // Navigation
    //

    /// The handle of the document root node, the anchor for edits.
    pub fn root_id(&self) -> NodeId {
        Self::ROOT
    }

    /// A cursor on the document root node.
    pub fn root(&self) -> Cursor<'_> {
        Cursor::new(self, Some(Self::ROOT))
    }

    /// A cursor on the first top level element, usually the single root
    /// element of the document.
    pub fn root_element(&self) -> Cursor<'_> {
        self.root().first_element()
    }

    pub fn cursor(&self, node: NodeId) -> Cursor<'_> {
        Cursor::new(self, Some(node))
    }

    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    //
    // Node construction and linking
    //

    pub(crate) fn new_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent,
            first_child: None,
            last_child: None,
            previous: None,
            next: None,
            location: Location::cleared(),
            kind,
        });
        id
    }

    pub(crate) fn link_end_child(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        if matches!(self.node(child).kind, NodeKind::Document) {
            self.set_error(ErrorId::DocumentTopOnly, Location::cleared());
            return None;
        }
        self.node_mut(child).parent = Some(parent);
        match self.node(parent).last_child {
            Some(last) => {
                self.node_mut(last).next = Some(child);
                self.node_mut(child).previous = Some(last);
            }
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
        Some(child)
    }

    //
    // Edit methods
    //

    fn check_container(&self, parent: NodeId) -> Result<(), DocumentError> {
        match self.node(parent).kind {
            NodeKind::Document | NodeKind::Element { .. } => Ok(()),
            _ => Err(DocumentError::BadXml(description::LEAF_CHILDREN)),
        }
    }

    fn insert(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, DocumentError> {
        self.check_container(parent)?;
        let node = self.new_node(kind, Some(parent));
        self.link_end_child(parent, node);
        Ok(node)
    }

    pub fn insert_element(&mut self, parent: NodeId, name: &str) -> Result<NodeId, DocumentError> {
        self.insert(
            parent,
            NodeKind::Element {
                name: name.as_bytes().to_vec(),
                attributes: AttributeSet::new(),
            },
        )
    }

    pub fn insert_text(&mut self, parent: NodeId, value: &str) -> Result<NodeId, DocumentError> {
        self.insert(
            parent,
            NodeKind::Text {
                value: value.as_bytes().to_vec(),
                cdata: false,
            },
        )
    }

    pub fn insert_cdata(&mut self, parent: NodeId, value: &str) -> Result<NodeId, DocumentError> {
        self.insert(
            parent,
            NodeKind::Text {
                value: value.as_bytes().to_vec(),
                cdata: true,
            },
        )
    }

    pub fn insert_comment(&mut self, parent: NodeId, value: &str) -> Result<NodeId, DocumentError> {
        self.insert(
            parent,
            NodeKind::Comment {
                value: value.as_bytes().to_vec(),
            },
        )
    }

    pub fn insert_unknown(&mut self, parent: NodeId, value: &str) -> Result<NodeId, DocumentError> {
        self.insert(
            parent,
            NodeKind::Unknown {
                value: value.as_bytes().to_vec(),
            },
        )
    }

    pub fn insert_declaration(
        &mut self,
        parent: NodeId,
        version: &str,
        encoding: &str,
        standalone: &str,
    ) -> Result<NodeId, DocumentError> {
        self.insert(
            parent,
            NodeKind::Declaration {
                version: version.as_bytes().to_vec(),
                encoding: encoding.as_bytes().to_vec(),
                standalone: standalone.as_bytes().to_vec(),
            },
        )
    }

    /// Adds an attribute to an element; a duplicate name is an error.
    pub fn insert_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DocumentError> {
        match &mut self.node_mut(element).kind {
            NodeKind::Element { attributes, .. } => {
                let mut attribute = Attribute::new();
                attribute.name = name.as_bytes().to_vec();
                attribute.value = value.as_bytes().to_vec();
                attributes.add(attribute)
            }
            _ => Err(DocumentError::BadXml(description::NOT_AN_ELEMENT)),
        }
    }

    /// Sets an attribute on an element, replacing the value of an
    /// existing name.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DocumentError> {
        match &mut self.node_mut(element).kind {
            NodeKind::Element { attributes, .. } => {
                attributes.set(name.as_bytes(), value.as_bytes());
                Ok(())
            }
            _ => Err(DocumentError::BadXml(description::NOT_AN_ELEMENT)),
        }
    }

    /// Removes an attribute; a missing name is not an error.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> Result<(), DocumentError> {
        match &mut self.node_mut(element).kind {
            NodeKind::Element { attributes, .. } => {
                attributes.remove(name.as_bytes());
                Ok(())
            }
            _ => Err(DocumentError::BadXml(description::NOT_AN_ELEMENT)),
        }
    }

    /// Unlinks a node and its subtree from the document. The root
    /// cannot be removed. The arena slots are reclaimed when the whole
    /// document is dropped.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else {
            return;
        };
        let previous = self.node(node).previous;
        let next = self.node(node).next;
        if let Some(next) = next {
            self.node_mut(next).previous = previous;
        }
        if let Some(previous) = previous {
            self.node_mut(previous).next = next;
        }
        let parent_data = self.node_mut(parent);
        if parent_data.first_child == Some(node) {
            parent_data.first_child = next;
        }
        if parent_data.last_child == Some(node) {
            parent_data.last_child = previous;
        }
        let data = self.node_mut(node);
        data.parent = None;
        data.previous = None;
        data.next = None;
    }

    //
    // Serialization
    //

    pub fn str_size(&self) -> usize {
        self.root().str_size()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.root().to_bytes()
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.root(), f)
    }
}

impl FromStr for Document {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut doc = Document::new();
        doc.parse_bytes(s.as_bytes());
        match doc.error {
            Some(error) => Err(error),
            None => Ok(doc),
        }
    }
}

/// A read-only handle on one node of a [Document].
///
/// Cursors follow the null object convention: navigating off the tree
/// yields a null cursor, and every method on a null cursor returns an
/// empty or null result instead of panicking, so navigation chains do
/// not need intermediate checks.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    doc: &'a Document,
    node: Option<NodeId>,
}

impl<'a> Cursor<'a> {
    fn new(doc: &'a Document, node: Option<NodeId>) -> Cursor<'a> {
        Cursor { doc, node }
    }

    fn data(&self) -> Option<&'a NodeData> {
        let doc = self.doc;
        self.node.map(|id| doc.node(id))
    }

    /// The handle of this node, usable with the [Document] edit
    /// methods. None for a null cursor.
    pub fn id(&self) -> Option<NodeId> {
        self.node
    }

    pub fn is_null(&self) -> bool {
        self.node.is_none()
    }

    //
    // Navigation methods
    //

    pub fn next(self) -> Cursor<'a> {
        match self.data() {
            Some(data) => Cursor::new(self.doc, data.next),
            None => self,
        }
    }

    pub fn previous(self) -> Cursor<'a> {
        match self.data() {
            Some(data) => Cursor::new(self.doc, data.previous),
            None => self,
        }
    }

    pub fn parent(self) -> Cursor<'a> {
        match self.data() {
            Some(data) => Cursor::new(self.doc, data.parent),
            None => self,
        }
    }

    pub fn first_child(self) -> Cursor<'a> {
        match self.data() {
            Some(data) => Cursor::new(self.doc, data.first_child),
            None => self,
        }
    }

    pub fn last_child(self) -> Cursor<'a> {
        match self.data() {
            Some(data) => Cursor::new(self.doc, data.last_child),
            None => self,
        }
    }

    pub fn next_element(self) -> Cursor<'a> {
        let mut next = self.next();
        while !next.is_null() && !next.is_element() {
            next = next.next();
        }
        next
    }

    pub fn previous_element(self) -> Cursor<'a> {
        let mut previous = self.previous();
        while !previous.is_null() && !previous.is_element() {
            previous = previous.previous();
        }
        previous
    }

    pub fn first_element(self) -> Cursor<'a> {
        let child = self.first_child();
        if child.is_null() || child.is_element() {
            child
        } else {
            child.next_element()
        }
    }

    /// Finds the first child element with the given name.
    pub fn find_element(self, name: &str) -> Cursor<'a> {
        let mut child = self.first_child();
        while !child.is_null() {
            if child.is_element() && child.name_bytes() == name.as_bytes() {
                break;
            }
            child = child.next();
        }
        child
    }

    /// Walks up to the top of the tree.
    pub fn root(self) -> Cursor<'a> {
        if self.is_null() {
            return self;
        }
        let mut current = self;
        loop {
            let parent = current.parent();
            if parent.is_null() {
                return current;
            }
            current = parent;
        }
    }

    //
    // Iterator methods
    //

    pub fn children(self) -> Children<'a> {
        Children::new(self.first_child())
    }

    pub fn attributes(self) -> Attributes<'a> {
        Attributes::new(self)
    }

    pub fn descendant_or_self(self) -> DescendantOrSelf<'a> {
        DescendantOrSelf::new(self)
    }

    //
    // Node property methods
    //

    pub fn node_type(&self) -> Option<NodeType> {
        self.data().map(NodeData::node_type)
    }

    pub fn is_element(&self) -> bool {
        self.node_type() == Some(NodeType::Element)
    }

    pub fn is_text(&self) -> bool {
        self.node_type() == Some(NodeType::Text)
    }

    /// True for a text node that came from a CDATA section.
    pub fn is_cdata(&self) -> bool {
        matches!(
            self.data(),
            Some(NodeData {
                kind: NodeKind::Text { cdata: true, .. },
                ..
            })
        )
    }

    /// The element name, or an empty string for other node kinds.
    pub fn name(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    pub fn name_bytes(&self) -> &'a [u8] {
        match self.data() {
            Some(NodeData {
                kind: NodeKind::Element { name, .. },
                ..
            }) => name.as_slice(),
            _ => b"",
        }
    }

    /// The text content of a text node, or an empty string for other
    /// node kinds.
    pub fn text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.text_bytes())
    }

    pub fn text_bytes(&self) -> &'a [u8] {
        match self.data() {
            Some(NodeData {
                kind: NodeKind::Text { value, .. },
                ..
            }) => value.as_slice(),
            _ => b"",
        }
    }

    /// The kind dependent value of this node: the tag name of an
    /// element, the body of a text, comment, or unknown node, and empty
    /// for documents and declarations.
    pub fn value(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.value_bytes())
    }

    pub fn value_bytes(&self) -> &'a [u8] {
        match self.data() {
            Some(data) => match &data.kind {
                NodeKind::Element { name, .. } => name.as_slice(),
                NodeKind::Text { value, .. }
                | NodeKind::Comment { value }
                | NodeKind::Unknown { value } => value.as_slice(),
                NodeKind::Declaration { .. } | NodeKind::Document => b"",
            },
            None => b"",
        }
    }

    /// The version field of a declaration node.
    pub fn version(&self) -> Cow<'a, str> {
        match self.data() {
            Some(NodeData {
                kind: NodeKind::Declaration { version, .. },
                ..
            }) => String::from_utf8_lossy(version),
            _ => Cow::Borrowed(""),
        }
    }

    /// The encoding field of a declaration node.
    pub fn encoding(&self) -> Cow<'a, str> {
        match self.data() {
            Some(NodeData {
                kind: NodeKind::Declaration { encoding, .. },
                ..
            }) => String::from_utf8_lossy(encoding),
            _ => Cow::Borrowed(""),
        }
    }

    /// The standalone field of a declaration node.
    pub fn standalone(&self) -> Cow<'a, str> {
        match self.data() {
            Some(NodeData {
                kind: NodeKind::Declaration { standalone, .. },
                ..
            }) => String::from_utf8_lossy(standalone),
            _ => Cow::Borrowed(""),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<Cow<'a, str>> {
        self.attribute_bytes(name).map(String::from_utf8_lossy)
    }

    pub fn attribute_bytes(&self, name: &str) -> Option<&'a [u8]> {
        match self.data() {
            Some(NodeData {
                kind: NodeKind::Element { attributes, .. },
                ..
            }) => attributes.find(name.as_bytes()).map(|a| a.value.as_slice()),
            _ => None,
        }
    }

    pub(crate) fn attribute_set(&self) -> Option<&'a AttributeSet> {
        match self.data() {
            Some(NodeData {
                kind: NodeKind::Element { attributes, .. },
                ..
            }) => Some(attributes),
            _ => None,
        }
    }

    /// The input position recorded when this node was parsed.
    pub fn location(&self) -> Location {
        match self.data() {
            Some(data) => data.location,
            None => Location::cleared(),
        }
    }

    /// 1-based input row of this node, or 0 when unknown.
    pub fn row(&self) -> i32 {
        self.location().row()
    }

    /// 1-based input column of this node, or 0 when unknown.
    pub fn column(&self) -> i32 {
        self.location().column()
    }

    //
    // Serialization
    //

    /// Exact byte size of [to_bytes()](Cursor::to_bytes).
    pub fn str_size(&self) -> usize {
        let Some(node) = self.node else {
            return 0;
        };
        node_str_size(self.doc, node)
    }

    /// Serializes the subtree under this cursor, reserving the exact
    /// capacity up front.
    pub fn to_bytes(&self) -> Vec<u8> {
        let Some(node) = self.node else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.str_size());
        write_node(self.doc, node, &mut out);
        out
    }
}

impl Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cursor({:?})", self.node)
    }
}

impl std::fmt::Display for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            return Ok(());
        }
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

enum VisitorStep {
    Start(NodeId),
    End(NodeId),
}

// Iterative depth first walk over a subtree, yielding a Start step on
// the way down and an End step when leaving a node with children.
struct Visitor<'a> {
    doc: &'a Document,
    current: Option<NodeId>,
    going_down: bool,
    level: usize,
}

impl<'a> Visitor<'a> {
    fn new(doc: &'a Document, start: NodeId) -> Visitor<'a> {
        Visitor {
            doc,
            current: Some(start),
            going_down: true,
            level: 0,
        }
    }

    fn step(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        if self.going_down
            && let Some(child) = self.doc.node(current).first_child
        {
            self.current = Some(child);
            self.level += 1;
            return;
        }
        if self.level == 0 {
            self.current = None;
            return;
        }
        match self.doc.node(current).next {
            None => {
                self.level -= 1;
                self.current = self.doc.node(current).parent;
                self.going_down = false;
            }
            Some(next) => {
                self.current = Some(next);
                self.going_down = true;
            }
        }
    }

    fn next(&mut self) -> Option<VisitorStep> {
        let current = self.current?;
        let going_down = self.going_down;
        self.step();
        if going_down {
            Some(VisitorStep::Start(current))
        } else {
            Some(VisitorStep::End(current))
        }
    }
}

fn write_node(doc: &Document, start: NodeId, out: &mut Vec<u8>) {
    let mut visitor = Visitor::new(doc, start);
    while let Some(step) = visitor.next() {
        match step {
            VisitorStep::Start(id) => {
                let node = doc.node(id);
                match &node.kind {
                    NodeKind::Document => (),
                    NodeKind::Element { name, attributes } => {
                        out.push(b'<');
                        out.extend_from_slice(name);
                        for attribute in attributes.iter() {
                            out.push(b' ');
                            out.extend_from_slice(&attribute.name);
                            out.extend_from_slice(b"=\"");
                            escape_into(&attribute.value, out);
                            out.push(b'"');
                        }
                        if node.first_child.is_none() {
                            out.extend_from_slice(b"/>");
                        } else {
                            out.push(b'>');
                        }
                    }
                    NodeKind::Text { value, cdata } => {
                        if *cdata {
                            out.extend_from_slice(b"<![CDATA[");
                            out.extend_from_slice(value);
                            out.extend_from_slice(b"]]>");
                        } else {
                            escape_into(value, out);
                        }
                    }
                    NodeKind::Comment { value } => {
                        out.extend_from_slice(b"<!--");
                        out.extend_from_slice(value);
                        out.extend_from_slice(b"-->");
                    }
                    NodeKind::Declaration {
                        version,
                        encoding,
                        standalone,
                    } => {
                        out.extend_from_slice(b"<?xml");
                        if !version.is_empty() {
                            out.extend_from_slice(b" version=\"");
                            out.extend_from_slice(version);
                            out.push(b'"');
                        }
                        if !encoding.is_empty() {
                            out.extend_from_slice(b" encoding=\"");
                            out.extend_from_slice(encoding);
                            out.push(b'"');
                        }
                        if !standalone.is_empty() {
                            out.extend_from_slice(b" standalone=\"");
                            out.extend_from_slice(standalone);
                            out.push(b'"');
                        }
                        out.extend_from_slice(b"?>");
                    }
                    NodeKind::Unknown { value } => {
                        out.push(b'<');
                        out.extend_from_slice(value);
                        out.push(b'>');
                    }
                }
            }
            VisitorStep::End(id) => {
                let node = doc.node(id);
                if let NodeKind::Element { name, .. } = &node.kind {
                    out.extend_from_slice(b"</");
                    out.extend_from_slice(name);
                    out.push(b'>');
                }
            }
        }
    }
}

// Mirrors write_node byte for byte so that output buffers can be
// reserved with the exact capacity.
fn node_str_size(doc: &Document, start: NodeId) -> usize {
    let mut size = 0;
    let mut visitor = Visitor::new(doc, start);
    while let Some(step) = visitor.next() {
        match step {
            VisitorStep::Start(id) => {
                let node = doc.node(id);
                match &node.kind {
                    NodeKind::Document => (),
                    NodeKind::Element { name, attributes } => {
                        size += 1 + name.len();
                        for attribute in attributes.iter() {
                            size += 1 + attribute.name.len() + 2;
                            size += escaped_size(&attribute.value);
                            size += 1;
                        }
                        size += if node.first_child.is_none() { 2 } else { 1 };
                    }
                    NodeKind::Text { value, cdata } => {
                        if *cdata {
                            size += 9 + value.len() + 3;
                        } else {
                            size += escaped_size(value);
                        }
                    }
                    NodeKind::Comment { value } => {
                        size += 4 + value.len() + 3;
                    }
                    NodeKind::Declaration {
                        version,
                        encoding,
                        standalone,
                    } => {
                        size += 5;
                        if !version.is_empty() {
                            size += 10 + version.len() + 1;
                        }
                        if !encoding.is_empty() {
                            size += 11 + encoding.len() + 1;
                        }
                        if !standalone.is_empty() {
                            size += 13 + standalone.len() + 1;
                        }
                        size += 2;
                    }
                    NodeKind::Unknown { value } => {
                        size += 1 + value.len() + 1;
                    }
                }
            }
            VisitorStep::End(id) => {
                if let NodeKind::Element { name, .. } = &doc.node(id).kind {
                    size += 2 + name.len() + 1;
                }
            }
        }
    }
    size
}
