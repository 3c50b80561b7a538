/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use memchr::memchr;
use memchr::memmem;

use crate::parser::Encoding;
use crate::parser::ErrorId;
use crate::parser::Location;
use crate::parser::ParsingData;
use crate::parser::is_alpha;
use crate::parser::is_white_space;
use crate::parser::read_name;
use crate::parser::read_text;
use crate::parser::skip_white_space;
use crate::parser::string_equal;

use super::Attribute;
use super::AttributeSet;
use super::Document;
use super::NodeId;
use super::NodeKind;
use super::NodeType;

const XML_HEADER: &[u8] = b"<?xml";
const COMMENT_HEADER: &[u8] = b"<!--";
const COMMENT_FOOTER: &[u8] = b"-->";
const DTD_HEADER: &[u8] = b"<!";
const CDATA_HEADER: &[u8] = b"<![CDATA[";
const CDATA_FOOTER: &[u8] = b"]]>";
const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Recursive-descent parser building nodes into a [Document].
///
/// Every parse routine takes a byte offset and returns the offset it
/// stopped at. Structural problems latch an error on the document and
/// unwind by returning the end of the region; the routines themselves
/// never fail.
pub(super) struct Parser<'a> {
    doc: &'a mut Document,
    buf: &'a [u8],
    data: ParsingData,
    encoding: Encoding,
    condense: bool,
}

impl<'a> Parser<'a> {
    pub(super) fn new(doc: &'a mut Document, buf: &'a [u8], encoding: Encoding) -> Parser<'a> {
        let data = ParsingData::new(doc.tab_size());
        let condense = doc.condense_white_space();
        Parser {
            doc,
            buf,
            data,
            encoding,
            condense,
        }
    }

    fn set_error(&mut self, id: ErrorId, pos: Option<usize>) {
        let location = match pos {
            Some(pos) => {
                self.data.stamp(self.buf, pos, self.encoding);
                self.data.cursor()
            }
            None => Location::cleared(),
        };
        self.doc.set_error(id, location);
    }

    fn stamp_node(&mut self, node: NodeId, pos: usize) {
        self.data.stamp(self.buf, pos, self.encoding);
        self.doc.node_mut(node).location = self.data.cursor();
    }

    fn set_value(&mut self, node: NodeId, value: Vec<u8>) {
        match &mut self.doc.node_mut(node).kind {
            NodeKind::Element { name, .. } => *name = value,
            NodeKind::Text { value: v, .. }
            | NodeKind::Comment { value: v }
            | NodeKind::Unknown { value: v } => *v = value,
            NodeKind::Declaration { .. } | NodeKind::Document => (),
        }
    }

    /// Top level parse loop: skip whitespace, identify a child, let it
    /// parse itself, link it, repeat until the input runs out.
    pub(super) fn parse_document(&mut self) {
        self.doc.clear_error();
        let mut pos = 0;

        if self.buf.is_empty() {
            self.set_error(ErrorId::DocumentEmpty, None);
            return;
        }

        self.doc.node_mut(Document::ROOT).location = self.data.cursor();

        if self.encoding == Encoding::Unknown && self.buf.starts_with(&UTF8_BOM) {
            self.encoding = Encoding::Utf8;
            self.doc.set_bom();
            pos = UTF8_BOM.len();
        }

        pos = skip_white_space(self.buf, pos);
        if pos >= self.buf.len() {
            self.set_error(ErrorId::DocumentEmpty, None);
            self.doc.set_encoding(self.encoding);
            return;
        }

        while pos < self.buf.len() {
            let Some(node) = self.identify(Document::ROOT, pos) else {
                break;
            };
            pos = self.parse_node(node, pos);
            self.doc.link_end_child(Document::ROOT, node);

            // The first declaration decides the encoding when no hint
            // or byte-order mark did.
            if self.encoding == Encoding::Unknown {
                if let NodeKind::Declaration { encoding, .. } = &self.doc.node(node).kind {
                    let declared = !encoding.is_empty();
                    self.encoding = if declared
                        || string_equal(self.buf, pos, b"UTF-8", true)
                        || string_equal(self.buf, pos, b"UTF8", true)
                    {
                        Encoding::Utf8
                    } else {
                        Encoding::Legacy
                    };
                }
            }

            pos = skip_white_space(self.buf, pos);
        }

        if self.doc.node(Document::ROOT).first_child.is_none() {
            self.set_error(ErrorId::DocumentEmpty, None);
        }

        self.doc.set_encoding(self.encoding);
    }

    /// Looks at the bytes following a `<` and constructs the matching
    /// empty node, parented but not yet linked. Never consumes input.
    fn identify(&mut self, parent: NodeId, pos: usize) -> Option<NodeId> {
        let pos = skip_white_space(self.buf, pos);
        if pos >= self.buf.len() || self.buf[pos] != b'<' {
            return None;
        }
        let kind = if string_equal(self.buf, pos, XML_HEADER, true) {
            NodeKind::Declaration {
                version: Vec::new(),
                encoding: Vec::new(),
                standalone: Vec::new(),
            }
        } else if string_equal(self.buf, pos, COMMENT_HEADER, false) {
            NodeKind::Comment { value: Vec::new() }
        } else if string_equal(self.buf, pos, CDATA_HEADER, false) {
            NodeKind::Text {
                value: Vec::new(),
                cdata: true,
            }
        } else if string_equal(self.buf, pos, DTD_HEADER, false) {
            NodeKind::Unknown { value: Vec::new() }
        } else if pos + 1 < self.buf.len()
            && (is_alpha(self.buf[pos + 1]) || self.buf[pos + 1] == b'_')
        {
            NodeKind::Element {
                name: Vec::new(),
                attributes: AttributeSet::new(),
            }
        } else {
            NodeKind::Unknown { value: Vec::new() }
        };
        Some(self.doc.new_node(kind, Some(parent)))
    }

    fn parse_node(&mut self, node: NodeId, pos: usize) -> usize {
        match self.doc.node(node).node_type() {
            NodeType::Element => self.parse_element(node, pos),
            NodeType::Comment => self.parse_comment(node, pos),
            NodeType::Text => {
                if matches!(
                    self.doc.node(node).kind,
                    NodeKind::Text { cdata: true, .. }
                ) {
                    self.parse_cdata(node, pos)
                } else {
                    self.parse_text(node, pos)
                }
            }
            NodeType::Declaration => self.parse_declaration(node, pos),
            NodeType::Unknown => self.parse_unknown(node, pos),
            NodeType::Document => pos,
        }
    }

    fn parse_comment(&mut self, node: NodeId, pos: usize) -> usize {
        let mut pos = skip_white_space(self.buf, pos);
        self.stamp_node(node, pos);

        if !string_equal(self.buf, pos, COMMENT_HEADER, false) {
            self.set_error(ErrorId::ParsingComment, Some(pos));
            return self.buf.len();
        }
        pos += COMMENT_HEADER.len();

        // The body is assigned verbatim up to the earliest "-->".
        match memmem::find(&self.buf[pos..], COMMENT_FOOTER) {
            Some(rel) => {
                self.set_value(node, self.buf[pos..pos + rel].to_vec());
                pos + rel + COMMENT_FOOTER.len()
            }
            None => {
                self.set_value(node, self.buf[pos..].to_vec());
                self.buf.len()
            }
        }
    }

    fn parse_cdata(&mut self, node: NodeId, pos: usize) -> usize {
        let mut pos = pos;
        self.stamp_node(node, pos);

        if !string_equal(self.buf, pos, CDATA_HEADER, false) {
            self.set_error(ErrorId::ParsingCdata, Some(pos));
            return self.buf.len();
        }
        pos += CDATA_HEADER.len();

        // No entity decoding and no whitespace handling in here.
        match memmem::find(&self.buf[pos..], CDATA_FOOTER) {
            Some(rel) => {
                self.set_value(node, self.buf[pos..pos + rel].to_vec());
                pos + rel + CDATA_FOOTER.len()
            }
            None => {
                self.set_value(node, self.buf[pos..].to_vec());
                self.buf.len()
            }
        }
    }

    fn parse_text(&mut self, node: NodeId, pos: usize) -> usize {
        self.stamp_node(node, pos);

        let mut value = Vec::new();
        let end = read_text(
            self.buf,
            pos,
            &mut value,
            true,
            b"<",
            false,
            self.condense,
            self.encoding,
        );
        self.set_value(node, value);

        if end < self.buf.len() {
            // Leave the '<' for the caller to examine.
            end - 1
        } else {
            end
        }
    }

    fn parse_unknown(&mut self, node: NodeId, pos: usize) -> usize {
        let mut pos = skip_white_space(self.buf, pos);
        self.stamp_node(node, pos);

        if pos >= self.buf.len() || self.buf[pos] != b'<' {
            self.set_error(ErrorId::ParsingUnknown, Some(pos));
            return self.buf.len();
        }
        pos += 1;

        match memchr(b'>', &self.buf[pos..]) {
            Some(rel) => {
                self.set_value(node, self.buf[pos..pos + rel].to_vec());
                pos + rel + 1
            }
            None => {
                self.set_value(node, self.buf[pos..].to_vec());
                self.set_error(ErrorId::ParsingUnknown, None);
                self.buf.len()
            }
        }
    }

    fn parse_declaration(&mut self, node: NodeId, pos: usize) -> usize {
        let mut pos = skip_white_space(self.buf, pos);

        if !string_equal(self.buf, pos, XML_HEADER, true) {
            self.set_error(ErrorId::ParsingDeclaration, None);
            return self.buf.len();
        }
        self.stamp_node(node, pos);
        pos += XML_HEADER.len();

        let mut version = Vec::new();
        let mut encoding = Vec::new();
        let mut standalone = Vec::new();

        while pos < self.buf.len() {
            if self.buf[pos] == b'>' {
                pos += 1;
                break;
            }
            if string_equal(self.buf, pos, b"?>", false) {
                pos += 2;
                break;
            }
            if string_equal(self.buf, pos, b"version", true) {
                let mut attribute = Attribute::new();
                pos = self.parse_attribute_into(&mut attribute, pos, false);
                version = attribute.value;
            } else if string_equal(self.buf, pos, b"encoding", true) {
                let mut attribute = Attribute::new();
                pos = self.parse_attribute_into(&mut attribute, pos, false);
                encoding = attribute.value;
            } else if string_equal(self.buf, pos, b"standalone", true) {
                let mut attribute = Attribute::new();
                pos = self.parse_attribute_into(&mut attribute, pos, false);
                standalone = attribute.value;
            } else {
                // Read over whatever it is.
                while pos < self.buf.len()
                    && !is_white_space(self.buf[pos])
                    && self.buf[pos] != b'>'
                {
                    pos += 1;
                }
            }
            pos = skip_white_space(self.buf, pos);
        }

        if let NodeKind::Declaration {
            version: v,
            encoding: e,
            standalone: s,
        } = &mut self.doc.node_mut(node).kind
        {
            *v = version;
            *e = encoding;
            *s = standalone;
        }
        pos
    }

    fn parse_element(&mut self, node: NodeId, pos: usize) -> usize {
        let mut pos = skip_white_space(self.buf, pos);

        if pos >= self.buf.len() {
            self.set_error(ErrorId::ParsingElement, None);
            return self.buf.len();
        }

        self.stamp_node(node, pos);

        if self.buf[pos] != b'<' {
            self.set_error(ErrorId::ParsingElement, Some(pos));
            return self.buf.len();
        }

        pos = skip_white_space(self.buf, pos + 1);

        let name_start = pos;
        match read_name(self.buf, pos) {
            Some((name, next)) => {
                self.set_value(node, name);
                pos = next;
            }
            None => pos = self.buf.len(),
        }
        if pos >= self.buf.len() {
            self.set_error(ErrorId::FailedToReadElementName, Some(name_start));
            return self.buf.len();
        }

        let name = self.doc.node(node).kind.element_name().to_vec();
        let mut end_tag = Vec::with_capacity(name.len() + 2);
        end_tag.extend_from_slice(b"</");
        end_tag.extend_from_slice(&name);

        // Read attributes, watching for an empty element or the end of
        // the start tag.
        while pos < self.buf.len() {
            let err_pos = pos;
            pos = skip_white_space(self.buf, pos);
            if pos >= self.buf.len() {
                self.set_error(ErrorId::ReadingAttributes, Some(err_pos));
                return self.buf.len();
            }
            if self.buf[pos] == b'/' {
                pos += 1;
                if pos >= self.buf.len() || self.buf[pos] != b'>' {
                    self.set_error(ErrorId::ParsingEmpty, Some(pos));
                    return self.buf.len();
                }
                return pos + 1;
            }
            if self.buf[pos] == b'>' {
                pos += 1;
                pos = self.read_value(node, pos);
                if pos >= self.buf.len() {
                    self.set_error(ErrorId::ReadingEndTag, Some(pos));
                    return self.buf.len();
                }
                // Both "</name>" and "</name >" are valid end tags.
                if string_equal(self.buf, pos, &end_tag, false) {
                    pos += end_tag.len();
                    pos = skip_white_space(self.buf, pos);
                    if pos < self.buf.len() && self.buf[pos] == b'>' {
                        return pos + 1;
                    }
                }
                self.set_error(ErrorId::ReadingEndTag, Some(pos));
                return self.buf.len();
            }

            let attr_pos = pos;
            let mut attribute = Attribute::new();
            pos = self.parse_attribute_into(&mut attribute, pos, true);
            if pos >= self.buf.len() {
                self.set_error(ErrorId::ParsingElement, Some(attr_pos));
                return self.buf.len();
            }
            let duplicate = match &mut self.doc.node_mut(node).kind {
                NodeKind::Element { attributes, .. } => attributes.add(attribute).is_err(),
                _ => false,
            };
            if duplicate {
                self.set_error(ErrorId::ParsingElement, Some(attr_pos));
                return self.buf.len();
            }
        }
        pos
    }

    /// Element content: text runs and child nodes in any order, until
    /// the closing tag of the element shows up.
    fn read_value(&mut self, node: NodeId, pos: usize) -> usize {
        let mut with_white_space = pos;
        let mut pos = skip_white_space(self.buf, pos);

        while pos < self.buf.len() {
            if self.buf[pos] != b'<' {
                // Keeping whitespace means the text starts back at the
                // last unskipped position.
                let start = if self.condense { pos } else { with_white_space };
                let text = self.doc.new_node(
                    NodeKind::Text {
                        value: Vec::new(),
                        cdata: false,
                    },
                    Some(node),
                );
                pos = self.parse_text(text, start);
                if !self.is_blank(text) {
                    self.doc.link_end_child(node, text);
                }
            } else {
                if string_equal(self.buf, pos, b"</", false) {
                    return pos;
                }
                match self.identify(node, pos) {
                    Some(child) => {
                        pos = self.parse_node(child, pos);
                        self.doc.link_end_child(node, child);
                    }
                    None => {
                        self.set_error(ErrorId::ReadingElementValue, Some(pos));
                        return self.buf.len();
                    }
                }
            }
            with_white_space = pos;
            pos = skip_white_space(self.buf, pos);
        }
        pos
    }

    fn is_blank(&self, node: NodeId) -> bool {
        match &self.doc.node(node).kind {
            NodeKind::Text { value, .. } => value.iter().all(|&b| is_white_space(b)),
            _ => false,
        }
    }

    /// One `name = "value"` attribute. Values may use either quote
    /// style; a missing quote falls back to a lenient scan up to the
    /// next whitespace or tag end. When `latch` is false (declaration
    /// triples) failures unwind without setting a document error.
    fn parse_attribute_into(
        &mut self,
        attribute: &mut Attribute,
        pos: usize,
        latch: bool,
    ) -> usize {
        let mut pos = skip_white_space(self.buf, pos);
        if pos >= self.buf.len() {
            return self.buf.len();
        }

        self.data.stamp(self.buf, pos, self.encoding);
        attribute.location = self.data.cursor();

        let Some((name, next)) = read_name(self.buf, pos) else {
            if latch {
                self.set_error(ErrorId::ReadingAttributes, Some(pos));
            }
            return self.buf.len();
        };
        attribute.name = name;
        pos = next;

        pos = skip_white_space(self.buf, pos);
        if pos >= self.buf.len() || self.buf[pos] != b'=' {
            if latch {
                self.set_error(ErrorId::ReadingAttributes, Some(pos));
            }
            return self.buf.len();
        }
        pos += 1;

        pos = skip_white_space(self.buf, pos);
        if pos >= self.buf.len() {
            if latch {
                self.set_error(ErrorId::ReadingAttributes, Some(pos));
            }
            return self.buf.len();
        }

        let mut value = Vec::new();
        if self.buf[pos] == b'\'' {
            pos = read_text(
                self.buf,
                pos + 1,
                &mut value,
                false,
                b"'",
                false,
                self.condense,
                self.encoding,
            );
        } else if self.buf[pos] == b'"' {
            pos = read_text(
                self.buf,
                pos + 1,
                &mut value,
                false,
                b"\"",
                false,
                self.condense,
                self.encoding,
            );
        } else {
            // Unquoted values are such a common mistake that they are
            // accepted up to the next whitespace or tag end.
            while pos < self.buf.len()
                && !is_white_space(self.buf[pos])
                && self.buf[pos] != b'/'
                && self.buf[pos] != b'>'
            {
                if self.buf[pos] == b'\'' || self.buf[pos] == b'"' {
                    // A closing quote without an opening one.
                    if latch {
                        self.set_error(ErrorId::ReadingAttributes, Some(pos));
                    }
                    return self.buf.len();
                }
                value.push(self.buf[pos]);
                pos += 1;
            }
        }
        attribute.value = value;
        pos
    }
}

impl NodeKind {
    fn element_name(&self) -> &[u8] {
        match self {
            NodeKind::Element { name, .. } => name.as_slice(),
            _ => b"",
        }
    }
}
