/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::Location;

/// Numeric code of a parse error.
///
/// The discriminant values are stable public API: callers match on them
/// and they are preserved across releases.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorId {
    Error = 1,
    OpeningFile = 2,
    ParsingElement = 3,
    FailedToReadElementName = 4,
    ReadingElementValue = 5,
    ReadingAttributes = 6,
    ParsingEmpty = 7,
    ReadingEndTag = 8,
    ParsingUnknown = 9,
    ParsingComment = 10,
    ParsingDeclaration = 11,
    DocumentEmpty = 12,
    EmbeddedNull = 13,
    ParsingCdata = 14,
    DocumentTopOnly = 15,
}

pub(crate) mod description {
    pub(crate) const ERROR: &str = "error";
    pub(crate) const OPENING_FILE: &str = "failed to open file";
    pub(crate) const PARSING_ELEMENT: &str = "error parsing element";
    pub(crate) const FAILED_TO_READ_ELEMENT_NAME: &str = "failed to read element name";
    pub(crate) const READING_ELEMENT_VALUE: &str = "error reading element value";
    pub(crate) const READING_ATTRIBUTES: &str = "error reading attributes";
    pub(crate) const PARSING_EMPTY: &str = "error parsing empty element tag";
    pub(crate) const READING_END_TAG: &str = "error reading end tag";
    pub(crate) const PARSING_UNKNOWN: &str = "error parsing unknown construct";
    pub(crate) const PARSING_COMMENT: &str = "error parsing comment";
    pub(crate) const PARSING_DECLARATION: &str = "error parsing declaration";
    pub(crate) const DOCUMENT_EMPTY: &str = "document is empty";
    pub(crate) const EMBEDDED_NULL: &str = "null byte found in input";
    pub(crate) const PARSING_CDATA: &str = "error parsing cdata section";
    pub(crate) const DOCUMENT_TOP_ONLY: &str = "a document node can only be at the root";
}

impl ErrorId {
    /// The numeric value of this code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// The fixed human readable description of this code.
    pub fn description(self) -> &'static str {
        match self {
            ErrorId::Error => description::ERROR,
            ErrorId::OpeningFile => description::OPENING_FILE,
            ErrorId::ParsingElement => description::PARSING_ELEMENT,
            ErrorId::FailedToReadElementName => description::FAILED_TO_READ_ELEMENT_NAME,
            ErrorId::ReadingElementValue => description::READING_ELEMENT_VALUE,
            ErrorId::ReadingAttributes => description::READING_ATTRIBUTES,
            ErrorId::ParsingEmpty => description::PARSING_EMPTY,
            ErrorId::ReadingEndTag => description::READING_END_TAG,
            ErrorId::ParsingUnknown => description::PARSING_UNKNOWN,
            ErrorId::ParsingComment => description::PARSING_COMMENT,
            ErrorId::ParsingDeclaration => description::PARSING_DECLARATION,
            ErrorId::DocumentEmpty => description::DOCUMENT_EMPTY,
            ErrorId::EmbeddedNull => description::EMBEDDED_NULL,
            ErrorId::ParsingCdata => description::PARSING_CDATA,
            ErrorId::DocumentTopOnly => description::DOCUMENT_TOP_ONLY,
        }
    }
}

/// A latched parse error: numeric code, fixed description, and the
/// input position where it was detected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseError {
    id: ErrorId,
    location: Location,
}

impl ParseError {
    pub(crate) fn new(id: ErrorId, location: Location) -> ParseError {
        ParseError { id, location }
    }

    pub fn id(&self) -> ErrorId {
        self.id
    }

    pub fn code(&self) -> i32 {
        self.id.code()
    }

    pub fn description(&self) -> &'static str {
        self.id.description()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// 1-based row of the error, or 0 when unknown.
    pub fn row(&self) -> i32 {
        self.location.row()
    }

    /// 1-based column of the error, or 0 when unknown.
    pub fn column(&self) -> i32 {
        self.location.column()
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.description(), self.location)
    }
}

impl std::error::Error for ParseError {}
