/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

pub(crate) mod description {
    pub(crate) const DUPLICATE_ATTRIBUTE: &str = "attribute name already used in this element";
    pub(crate) const NOT_AN_ELEMENT: &str = "attributes can only be set on element nodes";
    pub(crate) const LEAF_CHILDREN: &str = "only document and element nodes can have children";
}

/// An error from a document edit operation.
#[derive(Debug, Eq, PartialEq)]
pub enum DocumentError {
    BadXml(&'static str),
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::BadXml(description) => write!(f, "invalid edit: {}", description),
        }
    }
}

impl std::error::Error for DocumentError {}
