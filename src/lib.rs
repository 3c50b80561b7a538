/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod document;
mod entities;
mod parser;

pub use document::Attribute;
pub use document::AttributeSet;
pub use document::Attributes;
pub use document::Children;
pub use document::Cursor;
pub use document::DescendantOrSelf;
pub use document::Document;
pub use document::DocumentError;
pub use document::NodeId;
pub use document::NodeType;

pub use parser::Encoding;
pub use parser::ErrorId;
pub use parser::Location;
pub use parser::ParseError;
