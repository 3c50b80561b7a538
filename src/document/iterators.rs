/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::Attribute;
use super::Cursor;

/// Iterates the direct children of a node.
pub struct Children<'a> {
    current: Cursor<'a>,
}

impl<'a> Children<'a> {
    pub(super) fn new(cursor: Cursor<'a>) -> Self {
        Children { current: cursor }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = Cursor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_null() {
            return None;
        }
        let result = self.current;
        self.current = self.current.next();
        Some(result)
    }
}

/// Iterates the attributes of an element in insertion order.
pub struct Attributes<'a> {
    iter: std::slice::Iter<'a, Attribute>,
}

impl<'a> Attributes<'a> {
    pub(super) fn new(cursor: Cursor<'a>) -> Self {
        const EMPTY: &[Attribute] = &[];
        let iter = match cursor.attribute_set() {
            Some(attributes) => attributes.attributes.iter(),
            None => EMPTY.iter(),
        };
        Attributes { iter }
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = &'a Attribute;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

/// Iterates a node and all of its descendants in document order.
pub struct DescendantOrSelf<'a> {
    current: Cursor<'a>,
    level: usize,
    going_down: bool,
}

impl<'a> DescendantOrSelf<'a> {
    pub(super) fn new(cursor: Cursor<'a>) -> Self {
        DescendantOrSelf {
            current: cursor,
            level: 0,
            going_down: true,
        }
    }
}

impl<'a> Iterator for DescendantOrSelf<'a> {
    type Item = Cursor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_null() {
            return None;
        }
        let result = self.current;
        loop {
            if self.going_down {
                let child = self.current.first_child();
                if !child.is_null() {
                    self.current = child;
                    self.level += 1;
                    return Some(result);
                }
            }
            if self.level == 0 {
                self.current = Cursor::new(self.current.doc, None);
                break;
            }
            let next = self.current.next();
            if next.is_null() {
                self.level -= 1;
                self.current = self.current.parent();
                self.going_down = false;
            } else {
                self.current = next;
                self.going_down = true;
                break;
            }
        }
        Some(result)
    }
}
