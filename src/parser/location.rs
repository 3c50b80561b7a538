/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Display;

use super::encoding::Encoding;
use super::encoding::UTF8_BYTE_TABLE;
use super::encoding::UTF_LEAD_0;

/// A row/column position in the parser input.
///
/// Positions are attached to every parsed node and attribute, and to
/// the document error state, for diagnostic reporting. The reported
/// [row()](Location::row) and [column()](Location::column) values are
/// 1-based; a cleared location reports 0 for both.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Location {
    pub(crate) row: i32,
    pub(crate) col: i32,
}

impl Location {
    pub(crate) fn cleared() -> Location {
        Location { row: -1, col: -1 }
    }

    pub(crate) fn start() -> Location {
        Location { row: 0, col: 0 }
    }

    /// 1-based input row, or 0 when the location is unknown.
    pub fn row(&self) -> i32 {
        self.row + 1
    }

    /// 1-based input column, or 0 when the location is unknown.
    pub fn column(&self) -> i32 {
        self.col + 1
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::cleared()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} column {}", self.row(), self.column())
    }
}

/// Transient per-parse position tracker.
///
/// The cursor is advanced lazily: parse routines call
/// [stamp()](ParsingData::stamp) with the byte offset they are about to
/// consume and the tracker walks forward from the highest offset it has
/// already credited, honoring tab stops, the CR/LF/CRLF/LFCR line ending
/// conventions, zero width byte-order marks, and multi-byte UTF-8
/// characters (one column each).
pub(crate) struct ParsingData {
    cursor: Location,
    stamp: usize,
    tab_size: i32,
}

impl ParsingData {
    pub(crate) fn new(tab_size: i32) -> ParsingData {
        ParsingData {
            cursor: Location::start(),
            stamp: 0,
            tab_size,
        }
    }

    pub(crate) fn cursor(&self) -> Location {
        self.cursor
    }

    pub(crate) fn stamp(&mut self, buf: &[u8], target: usize, encoding: Encoding) {
        // A tab size below one disables the whole tracker.
        if self.tab_size < 1 {
            return;
        }

        let target = target.min(buf.len());
        let mut row = self.cursor.row;
        let mut col = self.cursor.col;
        let mut p = self.stamp;

        while p < target {
            match buf[p] {
                0 => {
                    // Never advance past a terminating null.
                    return;
                }
                b'\r' => {
                    row += 1;
                    col = 0;
                    p += 1;
                    // CRLF counts as a single line ending.
                    if p < buf.len() && buf[p] == b'\n' {
                        p += 1;
                    }
                }
                b'\n' => {
                    row += 1;
                    col = 0;
                    p += 1;
                    // LFCR still occurs on some arcane platforms.
                    if p < buf.len() && buf[p] == b'\r' {
                        p += 1;
                    }
                }
                b'\t' => {
                    p += 1;
                    col = (col / self.tab_size + 1) * self.tab_size;
                }
                UTF_LEAD_0 if encoding == Encoding::Utf8 => {
                    if p + 2 < buf.len() {
                        let pair = (buf[p + 1], buf[p + 2]);
                        p += 3;
                        // The BOM and the two non-characters are zero width.
                        if !matches!(pair, (0xbb, 0xbf) | (0xbf, 0xbe) | (0xbf, 0xbf)) {
                            col += 1;
                        }
                    } else {
                        p += 1;
                        col += 1;
                    }
                }
                b => {
                    if encoding == Encoding::Utf8 {
                        let mut step = UTF8_BYTE_TABLE[b as usize] as usize;
                        if step == 0 {
                            step = 1;
                        }
                        p += step.min(buf.len() - p);
                    } else {
                        p += 1;
                    }
                    col += 1;
                }
            }
        }

        self.cursor.row = row;
        self.cursor.col = col;
        self.stamp = p;
    }
}
