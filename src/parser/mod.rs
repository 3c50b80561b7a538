/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod encoding;
mod error;
mod location;

pub use encoding::Encoding;
pub(crate) use encoding::UTF8_BYTE_TABLE;
pub(crate) use encoding::convert_utf32_to_utf8;
pub(crate) use encoding::get_char;
pub(crate) use encoding::is_alpha;
pub(crate) use encoding::is_alpha_num;
pub(crate) use encoding::is_white_space;
pub use error::ErrorId;
pub use error::ParseError;
pub use location::Location;
pub(crate) use location::ParsingData;

pub(crate) fn skip_white_space(buf: &[u8], mut pos: usize) -> usize {
    while pos < buf.len() && is_white_space(buf[pos]) {
        pos += 1;
    }
    pos
}

/// Reads an XML name: a letter or underscore, then letters, digits,
/// underscores, hyphens, periods, and colons. Colons are only valid for
/// namespaces, but namespaces cannot be told apart from plain names
/// here. Returns the name and the position just past it, or None when
/// the input does not start with a valid name character.
pub(crate) fn read_name(buf: &[u8], pos: usize) -> Option<(Vec<u8>, usize)> {
    if pos >= buf.len() || !(is_alpha(buf[pos]) || buf[pos] == b'_') {
        return None;
    }
    let start = pos;
    let mut pos = pos;
    while pos < buf.len()
        && (is_alpha_num(buf[pos])
            || buf[pos] == b'_'
            || buf[pos] == b'-'
            || buf[pos] == b'.'
            || buf[pos] == b':')
    {
        pos += 1;
    }
    Some((buf[start..pos].to_vec(), pos))
}

/// Prefix match of `tag` at `pos`, optionally folding ascii case.
pub(crate) fn string_equal(buf: &[u8], pos: usize, tag: &[u8], ignore_case: bool) -> bool {
    if pos + tag.len() > buf.len() {
        return false;
    }
    let got = &buf[pos..pos + tag.len()];
    if ignore_case {
        got.eq_ignore_ascii_case(tag)
    } else {
        got == tag
    }
}

/// Consumes input into `text` until `end_tag` is seen, decoding entity
/// references along the way.
///
/// When both `trim_white_space` and `condense_white_space` are set,
/// leading whitespace is dropped and every internal whitespace run
/// collapses to a single space; otherwise all whitespace is kept.
/// Returns the position just past `end_tag`, or the end of the region
/// when the terminator is never found.
pub(crate) fn read_text(
    buf: &[u8],
    mut pos: usize,
    text: &mut Vec<u8>,
    trim_white_space: bool,
    end_tag: &[u8],
    case_insensitive: bool,
    condense_white_space: bool,
    encoding: Encoding,
) -> usize {
    text.clear();
    let mut c = [0u8; 4];

    if !trim_white_space || !condense_white_space {
        while pos < buf.len() && !string_equal(buf, pos, end_tag, case_insensitive) {
            let (len, next) = get_char(buf, pos, &mut c, encoding);
            text.extend_from_slice(&c[..len]);
            pos = next;
        }
    } else {
        let mut whitespace = false;
        pos = skip_white_space(buf, pos);
        while pos < buf.len() && !string_equal(buf, pos, end_tag, case_insensitive) {
            if buf[pos] == b'\r' || buf[pos] == b'\n' {
                whitespace = true;
                pos += 1;
            } else if is_white_space(buf[pos]) {
                whitespace = true;
                pos += 1;
            } else {
                // A pending whitespace run becomes a single space in
                // front of the next character.
                if whitespace {
                    text.push(b' ');
                    whitespace = false;
                }
                let (len, next) = get_char(buf, pos, &mut c, encoding);
                text.extend_from_slice(&c[..len]);
                pos = next;
            }
        }
    }

    if pos < buf.len() {
        pos += end_tag.len();
    }
    pos.min(buf.len())
}

#[cfg(test)]
mod tests;
