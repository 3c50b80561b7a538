/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::*;

fn stamped(buf: &[u8], target: usize, tab_size: i32, encoding: Encoding) -> (i32, i32) {
    let mut data = ParsingData::new(tab_size);
    data.stamp(buf, target, encoding);
    let cursor = data.cursor();
    (cursor.row(), cursor.column())
}

#[test]
fn stamp_plain_columns() {
    assert_eq!(stamped(b"", 0, 4, Encoding::Legacy), (1, 1));
    assert_eq!(stamped(b"abc", 0, 4, Encoding::Legacy), (1, 1));
    assert_eq!(stamped(b"abc", 1, 4, Encoding::Legacy), (1, 2));
    assert_eq!(stamped(b"abc", 3, 4, Encoding::Legacy), (1, 4));
    // A target past the region clamps to its end.
    assert_eq!(stamped(b"abc", 17, 4, Encoding::Legacy), (1, 4));
}

#[test]
fn stamp_line_endings() {
    assert_eq!(stamped(b"a\nb", 3, 4, Encoding::Legacy), (2, 2));
    assert_eq!(stamped(b"a\rb", 3, 4, Encoding::Legacy), (2, 2));
    // CRLF and LFCR both count as one line ending.
    assert_eq!(stamped(b"a\r\nb", 4, 4, Encoding::Legacy), (2, 2));
    assert_eq!(stamped(b"a\n\rb", 4, 4, Encoding::Legacy), (2, 2));
    assert_eq!(stamped(b"\n\n\nx", 4, 4, Encoding::Legacy), (4, 2));
    // Separate blank lines are not pairs.
    assert_eq!(stamped(b"a\n\nb", 4, 4, Encoding::Legacy), (3, 2));
}

#[test]
fn stamp_tab_stops() {
    assert_eq!(stamped(b"\tx", 2, 4, Encoding::Legacy), (1, 6));
    assert_eq!(stamped(b"ab\tx", 4, 4, Encoding::Legacy), (1, 6));
    assert_eq!(stamped(b"abcd\tx", 6, 4, Encoding::Legacy), (1, 10));
    assert_eq!(stamped(b"\tx", 2, 2, Encoding::Legacy), (1, 4));
}

#[test]
fn stamp_disabled_by_zero_tab_size() {
    assert_eq!(stamped(b"a\n\nb", 4, 0, Encoding::Legacy), (1, 1));
    assert_eq!(stamped(b"a\n\nb", 4, -1, Encoding::Legacy), (1, 1));
}

#[test]
fn stamp_stops_at_null() {
    // The walk abandons its progress instead of crossing a null.
    assert_eq!(stamped(b"ab\0cd", 5, 4, Encoding::Legacy), (1, 1));
}

#[test]
fn stamp_utf8_steps() {
    let buf = "é1".as_bytes();
    assert_eq!(stamped(buf, 2, 4, Encoding::Utf8), (1, 2));
    assert_eq!(stamped(buf, 2, 4, Encoding::Legacy), (1, 3));

    let buf = "\u{20ac}1".as_bytes();
    assert_eq!(stamped(buf, 3, 4, Encoding::Utf8), (1, 2));

    let buf = "\u{10abc}1".as_bytes();
    assert_eq!(stamped(buf, 4, 4, Encoding::Utf8), (1, 2));
}

#[test]
fn stamp_zero_width_bom() {
    let buf = b"a\xef\xbb\xbfb";
    assert_eq!(stamped(buf, 4, 4, Encoding::Utf8), (1, 2));
    assert_eq!(stamped(buf, 5, 4, Encoding::Utf8), (1, 3));
    // Other 0xef sequences are ordinary single column characters.
    let buf = b"a\xef\xad\xbbb";
    assert_eq!(stamped(buf, 4, 4, Encoding::Utf8), (1, 3));
}

#[test]
fn stamp_is_incremental() {
    let buf = b"ab\ncd\tef";
    let mut data = ParsingData::new(4);
    data.stamp(buf, 2, Encoding::Legacy);
    assert_eq!((data.cursor().row(), data.cursor().column()), (1, 3));
    data.stamp(buf, 4, Encoding::Legacy);
    assert_eq!((data.cursor().row(), data.cursor().column()), (2, 2));
    // Stamping backwards does not move the cursor.
    data.stamp(buf, 1, Encoding::Legacy);
    assert_eq!((data.cursor().row(), data.cursor().column()), (2, 2));
    data.stamp(buf, 8, Encoding::Legacy);
    assert_eq!((data.cursor().row(), data.cursor().column()), (2, 7));
}

#[test]
fn location_reporting() {
    assert_eq!(Location::cleared().row(), 0);
    assert_eq!(Location::cleared().column(), 0);
    assert_eq!(Location::start().row(), 1);
    assert_eq!(format!("{}", Location::start()), "line 1 column 1");
}

#[test]
fn generous_classification() {
    assert!(is_alpha(b'a'));
    assert!(is_alpha(b'Z'));
    assert!(!is_alpha(b'1'));
    assert!(!is_alpha(b' '));
    assert!(is_alpha_num(b'1'));
    // Anything beyond ascii is probably a letter.
    assert!(is_alpha(0x80));
    assert!(is_alpha(0xff));
    assert!(is_alpha_num(0xc3));
}

#[test]
fn names() {
    assert_eq!(read_name(b"abc def", 0), Some((b"abc".to_vec(), 3)));
    assert_eq!(read_name(b"_x1-2.3:z rest", 0), Some((b"_x1-2.3:z".to_vec(), 9)));
    assert_eq!(read_name(b"x>y", 0), Some((b"x".to_vec(), 1)));
    assert_eq!(read_name(b"ab", 1), Some((b"b".to_vec(), 2)));
    assert_eq!(read_name(b"1abc", 0), None);
    assert_eq!(read_name(b"-x", 0), None);
    assert_eq!(read_name(b"", 0), None);
    // Multi-byte names tokenize generously.
    let name = "étage".as_bytes();
    assert_eq!(read_name(name, 0), Some((name.to_vec(), name.len())));
}

#[test]
fn prefix_match() {
    assert!(string_equal(b"<?xml version", 0, b"<?xml", false));
    assert!(string_equal(b"<?XmL version", 0, b"<?xml", true));
    assert!(!string_equal(b"<?XmL version", 0, b"<?xml", false));
    assert!(string_equal(b"x</end>", 1, b"</", false));
    // A region shorter than the tag never matches.
    assert!(!string_equal(b"<?x", 0, b"<?xml", true));
    assert!(!string_equal(b"", 0, b"x", false));
}

fn text_of(buf: &[u8], trim: bool, end_tag: &[u8], condense: bool) -> (Vec<u8>, usize) {
    let mut text = Vec::new();
    let pos = read_text(buf, 0, &mut text, trim, end_tag, false, condense, Encoding::Utf8);
    (text, pos)
}

#[test]
fn text_condensing() {
    let (text, pos) = text_of(b"a  b  <x", true, b"<", true);
    assert_eq!(text, b"a b");
    assert_eq!(pos, 7);

    let (text, _) = text_of(b"  a\n\t b<", true, b"<", true);
    assert_eq!(text, b"a b");

    let (text, _) = text_of(b"a  b  <x", true, b"<", false);
    assert_eq!(text, b"a  b  ");

    let (text, _) = text_of(b"a  b  <x", false, b"<", true);
    assert_eq!(text, b"a  b  ");
}

#[test]
fn text_entities() {
    let (text, _) = text_of(b"x&amp;y<", true, b"<", true);
    assert_eq!(text, b"x&y");

    let (text, _) = text_of(b"&lt;tag&gt;<", true, b"<", true);
    assert_eq!(text, b"<tag>");

    let (text, _) = text_of(b"&#65;&#x42;<", true, b"<", true);
    assert_eq!(text, b"AB");

    // An unrecognized reference passes the ampersand through.
    let (text, _) = text_of(b"a&nbsp;b<", true, b"<", true);
    assert_eq!(text, b"a&nbsp;b");
}

#[test]
fn text_terminators() {
    let (text, pos) = text_of(b"abc", true, b"<", true);
    assert_eq!(text, b"abc");
    assert_eq!(pos, 3);

    let (text, pos) = text_of(b"ab'cd", true, b"'", true);
    assert_eq!(text, b"ab");
    assert_eq!(pos, 3);

    let (text, pos) = text_of(b"ab]]>cd", true, b"]]>", true);
    assert_eq!(text, b"ab");
    assert_eq!(pos, 5);
}

#[test]
fn logical_characters() {
    let mut c = [0u8; 4];

    let (len, next) = get_char(b"ab", 0, &mut c, Encoding::Utf8);
    assert_eq!((len, next), (1, 1));
    assert_eq!(c[0], b'a');

    let buf = "é!".as_bytes();
    let (len, next) = get_char(buf, 0, &mut c, Encoding::Utf8);
    assert_eq!((len, next), (2, 2));
    assert_eq!(&c[..2], &buf[..2]);

    // Legacy mode never groups bytes.
    let (len, next) = get_char(buf, 0, &mut c, Encoding::Legacy);
    assert_eq!((len, next), (1, 1));

    // A truncated sequence is clamped to the region.
    let (len, next) = get_char(b"\xe2\x82", 0, &mut c, Encoding::Utf8);
    assert_eq!((len, next), (2, 2));

    let (len, next) = get_char(b"&lt;x", 0, &mut c, Encoding::Utf8);
    assert_eq!((len, next), (1, 4));
    assert_eq!(c[0], b'<');
}

#[test]
fn utf32_to_utf8() {
    assert_eq!(convert_utf32_to_utf8(0x41), ([0x41, 0, 0, 0], 1));
    assert_eq!(convert_utf32_to_utf8(0xe9), ([0xc3, 0xa9, 0, 0], 2));
    assert_eq!(convert_utf32_to_utf8(0x20ac), ([0xe2, 0x82, 0xac, 0], 3));
    assert_eq!(convert_utf32_to_utf8(0x10abc), ([0xf0, 0x90, 0xaa, 0xbc], 4));
    // The encoder tops out below 0x200000.
    let (_, len) = convert_utf32_to_utf8(0x1fffff);
    assert_eq!(len, 4);
    let (_, len) = convert_utf32_to_utf8(0x200000);
    assert_eq!(len, 0);
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(ErrorId::Error.code(), 1);
    assert_eq!(ErrorId::OpeningFile.code(), 2);
    assert_eq!(ErrorId::ParsingElement.code(), 3);
    assert_eq!(ErrorId::FailedToReadElementName.code(), 4);
    assert_eq!(ErrorId::ReadingElementValue.code(), 5);
    assert_eq!(ErrorId::ReadingAttributes.code(), 6);
    assert_eq!(ErrorId::ParsingEmpty.code(), 7);
    assert_eq!(ErrorId::ReadingEndTag.code(), 8);
    assert_eq!(ErrorId::ParsingUnknown.code(), 9);
    assert_eq!(ErrorId::ParsingComment.code(), 10);
    assert_eq!(ErrorId::ParsingDeclaration.code(), 11);
    assert_eq!(ErrorId::DocumentEmpty.code(), 12);
    assert_eq!(ErrorId::EmbeddedNull.code(), 13);
    assert_eq!(ErrorId::ParsingCdata.code(), 14);
    assert_eq!(ErrorId::DocumentTopOnly.code(), 15);
}

#[test]
fn error_display() {
    let error = ParseError::new(ErrorId::ReadingEndTag, Location::start());
    assert_eq!(error.code(), 8);
    assert_eq!(error.description(), "error reading end tag");
    assert_eq!(error.row(), 1);
    assert_eq!(error.column(), 1);
    assert_eq!(format!("{}", error), "error reading end tag at line 1 column 1");

    let error = ParseError::new(ErrorId::DocumentEmpty, Location::cleared());
    assert_eq!(error.row(), 0);
    assert_eq!(error.column(), 0);
}
