/*
** This file is a part of Minik (a small permissive XML parser)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Minik is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::Read;
use std::io::stdin;
use std::process::ExitCode;

use minik::Cursor;
use minik::Document;
use minik::NodeType;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("miniklint (minik) v{}", VERSION);
}

fn print_usage() {
    println!(concat!(
        "Usage: miniklint [OPTIONS] [FILE.xml...]\n",
        "This tool checks the well-formedness of XML documents.\n",
        "Options:\n",
        "  -s, --stat           Overall statistics\n",
        "  -c, --count          Element counts\n",
        "  -t, --tabsize <N>    Tab size used for reported positions (default: 4)\n",
        "  -k, --keep-space     Do not condense whitespace in text content\n",
        "  -h, --help           Display this help message and exit\n",
        "  -v, --version        Display the version and exit\n",
        "Report issues at https://github.com/meduketto/minik/issues"
    ));
}

struct Stats {
    nr_elements: usize,
    nr_empty_elements: usize,
    nr_text_bytes: usize,
    max_depth: usize,
    element_map: HashMap<String, usize>,
}

impl Stats {
    fn new() -> Stats {
        Stats {
            nr_elements: 0,
            nr_empty_elements: 0,
            nr_text_bytes: 0,
            max_depth: 0,
            element_map: HashMap::new(),
        }
    }

    fn collect(&mut self, cursor: Cursor, depth: usize) {
        for child in cursor.children() {
            match child.node_type() {
                Some(NodeType::Element) => {
                    self.nr_elements += 1;
                    self.max_depth = self.max_depth.max(depth + 1);
                    if child.first_child().is_null() {
                        self.nr_empty_elements += 1;
                    }
                    *self.element_map.entry(child.name().into_owned()).or_insert(0) += 1;
                    self.collect(child, depth + 1);
                }
                Some(NodeType::Text) => {
                    self.nr_text_bytes += child.text_bytes().len();
                }
                _ => (),
            }
        }
    }
}

struct Linter {
    do_stats: bool,
    do_element_count: bool,
    tab_size: i32,
    keep_space: bool,
}

impl Linter {
    fn new(do_stats: bool, do_element_count: bool, tab_size: i32, keep_space: bool) -> Linter {
        Linter {
            do_stats,
            do_element_count,
            tab_size,
            keep_space,
        }
    }

    fn read_input(&self, file: &str, is_stream: bool) -> std::io::Result<Vec<u8>> {
        if is_stream {
            let mut bytes = Vec::new();
            stdin().read_to_end(&mut bytes)?;
            Ok(bytes)
        } else {
            fs::read(file)
        }
    }

    fn report(&self, doc: &Document) {
        let mut stats = Stats::new();
        stats.collect(doc.root(), 0);
        if self.do_stats {
            println!(
                "Elements: {}, empty elements: {}, max depth: {}",
                stats.nr_elements, stats.nr_empty_elements, stats.max_depth
            );
            println!("Total size of text content: {} bytes.", stats.nr_text_bytes);
        }
        if self.do_element_count {
            println!("Element counts:");
            for (name, count) in stats.element_map.iter() {
                println!("  {}: {}", name, count);
            }
        }
    }

    fn lint_file(&self, file: &str, is_stream: bool) -> bool {
        let bytes = match self.read_input(file, is_stream) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", file, e);
                return false;
            }
        };

        let mut doc = Document::new();
        doc.set_tab_size(self.tab_size);
        doc.set_condense_white_space(!self.keep_space);
        doc.parse_bytes(&bytes);

        if let Some(error) = doc.error() {
            eprintln!(
                "Syntax error in file '{}' at line {} column {}: {}",
                file,
                error.row(),
                error.column(),
                error.description()
            );
            return false;
        }

        if self.do_stats || self.do_element_count {
            self.report(&doc);
        }
        true
    }
}

fn main() -> ExitCode {
    let mut args = env::args();

    let mut files = Vec::new();
    let mut do_stats = false;
    let mut do_element_count = false;
    let mut tab_size = 4;
    let mut keep_space = false;

    // Skip the first argument (program name)
    args.next();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-s" | "--stat" => {
                do_stats = true;
            }
            "-c" | "--count" => {
                do_element_count = true;
            }
            "-cs" | "-sc" => {
                do_stats = true;
                do_element_count = true;
            }
            "-k" | "--keep-space" => {
                keep_space = true;
            }
            "-t" | "--tabsize" => {
                if let Some(size) = args.next() {
                    if let Ok(size) = size.parse::<i32>() {
                        tab_size = size;
                    } else {
                        eprintln!("Invalid tab size");
                        return ExitCode::FAILURE;
                    }
                } else {
                    eprintln!("Missing tab size");
                    return ExitCode::FAILURE;
                }
            }
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                print_version();
                return ExitCode::SUCCESS;
            }
            _ => {
                files.push(arg);
            }
        }
    }

    let linter = Linter::new(do_stats, do_element_count, tab_size, keep_space);
    if files.is_empty() {
        if !linter.lint_file("stdin", true) {
            return ExitCode::FAILURE;
        }
    } else {
        for file in files {
            if !linter.lint_file(&file, false) {
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
