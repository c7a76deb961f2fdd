//! Reads a JSON document and writes it back out in the canonical pretty
//! layout, or reports where it is malformed.
//!
//! The document comes from the file named on the command line, or from
//! `stdin` when no file is given. Comments are accepted, so the example also
//! works as a comment stripper for JSON-with-comments configuration files.
//!
//! Run with
//!
//! ```bash
//! echo '{"a": [1, 2.50, "x"] /* note */}' | cargo run -p jsonpress --example pretty_print
//! ```
#![allow(missing_docs)]

use std::{
    env, fs,
    io::{self, Read, Write},
    process::ExitCode,
};

use jsonpress::{Parser, ParserOptions, serialize};

fn read_input() -> io::Result<Vec<u8>> {
    match env::args_os().nth(1) {
        Some(path) => fs::read(path),
        None => {
            let mut input = Vec::new();
            io::stdin().read_to_end(&mut input)?;
            Ok(input)
        }
    }
}

fn main() -> ExitCode {
    let input = match read_input() {
        Ok(input) => input,
        Err(err) => {
            eprintln!("error: cannot read input: {err}");
            return ExitCode::FAILURE;
        }
    };

    let parser = Parser::new(ParserOptions {
        allow_comments: true,
        ..Default::default()
    });
    let value = match parser.parse(&input) {
        Ok(value) => value,
        Err(err) => {
            let (line, column) = err.line_column(&input);
            eprintln!(
                "error: {} at line {line}, column {column} (code {}), near {:?}",
                err.kind(),
                err.kind().code(),
                err.excerpt(&input),
            );
            return ExitCode::FAILURE;
        }
    };

    let mut out = serialize::to_vec(&value);
    out.push(b'\n');
    match io::stdout().lock().write_all(&out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: cannot write output: {err}");
            ExitCode::FAILURE
        }
    }
}
