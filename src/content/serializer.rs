//! Content stream serialization.
//!
//! The inverse of parsing: emitting a token vector and re-parsing it yields
//! the same vector. Numeric formatting is normalized (no exponent notation,
//! at most six fractional digits) which is value-preserving for every
//! number a content stream realistically carries.

use crate::content::token::{PdfString, StringForm, Token};

/// Serialize a token vector back to content-stream bytes.
pub fn serialize_content(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::new();
    for token in tokens {
        write_token(&mut out, token);
        match token {
            // Operators end an instruction; a newline keeps the output
            // readable and diffs small.
            Token::Operator(_) => out.push(b'\n'),
            Token::InlineData(_) => {}
            _ => out.push(b' '),
        }
    }
    out
}

fn write_token(out: &mut Vec<u8>, token: &Token) {
    match token {
        Token::Operator(op) => out.extend_from_slice(op.as_bytes()),
        Token::Str(s) => write_string(out, s),
        Token::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_token(out, item);
            }
            out.push(b']');
        }
        Token::Integer(value) => out.extend_from_slice(value.to_string().as_bytes()),
        Token::Real(value) => out.extend_from_slice(format_real(*value).as_bytes()),
        Token::Name(name) => write_name(out, name),
        Token::Boolean(true) => out.extend_from_slice(b"true"),
        Token::Boolean(false) => out.extend_from_slice(b"false"),
        Token::Null => out.extend_from_slice(b"null"),
        Token::DictBegin => out.extend_from_slice(b"<<"),
        Token::DictEnd => out.extend_from_slice(b">>"),
        Token::InlineData(data) => {
            // The preceding ID operator already emitted its newline; the
            // terminator EI follows as its own operator token.
            out.extend_from_slice(data);
            out.push(b'\n');
        }
    }
}

fn write_string(out: &mut Vec<u8>, s: &PdfString) {
    match s.form {
        StringForm::Literal => {
            out.push(b'(');
            for &byte in &s.bytes {
                match byte {
                    b'(' | b')' | b'\\' => {
                        out.push(b'\\');
                        out.push(byte);
                    }
                    b'\n' => out.extend_from_slice(b"\\n"),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    b'\t' => out.extend_from_slice(b"\\t"),
                    0x08 => out.extend_from_slice(b"\\b"),
                    0x0C => out.extend_from_slice(b"\\f"),
                    0x20..=0x7E => out.push(byte),
                    _ => out.extend_from_slice(format!("\\{byte:03o}").as_bytes()),
                }
            }
            out.push(b')');
        }
        StringForm::Hex => {
            out.push(b'<');
            for &byte in &s.bytes {
                out.extend_from_slice(format!("{byte:02X}").as_bytes());
            }
            out.push(b'>');
        }
    }
}

fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for ch in name.chars() {
        let byte = if (ch as u32) <= 0xFF { ch as u8 } else { b'?' };
        let needs_escape = byte == b'#'
            || byte <= b' '
            || byte > b'~'
            || matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%');
        if needs_escape {
            out.extend_from_slice(format!("#{byte:02X}").as_bytes());
        } else {
            out.push(byte);
        }
    }
}

/// Plain decimal formatting; content streams do not accept exponents.
fn format_real(value: f64) -> String {
    let mut text = format!("{value:.6}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.push('0');
    }
    text
}
