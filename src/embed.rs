//! Embed arbitrary file contents into C sources as a string literal.
//!
//! Output looks like
//!
//! ```text
//! static const char index_html[] =
//! "<html>\n"
//! "</html>\n"
//! "";
//! ```
//!
//! Lines of the literal are broken after every newline of the input and
//! whenever the current line reaches [`WRAP_COLUMN`] characters.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::EmbedError;

/// Column at which a literal line is closed and a new one started.
pub const WRAP_COLUMN: usize = 76;

pub fn is_c_identifier(symbol: &str) -> bool {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Write `data` as a `const char <symbol>[]` declaration.
pub fn write_c_literal<W: Write>(
    data: &[u8],
    symbol: &str,
    use_static: bool,
    out: &mut W,
) -> Result<(), EmbedError> {
    if !is_c_identifier(symbol) {
        return Err(EmbedError::InvalidSymbol(symbol.to_string()));
    }

    if use_static {
        out.write_all(b"static ")?;
    }
    write!(out, "const char {}[] = \n\"", symbol)?;

    let mut n = 0usize;
    // A C hex escape swallows every hex digit that follows it
    let mut after_hex_escape = false;

    for &c in data {
        match c {
            b'\n' => {
                out.write_all(b"\\n\"\n\"")?;
                n = 0;
                after_hex_escape = false;
            }
            b'"' => {
                out.write_all(b"\\\"")?;
                n += 2;
                after_hex_escape = false;
            }
            b'\\' => {
                out.write_all(b"\\\\")?;
                n += 2;
                after_hex_escape = false;
            }
            c if !(32..127).contains(&c) => {
                write!(out, "\\x{:02x}", c)?;
                n += 4;
                after_hex_escape = true;
            }
            c => {
                if after_hex_escape && c.is_ascii_hexdigit() {
                    out.write_all(b"\"\"")?;
                    n += 2;
                }
                out.write_all(&[c])?;
                n += 1;
                after_hex_escape = false;
            }
        }

        if n >= WRAP_COLUMN {
            out.write_all(b"\"\n\"")?;
            n = 0;
            after_hex_escape = false;
        }
    }

    out.write_all(b"\";\n")?;
    Ok(())
}

pub fn embed_to_string(data: &[u8], symbol: &str, use_static: bool) -> Result<String, EmbedError> {
    let mut buf = Vec::with_capacity(data.len() * 2 + symbol.len() + 32);
    write_c_literal(data, symbol, use_static, &mut buf)?;
    // Only ASCII is ever written
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn embed_file<W: Write>(
    path: &Path,
    symbol: &str,
    use_static: bool,
    out: &mut W,
) -> Result<(), EmbedError> {
    let data = fs::read(path).map_err(|source| EmbedError::Read {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "Embedding file");
    write_c_literal(&data, symbol, use_static, out)
}
