//! String and character escape decoding.
use phf::phf_map;
use rcaron_syntax::{ErrorCode, Result};

use crate::ErrorHandler;
use crate::lexer::Lexer;

static NAMED_ESCAPES: phf::Map<char, char> = phf_map! {
    '\'' => '\'',
    '"' => '"',
    '\\' => '\\',
    '0' => '\0',
    'a' => '\u{7}',
    'b' => '\u{8}',
    'f' => '\u{c}',
    'n' => '\n',
    'r' => '\r',
    't' => '\t',
    'v' => '\u{b}',
};

impl Lexer<'_> {
    /// Decode one escape starting at the backslash under the cursor.
    ///
    /// Malformed escapes are reported and skipped; the cursor always ends
    /// after the escape so the enclosing literal keeps its boundaries.
    pub(crate) fn read_escape(
        &mut self,
        out: &mut String,
        handler: &mut dyn ErrorHandler,
    ) -> Result<()> {
        let start = self.i;
        self.i += 1;
        let Some(code) = self.peek_char() else {
            return Ok(());
        };
        self.i += code.len_utf8();
        if let Some(&decoded) = NAMED_ESCAPES.get(&code) {
            out.push(decoded);
            return Ok(());
        }
        match code {
            'u' => self.read_unicode_escape(start, 4, out, handler),
            'U' => self.read_unicode_escape(start, 8, out, handler),
            _ => {
                self.report(
                    handler,
                    ErrorCode::InvalidEscape,
                    format!("Invalid escape sequence '\\{code}'"),
                    start,
                    self.i,
                )?;
                out.push_str(&self.input[start..self.i]);
                Ok(())
            }
        }
    }

    fn read_unicode_escape(
        &mut self,
        start: usize,
        width: usize,
        out: &mut String,
        handler: &mut dyn ErrorHandler,
    ) -> Result<()> {
        let (value, count) = self.read_hex_digits(width);
        if count < width {
            return self.report(
                handler,
                ErrorCode::TooShortUnicodeEscape,
                format!("Unicode escape needs {width} hex digits, found {count}"),
                start,
                self.i,
            );
        }
        if width == 4 && (0xD800..=0xDBFF).contains(&value) && self.peek_str("\\u") {
            let save = self.i;
            self.i += 2;
            let (low, n) = self.read_hex_digits(4);
            if n == 4 && (0xDC00..=0xDFFF).contains(&low) {
                let scalar = 0x10000 + ((value - 0xD800) << 10) + (low - 0xDC00);
                if let Some(c) = char::from_u32(scalar) {
                    out.push(c);
                    return Ok(());
                }
            }
            self.i = save;
        }
        match char::from_u32(value) {
            Some(c) => {
                out.push(c);
                Ok(())
            }
            None => self.report(
                handler,
                ErrorCode::InvalidUnicodeEscape,
                format!("'{}' is not a valid unicode scalar", &self.input[start..self.i]),
                start,
                self.i,
            ),
        }
    }

    fn read_hex_digits(&mut self, max: usize) -> (u32, usize) {
        let mut value = 0u32;
        let mut count = 0usize;
        while count < max {
            match self.peek_char().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    value = value * 16 + d;
                    self.i += 1;
                    count += 1;
                }
                None => break,
            }
        }
        (value, count)
    }
}
