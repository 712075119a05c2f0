// Same state machine as the scalar parser, but uses the
// byte scanner to skip whole unquoted/quoted runs at once instead of
// branching byte-by-byte. Must be observably identical to `Parser::parse`.

use crate::error::{ErrorKind, RecoveryPolicy};
use crate::parser::{Flow, Parser};
use crate::scanner;
use crate::state::ParseState;

/// Minimum input size, on architectures without native 16-byte SIMD, below
/// which the bulk-copy overhead isn't worth it and the scalar byte loop
/// runs instead. On SIMD-capable targets the SIMD path always runs.
const SIMD_MIN_LEN: usize = 1024;

/// One of four classes every byte falls into; built once per parse so the
/// inner loop is a single indexed load instead of four comparisons.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ByteClass {
    Normal,
    Delimiter,
    Quote,
    Newline,
    Cr,
}

struct ClassTable([ByteClass; 256]);

impl ClassTable {
    fn build(delimiter: u8, quote: u8) -> Self {
        let mut table = [ByteClass::Normal; 256];
        table[delimiter as usize] = ByteClass::Delimiter;
        table[quote as usize] = ByteClass::Quote;
        table[b'\n' as usize] = ByteClass::Newline;
        table[b'\r' as usize] = ByteClass::Cr;
        ClassTable(table)
    }

    #[inline]
    fn classify(&self, b: u8) -> ByteClass {
        self.0[b as usize]
    }
}

/// Returns true when the SIMD path should be used for this input size on
/// this build. `cfg!(target_feature = ...)` is resolved at compile time for
/// the architectures the byte scanner accelerates; below that width, or on
/// short inputs, the scalar byte loop already wins.
pub fn should_use_simd(input_len: usize) -> bool {
    if cfg!(any(target_arch = "x86_64", target_arch = "aarch64")) {
        true
    } else {
        input_len >= SIMD_MIN_LEN
    }
}

/// Appends `input[pos..end]` to the parser's field buffer, dropping any CR
/// bytes in the range (CR is always a skip per the resolved Open Question).
/// Uses a raw `extend_from_slice` fast path when no CR is present.
fn bulk_append_cr_filtered(parser: &mut Parser, input: &[u8], pos: usize, end: usize) {
    let span = &input[pos..end];
    if !span.contains(&b'\r') {
        parser.field_buffer.extend_from_slice(span);
    } else {
        parser.field_buffer.extend(span.iter().copied().filter(|&b| b != b'\r'));
    }
}

impl Parser {
    /// SIMD-accelerated counterpart to `parse`. Produces byte-identical
    /// `all_rows`, success/failure, and `ErrorKind` to `Parser::parse` for
    /// the same input and config.
    pub fn parse_simd(&mut self, input: &[u8]) -> bool {
        self.reset();

        if input.is_empty() {
            return true;
        }

        let quote = self.config.quote;
        let delim = self.config.delimiter;
        let comment = self.config.comment;
        let classes = ClassTable::build(delim, quote);
        let len = input.len();
        let mut pos = 0usize;

        while pos < len {
            match self.state {
                ParseState::InField => {
                    let (next, which) = scanner::find_any2(input, delim, b'\n', pos);
                    let end = if next < 0 { len } else { next as usize };
                    bulk_append_cr_filtered(self, input, pos, end);
                    self.column_number += (end - pos) as i64;
                    pos = end;
                    if next < 0 {
                        continue;
                    }
                    if which == delim {
                        self.emit_field();
                        self.state = ParseState::FieldStart;
                    } else {
                        self.emit_field();
                        self.emit_row();
                        self.state = ParseState::FieldStart;
                    }
                    self.column_number += 1;
                    pos += 1;
                    continue;
                }
                ParseState::InQuotedField => {
                    let next = scanner::find(input, quote, pos);
                    let end = if next < 0 { len } else { next as usize };
                    bulk_append_cr_filtered(self, input, pos, end);
                    self.column_number += (end - pos) as i64;
                    pos = end;
                    if next < 0 {
                        continue;
                    }
                    self.state = ParseState::QuoteInQuote;
                    self.column_number += 1;
                    pos += 1;
                    continue;
                }
                _ => {}
            }

            let byte = input[pos];
            let class = classes.classify(byte);
            let mut advance = 1usize;

            match self.state {
                ParseState::FieldStart => match class {
                    ByteClass::Quote => self.state = ParseState::InQuotedField,
                    ByteClass::Delimiter => self.emit_empty_field(),
                    ByteClass::Newline => {
                        if !self.current_row.is_empty() || pos > 0 {
                            self.emit_empty_field();
                            self.emit_row();
                        }
                    }
                    ByteClass::Cr => {}
                    ByteClass::Normal => {
                        if comment != 0
                            && byte == comment
                            && self.current_row.is_empty()
                            && self.field_buffer.is_empty()
                        {
                            self.state = ParseState::FieldEnd;
                        } else {
                            if let Flow::Abort = self.append_checked(byte) {
                                return false;
                            }
                            self.state = ParseState::InField;
                        }
                    }
                },
                ParseState::QuoteInQuote => match class {
                    ByteClass::Quote => {
                        if let Flow::Abort = self.append_checked(quote) {
                            return false;
                        }
                        self.state = ParseState::InQuotedField;
                    }
                    ByteClass::Delimiter => {
                        self.emit_field();
                        self.state = ParseState::FieldStart;
                    }
                    ByteClass::Newline => {
                        self.emit_field();
                        self.emit_row();
                        self.state = ParseState::FieldStart;
                    }
                    ByteClass::Cr => {}
                    ByteClass::Normal => {
                        if self.config.relaxed {
                            // The closing quote already ended the quoted portion;
                            // only the stray byte joins the field, as unquoted data.
                            if let Flow::Abort = self.append_checked(byte) {
                                return false;
                            }
                            self.state = ParseState::InField;
                        } else {
                            match self.violate(
                                ErrorKind::InvalidCharacterAfterQuote,
                                b"unexpected byte after closing quote",
                            ) {
                                Flow::Abort => return false,
                                Flow::Continue => match self.config.recovery_policy {
                                    RecoveryPolicy::SkipRow => {
                                        let after = self.skip_to_after_lf(input, pos);
                                        advance = after - pos;
                                        self.state = ParseState::FieldStart;
                                    }
                                    // BestEffort/CollectAllErrors continue with
                                    // the same relaxed reinterpretation as above.
                                    _ => {
                                        if let Flow::Abort = self.append_checked(byte) {
                                            return false;
                                        }
                                        self.state = ParseState::InField;
                                    }
                                },
                            }
                        }
                    }
                },
                ParseState::FieldEnd => {
                    if class == ByteClass::Newline {
                        self.field_buffer.clear();
                        self.current_row.clear();
                        self.state = ParseState::FieldStart;
                    }
                }
                ParseState::InField | ParseState::InQuotedField => unreachable!(),
            }

            self.column_number += 1;
            pos += advance;
        }

        match self.state {
            ParseState::InField | ParseState::QuoteInQuote => {
                self.emit_field();
                self.emit_row();
            }
            ParseState::InQuotedField => {
                if self.config.relaxed {
                    self.emit_field();
                    self.emit_row();
                } else {
                    self.record(ErrorKind::UnterminatedQuote, b"quote never closed", b"");
                    return false;
                }
            }
            ParseState::FieldStart => {
                if !self.current_row.is_empty() {
                    self.emit_empty_field();
                    self.emit_row();
                }
            }
            ParseState::FieldEnd => {}
        }

        true
    }

    /// Dispatches to `parse_simd` or `parse`: unconditional on
    /// SIMD-capable architectures, else gated on input size.
    pub fn parse_auto(&mut self, input: &[u8]) -> bool {
        if should_use_simd(input.len()) {
            self.parse_simd(input)
        } else {
            self.parse(input)
        }
    }
}
