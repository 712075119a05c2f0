// Parser: scalar state machine plus incremental parse buffer, the central entity
// every other component operates on.

use crate::config::Config;
use crate::error::{ErrorInfo, ErrorKind, RecoveryPolicy};
use crate::state::ParseState;

/// Owns every byte and vector produced by a parse; nothing it returns
/// borrows from the input slice.
#[derive(Debug, Clone)]
pub struct Parser {
    pub config: Config,
    pub(crate) state: ParseState,
    pub(crate) field_buffer: Vec<u8>,
    pub(crate) current_row: Vec<Vec<u8>>,
    pub(crate) all_rows: Vec<Vec<Vec<u8>>>,
    pub(crate) line_number: i64,
    pub(crate) column_number: i64,
    pub(crate) last_error: ErrorInfo,
    pub(crate) error_count: u32,
    pub(crate) warnings: Vec<ErrorInfo>,
    packed_buffer: Vec<u8>,
    pub(crate) field_size_warned: bool,
}

pub(crate) enum Flow {
    Continue,
    Abort,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            config: Config::default(),
            state: ParseState::FieldStart,
            field_buffer: Vec::new(),
            current_row: Vec::new(),
            all_rows: Vec::new(),
            line_number: 1,
            column_number: 1,
            last_error: ErrorInfo::none(),
            error_count: 0,
            warnings: Vec::new(),
            packed_buffer: Vec::new(),
            field_size_warned: false,
        }
    }

    pub fn with_config(config: Config) -> Result<Self, &'static str> {
        config.validate()?;
        let mut p = Parser::new();
        p.config = config;
        Ok(p)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn all_rows(&self) -> &[Vec<Vec<u8>>] {
        &self.all_rows
    }

    pub fn row_count(&self) -> usize {
        self.all_rows.len()
    }

    pub fn field_count(&self, row: usize) -> Option<usize> {
        self.all_rows.get(row).map(|r| r.len())
    }

    pub fn field(&self, row: usize, field: usize) -> Option<&[u8]> {
        self.all_rows.get(row)?.get(field).map(|f| f.as_slice())
    }

    pub fn last_error(&self) -> &ErrorInfo {
        &self.last_error
    }

    pub fn has_error(&self) -> bool {
        self.last_error.code != ErrorKind::None
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn warnings(&self) -> &[ErrorInfo] {
        &self.warnings
    }

    pub fn packed_buffer(&self) -> &[u8] {
        &self.packed_buffer
    }

    pub fn set_packed_buffer(&mut self, buf: Vec<u8>) {
        self.packed_buffer = buf;
    }

    /// Rows in `[from_line, to_line]` (inclusive), resolving the
    /// `from_line`/`to_line` config fields as a post-parse filter. The
    /// core's state machine never consults these fields directly — see
    /// DESIGN.md's Open Questions resolution.
    pub fn rows_in_range(&self) -> &[Vec<Vec<u8>>] {
        let from = self.config.from_line.max(0) as usize;
        if from >= self.all_rows.len() {
            return &[];
        }
        let to = if self.config.to_line < 0 {
            self.all_rows.len() - 1
        } else {
            (self.config.to_line as usize).min(self.all_rows.len() - 1)
        };
        if to < from {
            return &[];
        }
        &self.all_rows[from..=to]
    }

    // ------------------------------------------------------------------
    // Error Surface
    // ------------------------------------------------------------------

    pub(crate) fn record(&mut self, code: ErrorKind, message: &[u8], context: &[u8]) {
        self.last_error = ErrorInfo::new(code, self.line_number, self.column_number, message, context);
        self.error_count += 1;
    }

    pub(crate) fn violate(&mut self, code: ErrorKind, message: &[u8]) -> Flow {
        self.record(code, message, b"");
        log::warn!(
            "parse error at line {}, column {}: {}",
            self.line_number,
            self.column_number,
            String::from_utf8_lossy(message)
        );
        match self.config.recovery_policy {
            RecoveryPolicy::FailFast => Flow::Abort,
            RecoveryPolicy::SkipRow => {
                self.field_buffer.clear();
                self.current_row.clear();
                Flow::Continue
            }
            RecoveryPolicy::BestEffort => {
                self.warnings.push(self.last_error.clone());
                Flow::Continue
            }
            RecoveryPolicy::CollectAllErrors { max_errors } => {
                if self.error_count > max_errors {
                    Flow::Abort
                } else {
                    self.warnings.push(self.last_error.clone());
                    Flow::Continue
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Parse Buffer
    // ------------------------------------------------------------------

    #[inline]
    pub fn append_byte(&mut self, b: u8) {
        self.field_buffer.push(b);
    }

    pub fn append_codepoint(&mut self, cp: u32) {
        let mut buf = [0u8; 4];
        if let Some(ch) = char::from_u32(cp) {
            let s = ch.encode_utf8(&mut buf);
            self.field_buffer.extend_from_slice(s.as_bytes());
        }
    }

    pub(crate) fn append_checked(&mut self, b: u8) -> Flow {
        if self.config.max_row_size > 0
            && self.field_buffer.len() as i64 >= self.config.max_row_size
        {
            if !self.field_size_warned {
                self.field_size_warned = true;
                if self.config.relaxed {
                    self.warnings.push(ErrorInfo::new(
                        ErrorKind::MaxFieldSizeExceeded,
                        self.line_number,
                        self.column_number,
                        b"field truncated at max_row_size",
                        b"",
                    ));
                    return Flow::Continue;
                }
                return self.violate(ErrorKind::MaxFieldSizeExceeded, b"field exceeds max_row_size");
            }
            return Flow::Continue;
        }
        self.append_byte(b);
        Flow::Continue
    }

    pub fn emit_field(&mut self) {
        let field = if self.config.trim {
            trim_ascii_whitespace(&self.field_buffer)
        } else {
            std::mem::take(&mut self.field_buffer)
        };
        self.current_row.push(field);
        self.field_buffer.clear();
        self.field_size_warned = false;
    }

    pub fn emit_empty_field(&mut self) {
        self.current_row.push(Vec::new());
        self.field_size_warned = false;
    }

    pub fn emit_row(&mut self) {
        let row = std::mem::take(&mut self.current_row);
        self.all_rows.push(row);
        self.line_number += 1;
        self.column_number = 1;
    }

    pub fn reset(&mut self) {
        self.current_row.clear();
        self.all_rows.clear();
        self.field_buffer.clear();
        self.packed_buffer.clear();
        self.warnings.clear();
        self.state = ParseState::FieldStart;
        self.line_number = 1;
        self.column_number = 1;
        self.last_error = ErrorInfo::none();
        self.error_count = 0;
        self.field_size_warned = false;
    }

    pub(crate) fn skip_to_after_lf(&self, input: &[u8], mut pos: usize) -> usize {
        while pos < input.len() && input[pos] != b'\n' {
            pos += 1;
        }
        if pos < input.len() {
            pos += 1;
        }
        pos
    }

    // ------------------------------------------------------------------
    // Scalar State Machine
    // ------------------------------------------------------------------

    /// Parses `input`, replacing any previously-parsed rows. Returns
    /// `true` on success (including a partial success under a recovery
    /// policy other than `FailFast`), `false` if parsing had to abort.
    pub fn parse(&mut self, input: &[u8]) -> bool {
        self.reset();

        if input.is_empty() {
            return true;
        }

        let quote = self.config.quote;
        let delim = self.config.delimiter;
        let comment = self.config.comment;
        let len = input.len();
        let mut pos = 0usize;

        while pos < len {
            let byte = input[pos];
            let mut advance = 1usize;

            match self.state {
                ParseState::FieldStart => {
                    if byte == quote {
                        self.state = ParseState::InQuotedField;
                    } else if byte == delim {
                        self.emit_empty_field();
                    } else if byte == b'\n' {
                        if !self.current_row.is_empty() {
                            self.emit_empty_field();
                            self.emit_row();
                        } else if pos > 0 {
                            self.emit_empty_field();
                            self.emit_row();
                        }
                    } else if byte == b'\r' {
                        // skip
                    } else if comment != 0
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
                ParseState::InField => {
                    if byte == delim {
                        self.emit_field();
                        self.state = ParseState::FieldStart;
                    } else if byte == b'\n' {
                        self.emit_field();
                        self.emit_row();
                        self.state = ParseState::FieldStart;
                    } else if byte == b'\r' {
                        // skip
                    } else if let Flow::Abort = self.append_checked(byte) {
                        return false;
                    }
                }
                ParseState::InQuotedField => {
                    if byte == quote {
                        self.state = ParseState::QuoteInQuote;
                    } else if byte == b'\r' {
                        // CR is always skipped, even inside quotes (resolved open question).
                    } else if let Flow::Abort = self.append_checked(byte) {
                        return false;
                    }
                }
                ParseState::QuoteInQuote => {
                    if byte == quote {
                        if let Flow::Abort = self.append_checked(quote) {
                            return false;
                        }
                        self.state = ParseState::InQuotedField;
                    } else if byte == delim {
                        self.emit_field();
                        self.state = ParseState::FieldStart;
                    } else if byte == b'\n' {
                        self.emit_field();
                        self.emit_row();
                        self.state = ParseState::FieldStart;
                    } else if byte == b'\r' {
                        // skip
                    } else if self.config.relaxed {
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
                                // BestEffort/CollectAllErrors continue with the
                                // same relaxed reinterpretation as above.
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
                ParseState::FieldEnd => {
                    if byte == b'\n' {
                        self.field_buffer.clear();
                        self.current_row.clear();
                        self.state = ParseState::FieldStart;
                    }
                    // other: skip, stay in FieldEnd
                }
            }

            self.column_number += 1;
            pos += advance;
        }

        // End-of-input handling.
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
}

fn trim_ascii_whitespace(buf: &[u8]) -> Vec<u8> {
    let start = buf.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(buf.len());
    let end = buf.iter().rposition(|b| !b.is_ascii_whitespace()).map(|i| i + 1).unwrap_or(start);
    buf[start..end].to_vec()
}
