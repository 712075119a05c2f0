// Parser state machine states, shared by the scalar and SIMD parsers.

/// Position of the parser within the current field/row.
///
/// The scalar and SIMD parsers both drive this exact state set; keeping
/// it in one place is what lets the equivalence tests assert on a shared
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// At the first byte of a field.
    FieldStart,
    /// Inside an unquoted field.
    InField,
    /// Inside the body of a quoted field.
    InQuotedField,
    /// Saw a quote while in a quoted field; next byte decides escape vs close.
    QuoteInQuote,
    /// Consuming the remainder of a comment line.
    FieldEnd,
}
