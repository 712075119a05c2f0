// Splits an input buffer into row-aligned chunks for the
// parallel parser, tracking quote state from each chunk's own start so a
// boundary never lands inside a quoted field.

/// Minimum chunk size honored per thread; the orchestrator reduces `n` to
/// respect this rather than producing chunks smaller than this.
pub const MIN_CHUNK_SIZE: usize = 512 * 1024;

/// Splits `input` into up to `n` contiguous, row-aligned sub-slices whose
/// concatenation is exactly `input`. Falls back to fewer, larger chunks
/// when no safe boundary can be found for a prospective split.
pub fn chunks<'a>(input: &'a [u8], n: usize, quote: u8) -> Vec<&'a [u8]> {
    if n <= 1 || input.is_empty() {
        return vec![input];
    }

    let approx = input.len() / n;
    let mut result = Vec::with_capacity(n);
    let mut start = 0usize;

    for _ in 0..n - 1 {
        if start >= input.len() {
            break;
        }
        let target = start + approx;
        match safe_boundary(input, start, target, quote) {
            Some(boundary) => {
                result.push(&input[start..boundary]);
                start = boundary;
            }
            None => {
                log::debug!("chunker: no safe boundary past offset {}, emitting {} of {} requested chunks", target, result.len() + 1, n);
                break;
            }
        }
    }

    if start < input.len() {
        result.push(&input[start..]);
    }

    result
}

/// Finds the offset just past the first LF/CRLF at or after `from`, that
/// is not inside a quoted field, where quote state is tracked starting
/// from `chunk_start` (not from the head of the whole buffer).
fn safe_boundary(input: &[u8], chunk_start: usize, from: usize, quote: u8) -> Option<usize> {
    let mut in_quotes = false;
    let mut pos = chunk_start;

    // Establish quote parity up to `from` first, then keep scanning for
    // the next out-of-quotes LF from there.
    while pos < input.len() {
        let byte = input[pos];
        if byte == quote {
            if pos + 1 < input.len() && input[pos + 1] == quote {
                pos += 2;
                continue;
            }
            in_quotes = !in_quotes;
            pos += 1;
            continue;
        }
        if pos >= from && byte == b'\n' && !in_quotes {
            return Some(pos + 1);
        }
        pos += 1;
    }

    None
}

/// Recommended chunk count given input size and available CPUs, honoring
/// `MIN_CHUNK_SIZE`.
pub fn recommended_chunk_count(input_len: usize, n_cpus: usize) -> usize {
    let by_size = (input_len / MIN_CHUNK_SIZE).max(1);
    n_cpus.max(1).min(by_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_equals_input_for_any_n() {
        let input = b"a,b\nc,d\ne,f\ng,h\n".to_vec();
        for n in 1..=8 {
            let parts = chunks(&input, n, b'"');
            let joined: Vec<u8> = parts.iter().flat_map(|s| s.iter().copied()).collect();
            assert_eq!(joined, input, "n={n}");
        }
    }

    #[test]
    fn empty_input_yields_one_empty_chunk() {
        let parts = chunks(b"", 4, b'"');
        assert_eq!(parts, vec![&b""[..]]);
    }

    #[test]
    fn n_equal_one_yields_single_chunk() {
        let input = b"a,b\nc,d\n";
        let parts = chunks(input, 1, b'"');
        assert_eq!(parts, vec![&input[..]]);
    }

    #[test]
    fn boundary_never_lands_inside_quotes() {
        // A quoted field spanning the natural split point forces the
        // boundary to move past the field's closing quote and newline.
        let input = b"a,b\nc,\"this is a long quoted field that spans the split\"\nd,e\n".to_vec();
        let parts = chunks(&input, 2, b'"');
        let joined: Vec<u8> = parts.iter().flat_map(|s| s.iter().copied()).collect();
        assert_eq!(joined, input);

        for part in &parts {
            let mut in_quotes = false;
            for &b in part.iter() {
                if b == b'"' {
                    in_quotes = !in_quotes;
                }
            }
            assert!(!in_quotes, "chunk ended inside a quoted field: {:?}", String::from_utf8_lossy(part));
        }
    }

    #[test]
    fn falls_back_to_one_chunk_when_no_safe_boundary_exists() {
        // No LF anywhere past the midpoint inside a single giant quoted field.
        let mut input = vec![b'"'];
        input.extend(std::iter::repeat(b'x').take(100));
        input.push(b'"');
        input.push(b'\n');
        let parts = chunks(&input, 4, b'"');
        let joined: Vec<u8> = parts.iter().flat_map(|s| s.iter().copied()).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn recommended_chunk_count_respects_min_chunk_size() {
        assert_eq!(recommended_chunk_count(100, 8), 1);
        assert_eq!(recommended_chunk_count(MIN_CHUNK_SIZE * 3, 8), 3);
        assert_eq!(recommended_chunk_count(MIN_CHUNK_SIZE * 20, 8), 8);
    }
}
