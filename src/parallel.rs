// Splits the input via the chunker, parses each
// chunk on rayon's worker pool, and merges results in chunk-index order so
// the result is output-equivalent to a sequential scalar parse.

use rayon::prelude::*;

use crate::chunker;
use crate::config::Config;
use crate::parser::Parser;

/// Below this input size, `parse_parallel` falls back to a sequential
/// scalar parse rather than paying thread-spawn overhead.
pub const MIN_FILE_SIZE: usize = 2 * 1024 * 1024;

const MB: usize = 1024 * 1024;

/// Thread count for a given input size and CPU count. Scales up with
/// input size but caps at 8 to avoid pathological allocator contention.
pub fn thread_count(input_len: usize, n_cpus: usize) -> usize {
    let mb = input_len / MB;
    if input_len < 2 * MB {
        1
    } else if mb < 5 {
        2.min(n_cpus)
    } else if mb < 10 {
        4.min(n_cpus)
    } else if mb < 50 {
        (n_cpus / 2).max(4).min(8)
    } else {
        n_cpus.min(8)
    }
}

fn available_cpus() -> usize {
    std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// Parses `input` using the parallel strategy when large enough, else
/// falls back to sequential scalar parsing. Returns the merged Parser and
/// whether every chunk parsed successfully.
pub fn parse_parallel(input: &[u8], config: Config) -> (Parser, bool) {
    let n_cpus = available_cpus();
    let threads = thread_count(input.len(), n_cpus);

    if threads <= 1 {
        log::debug!("parse_parallel: {} bytes below parallel threshold, running sequential", input.len());
        let mut p = match Parser::with_config(config) {
            Ok(p) => p,
            Err(_) => Parser::new(),
        };
        let ok = p.parse(input);
        return (p, ok);
    }

    let quote = config.quote;
    let raw_chunks = chunker::chunks(input, threads, quote);

    let total: usize = raw_chunks.iter().map(|c| c.len()).sum();
    if total != input.len() {
        log::warn!("parse_parallel: chunker produced {} bytes for a {}-byte input, falling back to sequential", total, input.len());
        let mut p = match Parser::with_config(config) {
            Ok(p) => p,
            Err(_) => Parser::new(),
        };
        let ok = p.parse(input);
        return (p, ok);
    }

    if raw_chunks.len() <= 1 {
        log::debug!("parse_parallel: no safe chunk boundary found, running sequential");
        let mut p = match Parser::with_config(config) {
            Ok(p) => p,
            Err(_) => Parser::new(),
        };
        let ok = p.parse(input);
        return (p, ok);
    }

    log::debug!("parse_parallel: splitting {} bytes into {} chunks on {} threads", input.len(), raw_chunks.len(), threads);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build();

    let results: Vec<(Vec<Vec<Vec<u8>>>, bool)> = match pool {
        Ok(pool) => pool.install(|| run_chunks(&raw_chunks, &config)),
        Err(e) => {
            log::warn!("parse_parallel: failed to build a {}-thread pool ({}), using the default pool", threads, e);
            run_chunks(&raw_chunks, &config)
        }
    };

    let row_capacity: usize = results.iter().map(|(rows, _)| rows.len()).sum();
    let mut merged = match Parser::with_config(config) {
        Ok(p) => p,
        Err(_) => Parser::new(),
    };
    merged.all_rows.reserve(row_capacity);

    let mut all_ok = true;
    for (rows, ok) in results {
        if !ok {
            all_ok = false;
        }
        merged.all_rows.extend(rows);
    }

    if !all_ok && merged.last_error().code == crate::error::ErrorKind::None {
        merged.record(
            crate::error::ErrorKind::UnterminatedQuote,
            b"one or more chunks failed to parse",
            b"",
        );
    }

    (merged, all_ok)
}

fn run_chunks(raw_chunks: &[&[u8]], config: &Config) -> Vec<(Vec<Vec<Vec<u8>>>, bool)> {
    raw_chunks
        .par_iter()
        .map(|chunk| {
            let mut worker = match Parser::with_config(config.clone()) {
                Ok(p) => p,
                Err(_) => Parser::new(),
            };
            let ok = worker.parse(chunk);
            (worker.all_rows().to_vec(), ok)
        })
        .collect()
}
