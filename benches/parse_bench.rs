// Standalone Rust benchmark for CSV parsing strategies
//
// Run: cargo bench --bench parse_bench
//
// Compares scalar vs SIMD vs parallel parsing across several input shapes
// and sizes.

use std::time::{Duration, Instant};

use ocsv_core::{parallel, Config, Parser};

fn generate_clean_csv(num_rows: usize, fields_per_row: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..num_rows {
        for j in 0..fields_per_row {
            if j > 0 {
                out.push(b',');
            }
            out.extend_from_slice(format!("field_{}_{}_value", i, j).as_bytes());
        }
        out.push(b'\n');
    }
    out
}

fn generate_quoted_csv(num_rows: usize, fields_per_row: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..num_rows {
        for j in 0..fields_per_row {
            if j > 0 {
                out.push(b',');
            }
            match j % 4 {
                0 => out.extend_from_slice(format!("plain_{}", i).as_bytes()),
                1 => {
                    out.push(b'"');
                    out.extend_from_slice(format!("has,comma_{}", i).as_bytes());
                    out.push(b'"');
                }
                2 => {
                    out.push(b'"');
                    out.extend_from_slice(format!("has\"\"quote_{}", i).as_bytes());
                    out.push(b'"');
                }
                _ => {
                    out.push(b'"');
                    out.extend_from_slice(format!("has\nnewline_{}", i).as_bytes());
                    out.push(b'"');
                }
            }
        }
        out.push(b'\n');
    }
    out
}

struct BenchResult {
    name: String,
    iterations: u64,
    total_time: Duration,
    input_size: usize,
}

impl BenchResult {
    fn avg_ns(&self) -> f64 {
        self.total_time.as_nanos() as f64 / self.iterations as f64
    }

    fn throughput_mb_s(&self) -> f64 {
        let bytes_per_iter = self.input_size as f64;
        let secs_per_iter = self.avg_ns() / 1_000_000_000.0;
        bytes_per_iter / secs_per_iter / 1_000_000.0
    }
}

fn bench_fn<F: Fn() -> usize>(name: &str, input_size: usize, f: F, warmup_secs: f64, bench_secs: f64) -> BenchResult {
    let warmup_deadline = Instant::now() + Duration::from_secs_f64(warmup_secs);
    while Instant::now() < warmup_deadline {
        let _ = f();
    }

    let mut iterations: u64 = 0;
    let start = Instant::now();
    let deadline = start + Duration::from_secs_f64(bench_secs);
    while Instant::now() < deadline {
        let _ = f();
        iterations += 1;
    }
    let total_time = start.elapsed();

    BenchResult {
        name: name.to_string(),
        iterations,
        total_time,
        input_size,
    }
}

fn print_results(results: &[BenchResult]) {
    let max_name_len = results.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let fastest_ns = results.iter().map(|r| r.avg_ns()).fold(f64::MAX, f64::min);

    for r in results {
        let avg = r.avg_ns();
        let speedup = avg / fastest_ns;
        let marker = if (speedup - 1.0).abs() < 0.01 { " (fastest)" } else { "" };
        println!(
            "  {:<width$}  {:>10.2} µs/iter  {:>8.1} MB/s  {:>6.2}x{}",
            r.name,
            avg / 1000.0,
            r.throughput_mb_s(),
            speedup,
            marker,
            width = max_name_len,
        );
    }
}

fn run_benchmark_suite(label: &str, input: &[u8], warmup: f64, time: f64) {
    println!("\n--- {} ({} bytes) ---", label, input.len());

    let scalar_rows = {
        let mut p = Parser::new();
        p.parse(input);
        p.row_count()
    };
    let simd_rows = {
        let mut p = Parser::new();
        p.parse_simd(input);
        p.row_count()
    };
    let (parallel_parser, parallel_ok) = parallel::parse_parallel(input, Config::default());
    assert!(parallel_ok, "parallel parse failed for {}", label);
    assert_eq!(scalar_rows, simd_rows, "scalar/SIMD row count mismatch for {}", label);
    assert_eq!(scalar_rows, parallel_parser.row_count(), "scalar/parallel row count mismatch for {}", label);
    println!("  Output: {} rows (all strategies agree)", scalar_rows);

    let results = vec![
        bench_fn("Scalar", input.len(), || {
            let mut p = Parser::new();
            p.parse(input);
            p.row_count()
        }, warmup, time),
        bench_fn("SIMD", input.len(), || {
            let mut p = Parser::new();
            p.parse_auto(input);
            p.row_count()
        }, warmup, time),
        bench_fn("Parallel", input.len(), || {
            let (p, _) = parallel::parse_parallel(input, Config::default());
            p.row_count()
        }, warmup, time),
    ];

    print_results(&results);
}

fn main() {
    env_logger::init();
    println!("=== ocsv-core Parsing Benchmark ===");
    println!("Strategies: Scalar, SIMD (auto-selected), Parallel (rayon chunked)");
    println!("Set RUST_LOG=ocsv_core=debug to see chunking/fallback decisions.");

    let warmup = 0.5;
    let time = 2.0;

    let small_clean = generate_clean_csv(1_000, 10);
    run_benchmark_suite("1K rows x 10 fields (clean)", &small_clean, warmup, time);

    let medium_clean = generate_clean_csv(50_000, 10);
    run_benchmark_suite("50K rows x 10 fields (clean)", &medium_clean, warmup, time);

    let medium_quoted = generate_quoted_csv(50_000, 8);
    run_benchmark_suite("50K rows x 8 fields (quoted/escaped)", &medium_quoted, warmup, time);

    let large_clean = generate_clean_csv(500_000, 10);
    run_benchmark_suite("500K rows x 10 fields (clean, exercises parallel path)", &large_clean, warmup, time);

    println!("\n=== Done ===");
}
