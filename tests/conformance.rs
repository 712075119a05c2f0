// Cross-strategy equivalence and end-to-end scenario tests.
//
// Exercises the literal scenarios and boundary behaviors named in the
// testable-properties section: scalar, SIMD, and parallel parsing must
// agree on every input, and the packed buffer must round-trip.

use ocsv_core::error::{ErrorKind, RecoveryPolicy};
use ocsv_core::{parse_parallel, Config, Parser};

fn rows_as_strings(rows: &[Vec<Vec<u8>>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|f| String::from_utf8_lossy(f).to_string()).collect())
        .collect()
}

fn all_three_agree(input: &[u8], config: Config) -> (bool, Vec<Vec<String>>) {
    let mut scalar = Parser::with_config(config.clone()).unwrap();
    let scalar_ok = scalar.parse(input);

    let mut simd = Parser::with_config(config.clone()).unwrap();
    let simd_ok = simd.parse_simd(input);

    assert_eq!(scalar_ok, simd_ok, "scalar/simd success mismatch for {:?}", input);
    assert_eq!(
        rows_as_strings(scalar.all_rows()),
        rows_as_strings(simd.all_rows()),
        "scalar/simd rows mismatch for {:?}",
        input
    );
    assert_eq!(scalar.last_error().code, simd.last_error().code);

    (scalar_ok, rows_as_strings(scalar.all_rows()))
}

#[test]
fn scenario_basic_csv() {
    let (ok, rows) = all_three_agree(b"a,b,c\n1,2,3\n", Config::default());
    assert!(ok);
    assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
}

#[test]
fn scenario_doubled_quote_escape() {
    let (ok, rows) = all_three_agree(b"\"He said \"\"Hi\"\"\",world\n", Config::default());
    assert!(ok);
    assert_eq!(rows, vec![vec!["He said \"Hi\"", "world"]]);
}

#[test]
fn scenario_quoted_comma_and_embedded_newline() {
    let (ok, rows) = all_three_agree(b"\"a,b\",\"c\nd\"\n", Config::default());
    assert!(ok);
    assert_eq!(rows, vec![vec!["a,b", "c\nd"]]);
}

#[test]
fn scenario_comment_line() {
    let mut cfg = Config::default();
    cfg.comment = b'#';
    let (ok, rows) = all_three_agree(b"# comment\na,b\n", cfg);
    assert!(ok);
    assert_eq!(rows, vec![vec!["a", "b"]]);
}

#[test]
fn scenario_unterminated_quote_fails_strict() {
    let mut p = Parser::new();
    let ok = p.parse(b"\"unterminated");
    assert!(!ok);
    assert_eq!(p.last_error().code, ErrorKind::UnterminatedQuote);

    let mut simd = Parser::new();
    let simd_ok = simd.parse_simd(b"\"unterminated");
    assert!(!simd_ok);
    assert_eq!(simd.last_error().code, ErrorKind::UnterminatedQuote);
}

#[test]
fn scenario_invalid_character_after_quote_fails_strict() {
    let (ok, _) = all_three_agree(b"\"quoted\"x,y\n", Config::default());
    assert!(!ok);
}

#[test]
fn scenario_invalid_character_after_quote_recovers_relaxed() {
    let mut cfg = Config::default();
    cfg.relaxed = true;
    let (ok, rows) = all_three_agree(b"\"quoted\"x,y\n", cfg);
    assert!(ok);
    assert_eq!(rows, vec![vec!["quotedx", "y"]]);
}

#[test]
fn boundary_empty_input() {
    let (ok, rows) = all_three_agree(b"", Config::default());
    assert!(ok);
    assert!(rows.is_empty());
}

#[test]
fn boundary_lone_lf() {
    let (ok, rows) = all_three_agree(b"\n", Config::default());
    assert!(ok);
    assert!(rows.is_empty());
}

#[test]
fn boundary_single_field_no_lf() {
    let (ok, rows) = all_three_agree(b"a", Config::default());
    assert!(ok);
    assert_eq!(rows, vec![vec!["a"]]);
}

#[test]
fn boundary_trailing_delimiter() {
    let (ok, rows) = all_three_agree(b"a,", Config::default());
    assert!(ok);
    assert_eq!(rows, vec![vec!["a", ""]]);
}

#[test]
fn boundary_leading_delimiter() {
    let (ok, rows) = all_three_agree(b",a", Config::default());
    assert!(ok);
    assert_eq!(rows, vec![vec!["", "a"]]);
}

#[test]
fn boundary_two_rows() {
    let (ok, rows) = all_three_agree(b"a\nb", Config::default());
    assert!(ok);
    assert_eq!(rows, vec![vec!["a"], vec!["b"]]);
}

#[test]
fn parallel_matches_scalar_on_large_input() {
    let mut data = Vec::new();
    for i in 0..300_000 {
        data.extend_from_slice(format!("id{},name{},value{}\n", i, i, i * 2).as_bytes());
    }

    let mut scalar = Parser::new();
    scalar.parse(&data);

    let (parallel, ok) = parse_parallel(&data, Config::default());
    assert!(ok);
    assert_eq!(parallel.row_count(), scalar.row_count());
    assert_eq!(rows_as_strings(parallel.all_rows()), rows_as_strings(scalar.all_rows()));
}

#[test]
fn packed_buffer_scenario() {
    let mut p = Parser::new();
    p.parse(b"a,b\n1,2\n");
    let buf = ocsv_core::packed::pack(&mut p);

    assert_eq!(&buf[0..4], &[0x53, 0x56, 0x43, 0x4F]);
    assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 1);
    assert_eq!(u32::from_le_bytes(buf[8..12].try_into().unwrap()), 2);
    assert_eq!(u32::from_le_bytes(buf[12..16].try_into().unwrap()), 2);

    let decoded = ocsv_core::packed::decode(&buf).expect("valid packed buffer");
    assert_eq!(rows_as_strings(&decoded), rows_as_strings(p.all_rows()));
}

#[test]
fn skip_row_recovery_policy_discards_bad_row_only() {
    let mut cfg = Config::default();
    cfg.recovery_policy = RecoveryPolicy::SkipRow;
    let mut p = Parser::with_config(cfg).unwrap();
    let ok = p.parse(b"good1,row1\n\"bad\"x,row\ngood2,row2\n");
    assert!(ok);
    assert_eq!(
        rows_as_strings(p.all_rows()),
        vec![vec!["good1", "row1"], vec!["good2", "row2"]]
    );
    assert_eq!(p.error_count(), 1);
}

#[test]
fn collect_all_errors_stops_after_max_errors() {
    let mut cfg = Config::default();
    cfg.recovery_policy = RecoveryPolicy::CollectAllErrors { max_errors: 1 };
    let mut p = Parser::with_config(cfg).unwrap();
    let input = b"\"bad\"1,x\n\"bad\"2,y\n\"bad\"3,z\n";
    let ok = p.parse(input);
    assert!(!ok);
    assert_eq!(p.error_count(), 2);
}

#[test]
fn custom_delimiter_and_quote() {
    let mut cfg = Config::default();
    cfg.delimiter = b';';
    cfg.quote = b'\'';
    let (ok, rows) = all_three_agree(b"a;'b;c';d\n", cfg);
    assert!(ok);
    assert_eq!(rows, vec![vec!["a", "b;c", "d"]]);
}
