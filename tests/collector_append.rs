use std::io::Cursor;

use enose::collector::{CSV_HEADER, Collector, CsvLog, SessionControls, SessionInfo, read_identity};
use tempfile::tempdir;

fn info(session_id: &str) -> SessionInfo {
    SessionInfo {
        class: "planta".to_string(),
        sample_id: "manjericao_01".to_string(),
        note: "second session".to_string(),
        session_id: session_id.to_string(),
    }
}

fn run_session(path: &std::path::Path, input: &[u8], session_id: &str) -> Vec<usize> {
    let log = CsvLog::open_append(path).unwrap();
    let mut collector = Collector::new(
        Cursor::new(input.to_vec()),
        log,
        info(session_id),
        SessionControls::new(),
    );
    let mut counters = Vec::new();
    collector.run(|row| counters.push(row.counter)).unwrap();
    counters
}

#[test]
fn appending_preserves_prior_bytes_and_continues_counter() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("planta_manjericao_01.csv");
    let first = run_session(
        &path,
        b"24.5,51.2,1,2,3,4,5,6,7,8,9,10\n24.6,51.1,1,2,3,4,5,6,7,8,9,10\n",
        "20240501_100000",
    );
    assert_eq!(first, vec![1, 2]);
    let before = std::fs::read(&path).unwrap();

    let second = run_session(
        &path,
        b"25.0,50.0,11,12,13,14,15,16,17,18,19,20\n",
        "20240501_110000",
    );
    assert_eq!(second, vec![3]);

    let after = std::fs::read(&path).unwrap();
    assert_eq!(&after[..before.len()], &before[..]);
    let text = String::from_utf8(after).unwrap();
    assert_eq!(text.matches(&CSV_HEADER.join(",")).count(), 1);
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains(",20240501_110000,manjericao_01,planta,25.0,50.0,11,"));

    let identity = read_identity(&path).unwrap().unwrap();
    assert_eq!(identity.class, "planta");
    assert_eq!(identity.sample_id, "manjericao_01");
}

#[test]
fn short_lines_never_produce_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let full = "24.5,51.2,1,2,3,4,5,6,7,8,9,10";
    let mut input = String::new();
    for keep in 1..12 {
        let fields: Vec<&str> = full.split(',').take(keep).collect();
        input.push_str(&fields.join(","));
        input.push('\n');
    }
    let counters = run_session(&path, input.as_bytes(), "20240501_100000");
    assert!(counters.is_empty());
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, format!("{}\n", CSV_HEADER.join(",")));
}
