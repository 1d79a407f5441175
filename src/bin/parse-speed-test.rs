//! Feeds an APRS-IS log from stdin through the parser and reports the
//! parse rate plus a histogram of error codes. Log lines carry a leading
//! unix-timestamp column which is stripped; `#` comment lines are skipped.
//!
//! `-e CODE` additionally prints every packet that fails with the given
//! error code.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::time::Instant;

use aprs_fap::{parse, ErrorCode};

fn main() -> ExitCode {
    let mut filter_error: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-e" | "-error" | "--error" => match args.next() {
                Some(code) => filter_error = Some(code),
                None => {
                    eprintln!("{} requires an error code argument", arg);
                    return ExitCode::FAILURE;
                }
            },
            other => {
                eprintln!("unknown flag: {}", other);
                eprintln!("Usage: parse-speed-test [-e CODE] < aprsis.log");
                return ExitCode::FAILURE;
            }
        }
    }

    let stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();

    let mut ok: u64 = 0;
    let mut unsupported: u64 = 0;
    let mut failed: u64 = 0;
    let mut err_counts: HashMap<String, u64> = HashMap::new();

    let start = Instant::now();

    let mut raw = Vec::new();
    let mut reader = stdin;
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("read error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        while raw.last() == Some(&b'\n') || raw.last() == Some(&b'\r') {
            raw.pop();
        }

        // strip the unix-timestamp column
        let Some(idx) = raw.iter().position(|&b| b == b' ') else {
            failed += 1;
            *err_counts.entry("no space in line".to_string()).or_default() += 1;
            continue;
        };
        let packet = &raw[idx + 1..];

        if packet.first() == Some(&b'#') {
            continue;
        }

        match parse(packet) {
            Ok(_) => ok += 1,
            Err(err) => {
                if err.code == ErrorCode::TypeNotSupported {
                    unsupported += 1;
                } else {
                    failed += 1;
                }
                *err_counts.entry(err.code.as_str().to_string()).or_default() += 1;

                if filter_error.as_deref() == Some(err.code.as_str()) {
                    let _ = writeln!(
                        stdout,
                        "{} [{}]",
                        String::from_utf8_lossy(packet),
                        err
                    );
                }
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let total = ok + unsupported + failed;
    let rate = if elapsed > 0.0 {
        total as f64 / elapsed
    } else {
        0.0
    };

    let _ = writeln!(
        stdout,
        "Parsed {} packets in {:.3} seconds ({:.0} packets/sec)",
        total, elapsed, rate
    );
    let _ = writeln!(
        stdout,
        "  OK: {} ({} unsupported), Failed: {}",
        ok + unsupported,
        unsupported,
        failed
    );

    if !err_counts.is_empty() {
        let mut entries: Vec<(String, u64)> = err_counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let _ = writeln!(stdout, "\nError summary ({} unique errors):", entries.len());
        for (code, count) in entries {
            let _ = writeln!(stdout, "  {:6}  {}", count, code);
        }
    }

    ExitCode::SUCCESS
}
