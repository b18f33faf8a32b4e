// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for spooler output parsing.  The completion tracker
// parses `lpstat -o` several times a second while a job is outstanding, so
// this is the hot path of the bridge.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use spoolward_bridge::cups::{parse_job_ids, parse_printer_lines};
use spoolward_bridge::windows::parse_printer_table;

/// Build an `lpstat -o` listing with `n` jobs spread over two printers.
fn lpstat_listing(n: usize) -> String {
    (0..n)
        .map(|i| {
            let dest = if i % 2 == 0 { "Kiosk" } else { "Kiosk-Receipt" };
            format!("{dest}-{i}   kiosk   10240   Mon 01 Jan 2026 10:00:00 AM UTC\n")
        })
        .collect()
}

fn bench_parse_job_ids(c: &mut Criterion) {
    let small = lpstat_listing(4);
    let large = lpstat_listing(500);

    c.bench_function("cups::parse_job_ids (4 jobs)", |b| {
        b.iter(|| parse_job_ids(black_box(&small), black_box("Kiosk")))
    });
    c.bench_function("cups::parse_job_ids (500 jobs)", |b| {
        b.iter(|| parse_job_ids(black_box(&large), black_box("Kiosk")))
    });
}

fn bench_printer_listing(c: &mut Criterion) {
    let lpstat_p: String = (0..50)
        .map(|i| format!("printer Printer_{i} is idle.  enabled since Mon 01 Jan 2026\n"))
        .collect();
    let win32: String = (0..50)
        .map(|i| format!("{}\tPrinter {i}\r\n", if i == 7 { "True" } else { "False" }))
        .collect();

    c.bench_function("cups::parse_printer_lines (50)", |b| {
        b.iter(|| parse_printer_lines(black_box(&lpstat_p)))
    });
    c.bench_function("windows::parse_printer_table (50)", |b| {
        b.iter(|| parse_printer_table(black_box(&win32)))
    });
}

criterion_group!(benches, bench_parse_job_ids, bench_printer_listing);
criterion_main!(benches);
