//! Criterion benchmarks for test synthesis
//!
//! Covers: Playwright generation over traces of growing size and
//! selector conversion for typical recorded paths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use staktrak::capture::trace::{
    Assertion, AssertionKind, ClickDetail, InputAction, InputChange, Trace,
};
use staktrak::codegen::{convert_to_playwright_selector, generate_playwright_test};

const URL: &str = "https://app.test/";

/// Trace with `count` clicks, and typing bursts on a handful of fields
fn generate_trace(count: usize) -> Trace {
    let mut trace = Trace::started_at(0);
    trace.user_info.window_size = (1280, 720);

    for i in 0..count {
        let at = (i as u64) * 150;
        trace.clicks.push(ClickDetail::new(
            (i % 800) as f64,
            (i % 600) as f64,
            format!("html > body > div#app > main > button.btn-{}", i % 7),
            at,
        ));

        let field = format!("#field-{}", i % 5);
        let action = if i % 4 == 3 {
            InputAction::Complete
        } else {
            InputAction::Intermediate
        };
        trace
            .input_changes
            .push(InputChange::new(field, "x".repeat(i % 20 + 1), at + 40, action));

        if i % 10 == 0 {
            trace.assertions.push(Assertion {
                kind: AssertionKind::HasText,
                selector: format!("h2.title-{}", i % 3),
                value: format!("Heading {}", i),
                timestamp: at + 80,
            });
        }
    }
    trace
}

// ---------------------------------------------------------------------------
// Generation benchmarks
// ---------------------------------------------------------------------------

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_playwright_test");

    for count in [10, 100, 1000] {
        let trace = generate_trace(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &trace, |b, trace| {
            b.iter(|| generate_playwright_test(black_box(URL), black_box(trace)));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Selector benchmarks
// ---------------------------------------------------------------------------

fn bench_selector(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert_to_playwright_selector");

    let cases = [
        ("simple", "#submit"),
        ("testid", "html > body > div > [data-testid=\"save\"]"),
        ("placeholder", "input[placeholder=\"Search bounties\"]"),
        (
            "compound",
            "html > body > div.layout > section.panel > div.toolbar-menu > span",
        ),
        ("text", "text=Preview"),
    ];

    for (name, raw) in cases {
        group.bench_with_input(BenchmarkId::new("case", name), &raw, |b, raw| {
            b.iter(|| convert_to_playwright_selector(black_box(raw)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_selector);
criterion_main!(benches);
