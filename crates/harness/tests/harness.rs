use opentelemetry::KeyValue;
use parking_lot::Mutex;
use std::{
    io::{self, Write},
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
    time::{Duration, Instant},
};
use tally_harness::{Harness, HarnessConfig, HarnessError, RandomSource, ScriptedSource};
use tally_telemetry::{LogLevel, testing::RecordingSink};

/// Console writer whose output the test can read back.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(ToString::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn fast_config() -> HarnessConfig {
    HarnessConfig {
        tick_interval: Duration::ZERO,
        ..HarnessConfig::default()
    }
}

fn harness(sink: &Arc<RecordingSink>, config: &HarnessConfig) -> Harness<RecordingSink, ScriptedSource> {
    Harness::with_source(
        Arc::clone(sink),
        config,
        ScriptedSource::new([7, 7, 7, 7, 7, 7, 7, 1]),
    )
    .with_console(Box::new(io::sink()))
}

#[test]
fn test_units_nest_under_parent_in_order() {
    let sink = Arc::new(RecordingSink::new());
    let config = fast_config();
    let report = harness(&sink, &config).run(&config.units).unwrap();

    let names = report.units.iter().map(|u| u.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["first-child", "second-child", "third-child"]);
    assert!(report.units.iter().all(|u| u.ticks == 8 && u.total == 50));
    assert_eq!(report.total_ticks(), 24);

    let spans = sink.spans();
    let span_names = spans.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
    assert_eq!(
        span_names,
        vec!["parent", "first-child", "second-child", "third-child"]
    );

    let parent = &spans[0];
    assert_eq!(parent.parent, None);
    for child in &spans[1..] {
        assert_eq!(child.parent, Some(parent.id));
    }
    assert!(spans.iter().all(|s| s.ended));
}

#[test]
fn test_only_the_fault_unit_is_marked() {
    let sink = Arc::new(RecordingSink::new());
    let config = fast_config();
    let report = harness(&sink, &config).run(&config.units).unwrap();

    let faulted = report
        .units
        .iter()
        .filter(|u| u.faulted)
        .map(|u| u.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(faulted, vec!["second-child"]);

    let second = sink.span_named("second-child").unwrap();
    assert_eq!(
        second.attributes,
        vec![
            KeyValue::new("error", true),
            KeyValue::new("http.status_code", 401_i64)
        ]
    );
    assert_eq!(second.events.len(), 1);

    for name in ["parent", "first-child", "third-child"] {
        let span = sink.span_named(name).unwrap();
        assert!(span.attributes.is_empty(), "{} has attributes", name);
        assert!(span.events.is_empty(), "{} has events", name);
    }

    let errors = sink
        .logs()
        .into_iter()
        .filter(|(level, _)| *level == LogLevel::Error)
        .map(|(_, message)| message)
        .collect::<Vec<_>>();
    assert_eq!(errors, vec!["API failure detected in second-child"]);
}

#[test]
fn test_counter_and_flushes_across_units() {
    let sink = Arc::new(RecordingSink::new());
    let config = fast_config();
    let mut harness = harness(&sink, &config);
    assert_eq!(sink.gauge_count(), 1);

    harness.run(&config.units).unwrap();

    assert_eq!(sink.counter_total(), 150);
    assert_eq!(sink.flush_count(), 24);
    assert_eq!(harness.gauge().get(), 1);
    assert_eq!(sink.gauge_observations().len(), 24);
}

#[test]
fn test_console_line_per_tick() {
    let sink = Arc::new(RecordingSink::new());
    let console = SharedBuffer::default();
    let config = fast_config();

    let mut harness = harness(&sink, &config).with_console(Box::new(console.clone()));
    harness.run(&["first-child"]).unwrap();

    let lines = console.lines();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0], "Span: first-child\tDelta: 7\tCounter: 7");
    assert_eq!(lines[7], "Span: first-child\tDelta: 1\tCounter: 50");
}

#[test]
fn test_failing_flush_never_stalls_the_loop() {
    let sink = Arc::new(RecordingSink::new().with_failing_flush());
    let config = HarnessConfig {
        tick_interval: Duration::from_millis(10),
        ..HarnessConfig::default()
    };
    let mut harness = Harness::with_source(Arc::clone(&sink), &config, ScriptedSource::new([9]))
        .with_console(Box::new(io::sink()));

    let started = Instant::now();
    let report = harness.run(&["first-child"]).unwrap();
    let elapsed = started.elapsed();

    // 9, 18, 27, 36, 45, 54
    assert_eq!(report.units[0].ticks, 6);
    assert_eq!(sink.flush_count(), 6);
    assert!(elapsed >= Duration::from_millis(60));
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[test]
fn test_duplicate_units_rejected_before_any_telemetry() {
    let sink = Arc::new(RecordingSink::new());
    let config = fast_config();

    let result = harness(&sink, &config).run(&["first-child", "first-child"]);

    assert!(matches!(result, Err(HarnessError::InvalidUnit(_))));
    assert!(sink.spans().is_empty());
    assert!(sink.events().is_empty());
}

#[test]
fn test_empty_unit_list_still_closes_root_span() {
    let sink = Arc::new(RecordingSink::new());
    let config = fast_config();

    let report = harness(&sink, &config).run::<&str>(&[]).unwrap();

    assert!(report.units.is_empty());
    let spans = sink.spans();
    assert_eq!(spans.len(), 1);
    assert!(spans[0].ended);
}

#[test]
fn test_custom_root_span_and_status_code() {
    let sink = Arc::new(RecordingSink::new());
    let config = HarnessConfig {
        root_span: "batch".to_string(),
        fault_units: vec!["beta".to_string()],
        fault_status_code: 503,
        ..fast_config()
    };

    harness(&sink, &config).run(&["alpha", "beta"]).unwrap();

    assert!(sink.span_named("batch").is_some());
    let beta = sink.span_named("beta").unwrap();
    assert_eq!(
        beta.attribute("http.status_code"),
        Some(&KeyValue::new("http.status_code", 503_i64))
    );
    assert!(sink.span_named("alpha").unwrap().attributes.is_empty());
}

#[test]
fn test_seeded_harness_is_reproducible() {
    let config = HarnessConfig {
        seed: Some(2024),
        ..fast_config()
    };

    let run = || {
        let sink = Arc::new(RecordingSink::new());
        Harness::new(Arc::clone(&sink), &config)
            .with_console(Box::new(io::sink()))
            .run(&config.units)
            .unwrap()
    };

    let first = run();
    assert_eq!(first, run());
    assert!(first.units.iter().all(|u| u.total >= 50 && u.total < 60));
}

/// Samples a fixed delta a few times, then panics mid-walk.
struct PanicAfter(usize);

impl RandomSource for PanicAfter {
    fn sample(&mut self, _upper: u64) -> u64 {
        assert!(self.0 > 0, "random source exhausted");
        self.0 -= 1;
        5
    }
}

#[test]
fn test_panicking_unit_still_ends_root_and_unit_spans() {
    let sink = Arc::new(RecordingSink::new());
    let config = fast_config();
    let mut harness = Harness::with_source(Arc::clone(&sink), &config, PanicAfter(3))
        .with_console(Box::new(io::sink()));

    let result = catch_unwind(AssertUnwindSafe(|| harness.run(&["first-child", "second-child"])));

    assert!(result.is_err());
    let spans = sink.spans();
    let names = spans.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["parent", "first-child"]);
    assert!(sink.span_named("parent").unwrap().ended);
    assert!(sink.span_named("first-child").unwrap().ended);
    assert_eq!(sink.counter_total(), 15);
}

#[test]
fn test_fault_predicate_override() {
    let sink = Arc::new(RecordingSink::new());
    let config = fast_config();

    let report = harness(&sink, &config)
        .with_fault_predicate(Arc::new(|name: &str| name.starts_with("third")))
        .run(&config.units)
        .unwrap();

    let faulted = report
        .units
        .iter()
        .filter(|u| u.faulted)
        .map(|u| u.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(faulted, vec!["third-child"]);
    assert!(sink.span_named("second-child").unwrap().attributes.is_empty());
}
