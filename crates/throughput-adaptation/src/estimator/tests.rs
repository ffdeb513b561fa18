//! End-to-end tests for the estimation engine
//!
//! These tests drive [`AdaptationEngine`] with a synthetic clock so every tick
//! has a known elapsed time.

use super::*;
use crate::collector::{SampleCollector, SampleSnapshot};
use crate::models::Direction;
use std::time::Duration;

fn snapshot(sent: &[u64], buffer: &[u64]) -> SampleSnapshot {
    SampleSnapshot {
        sent: sent.to_vec(),
        buffer: buffer.to_vec(),
    }
}

fn engine() -> (AdaptationEngine, Instant) {
    let start = Instant::now();
    (AdaptationEngine::new(&AdaptationConfig::default(), start), start)
}

fn at(start: Instant, secs: u64) -> Instant {
    start + Duration::from_secs(secs)
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_fresh_engine_emits_neutral() {
        let (mut engine, start) = engine();
        let report = engine.tick(at(start, 5), &SampleSnapshot::default());

        assert_eq!(report.vector, 0.0);
        assert_eq!(report.pivot_average, 0.0);
        assert_eq!(report.direction, None);
        assert!(report.carried_forward);
        assert_eq!(report.throughput_bps, 0.0);
    }

    #[test]
    fn test_growing_buffer_emits_full_lower() {
        let (mut engine, start) = engine();
        let report = engine.tick(at(start, 5), &snapshot(&[6_000, 4_000], &[100, 500]));

        assert_eq!(report.direction, Some(Direction::Lower));
        assert_eq!(report.vector, -1.0);
        assert!((report.throughput_bps - 2_000.0).abs() < 1e-9);
        assert_eq!(report.pivot_samples, 0);
    }

    #[test]
    fn test_first_drain_after_fill_records_pivot_unscaled() {
        let (mut engine, start) = engine();
        engine.tick(at(start, 5), &snapshot(&[10_000], &[100, 500]));

        let report = engine.tick(at(start, 10), &snapshot(&[5_000], &[200, 0]));

        assert_eq!(report.direction, Some(Direction::Raise));
        assert_eq!(report.vector, 1.0);
        assert_eq!(report.pivots_recorded, 1);
        assert_eq!(report.pivot_samples, 1);
        // The pivot is the front of the bandwidth window: this tick's 1000 B/s
        assert!((report.pivot_average - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_deviation_yields_floor_magnitude() {
        let (mut engine, start) = engine();

        // Fill the bandwidth window with a constant 4000 B/s
        let mut secs = 0;
        for _ in 0..31 {
            secs += 1;
            engine.tick(at(start, secs), &snapshot(&[4_000], &[]));
        }
        assert_eq!(engine.bandwidth().window().len(), 30);

        secs += 1;
        let report = engine.tick(at(start, secs), &snapshot(&[4_000], &[100, 500]));
        assert_eq!(report.vector, -1.0);

        // Reversal plus partial drain: two pivots at 4000 B/s
        secs += 1;
        let report = engine.tick(at(start, secs), &snapshot(&[4_000], &[900, 300]));
        assert_eq!(report.direction, Some(Direction::Hold));
        assert_eq!(report.pivots_recorded, 2);
        assert!((report.pivot_average - 4_000.0).abs() < 1e-9);

        secs += 1;
        let report = engine.tick(at(start, secs), &snapshot(&[4_000], &[300, 900]));
        assert_eq!(report.direction, Some(Direction::Lower));
        assert!((report.vector + MIN_MAGNITUDE).abs() < 1e-12);
    }
}

mod classification_tests {
    use super::*;

    #[test]
    fn test_strict_growth_always_lowers() {
        let (mut engine, start) = engine();
        for i in 1..40u64 {
            let report = engine.tick(
                at(start, i * 5),
                &snapshot(&[i * 1_000], &[i * 10, i * 10 + 1 + i % 7]),
            );
            assert_eq!(report.direction, Some(Direction::Lower));
            assert!(report.vector < 0.0);
            assert!(report.vector >= -1.0);
        }
    }

    #[test]
    fn test_drain_within_debounce_holds() {
        let (mut engine, start) = engine();
        let report = engine.tick(at(start, 5), &snapshot(&[1_000], &[300, 0]));
        assert_eq!(report.direction, Some(Direction::Raise));

        let report = engine.tick(at(start, 10), &snapshot(&[1_000], &[0, 0]));
        assert_eq!(report.direction, Some(Direction::Hold));
        assert!(report.drain_debounced);
        assert_eq!(report.vector, 0.0);

        let report = engine.tick(at(start, 21), &snapshot(&[1_000], &[50, 0]));
        assert_eq!(report.direction, Some(Direction::Raise));
    }

    #[test]
    fn test_empty_pivots_emit_raw_direction() {
        let (mut engine, start) = engine();
        let patterns: [&[u64]; 4] = [&[20, 20], &[5], &[40, 90], &[10, 20]];

        for (i, buffer) in patterns.iter().enumerate() {
            let report = engine.tick(at(start, (i as u64 + 1) * 5), &snapshot(&[777], buffer));
            assert_eq!(engine.detector().pivots().len(), 0);
            let direction = report.direction.expect("buffer samples were supplied");
            assert_eq!(report.vector, direction.signum());
        }
    }

    #[test]
    fn test_buffer_gap_carries_previous_output() {
        let (mut engine, start) = engine();
        let classified = engine.tick(at(start, 5), &snapshot(&[2_000], &[100, 500]));
        let carried = engine.tick(at(start, 10), &snapshot(&[9_000], &[]));

        assert!(carried.carried_forward);
        assert_eq!(carried.vector, classified.vector);
        assert_eq!(carried.pivot_average, classified.pivot_average);
        // Bandwidth keeps moving even when the detector is idle
        assert!((carried.throughput_bps - 1_800.0).abs() < 1e-9);
    }
}

mod invariant_tests {
    use super::*;

    #[test]
    fn test_windows_never_exceed_capacity() {
        let config = AdaptationConfig::default()
            .with_bandwidth_samples(8)
            .with_pivot_samples(3);
        let start = Instant::now();
        let mut engine = AdaptationEngine::new(&config, start);

        for i in 1..500u64 {
            let buffer: Vec<u64> = match i % 4 {
                0 => vec![100, 900],
                1 => vec![900, 300],
                2 => vec![300, 0],
                _ => vec![],
            };
            let report = engine.tick(at(start, i), &snapshot(&[i * 37 % 5_000], &buffer));

            assert!(engine.bandwidth().window().len() <= 8);
            assert!(engine.detector().pivots().len() <= 3);
            assert!(report.vector.is_finite());
            assert!((-1.0..=1.0).contains(&report.vector));
            assert!(report.pivot_average >= 0.0);
        }
    }

    #[test]
    fn test_zero_sent_samples_are_noops() {
        let (mut quiet, start) = engine();
        let mut noisy = AdaptationEngine::new(&AdaptationConfig::default(), start);

        let collector = SampleCollector::new();
        for _ in 0..10 {
            collector.add_sent_bytes_sample(0);
        }
        let noop = collector.drain();

        let a = quiet.tick(at(start, 5), &SampleSnapshot::default());
        let b = noisy.tick(at(start, 5), &noop);

        assert_eq!(a.vector, b.vector);
        assert_eq!(a.pivot_average, b.pivot_average);
        assert_eq!(a.throughput_bps, b.throughput_bps);
        assert_eq!(a.smoothed_bps, b.smoothed_bps);
    }

    #[test]
    fn test_same_instant_tick_is_finite() {
        let (mut engine, start) = engine();
        let report = engine.tick(start, &snapshot(&[1_000], &[10, 20]));

        assert!(report.throughput_bps.is_finite());
        assert!(report.smoothed_bps.is_finite());
        assert!(report.elapsed_secs > 0.0);
    }

    #[test]
    fn test_zero_pivot_average_does_not_poison_vector() {
        let (mut engine, start) = engine();
        // Partial drains with no traffic record zero-valued pivots
        engine.tick(at(start, 5), &snapshot(&[], &[900, 300]));
        engine.tick(at(start, 10), &snapshot(&[], &[300, 100]));
        assert_eq!(engine.detector().pivot_average(), 0.0);

        let report = engine.tick(at(start, 15), &snapshot(&[50_000], &[100, 800]));
        assert_eq!(report.direction, Some(Direction::Lower));
        assert_eq!(report.vector, -MAX_MAGNITUDE);

        let report = engine.tick(at(start, 20), &snapshot(&[], &[100, 800]));
        assert!(report.vector.is_finite());
    }

    #[test]
    fn test_emitted_at_follows_tick_clock() {
        let start = Instant::now();
        let started_at =
            chrono::DateTime::<chrono::Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let mut engine =
            AdaptationEngine::with_epoch(&AdaptationConfig::default(), start, started_at);

        let first = engine.tick(at(start, 5), &snapshot(&[1_000], &[10, 20]));
        let carried = engine.tick(at(start, 10), &SampleSnapshot::default());

        assert_eq!(first.emitted_at, 1_700_000_005_000);
        assert_eq!(carried.emitted_at, 1_700_000_010_000);
    }

    #[test]
    fn test_report_serializes() {
        let (mut engine, start) = engine();
        let report = engine.tick(at(start, 5), &snapshot(&[5_000], &[100, 500]));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["direction"], "lower");
        assert_eq!(json["vector"], -1.0);
    }
}
