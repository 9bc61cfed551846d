use blockgen::{
    BlockSpec, BoxedError, CancellationToken, ContinuousStrategy, CustomMetricConfig,
    CustomMetricStrategy, Error, JsonLinesSink, Labels, PlanStrategy, ProfileCatalog,
    RolloutStrategy, Time, TimeWindow, align_forward, align::RAW_BLOCK_WIDTH_MS,
    profile::builtin_profiles,
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(60 * 60);

fn run(strategy: &dyn PlanStrategy, max_time: i64) -> Vec<BlockSpec> {
    let mut blocks = vec![];
    let mut sink = |b: BlockSpec| -> Result<(), BoxedError> {
        blocks.push(b);
        Ok(())
    };
    strategy
        .plan(
            &CancellationToken::new(),
            Time::from_timestamp_millis(max_time),
            &Labels::default(),
            &mut sink,
        )
        .unwrap();
    blocks
}

fn millis(widths: &[i64]) -> Vec<Duration> {
    widths
        .iter()
        .map(|w| Duration::from_millis(*w as u64))
        .collect()
}

/// Blocks are newest first, start on the aligned bound and leave no gaps.
fn assert_contiguous(blocks: &[BlockSpec], widths: &[i64], max_time: i64) {
    assert_eq!(blocks.len(), widths.len());
    let mut expected_max = align_forward(max_time, RAW_BLOCK_WIDTH_MS).unwrap();
    for (block, width) in blocks.iter().zip(widths) {
        let w = block.window();
        assert_eq!(w.max_time, expected_max);
        assert_eq!(w.width(), *width);
        expected_max = w.min_time - 1;
    }
}

/// Rollout ticks cover their block exactly, newest first, each ending where the next begins.
fn assert_ticks_tile_block(block: &BlockSpec) {
    let window = block.window();
    let ticks: Vec<TimeWindow> = block.series.iter().map(|s| s.window).collect();
    assert!(!ticks.is_empty(), "{window:?}");

    for tick in &ticks {
        assert!(window.contains(tick), "{tick:?} outside {window:?}");
    }
    assert_eq!(ticks[0].max_time, window.max_time);
    assert_eq!(ticks[ticks.len() - 1].min_time, window.min_time);
    for pair in ticks.windows(2) {
        assert_eq!(pair[1].max_time, pair[0].min_time, "{ticks:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test_log::test(test)]
    fn continuous_blocks_are_contiguous(
        widths in prop::collection::vec(1..=200 * 3_600_000i64, 0..8),
        max_time in -1_000_000_000_000i64..4_000_000_000_000,
    ) {
        let strategy = ContinuousStrategy::new(millis(&widths), 1, 2).unwrap();
        let blocks = run(&strategy, max_time);
        assert_contiguous(&blocks, &widths, max_time);
        for block in &blocks {
            prop_assert_eq!(block.series.len(), 2);
            for s in &block.series {
                prop_assert_eq!(s.window, block.window());
            }
        }
    }

    #[test]
    fn rollout_ticks_tile_hour_scale_blocks(
        widths in prop::collection::vec(1..=12 * 3_600_000i64, 1..6),
        interval in 60_000..=3 * 3_600_000i64,
        max_time in 0i64..2_000_000_000_000,
    ) {
        let strategy = RolloutStrategy::new(
            millis(&widths),
            Duration::from_millis(interval as u64),
            1,
            1,
        )
        .unwrap();
        let blocks = run(&strategy, max_time);
        assert_contiguous(&blocks, &widths, max_time);
        blocks.iter().for_each(assert_ticks_tile_block);
    }

    #[test]
    fn rollout_ticks_tile_tiny_blocks(
        widths in prop::collection::vec(1..=64i64, 1..10),
        interval in 2..=16i64,
        max_time in -100_000i64..100_000,
    ) {
        let strategy = RolloutStrategy::new(
            millis(&widths),
            Duration::from_millis(interval as u64),
            1,
            1,
        )
        .unwrap();
        let blocks = run(&strategy, max_time);
        assert_contiguous(&blocks, &widths, max_time);
        blocks.iter().for_each(assert_ticks_tile_block);
    }
}

#[test_log::test]
fn custom_metrics_without_ranges_plan_nothing() {
    let strategy = CustomMetricStrategy::new(
        vec![],
        1,
        vec!["a".into()],
        CustomMetricConfig::default(),
        StdRng::seed_from_u64(0),
    )
    .unwrap();
    assert!(run(&strategy, 0).is_empty());
}

#[test]
fn cancelled_before_start() {
    let strategy = ContinuousStrategy::new(vec![2 * HOUR; 3], 1, 1).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut calls = 0;
    let mut sink = |_: BlockSpec| -> Result<(), BoxedError> {
        calls += 1;
        Ok(())
    };
    let err = strategy
        .plan(
            &cancel,
            Time::from_timestamp_millis(0),
            &Labels::default(),
            &mut sink,
        )
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled), "{err}");
    assert_eq!(calls, 0);
}

#[test]
fn sink_error_is_returned_as_is() {
    let strategy = RolloutStrategy::new(vec![2 * HOUR; 5], HOUR, 1, 1).unwrap();

    let mut calls = 0;
    let mut sink = |_: BlockSpec| -> Result<(), BoxedError> {
        calls += 1;
        if calls == 2 {
            return Err(std::io::Error::other("disk full").into());
        }
        Ok(())
    };
    let err = strategy
        .plan(
            &CancellationToken::new(),
            Time::from_timestamp_millis(0),
            &Labels::default(),
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(calls, 2);

    let source = match err {
        Error::SinkFailed(source) => source,
        other => panic!("unexpected error: {other}"),
    };
    let io = source.downcast_ref::<std::io::Error>().unwrap();
    assert_eq!(io.to_string(), "disk full");
}

#[test]
fn external_labels_on_every_block() {
    let strategy = ContinuousStrategy::new(vec![2 * HOUR, 8 * HOUR], 1, 1).unwrap();
    let labels: Labels = "cluster=eu-1,replica=a".parse().unwrap();

    let mut blocks = vec![];
    let mut sink = |b: BlockSpec| -> Result<(), BoxedError> {
        blocks.push(b);
        Ok(())
    };
    strategy
        .plan(
            &CancellationToken::new(),
            Time::from_timestamp_millis(0),
            &labels,
            &mut sink,
        )
        .unwrap();

    assert_eq!(blocks.len(), 2);
    for block in &blocks {
        assert_eq!(block.meta.external_labels, labels.to_map());
        // external labels are block metadata, not series labels
        assert!(block.series[0].labels.get("cluster").is_none());
    }
}

#[test_log::test]
fn every_builtin_profile_plans() {
    let catalog = ProfileCatalog::builtin(CustomMetricConfig::default(), Some(5)).unwrap();
    // Mid November 2023, off the block grid.
    let max_time = 1_700_000_123_456;

    for profile in builtin_profiles() {
        let strategy = catalog.lookup(&profile.name).unwrap();
        let mut blocks = 0;
        let mut series = 0;
        let mut sink = |b: BlockSpec| -> Result<(), BoxedError> {
            blocks += 1;
            series += b.series.len();
            Ok(())
        };
        strategy
            .plan(
                &CancellationToken::new(),
                Time::from_timestamp_millis(max_time),
                &Labels::default(),
                &mut sink,
            )
            .unwrap();
        assert_eq!(blocks, profile.ranges.len(), "{}", profile.name);
        assert!(series >= blocks, "{}", profile.name);
    }
}

#[test]
fn small_realistic_profile_series_counts() {
    let catalog = ProfileCatalog::builtin(CustomMetricConfig::default(), None).unwrap();
    let strategy = catalog.lookup("realistic-k8s-2d-small").unwrap();
    let blocks = run(strategy.as_ref(), 0);

    // Three rollouts touch every 2h block and nine every 8h block, with 50 metrics of 100 apps
    // for each of them.
    let totals: Vec<_> = blocks.iter().map(BlockSpec::total_series).collect();
    assert_eq!(
        totals,
        [
            15_000, 15_000, 15_000, 45_000, 45_000, 45_000, 45_000, 45_000, 15_000
        ]
    );
}

#[test]
fn concurrent_plans_are_independent() {
    let catalog = ProfileCatalog::builtin(CustomMetricConfig::default(), Some(9)).unwrap();
    let render = |name: &str| {
        let mut sink = JsonLinesSink::new(Vec::new());
        catalog
            .plan(
                name,
                &CancellationToken::new(),
                Time::from_timestamp_millis(1_700_000_000_000),
                &Labels::new([("cluster", "a")]),
                &mut sink,
            )
            .unwrap();
        sink.into_inner().unwrap()
    };

    let expected = render("realistic-k8s-30d-tiny");
    let lines: Vec<BlockSpec> = std::str::from_utf8(&expected)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 9);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| render("realistic-k8s-30d-tiny")))
            .collect();
        let other = s.spawn(|| render("continuous-1w-small"));
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
        assert_ne!(other.join().unwrap(), expected);
    });
}
