use super::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::testkit::RecordingSink;

fn engine(sink: Arc<RecordingSink>) -> (MotionEngine, Arc<StateStore>) {
    let store = Arc::new(StateStore::new());
    let motion = MotionEngine::new(store.clone(), sink, &MotionConfig::default());
    (motion, store)
}

fn default_viewport() -> ViewportBounds {
    ViewportBounds::new(0.0, 40.0, 1280.0, 840.0)
}

#[tokio::test(start_paused = true)]
async fn test_short_move_emits_nothing_but_updates_cursor() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    store.set_viewport(default_viewport());
    store.set_cursor(Point::new(500.0, 500.0));

    motion
        .move_to(Point::new(501.0, 502.0), None, PathProfile::Natural)
        .await
        .unwrap();

    assert_eq!(sink.count_moves(), 0);
    assert_eq!(store.cursor(), Point::new(501.0, 502.0));
}

#[tokio::test(start_paused = true)]
async fn test_short_hop_is_one_direct_delta() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    store.set_viewport(default_viewport());
    store.set_cursor(Point::new(500.0, 500.0));

    motion
        .move_to(Point::new(510.0, 505.0), None, PathProfile::Natural)
        .await
        .unwrap();

    assert_eq!(
        sink.commands(),
        vec![Command::Move { dx: 10, dy: 5 }],
        "a short hop should collapse to a single delta"
    );
}

#[tokio::test(start_paused = true)]
async fn test_deltas_sum_to_full_displacement() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    store.set_viewport(default_viewport());
    store.set_cursor(Point::new(100.0, 100.0));

    motion
        .move_to(Point::new(700.0, 400.0), None, PathProfile::Natural)
        .await
        .unwrap();

    let (mut sum_x, mut sum_y) = (0i32, 0i32);
    for cmd in sink.commands() {
        match cmd {
            Command::Move { dx, dy } => {
                sum_x += dx;
                sum_y += dy;
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
    // The path lands on the rounded target; the correction pass (driven by
    // the stored cursor, which no Probe updates here) covers any residue.
    assert_eq!(sum_x, 600);
    assert_eq!(sum_y, 300);
    assert!(sink.count_moves() > 1);
    assert_eq!(store.cursor(), Point::new(700.0, 400.0));
}

#[tokio::test(start_paused = true)]
async fn test_every_intermediate_point_stays_inside_margins() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    let vp = default_viewport();
    store.set_viewport(vp);
    store.set_cursor(Point::new(30.0, 70.0));

    // A target beyond the right edge must be pulled into the margin rect.
    motion
        .move_to(Point::new(2000.0, 820.0), None, PathProfile::Natural)
        .await
        .unwrap();

    let (mut x, mut y) = (30.0, 70.0);
    for cmd in sink.commands() {
        if let Command::Move { dx, dy } = cmd {
            x += dx as f64;
            y += dy as f64;
            assert!(
                vp.contains(Point::new(x, y), 19.0),
                "point ({}, {}) escaped the viewport margins",
                x,
                y
            );
        }
    }
    assert_eq!(store.cursor(), Point::new(1260.0, 820.0));
}

#[tokio::test(start_paused = true)]
async fn test_stale_start_is_clamped_before_planning() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    let vp = default_viewport();
    store.set_viewport(vp);

    motion
        .move_to(
            Point::new(600.0, 400.0),
            Some(Point::new(-500.0, 10.0)),
            PathProfile::Natural,
        )
        .await
        .unwrap();

    // First delta starts from the clamped origin (20, 60), not (-500, 10).
    let (mut x, mut y) = (20.0, 60.0);
    for cmd in sink.commands() {
        if let Command::Move { dx, dy } = cmd {
            x += dx as f64;
            y += dy as f64;
            assert!(vp.contains(Point::new(x, y), 19.0));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_correction_pass_fires_on_fresh_probe_feedback() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    store.set_viewport(default_viewport());
    store.set_cursor(Point::new(100.0, 100.0));

    // Simulate the Probe's mousemove stream landing short of the target.
    let store2 = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        store2.set_cursor(Point::new(680.0, 390.0));
    });

    motion
        .move_to(Point::new(700.0, 400.0), None, PathProfile::Natural)
        .await
        .unwrap();

    let commands = sink.commands();
    assert_eq!(
        commands.last(),
        Some(&Command::Move { dx: 20, dy: 10 }),
        "expected a single corrective delta to the exact target"
    );
    assert_eq!(store.cursor(), Point::new(700.0, 400.0));
}

#[tokio::test(start_paused = true)]
async fn test_no_viewport_refuses_motion() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    store.set_cursor(Point::new(100.0, 100.0));

    let err = motion
        .move_to(Point::new(700.0, 400.0), None, PathProfile::Natural)
        .await
        .unwrap_err();
    assert!(matches!(err, MotionError::NoViewport));
    assert_eq!(sink.count_moves(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_viewport_arriving_during_wait_unblocks_motion() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    store.set_cursor(Point::new(100.0, 100.0));

    let store2 = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        store2.set_viewport(default_viewport());
    });

    motion
        .move_to(Point::new(300.0, 300.0), None, PathProfile::Natural)
        .await
        .unwrap();
    assert!(sink.count_moves() > 0);
}

#[tokio::test(start_paused = true)]
async fn test_unclamped_move_without_viewport() {
    let sink = RecordingSink::new();
    let (motion, store) = engine(sink.clone());
    store.set_cursor(Point::new(0.0, 0.0));

    motion
        .move_to_unclamped(Point::new(400.0, 300.0), None)
        .await
        .unwrap();
    assert!(sink.count_moves() > 0);
    assert_eq!(store.cursor(), Point::new(400.0, 300.0));
}

#[test]
fn test_curve_path_ends_exactly_on_target() {
    let mut rng = StdRng::seed_from_u64(7);
    let start = Point::new(100.0, 100.0);
    let target = Point::new(700.0, 400.0);
    for profile in [PathProfile::Natural, PathProfile::NoOvershoot] {
        let path = curve_path(start, target, profile, &mut rng);
        let last = path.last().unwrap();
        assert!(last.distance_to(target) < 1e-9);
    }
}

#[test]
fn test_curve_path_sample_count_bounded() {
    let mut rng = StdRng::seed_from_u64(7);
    let start = Point::new(0.0, 0.0);

    let hop = curve_path(start, Point::new(10.0, 0.0), PathProfile::Natural, &mut rng);
    assert_eq!(hop.len(), 1);

    let medium = curve_path(start, Point::new(100.0, 0.0), PathProfile::Natural, &mut rng);
    assert!(medium.len() >= 3);

    let long = curve_path(
        start,
        Point::new(5000.0, 5000.0),
        PathProfile::Natural,
        &mut rng,
    );
    assert!(long.len() <= 96);
}

#[test]
fn test_no_overshoot_profile_bows_less() {
    let start = Point::new(0.0, 500.0);
    let target = Point::new(1000.0, 500.0);

    let max_bow = |profile| {
        let mut worst: f64 = 0.0;
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            for p in curve_path(start, target, profile, &mut rng) {
                worst = worst.max((p.y - 500.0).abs());
            }
        }
        worst
    };

    let natural = max_bow(PathProfile::Natural);
    let flat = max_bow(PathProfile::NoOvershoot);
    assert!(natural <= 20.0 + 1e-9);
    assert!(flat <= 8.0 + 1e-9);
    assert!(flat < natural);
}
