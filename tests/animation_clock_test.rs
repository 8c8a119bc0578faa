use scene_core::{
    animation::{AnimationClock, Animator, ClipCursor},
    data_structures::graph::{AnimationInfo, ImportedScene},
};

#[derive(Default)]
struct Recorder(Vec<f64>);

impl Animator for Recorder {
    fn advance(&mut self, seconds: f64) {
        self.0.push(seconds);
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn visible_frames_deliver_their_delta() {
    let mut clock = AnimationClock::new();
    let mut animator = Recorder::default();

    assert_eq!(clock.advance(0.016, false, &mut animator), Some(0.016));
    assert_eq!(animator.0, vec![0.016]);
}

#[test]
fn silent_frames_are_delivered_on_next_visible_frame() {
    let mut clock = AnimationClock::new();
    let mut animator = Recorder::default();

    assert_eq!(clock.advance(0.1, true, &mut animator), None);
    assert_eq!(clock.advance(0.2, true, &mut animator), None);
    assert!(animator.0.is_empty());
    assert!(approx(clock.carried(), 0.3));

    let delivered = clock.advance(0.05, false, &mut animator).unwrap();

    assert!(approx(delivered, 0.35));
    assert_eq!(animator.0.len(), 1);
    assert_eq!(clock.carried(), 0.0);
}

#[test]
fn delivered_time_equals_total_time() {
    let mut clock = AnimationClock::new();
    let mut animator = Recorder::default();
    let frames = [
        (0.01, false),
        (0.02, true),
        (0.03, true),
        (0.04, false),
        (0.05, true),
        (0.06, false),
        (0.07, false),
    ];

    for (delta, silent) in frames {
        clock.advance(delta, silent, &mut animator);
    }

    let total: f64 = frames.iter().map(|(delta, _)| delta).sum();
    let delivered: f64 = animator.0.iter().sum();
    assert!(approx(delivered, total));
    assert_eq!(animator.0.len(), 4);
}

#[test]
fn trailing_silent_time_stays_carried() {
    let mut clock = AnimationClock::new();
    let mut animator = Recorder::default();

    clock.advance(0.5, false, &mut animator);
    clock.advance(0.25, true, &mut animator);

    let delivered: f64 = animator.0.iter().sum();
    assert!(approx(delivered + clock.carried(), 0.75));
}

#[test]
fn looping_cursor_wraps_around_clip() {
    let mut cursor = ClipCursor::new(2.0);

    cursor.advance(1.5);
    cursor.advance(1.0);

    assert!(approx(cursor.time(), 0.5));
}

#[test]
fn clamped_cursor_stops_at_end() {
    let mut cursor = ClipCursor::new(2.0);
    cursor.looping = false;

    cursor.advance(5.0);

    assert!(approx(cursor.time(), 2.0));
}

#[test]
fn cursor_speed_scales_time() {
    let mut cursor = ClipCursor::new(10.0);
    cursor.speed = 0.5;

    cursor.advance(4.0);

    assert!(approx(cursor.time(), 2.0));
}

#[test]
fn cursor_follows_longest_animation() {
    let mut scene = ImportedScene::empty();
    scene.animations = vec![
        AnimationInfo {
            name: "walk".to_string(),
            duration: 1.0,
            channels: 3,
        },
        AnimationInfo {
            name: "run".to_string(),
            duration: 2.5,
            channels: 3,
        },
    ];

    assert_eq!(ClipCursor::from_scene(&scene).duration(), 2.5);
    assert_eq!(ClipCursor::from_scene(&ImportedScene::empty()).duration(), 0.0);
}

#[test]
fn zero_length_clip_stays_at_start() {
    let mut cursor = ClipCursor::new(0.0);

    cursor.advance(1.0);

    assert_eq!(cursor.time(), 0.0);
}
