//! Integration tests for navigation, adaptation and the image cache.

use std::io::Write as _;
use std::time::Duration;

use proptest::prelude::*;
use qtdemo_menu::{
    ButtonId, ContentId, Features, FrameRateMonitor, Image, ImageCache, KeyCode, MenuConfig,
    MenuController, MenuDescription, MenuEvent, MenuGraph, Transform, Trigger,
};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone)]
enum Step {
    Fire(Trigger),
    Frames(u8),
}

fn trigger() -> impl Strategy<Value = Trigger> {
    prop_oneof![
        (0u32..10).prop_map(|b| Trigger::ButtonPress(ButtonId(b))),
        Just(Trigger::ButtonPress(ButtonId::BACK)),
        Just(Trigger::ButtonPress(ButtonId::MORE)),
        Just(Trigger::ButtonPress(ButtonId::PREVIOUS)),
        Just(Trigger::Timeout),
        Just(Trigger::KeyPress(KeyCode::Escape)),
        Just(Trigger::KeyPress(KeyCode::Down)),
        Just(Trigger::KeyPress(KeyCode::Up)),
    ]
}

fn script() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            trigger().prop_map(Step::Fire),
            (1u8..40).prop_map(Step::Frames),
        ],
        0..40,
    )
}

fn play(controller: &mut MenuController, steps: &[Step], dt: Duration) -> Vec<MenuEvent> {
    for step in steps {
        match step {
            Step::Fire(t) => {
                controller.handle(*t);
            }
            Step::Frames(n) => {
                for _ in 0..*n {
                    controller.tick(dt);
                }
            }
        }
    }
    controller.drain_events()
}

fn sample_controller(config: &MenuConfig) -> MenuController {
    MenuController::from_description(&MenuDescription::sample(), config).unwrap()
}

#[test]
fn browse_paginated_category_and_back() {
    let mut menu = sample_controller(&MenuConfig::default());
    assert!(menu.handle_button(ButtonId(2)));
    assert_eq!(menu.current_name(), "graphicsview");
    assert!(menu.handle_key(KeyCode::Down));
    assert_eq!(menu.current_name(), "graphicsview#2");
    assert!(!menu.handle_key(KeyCode::Down));
    assert!(menu.handle_button(ButtonId(1)));
    assert_eq!(menu.current_name(), "portedasteroids");
    assert!(menu.current_node().info.is_some());
    assert!(menu.handle_key(KeyCode::Backspace));
    assert_eq!(menu.current_name(), "graphicsview#2");
    assert!(menu.handle_button(ButtonId::PREVIOUS));
    assert!(menu.handle_button(ButtonId::BACK));
    assert_eq!(menu.current_state(), menu.graph().root());
}

#[test]
fn description_loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = MenuDescription::sample().to_json_string().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let desc = MenuDescription::load(file.path()).unwrap();
    assert_eq!(desc, MenuDescription::sample());
    let graph = MenuGraph::from_description(&desc, &MenuConfig::default()).unwrap();
    assert!(graph.find("graphicsview#2").is_some());
}

#[test]
fn broken_file_reports_json_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    let err = MenuDescription::load(file.path()).unwrap_err();
    assert!(matches!(err, qtdemo_menu::MenuError::Json(_)));
}

#[test]
fn cache_shares_rasters_across_tiles() {
    let mut cache = ImageCache::new();
    let id = ContentId::new("button:Dialogs");
    let a = cache.acquire(&id, &Transform::IDENTITY, |_| Image::filled(4, 4, 1));
    let shifted = Transform::IDENTITY.translated(0.0, 40.0);
    let b = cache.acquire(&id, &shifted, |_| Image::filled(4, 4, 2));
    assert_eq!(a, b);
    assert_eq!(cache.ref_count(a), 2);
    assert_eq!(cache.stats().renders, 1);

    let c = cache.acquire(&id, &Transform::scale(1.5, 1.5), |_| Image::filled(6, 6, 3));
    assert_ne!(a, c);
    assert_eq!(cache.stats().renders, 2);
    assert_eq!(cache.release(a).unwrap(), 1);
    assert_eq!(cache.release(b).unwrap(), 0);
    assert!(cache.image(a).is_none());
    assert!(cache.release(a).is_err());
    assert_eq!(cache.len(), 1);
}

proptest! {
    #[test]
    fn replay_is_deterministic(steps in script()) {
        let config = MenuConfig::default();
        let mut first = sample_controller(&config);
        let mut second = sample_controller(&config);
        let a = play(&mut first, &steps, FRAME);
        let b = play(&mut second, &steps, FRAME);
        prop_assert_eq!(a, b);
        prop_assert_eq!(first.current_state(), second.current_state());
        for (x, y) in first.tiles().iter().zip(second.tiles().iter()) {
            prop_assert_eq!((x.x, x.y, x.opacity, x.visible), (y.x, y.y, y.opacity, y.visible));
        }
    }

    #[test]
    fn settled_menu_shows_only_current_tiles(steps in script()) {
        let mut menu = sample_controller(&MenuConfig::default());
        play(&mut menu, &steps, FRAME);
        for _ in 0..120 {
            menu.tick(FRAME);
        }
        prop_assert!(!menu.is_animating());
        let shown: Vec<_> = menu.tiles().iter().filter(|t| t.visible).map(|t| t.id).collect();
        let owned: Vec<_> = menu.current_node().tiles.iter().map(|t| t.object).collect();
        prop_assert_eq!(shown, owned);
    }

    #[test]
    fn features_only_ever_turn_off(steps in script(), frame_ms in 10u64..120) {
        let mut menu = sample_controller(&MenuConfig::default());
        let mut seen = menu.features();
        let mut adapted = 0;
        for step in &steps {
            let frame = Duration::from_millis(frame_ms);
            let events = play(&mut menu, std::slice::from_ref(step), frame);
            adapted += events.iter().filter(|e| matches!(e, MenuEvent::Adapted(_))).count();
            let now = menu.features();
            prop_assert!(seen.contains(now));
            seen = now;
        }
        prop_assert!(adapted <= 1);
    }

    #[test]
    fn each_full_window_reports_its_median(
        window in 1usize..12,
        deltas in prop::collection::vec(0.001f64..0.2, 0..80),
    ) {
        let mut monitor = FrameRateMonitor::new(window);
        let reported: Vec<f64> = deltas
            .iter()
            .filter_map(|&d| monitor.record(d))
            .map(|m| m.delta_secs)
            .collect();

        let expected: Vec<f64> = deltas
            .chunks_exact(window)
            .map(|chunk| {
                let mut v = chunk.to_vec();
                v.sort_by(f64::total_cmp);
                let mid = v.len() / 2;
                if v.len() % 2 == 1 { v[mid] } else { (v[mid - 1] + v[mid]) / 2.0 }
            })
            .collect();
        prop_assert_eq!(reported, expected);
        prop_assert_eq!(monitor.windows() as usize, deltas.len() / window);
        prop_assert_eq!(monitor.len(), deltas.len() % window);
    }

    #[test]
    fn slow_hosts_lose_both_features(frame_ms in 51u64..200) {
        let mut menu = sample_controller(&MenuConfig::default());
        let frames = (3_000 / frame_ms) as usize;
        for _ in 0..frames {
            menu.tick(Duration::from_millis(frame_ms));
        }
        prop_assert_eq!(menu.features(), Features::empty());
        prop_assert!(menu.ticker().is_disabled());
    }
}
