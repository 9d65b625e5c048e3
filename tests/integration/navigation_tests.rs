//! Page navigation, threshold editing and the inactivity fallback, driven
//! through the supervisor.

use drybox::events::{ButtonEvent, ButtonId, ButtonMask, Event};
use drybox::thresholds::Selected;
use drybox::ui::{EditMode, Page};

use crate::mock_hw::{HwCall, MockHardware, TestSupervisor, run_ticks, started, test_config};

fn press(sup: &mut TestSupervisor, id: ButtonId, now_ms: u64) {
    let _ = sup.handle(Event::Button(ButtonEvent::Pressed(id)), now_ms);
}

fn hold(sup: &mut TestSupervisor, ids: &[ButtonId], now_ms: u64) {
    let event = ButtonEvent::Held {
        id: ids[0],
        active: ButtonMask::from_ids(ids),
    };
    let _ = sup.handle(Event::Button(event), now_ms);
}

fn editing(selected: Selected) -> Page {
    Page::ThresholdEdit {
        mode: EditMode::Edit,
        selected,
    }
}

fn selecting(selected: Selected) -> Page {
    Page::ThresholdEdit {
        mode: EditMode::Selection,
        selected,
    }
}

#[test]
fn right_walks_the_rotation() {
    let mut sup = started(test_config(), MockHardware::new());
    let renders = sup.hardware().render_count();

    press(&mut sup, ButtonId::Right, 100);
    assert_eq!(sup.page(), Page::FanStats);
    press(&mut sup, ButtonId::Right, 200);
    assert_eq!(sup.page(), Page::Internal);

    // Every transition is drawn straight away.
    assert_eq!(sup.hardware().render_count(), renders + 2);
    assert_eq!(sup.hardware().last_rendered_page(), Some(Page::Internal));
}

#[test]
fn left_wraps_to_thresholds_and_back() {
    let mut sup = started(test_config(), MockHardware::new());

    press(&mut sup, ButtonId::Left, 100);
    assert_eq!(sup.page(), selecting(Selected::Max));
    press(&mut sup, ButtonId::Right, 200);
    assert_eq!(sup.page(), Page::Default);
}

#[test]
fn edit_and_commit_max_threshold() {
    let mut sup = started(test_config(), MockHardware::new());

    press(&mut sup, ButtonId::Left, 1000);
    press(&mut sup, ButtonId::A, 1000);
    assert_eq!(sup.page(), editing(Selected::Max));
    for _ in 0..3 {
        press(&mut sup, ButtonId::Up, 1000);
    }
    assert!((sup.thresholds().max_humidity - 63.0).abs() < f32::EPSILON);
    assert!(sup.storage().json("thresholds").is_none(), "not saved mid-edit");

    press(&mut sup, ButtonId::B, 1000);
    assert_eq!(sup.page(), selecting(Selected::Max));
    let stored = sup.storage().json("thresholds").unwrap();
    assert_eq!(stored["max_humidity"], 63.0);
    assert_eq!(stored["min_humidity"], 40.0);
}

#[test]
fn selection_toggles_between_max_and_min() {
    let mut sup = started(test_config(), MockHardware::new());

    press(&mut sup, ButtonId::Left, 100);
    press(&mut sup, ButtonId::Down, 100);
    assert_eq!(sup.page(), selecting(Selected::Min));
    press(&mut sup, ButtonId::Up, 100);
    assert_eq!(sup.page(), selecting(Selected::Max));

    // Up/Down only move the selection; nothing was edited.
    assert!((sup.thresholds().max_humidity - 60.0).abs() < f32::EPSILON);
}

#[test]
fn edit_mode_ignores_navigation() {
    let mut sup = started(test_config(), MockHardware::new());

    press(&mut sup, ButtonId::Left, 100);
    press(&mut sup, ButtonId::A, 100);
    press(&mut sup, ButtonId::Right, 100);
    press(&mut sup, ButtonId::Left, 100);
    assert_eq!(sup.page(), editing(Selected::Max));
}

#[test]
fn min_cannot_reach_max() {
    let mut sup = started(test_config(), MockHardware::new());

    press(&mut sup, ButtonId::Left, 100);
    press(&mut sup, ButtonId::Down, 100);
    press(&mut sup, ButtonId::A, 100);
    for _ in 0..30 {
        press(&mut sup, ButtonId::Up, 100);
    }
    let th = sup.thresholds();
    assert!(th.min_humidity < th.max_humidity);
    assert!((th.min_humidity - 59.0).abs() < f32::EPSILON);
}

#[test]
fn hold_enters_edit_on_the_threshold_page_only() {
    let mut sup = started(test_config(), MockHardware::new());

    hold(&mut sup, &[ButtonId::Down], 100);
    assert_eq!(sup.page(), Page::Default);

    press(&mut sup, ButtonId::Left, 200);
    hold(&mut sup, &[ButtonId::Down], 300);
    assert_eq!(sup.page(), editing(Selected::Min));
    hold(&mut sup, &[ButtonId::Up], 400);
    assert_eq!(sup.page(), editing(Selected::Max));
}

#[test]
fn combination_hold_is_ignored() {
    let mut sup = started(test_config(), MockHardware::new());
    press(&mut sup, ButtonId::Left, 100);
    let renders = sup.hardware().render_count();

    hold(&mut sup, &[ButtonId::Up, ButtonId::Down], 200);
    assert_eq!(sup.page(), selecting(Selected::Max));
    assert_eq!(sup.hardware().render_count(), renders);
}

#[test]
fn inactivity_returns_to_default() {
    let mut sup = started(test_config(), MockHardware::new());
    run_ticks(&mut sup, 1, 1);
    press(&mut sup, ButtonId::Right, 1000);

    // Idle for exactly the timeout at 9 s: not yet.
    run_ticks(&mut sup, 2, 9);
    assert_eq!(sup.page(), Page::FanStats);
    run_ticks(&mut sup, 10, 10);
    assert_eq!(sup.page(), Page::Default);
    assert_eq!(sup.hardware().last_rendered_page(), Some(Page::Default));
}

#[test]
fn button_activity_postpones_the_fallback() {
    let mut sup = started(test_config(), MockHardware::new());
    press(&mut sup, ButtonId::Right, 1000);
    run_ticks(&mut sup, 2, 5);
    press(&mut sup, ButtonId::Right, 5000);

    run_ticks(&mut sup, 6, 13);
    assert_eq!(sup.page(), Page::Internal);
    run_ticks(&mut sup, 14, 14);
    assert_eq!(sup.page(), Page::Default);
}

#[test]
fn inactivity_in_edit_commits_the_change() {
    let mut sup = started(test_config(), MockHardware::new());
    press(&mut sup, ButtonId::Left, 1000);
    press(&mut sup, ButtonId::A, 1000);
    press(&mut sup, ButtonId::Up, 1000);

    run_ticks(&mut sup, 2, 10);
    assert_eq!(sup.page(), Page::Default);
    assert_eq!(sup.storage().json("thresholds").unwrap()["max_humidity"], 61.0);
}

#[test]
fn page_rotation_redraws_periodically() {
    let mut sup = started(test_config(), MockHardware::new());
    let renders = sup.hardware().render_count();

    run_ticks(&mut sup, 1, 4);
    assert_eq!(sup.hardware().render_count(), renders);
    run_ticks(&mut sup, 5, 10);
    assert_eq!(sup.hardware().render_count(), renders + 2);
}

#[test]
fn fan_notice_stays_until_the_next_rotation() {
    let mut sup = started(test_config(), MockHardware::with_humidity(&[62.0]));
    run_ticks(&mut sup, 1, 4);

    let calls = &sup.hardware().calls;
    let notice = calls
        .iter()
        .position(|c| *c == HwCall::Border("Fan Started...".into()))
        .expect("engage notice drawn");
    assert!(
        !calls[notice..]
            .iter()
            .any(|c| matches!(c, HwCall::Render(_))),
        "no page drawn over the notice before the rotation"
    );

    run_ticks(&mut sup, 5, 5);
    assert_eq!(sup.hardware().calls.last(), Some(&HwCall::Render(Page::Default)));
}

#[test]
fn rendered_snapshot_reflects_the_edit() {
    let mut sup = started(test_config(), MockHardware::new());
    press(&mut sup, ButtonId::Left, 100);
    press(&mut sup, ButtonId::Down, 100);
    press(&mut sup, ButtonId::A, 100);
    press(&mut sup, ButtonId::Down, 100);

    let snapshot = sup.hardware().last_snapshot.expect("drawn");
    assert_eq!(snapshot.page, editing(Selected::Min));
    assert!((snapshot.thresholds.min_humidity - 39.0).abs() < f32::EPSILON);
}
