//! Toast stacking, queueing, and exit behavior through the public
//! API.

use std::rc::Rc;
use std::time::Duration;

use scrim::{
    Anchor, CountdownCue, MemoryPlatform, Platform, Scrim, Timeout, ToastBehavior, ToastOptions,
};

fn setup() -> (Rc<MemoryPlatform>, Scrim) {
    let mem = Rc::new(MemoryPlatform::new());
    let scrim = Scrim::new(Rc::clone(&mem) as Rc<dyn Platform>);
    scrim.config().update(|c| c.animation.enabled = false);
    (mem, scrim)
}

fn visible_titles(mem: &MemoryPlatform) -> Vec<String> {
    mem.find_by_class("scrim-toast-title")
        .into_iter()
        .map(|node| mem.text(node))
        .collect()
}

#[test]
fn stack_behavior_evicts_oldest_at_cap() {
    let (mem, scrim) = setup();
    for title in ["one", "two", "three"] {
        scrim.toast(
            ToastOptions::new()
                .title(title)
                .behavior(ToastBehavior::Stack)
                .max_visible(2)
                .timeout(Timeout::None),
        );
    }
    assert_eq!(visible_titles(&mem), vec!["two", "three"]);
}

#[test]
fn replace_behavior_leaves_exactly_one() {
    let (mem, scrim) = setup();
    scrim.toast(ToastOptions::new().title("old").timeout(Timeout::None));
    scrim.toast(ToastOptions::new().title("older").timeout(Timeout::None));
    scrim.toast(
        ToastOptions::new()
            .title("new")
            .behavior(ToastBehavior::Replace)
            .timeout(Timeout::None),
    );
    assert_eq!(visible_titles(&mem), vec!["new"]);
}

#[test]
fn queue_behavior_is_fifo_per_position() {
    let (mem, scrim) = setup();
    let mut handles = Vec::new();
    for title in ["a", "b", "c"] {
        handles.push(scrim.toast(
            ToastOptions::new()
                .title(title)
                .behavior(ToastBehavior::Queue)
                .max_visible(1)
                .timeout(Timeout::None),
        ));
    }
    assert_eq!(visible_titles(&mem), vec!["a"]);

    handles[0].dismiss();
    assert_eq!(visible_titles(&mem), vec!["b"]);
    handles[1].dismiss();
    assert_eq!(visible_titles(&mem), vec!["c"]);
}

#[test]
fn positions_queue_independently() {
    let (mem, scrim) = setup();
    let right = scrim.toast(
        ToastOptions::new()
            .title("right-1")
            .position(Anchor::TopRight)
            .behavior(ToastBehavior::Queue)
            .max_visible(1)
            .timeout(Timeout::None),
    );
    let _queued = scrim.toast(
        ToastOptions::new()
            .title("right-2")
            .position(Anchor::TopRight)
            .behavior(ToastBehavior::Queue)
            .max_visible(1)
            .timeout(Timeout::None),
    );
    let left = scrim.toast(
        ToastOptions::new()
            .title("left-1")
            .position(Anchor::BottomLeft)
            .behavior(ToastBehavior::Queue)
            .max_visible(1)
            .timeout(Timeout::None),
    );
    // The full left slot never blocks the right slot and vice versa.
    assert!(right.is_visible());
    assert!(left.is_visible());
    assert_eq!(visible_titles(&mem), vec!["right-1", "left-1"]);

    left.dismiss();
    assert_eq!(visible_titles(&mem), vec!["right-1"]);
    right.dismiss();
    assert_eq!(visible_titles(&mem), vec!["right-2"]);
}

#[test]
fn animated_exit_runs_element_then_container_stage() {
    let (mem, scrim) = setup();
    scrim.config().update(|c| c.animation.enabled = true);
    let handle = scrim.toast(ToastOptions::new().title("bye").timeout(Timeout::None));
    let element = mem.find_by_class("scrim-toast")[0];
    let container = mem.find_by_class("scrim-toast-container")[0];
    mem.complete_animation(element); // settle the enter animation

    handle.dismiss();
    assert!(mem.classes(element).contains(&"is-closing".to_owned()));
    assert!(!mem.classes(container).contains(&"is-collapsing".to_owned()));

    mem.complete_animation(element);
    assert!(mem.classes(container).contains(&"is-collapsing".to_owned()));
    assert!(mem.find_by_class("scrim-toast").len() == 1);

    mem.complete_animation(container);
    assert!(mem.find_by_class("scrim-toast").is_empty());
}

#[test]
fn timeout_countdown_cue_matches_duration() {
    let (mem, scrim) = setup();
    scrim.toast(
        ToastOptions::new()
            .title("soon")
            .timeout(Timeout::After(Duration::from_secs(3)))
            .countdown(CountdownCue::Cover { grow: true }),
    );
    let cue = mem.find_by_class("scrim-countdown")[0];
    assert!(mem.classes(cue).contains(&"scrim-countdown-cover".to_owned()));
    assert!(mem.classes(cue).contains(&"is-growing".to_owned()));
    assert_eq!(
        mem.css_var(cue, "--scrim-countdown-duration").as_deref(),
        Some("3000ms")
    );

    mem.advance(Duration::from_secs(3));
    assert!(mem.find_by_class("scrim-toast").is_empty());
}

#[test]
fn toasts_coexist_with_a_modal_surface() {
    let (mem, scrim) = setup();
    let _modal = scrim
        .open(scrim::SurfaceOptions::new().title("busy"))
        .unwrap();
    let toast = scrim.toast(ToastOptions::new().title("still here").timeout(Timeout::None));
    assert!(toast.is_visible());
    assert_eq!(mem.find_by_class("scrim-surface").len(), 1);
    assert_eq!(mem.find_by_class("scrim-toast").len(), 1);
}
