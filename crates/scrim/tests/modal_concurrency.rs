//! Concurrency gate behavior observed through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;
use scrim::{
    CloseResult, ConcurrencyPolicy, Error, MemoryPlatform, Platform, Scrim, SurfaceOptions,
};

fn setup() -> (Rc<MemoryPlatform>, Scrim) {
    let mem = Rc::new(MemoryPlatform::new());
    let scrim = Scrim::new(Rc::clone(&mem) as Rc<dyn Platform>);
    scrim.config().update(|c| c.animation.enabled = false);
    (mem, scrim)
}

#[test]
fn second_open_queues_and_renders_after_close() {
    let (mem, scrim) = setup();
    let first = scrim.open(SurfaceOptions::new().title("first")).unwrap();
    let second = scrim.open(SurfaceOptions::new().title("second")).unwrap();

    assert!(first.is_open());
    assert!(!second.is_open());
    assert_eq!(mem.find_by_class("scrim-surface").len(), 1);

    first.close(CloseResult::Programmatic).unwrap();
    assert!(second.is_open());
    assert_eq!(mem.find_by_class("scrim-surface").len(), 1);
}

#[test]
fn queued_handle_rejects_operations_until_rendered() {
    let (_mem, scrim) = setup();
    let _first = scrim.open(SurfaceOptions::new()).unwrap();
    let second = scrim.open(SurfaceOptions::new()).unwrap();
    assert_eq!(
        second.close(CloseResult::Programmatic),
        Err(Error::SurfaceNotReady)
    );
    assert_eq!(second.surface_node(), Err(Error::SurfaceNotReady));
}

#[test]
fn reject_policy_fails_and_leaves_the_active_surface() {
    let (mem, scrim) = setup();
    scrim
        .config()
        .update(|c| c.modal.policy = ConcurrencyPolicy::Reject);
    let first = scrim.open(SurfaceOptions::new().title("kept")).unwrap();
    let err = scrim.open(SurfaceOptions::new().title("denied"));
    assert!(matches!(err, Err(Error::ModalRejected)));

    assert!(first.is_open());
    let title = mem.find_by_class("scrim-title")[0];
    assert_eq!(mem.text(title), "kept");
}

#[test]
fn double_close_runs_one_teardown() {
    let (mem, scrim) = setup();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let handle = scrim
        .open(SurfaceOptions::new().on_close(move |_| c.set(c.get() + 1)))
        .unwrap();

    handle.close(CloseResult::Programmatic).unwrap();
    assert_eq!(
        handle.close(CloseResult::Programmatic),
        Err(Error::SurfaceClosed)
    );
    assert_eq!(count.get(), 1);
    assert!(mem.find_by_class("scrim-surface").is_empty());
}

#[test]
fn close_during_exit_animation_is_a_noop() {
    let (mem, scrim) = setup();
    scrim.config().update(|c| c.animation.enabled = true);
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let handle = scrim
        .open(SurfaceOptions::new().on_close(move |_| c.set(c.get() + 1)))
        .unwrap();
    let surface = handle.surface_node().unwrap();
    mem.complete_animation(surface);

    handle.close(CloseResult::Programmatic).unwrap();
    handle.close(CloseResult::Programmatic).unwrap();
    assert_eq!(count.get(), 0); // still animating out

    mem.advance(Duration::from_secs(1));
    assert_eq!(count.get(), 1);
}

#[test]
fn fallback_timer_finishes_close_without_animation_events() {
    let (mem, scrim) = setup();
    scrim.config().update(|c| c.animation.enabled = true);
    let first = scrim.open(SurfaceOptions::new().title("a")).unwrap();
    let second = scrim.open(SurfaceOptions::new().title("b")).unwrap();
    mem.advance(Duration::from_secs(1)); // settles the open animation

    first.close(CloseResult::Programmatic).unwrap();
    assert!(!second.is_open());
    // The platform never delivers animation-end; timers alone must
    // reach teardown and admit the queued surface.
    mem.advance(Duration::from_secs(1));
    assert!(second.is_open());
    assert_eq!(mem.find_by_class("scrim-surface").len(), 1);
}

proptest! {
    #[test]
    fn queued_surfaces_render_strictly_fifo(n in 1usize..6) {
        let (mem, scrim) = setup();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..n {
            let o = Rc::clone(&order);
            handles.push(
                scrim
                    .open(SurfaceOptions::new().on_open(move |_| o.borrow_mut().push(i)))
                    .unwrap(),
            );
            // Never more than one rendered surface, however many are
            // waiting.
            prop_assert!(mem.find_by_class("scrim-surface").len() <= 1);
        }
        prop_assert_eq!(&*order.borrow(), &vec![0]);

        for handle in &handles {
            handle.close(CloseResult::Programmatic).unwrap();
            prop_assert!(mem.find_by_class("scrim-surface").len() <= 1);
        }
        let expected: Vec<usize> = (0..n).collect();
        prop_assert_eq!(&*order.borrow(), &expected);
        prop_assert!(mem.find_by_class("scrim-surface").is_empty());
    }
}
