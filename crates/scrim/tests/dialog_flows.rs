//! Promise dialog flows through the public API.

use std::rc::Rc;

use scrim::{
    AlertOptions, ConfirmOptions, EventDetail, EventKind, Key, KeyEvent, MemoryPlatform, NodeId,
    Platform, PromptOptions, QuestionButton, QuestionOptions, Scrim,
};

fn setup() -> (Rc<MemoryPlatform>, Scrim) {
    let mem = Rc::new(MemoryPlatform::new());
    let scrim = Scrim::new(Rc::clone(&mem) as Rc<dyn Platform>);
    scrim.config().update(|c| c.animation.enabled = false);
    (mem, scrim)
}

fn click(mem: &MemoryPlatform, node: NodeId) {
    mem.dispatch(node, EventKind::Click, EventDetail::None);
}

fn button(mem: &MemoryPlatform, id: &str) -> NodeId {
    mem.find_by_attr("data-id", id)[0]
}

fn press_escape(mem: &MemoryPlatform) {
    let surface = mem.find_by_class("scrim-surface")[0];
    mem.dispatch(
        surface,
        EventKind::KeyDown,
        EventDetail::Key(KeyEvent::plain(Key::Escape)),
    );
}

#[test]
fn alert_resolves_on_button_and_on_backdrop() {
    let (mem, scrim) = setup();
    let first = scrim.alert("Saved.", AlertOptions::default()).unwrap();
    click(&mem, button(&mem, "ok"));
    assert!(first.is_settled());

    let second = scrim.alert("Saved again.", AlertOptions::default()).unwrap();
    let overlay = mem.find_by_class("scrim-overlay")[0];
    click(&mem, overlay);
    assert!(second.is_settled());
}

#[test]
fn confirm_maps_buttons_and_dismissal() {
    let (mem, scrim) = setup();
    let yes = scrim.confirm("Proceed?", ConfirmOptions::default()).unwrap();
    click(&mem, button(&mem, "yes"));
    assert_eq!(yes.try_get(), Some(true));

    let no = scrim.confirm("Proceed?", ConfirmOptions::default()).unwrap();
    click(&mem, button(&mem, "no"));
    assert_eq!(no.try_get(), Some(false));

    let escaped = scrim.confirm("Proceed?", ConfirmOptions::default()).unwrap();
    press_escape(&mem);
    assert_eq!(escaped.try_get(), Some(false));
}

#[test]
fn prompt_validation_keeps_surface_open_until_valid() {
    let (mem, scrim) = setup();
    let promise = scrim
        .prompt(
            "Your name:",
            "",
            PromptOptions {
                required: true,
                ..PromptOptions::default()
            },
        )
        .unwrap();
    let input = mem.find_by_class("scrim-input")[0];

    mem.set_value(input, "   ");
    click(&mem, button(&mem, "ok"));
    assert!(!promise.is_settled());
    assert_eq!(mem.find_by_class("scrim-surface").len(), 1);
    let error = mem.find_by_class("scrim-error")[0];
    assert!(!mem.text(error).is_empty());

    mem.set_value(input, "Ada");
    click(&mem, button(&mem, "ok"));
    assert_eq!(promise.try_get(), Some(Some("Ada".to_owned())));
    assert!(mem.find_by_class("scrim-surface").is_empty());
}

#[test]
fn prompt_enter_key_submits_the_default_value() {
    let (mem, scrim) = setup();
    let promise = scrim
        .prompt("Your name:", "Grace", PromptOptions::default())
        .unwrap();
    let input = mem.find_by_class("scrim-input")[0];
    assert_eq!(mem.focused(), Some(input));
    let surface = mem.find_by_class("scrim-surface")[0];
    mem.dispatch(
        surface,
        EventKind::KeyDown,
        EventDetail::Key(KeyEvent::plain(Key::Enter)),
    );
    assert_eq!(promise.try_get(), Some(Some("Grace".to_owned())));
}

#[test]
fn closed_prompt_leaves_no_registered_listeners() {
    let (mem, scrim) = setup();
    let promise = scrim.prompt("Name:", "", PromptOptions::default()).unwrap();
    assert!(mem.active_listeners() > 0);
    click(&mem, button(&mem, "cancel"));
    assert_eq!(promise.try_get(), Some(None));
    assert_eq!(mem.active_listeners(), 0);
}

#[test]
fn prompt_cancel_and_dismissal_resolve_none() {
    let (mem, scrim) = setup();
    let cancelled = scrim.prompt("Name:", "", PromptOptions::default()).unwrap();
    click(&mem, button(&mem, "cancel"));
    assert_eq!(cancelled.try_get(), Some(None));

    let escaped = scrim.prompt("Name:", "", PromptOptions::default()).unwrap();
    press_escape(&mem);
    assert_eq!(escaped.try_get(), Some(None));
}

#[test]
fn question_resolves_the_clicked_choice() {
    let (mem, scrim) = setup();
    let promise = scrim
        .question(QuestionOptions {
            buttons: vec![
                QuestionButton::new("save", "Save"),
                QuestionButton::new("discard", "Discard"),
            ],
            ..QuestionOptions::default()
        })
        .unwrap();
    click(&mem, button(&mem, "save"));
    assert_eq!(promise.try_get(), Some("save".to_owned()));
}

#[test]
fn question_without_dismissal_mapping_stays_pending() {
    let (mem, scrim) = setup();
    let promise = scrim
        .question(QuestionOptions {
            buttons: vec![QuestionButton::new("go", "Go")],
            ..QuestionOptions::default()
        })
        .unwrap();
    let overlay = mem.find_by_class("scrim-overlay")[0];
    click(&mem, overlay);
    // The surface is gone but the promise never settles.
    assert!(mem.find_by_class("scrim-surface").is_empty());
    assert!(!promise.is_settled());
}

#[test]
fn dialogs_queue_behind_an_open_surface() {
    let (mem, scrim) = setup();
    let blocker = scrim.open(scrim::SurfaceOptions::new().title("busy")).unwrap();
    let promise = scrim.alert("Queued.", AlertOptions::default()).unwrap();
    assert_eq!(mem.find_by_class("scrim-surface").len(), 1);
    assert!(!promise.is_settled());

    blocker.close(scrim::CloseResult::Programmatic).unwrap();
    click(&mem, button(&mem, "ok"));
    assert!(promise.is_settled());
}
