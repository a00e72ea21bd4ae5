#![forbid(unsafe_code)]

//! Promise-based dialogs built on the surface controller.
//!
//! Each helper opens one surface and returns a [`Promise`] that
//! settles on a later UI event. Resolution happens in the surface's
//! close callback, so every path (button, escape, backdrop, close
//! button) funnels through one place.
//!
//! # Invariants
//!
//! 1. `alert` resolves on every dismissal path, never only on the
//!    button.
//! 2. `question` without a dismissal mapping leaves its promise
//!    pending on dismissal. Deliberate, observable behavior.
//! 3. Prompt validation failures keep the surface open and the
//!    promise pending; the primary button never closes the surface
//!    before validation passes.
//! 4. A settled latch guards the prompt's Enter and click paths from
//!    double-resolving with side effects.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use regex::Regex;
use scrim_core::{EventKind, Key, NodeId, Promise, promise};
use tracing::trace;

use crate::error::Error;
use crate::sanitize::Content;
use crate::surface::{
    ButtonKind, ButtonSpec, CloseResult, SurfaceEnv, SurfaceHandle, SurfaceOptions, open,
};
use scrim_i18n::{LabelKey, LocaleRegistry};

/// Collaborators the dialog layer needs beyond the surface
/// environment: the label registry for default captions.
#[derive(Clone)]
pub(crate) struct DialogEnv {
    pub surface: SurfaceEnv,
    pub i18n: Rc<RefCell<LocaleRegistry>>,
}

impl DialogEnv {
    fn label(&self, key: LabelKey) -> String {
        self.i18n.borrow().label(key).to_owned()
    }
}

/// One choice in a [`question`] dialog.
#[derive(Debug, Clone)]
pub struct QuestionButton {
    pub id: String,
    pub label: String,
    pub kind: ButtonKind,
}

impl QuestionButton {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ButtonKind::Secondary,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ButtonKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Options for [`question`].
#[derive(Default)]
pub struct QuestionOptions {
    pub title: Option<String>,
    pub message: Option<Content>,
    pub buttons: Vec<QuestionButton>,
    /// Id resolved for escape/backdrop/close-button dismissal. When
    /// `None`, dismissal leaves the promise pending until a button
    /// is clicked.
    pub on_dismissal: Option<String>,
}

/// Open a multi-choice dialog; the promise resolves with the clicked
/// button's id.
pub(crate) fn question(env: &DialogEnv, options: QuestionOptions) -> Result<Promise<String>, Error> {
    let (result, resolver) = promise::<String>();
    let title = options
        .title
        .unwrap_or_else(|| env.label(LabelKey::QuestionTitle));
    let buttons = options
        .buttons
        .into_iter()
        .map(|b| ButtonSpec::new(b.id, b.label).kind(b.kind))
        .collect();
    let on_dismissal = options.on_dismissal;

    let mut surface_options = SurfaceOptions::new()
        .title(title)
        .kind("question")
        .buttons(buttons)
        .on_close(move |result| match result {
            CloseResult::Button(id) => {
                resolver.resolve(id.clone());
            }
            CloseResult::Dismissed(_) | CloseResult::Programmatic => {
                if let Some(id) = on_dismissal {
                    resolver.resolve(id);
                } else {
                    // Documented pending state: no mapping, no value.
                    trace!("question dismissed without mapping");
                }
            }
        });
    if let Some(message) = options.message {
        surface_options = surface_options.content(message);
    }
    open(&env.surface, surface_options)?;
    Ok(result)
}

/// Options for [`confirm`].
#[derive(Debug, Clone, Default)]
pub struct ConfirmOptions {
    pub title: Option<String>,
    pub yes_label: Option<String>,
    pub no_label: Option<String>,
    /// Add a third, cancel button (also resolving `false`).
    pub with_cancel: bool,
}

/// Open a yes/no dialog. Dismissal resolves `false`.
pub(crate) fn confirm(
    env: &DialogEnv,
    message: impl Into<Content>,
    options: ConfirmOptions,
) -> Result<Promise<bool>, Error> {
    let (result, resolver) = promise::<bool>();
    let title = options
        .title
        .unwrap_or_else(|| env.label(LabelKey::ConfirmTitle));
    let yes = options.yes_label.unwrap_or_else(|| env.label(LabelKey::Yes));
    let no = options.no_label.unwrap_or_else(|| env.label(LabelKey::No));

    let mut buttons = vec![
        ButtonSpec::new("yes", yes),
        ButtonSpec::new("no", no).kind(ButtonKind::Secondary),
    ];
    if options.with_cancel {
        buttons.push(
            ButtonSpec::new("cancel", env.label(LabelKey::Cancel)).kind(ButtonKind::Secondary),
        );
    }

    let surface_options = SurfaceOptions::new()
        .title(title)
        .kind("confirm")
        .content(message.into())
        .buttons(buttons)
        .on_close(move |result| {
            let value = matches!(result, CloseResult::Button(id) if id == "yes");
            resolver.resolve(value);
        });
    open(&env.surface, surface_options)?;
    Ok(result)
}

/// Options for [`alert`].
#[derive(Debug, Clone, Default)]
pub struct AlertOptions {
    pub title: Option<String>,
    pub button_label: Option<String>,
}

/// Open an acknowledgement dialog. Resolves on the button and on
/// every dismissal path.
pub(crate) fn alert(
    env: &DialogEnv,
    message: impl Into<Content>,
    options: AlertOptions,
) -> Result<Promise<()>, Error> {
    let (result, resolver) = promise::<()>();
    let title = options
        .title
        .unwrap_or_else(|| env.label(LabelKey::AlertTitle));
    let label = options
        .button_label
        .unwrap_or_else(|| env.label(LabelKey::Ok));

    let surface_options = SurfaceOptions::new()
        .title(title)
        .kind("alert")
        .content(message.into())
        .buttons(vec![ButtonSpec::new("ok", label)])
        .on_close(move |_| {
            resolver.resolve(());
        });
    open(&env.surface, surface_options)?;
    Ok(result)
}

type Validator = Rc<dyn Fn(&str) -> Result<(), String>>;

/// Options for [`prompt`].
#[derive(Default)]
pub struct PromptOptions {
    pub title: Option<String>,
    pub ok_label: Option<String>,
    pub cancel_label: Option<String>,
    pub placeholder: Option<String>,
    /// Reject empty or whitespace-only input.
    pub required: bool,
    /// Minimum length of the trimmed value.
    pub min_len: Option<usize>,
    /// Maximum length of the trimmed value.
    pub max_len: Option<usize>,
    /// Regular expression the trimmed value must fully match. An
    /// invalid pattern is reported as a validation failure.
    pub pattern: Option<String>,
    /// Custom check; an `Err` is shown inline.
    pub validator: Option<Validator>,
}

struct PromptRules {
    required: bool,
    min_len: Option<usize>,
    max_len: Option<usize>,
    pattern: Option<String>,
    validator: Option<Validator>,
}

impl PromptRules {
    /// Check `value` in documented order; the checks run against the
    /// trimmed value, resolution uses the value as typed.
    fn check(&self, value: &str) -> Result<(), String> {
        let trimmed = value.trim();
        if self.required && trimmed.is_empty() {
            return Err("This field is required.".to_owned());
        }
        if let Some(min) = self.min_len
            && trimmed.chars().count() < min
        {
            return Err(format!("Please enter at least {min} characters."));
        }
        if let Some(max) = self.max_len
            && trimmed.chars().count() > max
        {
            return Err(format!("Please enter at most {max} characters."));
        }
        if let Some(pattern) = &self.pattern {
            match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(re) => {
                    if !re.is_match(trimmed) {
                        return Err("Please match the requested format.".to_owned());
                    }
                }
                // A bad pattern must degrade to a failure, never a
                // crash of the surface's event handling.
                Err(_) => return Err("Please match the requested format.".to_owned()),
            }
        }
        if let Some(validator) = &self.validator {
            validator(value)?;
        }
        Ok(())
    }
}

/// Open a text input dialog.
///
/// Resolves `Some(value)` (as typed, untrimmed) once validation
/// passes, `None` on cancel or dismissal.
pub(crate) fn prompt(
    env: &DialogEnv,
    message: impl Into<Content>,
    default: impl Into<String>,
    options: PromptOptions,
) -> Result<Promise<Option<String>>, Error> {
    let (result, resolver) = promise::<Option<String>>();
    let title = options
        .title
        .unwrap_or_else(|| env.label(LabelKey::PromptTitle));
    let ok = options.ok_label.unwrap_or_else(|| env.label(LabelKey::Ok));
    let cancel = options
        .cancel_label
        .unwrap_or_else(|| env.label(LabelKey::Cancel));
    let default = default.into();
    let placeholder = options.placeholder.clone();

    let rules = Rc::new(PromptRules {
        required: options.required,
        min_len: options.min_len,
        max_len: options.max_len,
        pattern: options.pattern,
        validator: options.validator,
    });

    // First settlement wins; the latch also stops the close path
    // from re-resolving after a successful submit.
    let settled = Rc::new(Cell::new(false));
    let input_node: Rc<Cell<Option<NodeId>>> = Rc::new(Cell::new(None));
    let error_node: Rc<Cell<Option<NodeId>>> = Rc::new(Cell::new(None));

    let submit = {
        let platform = Rc::clone(&env.surface.platform);
        let rules = Rc::clone(&rules);
        let settled = Rc::clone(&settled);
        let input_node = Rc::clone(&input_node);
        let error_node = Rc::clone(&error_node);
        let resolver = resolver.clone();
        Rc::new(move |handle: &SurfaceHandle| {
            if settled.get() {
                return;
            }
            let Some(input) = input_node.get() else { return };
            let value = platform.value(input);
            match rules.check(&value) {
                Ok(()) => {
                    settled.set(true);
                    resolver.resolve(Some(value));
                    let _ = handle.close(CloseResult::Button("ok".to_owned()));
                }
                Err(message) => {
                    trace!("prompt validation failed");
                    if let Some(error) = error_node.get() {
                        platform.set_text(error, &message);
                        platform.add_class(error, "is-visible");
                    }
                    if let Ok(surface) = handle.surface_node() {
                        platform.add_class(surface, "has-error");
                    }
                }
            }
        })
    };

    let on_open = {
        let platform = Rc::clone(&env.surface.platform);
        let input_node = Rc::clone(&input_node);
        let error_node = Rc::clone(&error_node);
        let submit = Rc::clone(&submit);
        move |handle: &SurfaceHandle| {
            let Ok(body) = handle.body_node() else { return };
            let input = platform.create_element("input");
            platform.add_class(input, "scrim-input");
            platform.set_value(input, &default);
            if let Some(placeholder) = &placeholder {
                platform.set_attr(input, "placeholder", placeholder);
            }
            platform.append(body, input);
            input_node.set(Some(input));

            let error = platform.create_element("div");
            platform.add_class(error, "scrim-error");
            platform.append(body, error);
            error_node.set(Some(error));

            // Key events for the trapped region arrive at the surface
            // node; the surface owns the listener so teardown removes
            // it. Enter only submits while the input has focus.
            if let Ok(surface) = handle.surface_node() {
                let submit = Rc::clone(&submit);
                let key_handle = handle.clone();
                let p = Rc::clone(&platform);
                let _ = handle.listen(
                    surface,
                    EventKind::KeyDown,
                    Rc::new(move |event| {
                        if event.key().is_some_and(|k| k.key == Key::Enter)
                            && p.focused() == Some(input)
                        {
                            submit(&key_handle);
                        }
                    }),
                );
            }
            platform.focus(input);
        }
    };

    let on_button = {
        let submit = Rc::clone(&submit);
        move |handle: &SurfaceHandle, id: &str| {
            if id == "ok" {
                submit(handle);
            }
        }
    };

    let on_close = {
        let settled = Rc::clone(&settled);
        move |_result: &CloseResult| {
            // Cancel and every dismissal path resolve to no value.
            if !settled.replace(true) {
                resolver.resolve(None);
            }
        }
    };

    let surface_options = SurfaceOptions::new()
        .title(title)
        .kind("prompt")
        .content(message.into())
        .buttons(vec![
            ButtonSpec::new("ok", ok).close_on_click(false),
            ButtonSpec::new("cancel", cancel).kind(ButtonKind::Secondary),
        ])
        .on_open(on_open)
        .on_button(on_button)
        .on_close(on_close);
    open(&env.surface, surface_options)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::manager::Manager;
    use crate::sanitize::Passthrough;
    use scrim_core::{EventDetail, KeyEvent, MemoryPlatform, Platform};

    fn env() -> (Rc<MemoryPlatform>, DialogEnv) {
        let mem = Rc::new(MemoryPlatform::new());
        let platform: Rc<dyn Platform> = Rc::clone(&mem) as Rc<dyn Platform>;
        let config = ConfigStore::new();
        config.update(|c| c.animation.enabled = false);
        let manager = Rc::new(Manager::new(Rc::clone(&platform), config.clone()));
        (
            mem,
            DialogEnv {
                surface: SurfaceEnv {
                    platform,
                    manager,
                    config,
                    sanitizer: Rc::new(Passthrough),
                },
                i18n: Rc::new(RefCell::new(LocaleRegistry::new())),
            },
        )
    }

    fn click(mem: &MemoryPlatform, node: NodeId) {
        mem.dispatch(node, EventKind::Click, EventDetail::None);
    }

    fn button(mem: &MemoryPlatform, id: &str) -> NodeId {
        mem.find_by_attr("data-id", id)[0]
    }

    #[test]
    fn question_resolves_with_clicked_button_id() {
        let (mem, env) = env();
        let promise = question(
            &env,
            QuestionOptions {
                buttons: vec![
                    QuestionButton::new("save", "Save"),
                    QuestionButton::new("discard", "Discard"),
                ],
                ..QuestionOptions::default()
            },
        )
        .unwrap();
        click(&mem, button(&mem, "discard"));
        assert_eq!(promise.try_get(), Some("discard".to_owned()));
    }

    #[test]
    fn question_dismissal_maps_when_configured() {
        let (mem, env) = env();
        let promise = question(
            &env,
            QuestionOptions {
                buttons: vec![QuestionButton::new("go", "Go")],
                on_dismissal: Some("later".to_owned()),
                ..QuestionOptions::default()
            },
        )
        .unwrap();
        let overlay = mem.find_by_class("scrim-overlay")[0];
        click(&mem, overlay);
        assert_eq!(promise.try_get(), Some("later".to_owned()));
    }

    #[test]
    fn question_without_mapping_stays_pending_on_dismissal() {
        let (mem, env) = env();
        let promise = question(
            &env,
            QuestionOptions {
                buttons: vec![QuestionButton::new("a", "A")],
                ..QuestionOptions::default()
            },
        )
        .unwrap();
        let overlay = mem.find_by_class("scrim-overlay")[0];
        click(&mem, overlay);
        assert!(!promise.is_settled());
    }

    #[test]
    fn confirm_yes_resolves_true_escape_false() {
        let (mem, env) = env();
        let first = confirm(&env, "Delete?", ConfirmOptions::default()).unwrap();
        click(&mem, button(&mem, "yes"));
        assert_eq!(first.try_get(), Some(true));

        let second = confirm(&env, "Delete?", ConfirmOptions::default()).unwrap();
        let surface = mem.find_by_class("scrim-surface")[0];
        mem.dispatch(
            surface,
            EventKind::KeyDown,
            EventDetail::Key(KeyEvent::plain(Key::Escape)),
        );
        assert_eq!(second.try_get(), Some(false));
    }

    #[test]
    fn confirm_uses_localized_default_labels() {
        let (mem, env) = env();
        let _promise = confirm(&env, "Sure?", ConfirmOptions::default()).unwrap();
        assert_eq!(mem.text(button(&mem, "yes")), "Yes");
        assert_eq!(mem.text(button(&mem, "no")), "No");
        let title = mem.find_by_class("scrim-title")[0];
        assert_eq!(mem.text(title), "Confirm");
    }

    #[test]
    fn alert_resolves_on_backdrop_dismissal() {
        let (mem, env) = env();
        let promise = alert(&env, "Heads up", AlertOptions::default()).unwrap();
        let overlay = mem.find_by_class("scrim-overlay")[0];
        click(&mem, overlay);
        assert!(promise.is_settled());
    }

    #[test]
    fn prompt_required_blocks_whitespace_and_accepts_input() {
        let (mem, env) = env();
        let promise = prompt(
            &env,
            "Name:",
            "",
            PromptOptions {
                required: true,
                ..PromptOptions::default()
            },
        )
        .unwrap();
        let input = mem.find_by_class("scrim-input")[0];
        let error = mem.find_by_class("scrim-error")[0];

        env.surface.platform.set_value(input, "   ");
        click(&mem, button(&mem, "ok"));
        assert!(!promise.is_settled());
        assert!(!mem.text(error).is_empty());
        assert_eq!(mem.find_by_class("scrim-surface").len(), 1);

        env.surface.platform.set_value(input, "Ada");
        click(&mem, button(&mem, "ok"));
        assert_eq!(promise.try_get(), Some(Some("Ada".to_owned())));
        assert!(mem.find_by_class("scrim-surface").is_empty());
    }

    #[test]
    fn prompt_resolves_untrimmed_value() {
        let (mem, env) = env();
        let promise = prompt(
            &env,
            "Name:",
            "",
            PromptOptions {
                required: true,
                ..PromptOptions::default()
            },
        )
        .unwrap();
        let input = mem.find_by_class("scrim-input")[0];
        env.surface.platform.set_value(input, "  Ada  ");
        click(&mem, button(&mem, "ok"));
        assert_eq!(promise.try_get(), Some(Some("  Ada  ".to_owned())));
    }

    #[test]
    fn prompt_enter_submits() {
        let (mem, env) = env();
        let promise = prompt(&env, "Name:", "Grace", PromptOptions::default()).unwrap();
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
    fn prompt_enter_ignored_when_input_not_focused() {
        let (mem, env) = env();
        let promise = prompt(&env, "Name:", "Grace", PromptOptions::default()).unwrap();
        let cancel = button(&mem, "cancel");
        mem.focus(cancel);
        let surface = mem.find_by_class("scrim-surface")[0];
        mem.dispatch(
            surface,
            EventKind::KeyDown,
            EventDetail::Key(KeyEvent::plain(Key::Enter)),
        );
        assert!(!promise.is_settled());
    }

    #[test]
    fn prompt_teardown_releases_every_listener() {
        let (mem, env) = env();
        let promise = prompt(&env, "Name:", "", PromptOptions::default()).unwrap();
        assert!(mem.active_listeners() > 0);
        click(&mem, button(&mem, "cancel"));
        assert_eq!(promise.try_get(), Some(None));
        assert_eq!(mem.active_listeners(), 0);
    }

    #[test]
    fn prompt_cancel_and_escape_resolve_none() {
        let (mem, env) = env();
        let first = prompt(&env, "Name:", "", PromptOptions::default()).unwrap();
        click(&mem, button(&mem, "cancel"));
        assert_eq!(first.try_get(), Some(None));

        let second = prompt(&env, "Name:", "", PromptOptions::default()).unwrap();
        let surface = mem.find_by_class("scrim-surface")[0];
        mem.dispatch(
            surface,
            EventKind::KeyDown,
            EventDetail::Key(KeyEvent::plain(Key::Escape)),
        );
        assert_eq!(second.try_get(), Some(None));
    }

    #[test]
    fn prompt_length_and_pattern_checks_run_in_order() {
        let rules = PromptRules {
            required: true,
            min_len: Some(3),
            max_len: Some(5),
            pattern: Some("[a-z]+".to_owned()),
            validator: None,
        };
        assert!(rules.check("  ").is_err());
        assert!(rules.check("ab").is_err());
        assert!(rules.check("abcdef").is_err());
        assert!(rules.check("ABC").is_err());
        assert!(rules.check("abc").is_ok());
        // Trimmed value is what gets validated.
        assert!(rules.check("  abc  ").is_ok());
    }

    #[test]
    fn bad_pattern_is_a_validation_failure() {
        let rules = PromptRules {
            required: false,
            min_len: None,
            max_len: None,
            pattern: Some("[unclosed".to_owned()),
            validator: None,
        };
        assert!(rules.check("anything").is_err());
    }

    #[test]
    fn custom_validator_failure_shows_inline() {
        let (mem, env) = env();
        let promise = prompt(
            &env,
            "Even number:",
            "",
            PromptOptions {
                validator: Some(Rc::new(|value: &str| {
                    value
                        .trim()
                        .parse::<i64>()
                        .ok()
                        .filter(|n| n % 2 == 0)
                        .map(|_| ())
                        .ok_or_else(|| "Please enter an even number.".to_owned())
                })),
                ..PromptOptions::default()
            },
        )
        .unwrap();
        let input = mem.find_by_class("scrim-input")[0];
        env.surface.platform.set_value(input, "3");
        click(&mem, button(&mem, "ok"));
        assert!(!promise.is_settled());
        let error = mem.find_by_class("scrim-error")[0];
        assert_eq!(mem.text(error), "Please enter an even number.");

        env.surface.platform.set_value(input, "4");
        click(&mem, button(&mem, "ok"));
        assert_eq!(promise.try_get(), Some(Some("4".to_owned())));
    }
}
