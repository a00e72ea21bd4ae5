#![forbid(unsafe_code)]

//! Label registry with per-locale bundles and English fallback.
//!
//! # Invariants
//!
//! 1. **Lookups are total**: every [`LabelKey`] resolves to a string
//!    in every registered locale, because partial registrations are
//!    merged over the built-in English bundle at load time.
//!
//! 2. **English is always present**: the registry starts with `"en"`
//!    registered and active, and it cannot be removed.
//!
//! 3. **Activation is validated**: switching to an unregistered
//!    locale fails without changing the active one.

use std::collections::HashMap;

/// Errors from label registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nError {
    /// The locale has not been registered.
    UnknownLocale(String),
}

impl std::fmt::Display for I18nError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLocale(locale) => write!(f, "unknown locale: {locale}"),
        }
    }
}

impl std::error::Error for I18nError {}

/// The built-in strings Scrim renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKey {
    Ok,
    Cancel,
    Yes,
    No,
    Close,
    Dismiss,
    AlertTitle,
    ConfirmTitle,
    PromptTitle,
    QuestionTitle,
}

/// A complete set of labels for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleBundle {
    pub ok: String,
    pub cancel: String,
    pub yes: String,
    pub no: String,
    pub close: String,
    pub dismiss: String,
    pub alert_title: String,
    pub confirm_title: String,
    pub prompt_title: String,
    pub question_title: String,
}

impl LocaleBundle {
    /// The built-in English bundle.
    #[must_use]
    pub fn english() -> Self {
        Self {
            ok: "OK".into(),
            cancel: "Cancel".into(),
            yes: "Yes".into(),
            no: "No".into(),
            close: "Close".into(),
            dismiss: "Dismiss".into(),
            alert_title: "Notice".into(),
            confirm_title: "Confirm".into(),
            prompt_title: "Input".into(),
            question_title: "Question".into(),
        }
    }

    /// The label for `key`.
    #[must_use]
    pub fn label(&self, key: LabelKey) -> &str {
        match key {
            LabelKey::Ok => &self.ok,
            LabelKey::Cancel => &self.cancel,
            LabelKey::Yes => &self.yes,
            LabelKey::No => &self.no,
            LabelKey::Close => &self.close,
            LabelKey::Dismiss => &self.dismiss,
            LabelKey::AlertTitle => &self.alert_title,
            LabelKey::ConfirmTitle => &self.confirm_title,
            LabelKey::PromptTitle => &self.prompt_title,
            LabelKey::QuestionTitle => &self.question_title,
        }
    }

    /// Apply the set fields of a partial bundle over this one.
    pub fn merge(&mut self, partial: PartialBundle) {
        let PartialBundle {
            ok,
            cancel,
            yes,
            no,
            close,
            dismiss,
            alert_title,
            confirm_title,
            prompt_title,
            question_title,
        } = partial;
        if let Some(v) = ok {
            self.ok = v;
        }
        if let Some(v) = cancel {
            self.cancel = v;
        }
        if let Some(v) = yes {
            self.yes = v;
        }
        if let Some(v) = no {
            self.no = v;
        }
        if let Some(v) = close {
            self.close = v;
        }
        if let Some(v) = dismiss {
            self.dismiss = v;
        }
        if let Some(v) = alert_title {
            self.alert_title = v;
        }
        if let Some(v) = confirm_title {
            self.confirm_title = v;
        }
        if let Some(v) = prompt_title {
            self.prompt_title = v;
        }
        if let Some(v) = question_title {
            self.question_title = v;
        }
    }
}

impl Default for LocaleBundle {
    fn default() -> Self {
        Self::english()
    }
}

/// A partial translation: unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialBundle {
    pub ok: Option<String>,
    pub cancel: Option<String>,
    pub yes: Option<String>,
    pub no: Option<String>,
    pub close: Option<String>,
    pub dismiss: Option<String>,
    pub alert_title: Option<String>,
    pub confirm_title: Option<String>,
    pub prompt_title: Option<String>,
    pub question_title: Option<String>,
}

/// Registry of locale bundles with one active locale.
///
/// # Example
///
/// ```
/// use scrim_i18n::{LabelKey, LocaleRegistry, PartialBundle};
///
/// let mut registry = LocaleRegistry::new();
/// registry.load(
///     "de",
///     PartialBundle {
///         ok: Some("OK".into()),
///         cancel: Some("Abbrechen".into()),
///         ..PartialBundle::default()
///     },
/// );
/// registry.activate("de").unwrap();
/// assert_eq!(registry.label(LabelKey::Cancel), "Abbrechen");
/// // Fields the translation left out fall back to English.
/// assert_eq!(registry.label(LabelKey::Yes), "Yes");
/// ```
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    locales: HashMap<String, LocaleBundle>,
    active: String,
}

impl LocaleRegistry {
    /// A registry with English registered and active.
    #[must_use]
    pub fn new() -> Self {
        let mut locales = HashMap::new();
        locales.insert("en".to_owned(), LocaleBundle::english());
        Self {
            locales,
            active: "en".to_owned(),
        }
    }

    /// Register a complete bundle, replacing any existing one.
    pub fn register(&mut self, locale: impl Into<String>, bundle: LocaleBundle) {
        self.locales.insert(locale.into(), bundle);
    }

    /// Merge a partial translation into a locale.
    ///
    /// An unregistered locale starts from the English bundle, so the
    /// result is always complete.
    pub fn load(&mut self, locale: impl Into<String>, partial: PartialBundle) {
        self.locales
            .entry(locale.into())
            .or_insert_with(LocaleBundle::english)
            .merge(partial);
    }

    /// Switch the active locale.
    pub fn activate(&mut self, locale: &str) -> Result<(), I18nError> {
        if !self.locales.contains_key(locale) {
            return Err(I18nError::UnknownLocale(locale.to_owned()));
        }
        self.active = locale.to_owned();
        Ok(())
    }

    /// Override one label on the active locale.
    pub fn set(&mut self, key: LabelKey, value: impl Into<String>) {
        let active = self.active.clone();
        let bundle = self
            .locales
            .entry(active)
            .or_insert_with(LocaleBundle::english);
        let value = value.into();
        match key {
            LabelKey::Ok => bundle.ok = value,
            LabelKey::Cancel => bundle.cancel = value,
            LabelKey::Yes => bundle.yes = value,
            LabelKey::No => bundle.no = value,
            LabelKey::Close => bundle.close = value,
            LabelKey::Dismiss => bundle.dismiss = value,
            LabelKey::AlertTitle => bundle.alert_title = value,
            LabelKey::ConfirmTitle => bundle.confirm_title = value,
            LabelKey::PromptTitle => bundle.prompt_title = value,
            LabelKey::QuestionTitle => bundle.question_title = value,
        }
    }

    /// The active locale identifier.
    #[must_use]
    pub fn active(&self) -> &str {
        &self.active
    }

    /// The label for `key` in the active locale.
    #[must_use]
    pub fn label(&self, key: LabelKey) -> &str {
        self.locales
            .get(&self.active)
            .map_or_else(|| "", |bundle| bundle.label(key))
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
