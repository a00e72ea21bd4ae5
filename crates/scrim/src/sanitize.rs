#![forbid(unsafe_code)]

//! Sanitizer contract and content routing.
//!
//! Scrim never interprets markup itself; the actual allow-list
//! filter is an external collaborator injected as a [`Sanitize`]
//! implementation. Every markup string a caller hands to a surface
//! or toast goes through the injected sanitizer unless the caller
//! opts out with [`Content::HtmlRaw`].

use std::rc::Rc;

use scrim_core::{NodeId, Platform};

/// An HTML filtering strategy.
pub trait Sanitize {
    /// Return `html` with disallowed elements and attributes removed
    /// or unwrapped.
    fn clean(&self, html: &str) -> String;
}

/// The default sanitizer: returns input unchanged.
///
/// Suitable for trusted content and tests only; production embedders
/// inject a real filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Sanitize for Passthrough {
    fn clean(&self, html: &str) -> String {
        html.to_owned()
    }
}

/// Caller-supplied node content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Plain text, rendered verbatim with no markup interpretation.
    Text(String),
    /// Markup, routed through the injected sanitizer.
    Html(String),
    /// Markup inserted without sanitization. Explicit opt-out.
    HtmlRaw(String),
}

impl Content {
    /// Write this content into `node`.
    pub fn apply(&self, platform: &Rc<dyn Platform>, node: NodeId, sanitizer: &Rc<dyn Sanitize>) {
        match self {
            Self::Text(text) => platform.set_text(node, text),
            Self::Html(html) => platform.set_html(node, &sanitizer.clean(html)),
            Self::HtmlRaw(html) => platform.set_html(node, html),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrim_core::MemoryPlatform;

    struct Stripper;

    impl Sanitize for Stripper {
        fn clean(&self, html: &str) -> String {
            html.replace("<script>", "")
        }
    }

    #[test]
    fn text_bypasses_sanitizer() {
        let mem = Rc::new(MemoryPlatform::new());
        let platform: Rc<dyn Platform> = Rc::clone(&mem) as Rc<dyn Platform>;
        let sanitizer: Rc<dyn Sanitize> = Rc::new(Stripper);
        let node = platform.create_element("div");
        Content::Text("<script>".into()).apply(&platform, node, &sanitizer);
        assert_eq!(mem.text(node), "<script>");
    }

    #[test]
    fn html_is_sanitized_and_raw_is_not() {
        let mem = Rc::new(MemoryPlatform::new());
        let platform: Rc<dyn Platform> = Rc::clone(&mem) as Rc<dyn Platform>;
        let sanitizer: Rc<dyn Sanitize> = Rc::new(Stripper);

        let clean = platform.create_element("div");
        Content::Html("<script>hi".into()).apply(&platform, clean, &sanitizer);
        assert_eq!(mem.html(clean), "hi");

        let raw = platform.create_element("div");
        Content::HtmlRaw("<script>hi".into()).apply(&platform, raw, &sanitizer);
        assert_eq!(mem.html(raw), "<script>hi");
    }
}
