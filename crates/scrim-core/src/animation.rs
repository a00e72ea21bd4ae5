#![forbid(unsafe_code)]

//! Animation resolution: declarative specs to concrete parameters.
//!
//! An [`AnimationSpec`] may leave direction, distance, duration, and
//! easing as `Auto`/unset; [`resolve`] combines it with the anchor
//! the animating element is positioned at and the configured defaults
//! to produce a [`ResolvedAnimation`] with every field concrete.
//!
//! # Invariants
//!
//! 1. Resolution is a pure function: same inputs, same output.
//! 2. A `ResolvedAnimation` contains no `Auto` and is never mutated
//!    after resolution.
//! 3. Auto direction depends only on the anchor: vertical for center
//!    positions, horizontal toward the side for corners.

use std::time::Duration;

/// A screen anchor: where the animating element is positioned.
///
/// `Center` is the modal anchor; the other six are the toast slots
/// (top/bottom × left/center/right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    Center,
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// The class-name suffix for this anchor (`top-left`, …).
    #[must_use]
    pub fn class_suffix(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }
}

/// Animation preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Preset {
    /// Opacity transition only.
    #[default]
    Fade,
    /// Translate in from a direction, with fade.
    Slide,
    /// Scale in from slightly smaller, with fade.
    Zoom,
}

/// Movement direction for the `Slide` preset.
///
/// Directions name where the element moves *toward* while entering;
/// the exit phase plays the same resolved direction in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Derive from the anchor (see module docs).
    #[default]
    Auto,
    Up,
    Down,
    Left,
    Right,
}

/// A direction with `Auto` resolved away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ResolvedDirection {
    /// The class-name suffix for this direction.
    #[must_use]
    pub fn class_suffix(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Travel distance for the `Slide` preset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Distance {
    /// Preset-dependent default.
    #[default]
    Auto,
    Px(f64),
}

/// Timing function, expressed as its CSS value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    /// A raw CSS timing function, e.g. `cubic-bezier(0.2, 0, 0, 1)`.
    Custom(String),
}

impl Easing {
    /// The CSS `animation-timing-function` value.
    #[must_use]
    pub fn as_css(&self) -> &str {
        match self {
            Self::Linear => "linear",
            Self::Ease => "ease",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
            Self::Custom(css) => css,
        }
    }
}

/// Default slide distance when the spec says `Auto`.
const AUTO_SLIDE_DISTANCE_PX: f64 = 24.0;

/// Declarative animation request.
///
/// Unset fields fall back to the configured defaults at resolution
/// time; `Auto` fields are derived from the anchor.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationSpec {
    pub preset: Preset,
    pub direction: Direction,
    pub distance: Distance,
    pub duration: Option<Duration>,
    pub easing: Option<Easing>,
}

impl AnimationSpec {
    /// A spec with every field at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preset.
    #[must_use]
    pub fn preset(mut self, preset: Preset) -> Self {
        self.preset = preset;
        self
    }

    /// Set the slide direction.
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the slide distance.
    #[must_use]
    pub fn distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    /// Override the configured duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Override the configured easing.
    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }
}

/// Concrete animation parameters; see [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAnimation {
    pub preset: Preset,
    pub direction: ResolvedDirection,
    pub distance_px: f64,
    pub duration: Duration,
    pub easing: Easing,
}

impl ResolvedAnimation {
    /// The duration as a CSS value, e.g. `180ms`.
    #[must_use]
    pub fn duration_css(&self) -> String {
        format!("{}ms", self.duration.as_millis())
    }

    /// The distance as a CSS value, e.g. `24px`.
    #[must_use]
    pub fn distance_css(&self) -> String {
        format!("{}px", self.distance_px)
    }
}

fn auto_direction(anchor: Anchor) -> ResolvedDirection {
    match anchor {
        // Center-column elements travel vertically toward their edge.
        Anchor::Center | Anchor::TopCenter => ResolvedDirection::Down,
        Anchor::BottomCenter => ResolvedDirection::Up,
        // Corner elements slide in horizontally from their side.
        Anchor::TopLeft | Anchor::BottomLeft => ResolvedDirection::Right,
        Anchor::TopRight | Anchor::BottomRight => ResolvedDirection::Left,
    }
}

/// Resolve a spec against an anchor and the configured defaults.
#[must_use]
pub fn resolve(
    spec: &AnimationSpec,
    anchor: Anchor,
    default_duration: Duration,
    default_easing: &Easing,
) -> ResolvedAnimation {
    let direction = match spec.direction {
        Direction::Auto => auto_direction(anchor),
        Direction::Up => ResolvedDirection::Up,
        Direction::Down => ResolvedDirection::Down,
        Direction::Left => ResolvedDirection::Left,
        Direction::Right => ResolvedDirection::Right,
    };
    let distance_px = match spec.distance {
        Distance::Auto => match spec.preset {
            Preset::Slide => AUTO_SLIDE_DISTANCE_PX,
            Preset::Fade | Preset::Zoom => 0.0,
        },
        Distance::Px(px) => px,
    };
    ResolvedAnimation {
        preset: spec.preset,
        direction,
        distance_px,
        duration: spec.duration.unwrap_or(default_duration),
        easing: spec.easing.clone().unwrap_or_else(|| default_easing.clone()),
    }
}
