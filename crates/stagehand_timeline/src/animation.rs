// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation parameters carried by timeline entries.
//!
//! The engine never interpolates anything itself. These types describe the
//! transition a target should perform, and are handed to the target's own
//! [`TargetHandle`](crate::registry::TargetHandle) as [`TransitionParams`].

use serde::{Deserialize, Serialize};

/// Default duration of a single transition, in seconds
pub const DEFAULT_DURATION: f64 = 0.5;

/// Default visibility ratio that counts as "in view"
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.3;

/// Kind of visual effect a target should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    /// Opacity fade
    #[default]
    Fade,
    /// Translate in from a direction
    Slide,
    /// Scale up from a smaller size
    Scale,
    /// Rotate into place
    Rotate,
    /// 3D flip
    Flip,
    /// Blur to sharp
    Blur,
    /// Overshooting bounce
    Bounce,
    /// Interpreted by the target from `custom`
    Custom,
}

impl AnimationType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fade => "Fade",
            Self::Slide => "Slide",
            Self::Scale => "Scale",
            Self::Rotate => "Rotate",
            Self::Flip => "Flip",
            Self::Blur => "Blur",
            Self::Bounce => "Bounce",
            Self::Custom => "Custom",
        }
    }
}

/// Direction a directional effect enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From below, moving up
    #[default]
    Up,
    /// From above, moving down
    Down,
    /// From the right, moving left
    Left,
    /// From the left, moving right
    Right,
}

/// Spring physics parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    /// Spring stiffness
    pub stiffness: f64,
    /// Damping force
    pub damping: f64,
    /// Mass of the moving body
    pub mass: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 10.0,
            mass: 1.0,
        }
    }
}

/// Timing curve of a transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Slow start
    EaseIn,
    /// Slow end
    #[default]
    EaseOut,
    /// Slow start and end
    EaseInOut,
    /// Explicit cubic bezier control points `[x1, y1, x2, y2]`
    CubicBezier([f64; 4]),
    /// Physically based spring
    Spring(SpringConfig),
}

impl Easing {
    /// Control points of the equivalent cubic bezier, if the curve has one
    pub fn control_points(&self) -> Option<[f64; 4]> {
        match self {
            Self::Linear => Some([0.0, 0.0, 1.0, 1.0]),
            Self::EaseIn => Some([0.42, 0.0, 1.0, 1.0]),
            Self::EaseOut => Some([0.0, 0.0, 0.58, 1.0]),
            Self::EaseInOut => Some([0.42, 0.0, 0.58, 1.0]),
            Self::CubicBezier(points) => Some(*points),
            Self::Spring(_) => None,
        }
    }

    /// Spring parameters, if this is a spring curve
    pub fn spring(&self) -> Option<SpringConfig> {
        match self {
            Self::Spring(spring) => Some(*spring),
            _ => None,
        }
    }
}

/// Event class a single component animation responds to on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationTrigger {
    /// When the component mounts
    #[default]
    Load,
    /// When the component scrolls into view
    Scroll,
    /// While hovered
    Hover,
    /// When clicked
    Click,
}

/// Visibility settings for scroll-driven playback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollTrigger {
    /// Fraction of the container that must be visible, in `[0, 1]`
    pub threshold: f64,
    /// Only fire the first time the threshold is crossed
    pub once: bool,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_VISIBILITY_THRESHOLD,
            once: true,
        }
    }
}

/// Hover deltas applied on top of the resting state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HoverConfig {
    /// Additional scale factor
    pub scale: f64,
    /// Additional rotation in degrees
    pub rotate: f64,
    /// Vertical offset in pixels
    pub y: f64,
}

/// Animation settings of a timeline entry
///
/// Every field has a default, so an entry may specify only the parts it
/// cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Whether the entry animates at all
    pub enabled: bool,
    /// Effect kind
    #[serde(rename = "type")]
    pub kind: AnimationType,
    /// Entry direction
    pub direction: Direction,
    /// Duration in seconds
    pub duration: f64,
    /// Delay before the effect starts, applied by the target
    pub delay: f64,
    /// Per-child stagger, applied by the target
    pub stagger: f64,
    /// Timing curve
    pub easing: Easing,
    /// Component-level trigger
    pub trigger: AnimationTrigger,
    /// Component-level scroll settings
    pub scroll_trigger: ScrollTrigger,
    /// Hover deltas
    pub hover: Option<HoverConfig>,
    /// Free-form override interpreted by the target
    pub custom: Option<serde_json::Value>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: AnimationType::default(),
            direction: Direction::default(),
            duration: DEFAULT_DURATION,
            delay: 0.0,
            stagger: 0.0,
            easing: Easing::default(),
            trigger: AnimationTrigger::default(),
            scroll_trigger: ScrollTrigger::default(),
            hover: None,
            custom: None,
        }
    }
}

impl AnimationConfig {
    /// Create a config with the given duration
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// Set the effect kind
    pub fn kind(mut self, kind: AnimationType) -> Self {
        self.kind = kind;
        self
    }

    /// Set the timing curve
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Disable the animation while keeping its slot in the timeline
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Parameters handed to a target when it is told to transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionParams {
    /// Effect kind
    pub kind: AnimationType,
    /// Entry direction
    pub direction: Direction,
    /// Duration in seconds
    pub duration: f64,
    /// Target-side delay in seconds
    pub delay: f64,
    /// Target-side stagger in seconds
    pub stagger: f64,
    /// Timing curve
    pub easing: Easing,
    /// Component-level scroll settings
    pub scroll_trigger: ScrollTrigger,
    /// Hover deltas
    pub hover: Option<HoverConfig>,
    /// Free-form override
    pub custom: Option<serde_json::Value>,
    /// Label of the originating entry
    pub label: Option<String>,
    /// Zero-based loop iteration the command belongs to
    pub iteration: u32,
}

impl TransitionParams {
    /// Build the parameters for one dispatch
    pub fn from_config(config: &AnimationConfig, label: Option<&str>, iteration: u32) -> Self {
        Self {
            kind: config.kind,
            direction: config.direction,
            duration: config.duration,
            delay: config.delay,
            stagger: config.stagger,
            easing: config.easing,
            scroll_trigger: config.scroll_trigger,
            hover: config.hover,
            custom: config.custom.clone(),
            label: label.map(str::to_owned),
            iteration,
        }
    }

    /// Spring parameters, if the transition uses a spring curve
    pub fn spring(&self) -> Option<SpringConfig> {
        self.easing.spring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AnimationConfig = ron::from_str("(duration: 0.6, type: slide)").unwrap();
        assert_eq!(config.duration, 0.6);
        assert_eq!(config.kind, AnimationType::Slide);
        assert!(config.enabled);
        assert_eq!(config.scroll_trigger.threshold, DEFAULT_VISIBILITY_THRESHOLD);
    }

    #[test]
    fn test_spring_easing() {
        let config: AnimationConfig =
            ron::from_str("(easing: spring((stiffness: 300.0, damping: 20.0)))").unwrap();
        let params = TransitionParams::from_config(&config, Some("hero"), 0);
        let spring = params.spring().unwrap();
        assert_eq!(spring.stiffness, 300.0);
        assert_eq!(spring.damping, 20.0);
        assert_eq!(spring.mass, 1.0);
        assert!(params.easing.control_points().is_none());
        assert_eq!(params.label.as_deref(), Some("hero"));
    }

    #[test]
    fn test_named_easing_control_points() {
        assert_eq!(Easing::Linear.control_points(), Some([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(Easing::default(), Easing::EaseOut);
    }
}
