use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of numeric features a theme encodes to
/// (text r, g, b followed by background r, g, b).
pub const FEATURE_WIDTH: usize = 6;

/// One colour as three 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// A text colour rendered on a background colour.
///
/// Themes are never mutated; every cycle publishes a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Theme {
    pub text_colour: Rgb,
    pub background_colour: Rgb,
}

impl Theme {
    pub const fn new(text_colour: Rgb, background_colour: Rgb) -> Self {
        Self {
            text_colour,
            background_colour,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "text {} on {}", self.text_colour, self.background_colour)
    }
}

/// Normalised encoding of a theme, every component in [0, 1].
pub type FeatureVector = [f32; FEATURE_WIDTH];

/// A rated theme, ready to be folded into a retraining batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatedSample {
    pub features: FeatureVector,
    pub reward: f32,
}

impl RatedSample {
    pub fn new(features: FeatureVector, reward: f32) -> Self {
        Self { features, reward }
    }
}

/// A candidate theme with the score the preference model assigned it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredTheme {
    pub theme: Theme,
    pub score: f32,
}

/// The three rating controls offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    /// "This is clean"
    Clean,
    /// "Meh..."
    Meh,
    /// "Absolute trash"
    Trash,
}

impl Rating {
    pub fn reward(&self) -> f32 {
        match self {
            Rating::Clean => 1.0,
            Rating::Meh => 0.5,
            Rating::Trash => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Clean => "clean",
            Rating::Meh => "meh",
            Rating::Trash => "trash",
        }
    }
}

/// Options passed to every `fit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitOptions {
    pub epochs: usize,
    pub shuffle: bool,
}

/// Outcome of one `fit` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub epochs: usize,
    pub samples: usize,
    /// Mean-squared error at the end of each epoch.
    pub loss_history: Vec<f32>,
}

impl TrainingResult {
    pub fn final_loss(&self) -> Option<f32> {
        self.loss_history.last().copied()
    }
}

/// How the next displayed theme was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionKind {
    /// A brand-new random theme, independent of the ranked pool.
    Explore,
    /// A theme drawn from the recommended list, at this index.
    Exploit { rank: usize },
}

impl SelectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionKind::Explore => "explore",
            SelectionKind::Exploit { .. } => "exploit",
        }
    }
}

/// Read-only view of what the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSnapshot {
    pub current_theme: Theme,
    pub recommended: Vec<ScoredTheme>,
    pub busy: bool,
    /// Completed rating cycles.
    pub cycle: u64,
    pub last_training: Option<TrainingResult>,
    pub updated_at: DateTime<Utc>,
}

impl RecommendationSnapshot {
    pub fn initial(current_theme: Theme) -> Self {
        Self {
            current_theme,
            recommended: Vec::new(),
            busy: false,
            cycle: 0,
            last_training: None,
            updated_at: Utc::now(),
        }
    }
}
