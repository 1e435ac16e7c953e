//! Font style requests and the axis value types they are built from
//! (made by FontLab https://www.fontlab.com/)

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FontError;

/// Upright, italic or oblique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slant {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl Slant {
    pub fn as_str(self) -> &'static str {
        match self {
            Slant::Normal => "normal",
            Slant::Italic => "italic",
            Slant::Oblique => "oblique",
        }
    }

    /// Italic and oblique count as near misses of each other.
    pub fn is_sloped(self) -> bool {
        matches!(self, Slant::Italic | Slant::Oblique)
    }
}

impl FromStr for Slant {
    type Err = FontError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Slant::Normal),
            "italic" => Ok(Slant::Italic),
            "oblique" => Ok(Slant::Oblique),
            _ => Err(FontError::validation(
                "slant",
                raw,
                "normal, italic or oblique",
            )),
        }
    }
}

impl fmt::Display for Slant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normal or small-caps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    #[default]
    Normal,
    SmallCaps,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Normal => "normal",
            Variant::SmallCaps => "small-caps",
        }
    }
}

impl FromStr for Variant {
    type Err = FontError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Variant::Normal),
            "small-caps" => Ok(Variant::SmallCaps),
            _ => Err(FontError::validation(
                "variant",
                raw,
                "normal or small-caps",
            )),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight keywords and the CSS numbers they stand for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedWeight {
    #[serde(rename = "ultralight")]
    Ultralight,
    #[serde(rename = "light")]
    Light,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "book")]
    Book,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "roman")]
    Roman,
    #[serde(rename = "semibold")]
    Semibold,
    #[serde(rename = "demibold")]
    Demibold,
    #[serde(rename = "demi")]
    Demi,
    #[serde(rename = "bold")]
    Bold,
    #[serde(rename = "heavy")]
    Heavy,
    #[serde(rename = "extra bold")]
    ExtraBold,
    #[serde(rename = "black")]
    Black,
}

impl NamedWeight {
    /// Every keyword, in the order name-based detection tries them.
    pub const ALL: [NamedWeight; 14] = [
        NamedWeight::Ultralight,
        NamedWeight::Light,
        NamedWeight::Normal,
        NamedWeight::Regular,
        NamedWeight::Book,
        NamedWeight::Medium,
        NamedWeight::Roman,
        NamedWeight::Semibold,
        NamedWeight::Demibold,
        NamedWeight::Demi,
        NamedWeight::Bold,
        NamedWeight::Heavy,
        NamedWeight::ExtraBold,
        NamedWeight::Black,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NamedWeight::Ultralight => "ultralight",
            NamedWeight::Light => "light",
            NamedWeight::Normal => "normal",
            NamedWeight::Regular => "regular",
            NamedWeight::Book => "book",
            NamedWeight::Medium => "medium",
            NamedWeight::Roman => "roman",
            NamedWeight::Semibold => "semibold",
            NamedWeight::Demibold => "demibold",
            NamedWeight::Demi => "demi",
            NamedWeight::Bold => "bold",
            NamedWeight::Heavy => "heavy",
            NamedWeight::ExtraBold => "extra bold",
            NamedWeight::Black => "black",
        }
    }

    pub fn value(self) -> u16 {
        match self {
            NamedWeight::Ultralight => 100,
            NamedWeight::Light => 200,
            NamedWeight::Normal | NamedWeight::Regular | NamedWeight::Book => 400,
            NamedWeight::Medium | NamedWeight::Roman => 500,
            NamedWeight::Semibold | NamedWeight::Demibold | NamedWeight::Demi => 600,
            NamedWeight::Bold => 700,
            NamedWeight::Heavy | NamedWeight::ExtraBold => 800,
            NamedWeight::Black => 900,
        }
    }

    fn lookup(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|w| w.as_str() == lowered)
    }
}

/// Stretch keywords and the CSS numbers they stand for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamedStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl NamedStretch {
    pub const ALL: [NamedStretch; 9] = [
        NamedStretch::UltraCondensed,
        NamedStretch::ExtraCondensed,
        NamedStretch::Condensed,
        NamedStretch::SemiCondensed,
        NamedStretch::Normal,
        NamedStretch::SemiExpanded,
        NamedStretch::Expanded,
        NamedStretch::ExtraExpanded,
        NamedStretch::UltraExpanded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NamedStretch::UltraCondensed => "ultra-condensed",
            NamedStretch::ExtraCondensed => "extra-condensed",
            NamedStretch::Condensed => "condensed",
            NamedStretch::SemiCondensed => "semi-condensed",
            NamedStretch::Normal => "normal",
            NamedStretch::SemiExpanded => "semi-expanded",
            NamedStretch::Expanded => "expanded",
            NamedStretch::ExtraExpanded => "extra-expanded",
            NamedStretch::UltraExpanded => "ultra-expanded",
        }
    }

    pub fn value(self) -> u16 {
        match self {
            NamedStretch::UltraCondensed => 100,
            NamedStretch::ExtraCondensed => 200,
            NamedStretch::Condensed => 300,
            NamedStretch::SemiCondensed => 400,
            NamedStretch::Normal => 500,
            NamedStretch::SemiExpanded => 600,
            NamedStretch::Expanded => 700,
            NamedStretch::ExtraExpanded => 800,
            NamedStretch::UltraExpanded => 900,
        }
    }

    fn lookup(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == lowered)
    }
}

/// A weight given either as a number on the 0–1000 scale or as a keyword.
///
/// The two forms are kept apart: `bold` and `700` are different requests even
/// though they resolve to the same number, because identical keywords score a
/// perfect match while numbers never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(u16),
    Named(NamedWeight),
}

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight::Named(NamedWeight::Normal);

    /// Build a numeric weight, rejecting values outside 0–1000.
    pub fn numeric(value: i64) -> Result<Self, FontError> {
        if (0..=1000).contains(&value) {
            Ok(FontWeight::Numeric(value as u16))
        } else {
            Err(weight_error(&value.to_string()))
        }
    }

    /// Canonical CSS number.
    pub fn value(self) -> u16 {
        match self {
            FontWeight::Numeric(v) => v,
            FontWeight::Named(named) => named.value(),
        }
    }

    pub(crate) fn validated(self) -> Result<Self, FontError> {
        match self {
            FontWeight::Numeric(v) if v > 1000 => Err(weight_error(&v.to_string())),
            other => Ok(other),
        }
    }
}

fn weight_error(raw: &str) -> FontError {
    let names: Vec<&str> = NamedWeight::ALL.iter().map(|w| w.as_str()).collect();
    FontError::validation(
        "weight",
        raw,
        format!("an integer in 0..=1000 or one of {}", names.join(", ")),
    )
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::NORMAL
    }
}

impl FromStr for FontWeight {
    type Err = FontError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = raw.trim().parse::<i64>() {
            return FontWeight::numeric(number).map_err(|_| weight_error(raw));
        }
        NamedWeight::lookup(raw)
            .map(FontWeight::Named)
            .ok_or_else(|| weight_error(raw))
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontWeight::Numeric(v) => write!(f, "{v}"),
            FontWeight::Named(named) => f.write_str(named.as_str()),
        }
    }
}

/// A width given either as a number on the 0–1000 scale or as a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontStretch {
    Numeric(u16),
    Named(NamedStretch),
}

impl FontStretch {
    pub const NORMAL: FontStretch = FontStretch::Named(NamedStretch::Normal);

    pub fn numeric(value: i64) -> Result<Self, FontError> {
        if (0..=1000).contains(&value) {
            Ok(FontStretch::Numeric(value as u16))
        } else {
            Err(stretch_error(&value.to_string()))
        }
    }

    pub fn value(self) -> u16 {
        match self {
            FontStretch::Numeric(v) => v,
            FontStretch::Named(named) => named.value(),
        }
    }

    pub(crate) fn validated(self) -> Result<Self, FontError> {
        match self {
            FontStretch::Numeric(v) if v > 1000 => Err(stretch_error(&v.to_string())),
            other => Ok(other),
        }
    }
}

fn stretch_error(raw: &str) -> FontError {
    let names: Vec<&str> = NamedStretch::ALL.iter().map(|s| s.as_str()).collect();
    FontError::validation(
        "stretch",
        raw,
        format!("an integer in 0..=1000 or one of {}", names.join(", ")),
    )
}

impl Default for FontStretch {
    fn default() -> Self {
        FontStretch::NORMAL
    }
}

impl FromStr for FontStretch {
    type Err = FontError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = raw.trim().parse::<i64>() {
            return FontStretch::numeric(number).map_err(|_| stretch_error(raw));
        }
        NamedStretch::lookup(raw)
            .map(FontStretch::Named)
            .ok_or_else(|| stretch_error(raw))
    }
}

impl fmt::Display for FontStretch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontStretch::Numeric(v) => write!(f, "{v}"),
            FontStretch::Named(named) => f.write_str(named.as_str()),
        }
    }
}

/// Relative and absolute size keywords with their scaling of the default size.
pub const FONT_SCALINGS: [(&str, f64); 9] = [
    ("xx-small", 0.579),
    ("x-small", 0.694),
    ("small", 0.833),
    ("medium", 1.0),
    ("large", 1.200),
    ("x-large", 1.440),
    ("xx-large", 1.728),
    ("larger", 1.2),
    ("smaller", 0.833),
];

/// Size in points, never below 1pt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FontSize(f64);

impl FontSize {
    pub const DEFAULT: FontSize = FontSize(10.0);

    /// Accept an absolute size; sizes under 1pt are raised to 1pt.
    pub fn points(value: f64) -> Result<Self, FontError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(size_error(&value.to_string()));
        }
        if value < 1.0 {
            tracing::debug!("font size {value:.2}pt is below 1pt, using 1pt");
            return Ok(FontSize(1.0));
        }
        Ok(FontSize(value))
    }

    /// Parse a number of points or a size keyword resolved against `default_size`.
    pub fn parse(raw: &str, default_size: FontSize) -> Result<Self, FontError> {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<f64>() {
            return FontSize::points(value).map_err(|_| size_error(raw));
        }
        let lowered = trimmed.to_ascii_lowercase();
        FONT_SCALINGS
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, scale)| FontSize::points(scale * default_size.0))
            .unwrap_or_else(|| Err(size_error(raw)))
    }

    pub fn as_points(self) -> f64 {
        self.0
    }
}

fn size_error(raw: &str) -> FontError {
    let names: Vec<&str> = FONT_SCALINGS.iter().map(|(name, _)| *name).collect();
    FontError::validation(
        "size",
        raw,
        format!("a positive number of points or one of {}", names.join(", ")),
    )
}

impl Default for FontSize {
    fn default() -> Self {
        FontSize::DEFAULT
    }
}

impl PartialEq for FontSize {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FontSize {}

impl Hash for FontSize {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl TryFrom<f64> for FontSize {
    type Error = FontError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        FontSize::points(value)
    }
}

impl From<FontSize> for f64 {
    fn from(size: FontSize) -> f64 {
        size.0
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Values every request starts from before its own axes are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDefaults {
    pub family: Vec<String>,
    pub style: Slant,
    pub variant: Variant,
    pub weight: FontWeight,
    pub stretch: FontStretch,
    pub size: FontSize,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            family: vec!["sans-serif".to_string()],
            style: Slant::Normal,
            variant: Variant::Normal,
            weight: FontWeight::NORMAL,
            stretch: FontStretch::NORMAL,
            size: FontSize::DEFAULT,
        }
    }
}

/// A requested font style.
///
/// Equality and hashing cover every axis plus the explicit file, so two
/// requests built differently but describing the same style compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontProperties {
    family: Vec<String>,
    slant: Slant,
    variant: Variant,
    weight: FontWeight,
    stretch: FontStretch,
    size: FontSize,
    file: Option<PathBuf>,
}

impl FontProperties {
    pub fn new() -> Self {
        Self::from_defaults(&StyleDefaults::default())
    }

    pub fn from_defaults(defaults: &StyleDefaults) -> Self {
        let family = if defaults.family.is_empty() {
            StyleDefaults::default().family
        } else {
            defaults.family.clone()
        };
        Self {
            family,
            slant: defaults.style,
            variant: defaults.variant,
            weight: defaults.weight,
            stretch: defaults.stretch,
            size: defaults.size,
            file: None,
        }
    }

    /// Replace the family list. An empty list leaves the current families in place.
    pub fn with_family<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let families: Vec<String> = families
            .into_iter()
            .map(Into::into)
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        if !families.is_empty() {
            self.family = families;
        }
        self
    }

    pub fn with_slant(mut self, slant: Slant) -> Self {
        self.slant = slant;
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Result<Self, FontError> {
        self.weight = weight.validated()?;
        Ok(self)
    }

    pub fn with_stretch(mut self, stretch: FontStretch) -> Result<Self, FontError> {
        self.stretch = stretch.validated()?;
        Ok(self)
    }

    pub fn with_size(mut self, size: FontSize) -> Self {
        self.size = size;
        self
    }

    /// Pin the request to a file; the matcher then returns it without scoring.
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn family(&self) -> &[String] {
        &self.family
    }

    pub fn slant(&self) -> Slant {
        self.slant
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn stretch(&self) -> FontStretch {
        self.stretch
    }

    pub fn size(&self) -> FontSize {
        self.size
    }

    pub fn size_in_points(&self) -> f64 {
        self.size.as_points()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Parse a pattern such as `DejaVu Sans-12:bold:italic` against the stock defaults.
    pub fn from_pattern(pattern: &str) -> Result<Self, FontError> {
        crate::pattern::parse_pattern(pattern, &StyleDefaults::default())
    }

    pub fn to_pattern(&self) -> String {
        crate::pattern::to_pattern(self)
    }
}

impl Default for FontProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FontProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pattern())
    }
}

impl FromStr for FontProperties {
    type Err = FontError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        FontProperties::from_pattern(pattern)
    }
}
