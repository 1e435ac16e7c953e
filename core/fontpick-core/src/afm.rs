//! Adobe Font Metrics header reader (made by FontLab https://www.fontlab.com/)
//!
//! Only the global header is read; character metrics, kerning and composites
//! are ignored.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ExtractError;
use crate::extract::{stretch_from_name, variant_from_family, FaceInfo};
use crate::properties::{FontWeight, Slant};

/// Header fields relevant to matching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AfmHeader {
    pub font_name: Option<String>,
    pub full_name: Option<String>,
    pub family_name: Option<String>,
    pub weight: Option<String>,
    pub italic_angle: f64,
}

impl AfmHeader {
    /// `FamilyName`, or `FullName` with trailing style words removed.
    pub fn family(&self) -> Option<String> {
        if let Some(family) = &self.family_name {
            return Some(family.clone());
        }
        self.full_name
            .as_deref()
            .map(|full| style_suffix().replace(full, "").trim().to_string())
            .filter(|family| !family.is_empty())
    }
}

fn style_suffix() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| {
        Regex::new(
            r"(?i)([ -](regular|plain|italic|oblique|bold|semibold|light|ultralight|extra|condensed))+$",
        )
        .expect("style suffix regex")
    })
}

/// Parse the header of an AFM file. The bytes are read as Latin-1.
pub fn parse_header(data: &[u8]) -> Result<AfmHeader, ExtractError> {
    let text: String = data.iter().map(|&b| b as char).collect();
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(first) if first.starts_with("StartFontMetrics") => {}
        _ => {
            return Err(ExtractError::Unsupported(
                "AFM data must start with StartFontMetrics".into(),
            ))
        }
    }

    let mut header = AfmHeader::default();
    for line in lines {
        let (key, value) = match line.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (line, ""),
        };
        match key {
            "StartCharMetrics" | "EndFontMetrics" => break,
            "FontName" => header.font_name = Some(value.to_string()),
            "FullName" => header.full_name = Some(value.to_string()),
            "FamilyName" => header.family_name = Some(value.to_string()),
            "Weight" => header.weight = Some(value.to_string()),
            "ItalicAngle" => {
                header.italic_angle = value.parse().map_err(|_| {
                    ExtractError::Unsupported(format!("bad ItalicAngle {value:?}"))
                })?
            }
            _ => {}
        }
    }
    Ok(header)
}

/// Describe the face of an AFM file.
pub fn face_info(data: &[u8]) -> Result<FaceInfo, ExtractError> {
    let header = parse_header(data)?;
    let family_name = header
        .family()
        .ok_or_else(|| ExtractError::Unsupported("AFM header has no family name".into()))?;
    let lowered = family_name.to_lowercase();

    let style = if header.italic_angle != 0.0 || lowered.contains("italic") {
        Slant::Italic
    } else if lowered.contains("oblique") {
        Slant::Oblique
    } else {
        Slant::Normal
    };

    let weight = match header.weight.as_deref() {
        None => FontWeight::NORMAL,
        Some(raw) => raw.to_lowercase().parse().unwrap_or_else(|_| {
            tracing::debug!("unknown AFM weight {raw:?}, treating it as 500");
            FontWeight::Numeric(500)
        }),
    };

    let font_name = header.font_name.as_deref().unwrap_or_default().to_lowercase();

    Ok(FaceInfo {
        variant: variant_from_family(&family_name),
        stretch: stretch_from_name(&font_name),
        style,
        weight,
        family_name,
        scalable: true,
    })
}
