//! Turning font files into style descriptions (made by FontLab https://www.fontlab.com/)

use std::fs;
use std::path::Path;

use crate::afm;
use crate::catalog::FontKind;
use crate::error::ExtractError;
use crate::properties::{FontStretch, FontWeight, NamedStretch, NamedWeight, Slant, Variant};

/// What an extractor learned about one face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceInfo {
    pub family_name: String,
    pub style: Slant,
    pub variant: Variant,
    pub weight: FontWeight,
    pub stretch: FontStretch,
    pub scalable: bool,
}

impl FaceInfo {
    /// A regular, scalable face of `family_name`.
    pub fn new(family_name: impl Into<String>) -> Self {
        Self {
            family_name: family_name.into(),
            style: Slant::Normal,
            variant: Variant::Normal,
            weight: FontWeight::NORMAL,
            stretch: FontStretch::NORMAL,
            scalable: true,
        }
    }
}

/// Reads one file of a given kind. Implementations must tolerate being called
/// from several threads at once.
pub trait FontExtractor: Send + Sync {
    fn extract(&self, path: &Path, kind: FontKind) -> Result<FaceInfo, ExtractError>;
}

/// Extractor backed by the real file parsers.
#[derive(Debug, Clone, Default)]
pub struct FileExtractor {
    max_file_size: Option<u64>,
}

impl FileExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse files larger than `limit` bytes without reading them.
    pub fn with_max_file_size(mut self, limit: Option<u64>) -> Self {
        self.max_file_size = limit;
        self
    }
}

impl FontExtractor for FileExtractor {
    fn extract(&self, path: &Path, kind: FontKind) -> Result<FaceInfo, ExtractError> {
        let unreadable = |source| ExtractError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        if let Some(limit) = self.max_file_size {
            let len = fs::metadata(path).map_err(unreadable)?.len();
            if len > limit {
                return Err(ExtractError::Unsupported(format!(
                    "file is {len} bytes, limit is {limit}"
                )));
            }
        }

        let data = fs::read(path).map_err(unreadable)?;
        match kind {
            FontKind::Outline => outline_face(&data, path),
            FontKind::Metric => afm::face_info(&data),
        }
    }
}

#[cfg(feature = "fontations")]
fn outline_face(data: &[u8], path: &Path) -> Result<FaceInfo, ExtractError> {
    use read_fonts::tables::name::NameId;
    use read_fonts::types::Tag;
    use read_fonts::{FontRef, TableProvider};
    use skrifa::attribute::Style;
    use skrifa::{FontRef as SkrifaFontRef, MetadataProvider};

    let font = FontRef::fonts(data)
        .next()
        .ok_or_else(|| ExtractError::Unsupported("no faces in file".into()))?
        .map_err(|err| ExtractError::Unsupported(err.to_string()))?;
    let sfont = match font.ttc_index() {
        Some(idx) => SkrifaFontRef::from_index(data, idx),
        None => SkrifaFontRef::new(data),
    }
    .map_err(|err| ExtractError::Unsupported(err.to_string()))?;

    let outline_tables = [Tag::new(b"glyf"), Tag::new(b"CFF "), Tag::new(b"CFF2")];
    let scalable = font
        .table_directory
        .table_records()
        .iter()
        .any(|rec| outline_tables.contains(&rec.tag()));

    let family_name = english_name(&font, NameId::FAMILY_NAME)
        .or_else(|| english_name(&font, NameId::TYPOGRAPHIC_FAMILY_NAME))
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
        })
        .ok_or_else(|| ExtractError::Unsupported("face has no family name".into()))?;
    let subfamily = english_name(&font, NameId::SUBFAMILY_NAME)
        .unwrap_or_default()
        .to_lowercase();
    let full_name = english_name(&font, NameId::FULL_NAME)
        .unwrap_or_default()
        .to_lowercase();

    let attributes = sfont.attributes();
    let style = if full_name.contains("oblique") {
        Slant::Oblique
    } else if full_name.contains("italic") {
        Slant::Italic
    } else if subfamily.contains("regular") {
        Slant::Normal
    } else {
        match attributes.style {
            Style::Italic => Slant::Italic,
            Style::Oblique(_) => Slant::Oblique,
            Style::Normal => Slant::Normal,
        }
    };

    let weight = match weight_from_name(&full_name) {
        Some(named) => FontWeight::Named(named),
        None => {
            let class = match font.os2() {
                Ok(os2) => os2.us_weight_class() as f32,
                Err(_) => attributes.weight.value(),
            };
            FontWeight::Numeric(class.round().clamp(1.0, 1000.0) as u16)
        }
    };

    Ok(FaceInfo {
        variant: variant_from_family(&family_name),
        stretch: stretch_from_name(&full_name),
        family_name,
        style,
        weight,
        scalable,
    })
}

#[cfg(not(feature = "fontations"))]
fn outline_face(_data: &[u8], _path: &Path) -> Result<FaceInfo, ExtractError> {
    Err(ExtractError::Unsupported(
        "outline fonts need the `fontations` feature".into(),
    ))
}

/// First Unicode record for `id`, preferring US English.
#[cfg(feature = "fontations")]
fn english_name(
    font: &read_fonts::FontRef,
    id: read_fonts::tables::name::NameId,
) -> Option<String> {
    use read_fonts::TableProvider;

    let name_table = font.name().ok()?;
    let data = name_table.string_data();
    let mut fallback = None;

    for record in name_table.name_record() {
        if !record.is_unicode() || record.name_id() != id {
            continue;
        }
        let Ok(entry) = record.string(data) else {
            continue;
        };
        let rendered = entry.to_string().trim().to_string();
        if rendered.is_empty() {
            continue;
        }
        if record.language_id() == 0x0409 {
            return Some(rendered);
        }
        fallback.get_or_insert(rendered);
    }
    fallback
}

/// First weight keyword, in table order, found in a lowercase face name.
pub(crate) fn weight_from_name(name: &str) -> Option<NamedWeight> {
    NamedWeight::ALL
        .into_iter()
        .find(|weight| name.contains(weight.as_str()))
}

/// Width keyword in a lowercase face name.
pub(crate) fn stretch_from_name(name: &str) -> FontStretch {
    let named = if name.contains("demi cond") {
        NamedStretch::SemiCondensed
    } else if name.contains("narrow") || name.contains("cond") {
        NamedStretch::Condensed
    } else if name.contains("wide") || name.contains("expanded") {
        NamedStretch::Expanded
    } else {
        NamedStretch::Normal
    };
    FontStretch::Named(named)
}

pub(crate) fn variant_from_family(family: &str) -> Variant {
    let lowered = family.to_lowercase();
    if lowered == "capitals" || lowered == "small-caps" {
        Variant::SmallCaps
    } else {
        Variant::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn name_heuristics() {
        assert_eq!(weight_from_name("dejavu sans bold oblique"), Some(NamedWeight::Bold));
        assert_eq!(weight_from_name("foo semibold"), Some(NamedWeight::Semibold));
        assert_eq!(weight_from_name("foo extra bold"), Some(NamedWeight::Bold));
        assert_eq!(weight_from_name("foo ultralight"), Some(NamedWeight::Ultralight));
        assert_eq!(weight_from_name("plain"), None);

        assert_eq!(stretch_from_name("foo demi condensed").value(), 400);
        assert_eq!(stretch_from_name("arial narrow").value(), 300);
        assert_eq!(stretch_from_name("foo wide").value(), 700);
        assert_eq!(stretch_from_name("foo"), FontStretch::NORMAL);

        assert_eq!(variant_from_family("Capitals"), Variant::SmallCaps);
        assert_eq!(variant_from_family("small-caps"), Variant::SmallCaps);
        assert_eq!(variant_from_family("Foo Capitals"), Variant::Normal);
        assert_eq!(variant_from_family("Foo Small-Caps"), Variant::Normal);
        assert_eq!(variant_from_family("Foo"), Variant::Normal);
    }

    #[test]
    fn garbage_outline_data_is_rejected() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(b"definitely not a font").expect("write");
        let err = FileExtractor::new()
            .extract(file.path(), FontKind::Outline)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }

    #[test]
    fn oversized_files_are_not_read() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(&[0u8; 64]).expect("write");
        let err = FileExtractor::new()
            .with_max_file_size(Some(16))
            .extract(file.path(), FontKind::Outline)
            .unwrap_err();
        assert!(err.to_string().contains("limit is 16"));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = FileExtractor::new()
            .extract(Path::new("/no/such/font.afm"), FontKind::Metric)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable { .. }));
    }
}
