//! Fontconfig-style pattern strings (made by FontLab https://www.fontlab.com/)
//!
//! A pattern reads `families[-size][:key=value[,value]...][:constant]...`,
//! for example `DejaVu Sans,serif-12:weight=bold:italic`. The characters
//! `\ - : , =` are backslash-escaped inside names and values.

use std::path::PathBuf;

use crate::error::FontError;
use crate::properties::{
    FontProperties, FontSize, FontStretch, FontWeight, NamedStretch, NamedWeight, Slant,
    StyleDefaults, Variant,
};

const SPECIAL: [char; 5] = ['\\', '-', ':', ',', '='];

/// Parse `pattern` into a request, starting from `defaults` for absent axes.
pub fn parse_pattern(pattern: &str, defaults: &StyleDefaults) -> Result<FontProperties, FontError> {
    let segments = split_unescaped(pattern, ':');
    let (head, properties) = segments
        .split_first()
        .ok_or_else(|| FontError::pattern(pattern, "empty pattern"))?;

    let mut props = FontProperties::from_defaults(defaults);
    let mut families: Vec<String> = Vec::new();

    let (family_part, size_part) = split_head(head);
    families.extend(
        split_unescaped(family_part, ',')
            .into_iter()
            .map(unescape)
            .filter(|f| !f.trim().is_empty()),
    );
    if let Some(sizes) = size_part {
        if let Some(first) = split_unescaped(sizes, ',').first() {
            props = props.with_size(FontSize::parse(&unescape(first), defaults.size)?);
        }
    }

    for segment in properties {
        if segment.trim().is_empty() {
            continue;
        }
        match find_unescaped(segment, '=') {
            Some(eq) => {
                let key = unescape(&segment[..eq]).trim().to_ascii_lowercase();
                let values: Vec<String> = split_unescaped(&segment[eq + 1..], ',')
                    .into_iter()
                    .map(unescape)
                    .collect();
                props = apply_property(pattern, props, &key, values, defaults, &mut families)?;
            }
            None => {
                props = apply_constant(pattern, props, &unescape(segment))?;
            }
        }
    }

    Ok(props.with_family(families))
}

/// Render every axis explicitly so that parsing the result gives back `props`.
pub fn to_pattern(props: &FontProperties) -> String {
    let families: Vec<String> = props.family().iter().map(|f| escape(f)).collect();
    let mut out = format!(
        "{}-{}:style={}:variant={}:weight={}:stretch={}",
        families.join(","),
        props.size(),
        props.slant(),
        props.variant(),
        escape(&props.weight().to_string()),
        escape(&props.stretch().to_string()),
    );
    if let Some(file) = props.file() {
        out.push_str(":file=");
        out.push_str(&escape(&file.to_string_lossy()));
    }
    out
}

fn apply_property(
    pattern: &str,
    props: FontProperties,
    key: &str,
    values: Vec<String>,
    defaults: &StyleDefaults,
    families: &mut Vec<String>,
) -> Result<FontProperties, FontError> {
    if key == "family" {
        families.extend(values.into_iter().filter(|f| !f.trim().is_empty()));
        return Ok(props);
    }

    let value = values
        .into_iter()
        .next()
        .ok_or_else(|| FontError::pattern(pattern, format!("missing value for {key}")))?;

    match key {
        "style" | "slant" => Ok(props.with_slant(value.parse()?)),
        "variant" => Ok(props.with_variant(value.parse()?)),
        "weight" => props.with_weight(value.parse()?),
        "stretch" | "width" => props.with_stretch(value.parse()?),
        "size" => Ok(props.with_size(FontSize::parse(&value, defaults.size)?)),
        "file" => Ok(props.with_file(Some(PathBuf::from(value)))),
        other => Err(FontError::pattern(pattern, format!("unknown property {other:?}"))),
    }
}

fn apply_constant(
    pattern: &str,
    props: FontProperties,
    constant: &str,
) -> Result<FontProperties, FontError> {
    let weight = |w: NamedWeight| props.clone().with_weight(FontWeight::Named(w));
    let stretch = |s: NamedStretch| props.clone().with_stretch(FontStretch::Named(s));

    match constant.trim().to_ascii_lowercase().as_str() {
        "thin" | "extralight" | "light" => weight(NamedWeight::Light),
        "ultralight" => weight(NamedWeight::Ultralight),
        "book" => weight(NamedWeight::Book),
        "regular" => weight(NamedWeight::Regular),
        "normal" => weight(NamedWeight::Normal),
        "medium" => weight(NamedWeight::Medium),
        "demibold" => weight(NamedWeight::Demibold),
        "semibold" => weight(NamedWeight::Semibold),
        "bold" => weight(NamedWeight::Bold),
        "extrabold" => weight(NamedWeight::ExtraBold),
        "heavy" => weight(NamedWeight::Heavy),
        "black" => weight(NamedWeight::Black),
        "roman" => Ok(props.clone().with_slant(Slant::Normal)),
        "italic" => Ok(props.clone().with_slant(Slant::Italic)),
        "oblique" => Ok(props.clone().with_slant(Slant::Oblique)),
        "smallcaps" => Ok(props.clone().with_variant(Variant::SmallCaps)),
        "ultracondensed" => stretch(NamedStretch::UltraCondensed),
        "extracondensed" => stretch(NamedStretch::ExtraCondensed),
        "condensed" => stretch(NamedStretch::Condensed),
        "semicondensed" => stretch(NamedStretch::SemiCondensed),
        "semiexpanded" => stretch(NamedStretch::SemiExpanded),
        "expanded" => stretch(NamedStretch::Expanded),
        "extraexpanded" => stretch(NamedStretch::ExtraExpanded),
        "ultraexpanded" => stretch(NamedStretch::UltraExpanded),
        other => Err(FontError::pattern(pattern, format!("unknown constant {other:?}"))),
    }
}

/// Separate `families-size`. The dash only starts a size when a number follows it,
/// so `sans-serif` stays a family name.
fn split_head(head: &str) -> (&str, Option<&str>) {
    if let Some(dash) = rfind_unescaped(head, '-') {
        let tail = &head[dash + 1..];
        let first = split_unescaped(tail, ',').into_iter().next().unwrap_or("");
        if unescape(first).trim().parse::<f64>().is_ok() {
            return (&head[..dash], Some(tail));
        }
    }
    (head, None)
}

fn split_unescaped(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            parts.push(&input[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn unescaped_positions(input: &str, needle: char) -> impl Iterator<Item = usize> + '_ {
    let mut escaped = false;
    input.char_indices().filter_map(move |(idx, ch)| {
        if escaped {
            escaped = false;
            None
        } else if ch == '\\' {
            escaped = true;
            None
        } else if ch == needle {
            Some(idx)
        } else {
            None
        }
    })
}

fn find_unescaped(input: &str, needle: char) -> Option<usize> {
    unescaped_positions(input, needle).next()
}

fn rfind_unescaped(input: &str, needle: char) -> Option<usize> {
    unescaped_positions(input, needle).last()
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
