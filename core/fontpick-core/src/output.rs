//! Presenting lookup results and catalog listings to the outside world
//!
//! Prettified JSON for people who like to read, newline-delimited JSON for
//! pipelines that like to stream. Both accept anything serde can serialize,
//! so match results and catalog entries share the same helpers.
//!
//! Made with love at FontLab https://www.fontlab.com/

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

/// Write `items` as one indented JSON array.
pub fn write_json_pretty<T: Serialize>(items: &[T], mut w: impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    w.write_all(json.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write each item on its own line (NDJSON).
pub fn write_ndjson<T: Serialize>(items: &[T], mut w: impl Write) -> Result<()> {
    for item in items {
        let line = serde_json::to_string(item)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FontEntry;
    use crate::extract::FaceInfo;
    use std::path::PathBuf;

    fn sample_entry() -> FontEntry {
        FontEntry::from_face(PathBuf::from("/fonts/A.ttf"), FaceInfo::new("A"))
    }

    #[test]
    fn ndjson_writes_one_line_per_entry() {
        let entries = vec![sample_entry(), sample_entry()];
        let mut buf = Vec::new();

        write_ndjson(&entries, &mut buf).expect("write ndjson");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: FontEntry = serde_json::from_str(lines[0]).expect("parse");
        assert_eq!(parsed, sample_entry());
    }
}
