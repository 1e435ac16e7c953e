//! Generic family aliases such as `serif` and the lists they resolve to
//! (made by FontLab https://www.fontlab.com/)

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// The five CSS generic families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    Serif,
    SansSerif,
    Cursive,
    Fantasy,
    Monospace,
}

impl GenericFamily {
    pub const ALL: [GenericFamily; 5] = [
        GenericFamily::Serif,
        GenericFamily::SansSerif,
        GenericFamily::Cursive,
        GenericFamily::Fantasy,
        GenericFamily::Monospace,
    ];

    /// Recognise an alias, case-insensitively. `sans` and `sans serif` mean `sans-serif`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "serif" => Some(GenericFamily::Serif),
            "sans-serif" | "sans serif" | "sans" => Some(GenericFamily::SansSerif),
            "cursive" => Some(GenericFamily::Cursive),
            "fantasy" => Some(GenericFamily::Fantasy),
            "monospace" => Some(GenericFamily::Monospace),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenericFamily::Serif => "serif",
            GenericFamily::SansSerif => "sans-serif",
            GenericFamily::Cursive => "cursive",
            GenericFamily::Fantasy => "fantasy",
            GenericFamily::Monospace => "monospace",
        }
    }
}

/// Ordered concrete family names behind each generic alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericFamilies {
    pub serif: Vec<String>,
    #[serde(rename = "sans-serif")]
    pub sans_serif: Vec<String>,
    pub cursive: Vec<String>,
    pub fantasy: Vec<String>,
    pub monospace: Vec<String>,
}

impl GenericFamilies {
    pub fn get(&self, family: GenericFamily) -> &[String] {
        match family {
            GenericFamily::Serif => &self.serif,
            GenericFamily::SansSerif => &self.sans_serif,
            GenericFamily::Cursive => &self.cursive,
            GenericFamily::Fantasy => &self.fantasy,
            GenericFamily::Monospace => &self.monospace,
        }
    }

    pub fn set(&mut self, family: GenericFamily, names: Vec<String>) {
        let slot = match family {
            GenericFamily::Serif => &mut self.serif,
            GenericFamily::SansSerif => &mut self.sans_serif,
            GenericFamily::Cursive => &mut self.cursive,
            GenericFamily::Fantasy => &mut self.fantasy,
            GenericFamily::Monospace => &mut self.monospace,
        };
        *slot = names;
    }

    /// Resolve `name` if it is a generic alias.
    pub fn resolve(&self, name: &str) -> Option<&[String]> {
        GenericFamily::parse(name).map(|family| self.get(family))
    }

    /// Stable digest of every alias list; part of each lookup cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for family in GenericFamily::ALL {
            hasher.update(family.as_str().as_bytes());
            hasher.update(&[0x1e]);
            for name in self.get(family) {
                hasher.update(name.as_bytes());
                hasher.update(&[0x1f]);
            }
        }
        hasher.digest()
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for GenericFamilies {
    fn default() -> Self {
        Self {
            serif: names(&[
                "DejaVu Serif",
                "Bitstream Vera Serif",
                "Computer Modern Roman",
                "New Century Schoolbook",
                "Century Schoolbook L",
                "Utopia",
                "ITC Bookman",
                "Bookman",
                "Nimbus Roman No9 L",
                "Times New Roman",
                "Times",
                "Palatino",
                "Charter",
                "serif",
            ]),
            sans_serif: names(&[
                "DejaVu Sans",
                "Bitstream Vera Sans",
                "Computer Modern Sans Serif",
                "Lucida Grande",
                "Verdana",
                "Geneva",
                "Lucid",
                "Arial",
                "Helvetica",
                "Avant Garde",
                "sans-serif",
            ]),
            cursive: names(&[
                "Apple Chancery",
                "Textile",
                "Zapf Chancery",
                "Sand",
                "Script MT",
                "Felipa",
                "cursive",
            ]),
            fantasy: names(&[
                "Comic Sans MS",
                "Chicago",
                "Charcoal",
                "Impact",
                "Western",
                "Humor Sans",
                "xkcd",
                "fantasy",
            ]),
            monospace: names(&[
                "DejaVu Sans Mono",
                "Bitstream Vera Sans Mono",
                "Computer Modern Typewriter",
                "Andale Mono",
                "Nimbus Mono L",
                "Courier New",
                "Courier",
                "Fixed",
                "Terminal",
                "monospace",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sans_aliases_share_one_list() {
        let tables = GenericFamilies::default();
        assert_eq!(tables.resolve("sans"), tables.resolve("Sans-Serif"));
        assert_eq!(tables.resolve("sans serif").unwrap()[0], "DejaVu Sans");
        assert!(tables.resolve("DejaVu Sans").is_none());
    }

    #[test]
    fn fingerprint_tracks_list_changes() {
        let mut tables = GenericFamilies::default();
        let before = tables.fingerprint();
        assert_eq!(before, GenericFamilies::default().fingerprint());

        tables.set(GenericFamily::Serif, vec!["DejaVu Sans".to_string()]);
        assert_ne!(before, tables.fingerprint());
    }

    #[test]
    fn fingerprint_separates_list_boundaries() {
        let mut a = GenericFamilies::default();
        let mut b = GenericFamilies::default();
        a.set(GenericFamily::Serif, vec!["ab".into(), "c".into()]);
        b.set(GenericFamily::Serif, vec!["a".into(), "bc".into()]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
