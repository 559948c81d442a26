//! Named conversion presets and the bundled dictionary set they draw from.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Conversion direction and regional standard, combined with `|`.
///
/// `TRADITIONALIZE` and `SIMPLIFY` pick the direction; `HK_STANDARD` or
/// `TW_STANDARD` add regional character variants; `TW_IDIOM` adds Taiwan
/// vocabulary. With no direction the regional variants apply on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Options(u8);

impl Options {
    pub const TRADITIONALIZE: Self = Self(1 << 0);
    pub const SIMPLIFY: Self = Self(1 << 1);
    pub const HK_STANDARD: Self = Self(1 << 2);
    pub const TW_STANDARD: Self = Self(1 << 3);
    pub const TW_IDIOM: Self = Self(1 << 4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Dictionary used to find word boundaries.
    pub fn segmentation_dict(self) -> DictionaryName {
        if self.contains(Self::TRADITIONALIZE) {
            DictionaryName::STPhrases
        } else if self.contains(Self::SIMPLIFY) {
            DictionaryName::TSPhrases
        } else if self.contains(Self::HK_STANDARD) {
            DictionaryName::HKVariants
        } else if self.contains(Self::TW_STANDARD) {
            DictionaryName::TWVariants
        } else {
            DictionaryName::STPhrases
        }
    }

    /// Conversion stages in order; each inner list is queried as one group.
    pub fn conversion_chain(self) -> Vec<Vec<DictionaryName>> {
        use DictionaryName::*;

        let mut chain = Vec::new();
        if self.contains(Self::TRADITIONALIZE) {
            chain.push(vec![STPhrases, STCharacters]);
            if self.contains(Self::TW_IDIOM) {
                chain.push(vec![TWPhrases]);
            }
            if self.contains(Self::HK_STANDARD) {
                chain.push(vec![HKVariants]);
            } else if self.contains(Self::TW_STANDARD) {
                chain.push(vec![TWVariants]);
            }
        } else if self.contains(Self::SIMPLIFY) {
            if self.contains(Self::HK_STANDARD) {
                chain.push(vec![HKVariantsRevPhrases, HKVariantsRev]);
            } else if self.contains(Self::TW_STANDARD) {
                chain.push(vec![TWVariantsRevPhrases, TWVariantsRev]);
            }
            if self.contains(Self::TW_IDIOM) {
                chain.push(vec![TWPhrasesRev]);
            }
            chain.push(vec![TSPhrases, TSCharacters]);
        } else if self.contains(Self::HK_STANDARD) {
            chain.push(vec![HKVariants]);
        } else if self.contains(Self::TW_STANDARD) {
            chain.push(vec![TWVariants]);
        }
        if chain.is_empty() {
            chain.push(vec![STPhrases, STCharacters]);
        }
        chain
    }
}

impl BitOr for Options {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Short preset names, in the conventional `<from>2<to>` form.
pub const PRESETS: &[(&str, Options)] = &[
    ("s2t", Options::TRADITIONALIZE),
    ("t2s", Options::SIMPLIFY),
    ("s2hk", Options::TRADITIONALIZE.union(Options::HK_STANDARD)),
    ("hk2s", Options::SIMPLIFY.union(Options::HK_STANDARD)),
    ("s2tw", Options::TRADITIONALIZE.union(Options::TW_STANDARD)),
    ("tw2s", Options::SIMPLIFY.union(Options::TW_STANDARD)),
    (
        "s2twp",
        Options::TRADITIONALIZE
            .union(Options::TW_STANDARD)
            .union(Options::TW_IDIOM),
    ),
    (
        "tw2sp",
        Options::SIMPLIFY
            .union(Options::TW_STANDARD)
            .union(Options::TW_IDIOM),
    ),
];

impl FromStr for Options {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PRESETS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|&(_, opts)| opts)
            .ok_or_else(|| {
                let names: Vec<&str> = PRESETS.iter().map(|(n, _)| *n).collect();
                format!("unknown preset '{s}' (expected one of {})", names.join(", "))
            })
    }
}

/// The bundled dictionaries; each is stored as `<Name>.twd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictionaryName {
    HKVariants,
    HKVariantsRev,
    HKVariantsRevPhrases,
    STCharacters,
    STPhrases,
    TSCharacters,
    TSPhrases,
    TWPhrases,
    TWPhrasesRev,
    TWVariants,
    TWVariantsRev,
    TWVariantsRevPhrases,
}

impl DictionaryName {
    pub const ALL: [Self; 12] = [
        Self::HKVariants,
        Self::HKVariantsRev,
        Self::HKVariantsRevPhrases,
        Self::STCharacters,
        Self::STPhrases,
        Self::TSCharacters,
        Self::TSPhrases,
        Self::TWPhrases,
        Self::TWPhrasesRev,
        Self::TWVariants,
        Self::TWVariantsRev,
        Self::TWVariantsRevPhrases,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HKVariants => "HKVariants",
            Self::HKVariantsRev => "HKVariantsRev",
            Self::HKVariantsRevPhrases => "HKVariantsRevPhrases",
            Self::STCharacters => "STCharacters",
            Self::STPhrases => "STPhrases",
            Self::TSCharacters => "TSCharacters",
            Self::TSPhrases => "TSPhrases",
            Self::TWPhrases => "TWPhrases",
            Self::TWPhrasesRev => "TWPhrasesRev",
            Self::TWVariants => "TWVariants",
            Self::TWVariantsRev => "TWVariantsRev",
            Self::TWVariantsRevPhrases => "TWVariantsRevPhrases",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.twd", self.as_str())
    }
}

impl fmt::Display for DictionaryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
