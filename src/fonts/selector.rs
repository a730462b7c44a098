// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font family and face selection
//!
//! This module provides a small, serializable, CSS-flavoured font selection
//! model on top of [`fontdb`]: a [`FamilySelector`] names either a concrete
//! font family or one of the CSS generic families, and a [`FontSelector`]
//! pairs a family with width/weight/style attributes.

use super::{attributes::GenericFamily, FontStyle, FontWeight, FontWidth};
use fontdb::{Database, Family, Query};
#[cfg(feature = "serde")]
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A font family name: either an explicit name or a CSS generic family
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FamilyName {
    /// An explicit font family name, e.g. "Noto Sans"
    Named(String),
    /// A CSS generic family, e.g. `sans-serif`
    Generic(GenericFamily),
}

/// A font family selector
///
/// This wraps a single [`FamilyName`] and provides the small set of CSS
/// generic-family constants in common use. It serializes to (and parses
/// from) a single CSS-style keyword or quoted family name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FamilySelector(FamilyName);

impl FamilySelector {
    /// The `serif` generic family
    pub const SERIF: Self = Self(FamilyName::Generic(GenericFamily::Serif));
    /// The `sans-serif` generic family
    pub const SANS_SERIF: Self = Self(FamilyName::Generic(GenericFamily::SansSerif));
    /// The `cursive` generic family
    pub const CURSIVE: Self = Self(FamilyName::Generic(GenericFamily::Cursive));
    /// The `fantasy` generic family
    pub const FANTASY: Self = Self(FamilyName::Generic(GenericFamily::Fantasy));
    /// The `monospace` generic family
    pub const MONOSPACE: Self = Self(FamilyName::Generic(GenericFamily::Monospace));
    /// The `system-ui` generic family
    pub const SYSTEM_UI: Self = Self(FamilyName::Generic(GenericFamily::SystemUi));
    /// The `math` generic family
    pub const MATH: Self = Self(FamilyName::Generic(GenericFamily::Math));
    /// The `fangsong` generic family (CJK)
    pub const FANG_SONG: Self = Self(FamilyName::Generic(GenericFamily::FangSong));

    /// Select an explicit font family by name
    pub fn named(name: impl Into<String>) -> Self {
        FamilySelector(FamilyName::Named(name.into()))
    }

    /// CSS-style keyword or (for a named family) the family name itself
    pub fn to_css_keyword(&self) -> String {
        match &self.0 {
            FamilyName::Named(name) => name.clone(),
            FamilyName::Generic(g) => g.css_keyword().to_string(),
        }
    }

    /// Parse a CSS-style keyword or family name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(g) = GenericFamily::parse(s) {
            return Some(FamilySelector(FamilyName::Generic(g)));
        }
        if s.is_empty() {
            return None;
        }
        Some(FamilySelector::named(s))
    }

    /// The ordered list of concrete family names to try, falling back
    /// through [`families`] for generic families without a system alias.
    fn candidate_names(&self) -> Vec<&str> {
        match &self.0 {
            FamilyName::Named(name) => vec![name.as_str()],
            FamilyName::Generic(g) => g.fallback_names(),
        }
    }

    fn fontdb_family<'a>(name: &'a str) -> Family<'a> {
        Family::Name(name)
    }
}

impl Default for FamilySelector {
    fn default() -> Self {
        FamilySelector::SYSTEM_UI
    }
}

impl fmt::Display for FamilySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_css_keyword())
    }
}

#[cfg(feature = "serde")]
impl Serialize for FamilySelector {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for FamilySelector {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        FamilySelector::parse(&s).ok_or_else(|| D::Error::custom(format!("invalid family: {s}")))
    }
}

/// A font face selector: family plus width/weight/style
///
/// This tool selects a font according to the given criteria from available
/// system fonts. Selection criteria are based on CSS.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontSelector {
    /// Font family (or generic family)
    pub family: FamilySelector,
    /// Width (stretch)
    pub width: FontWidth,
    /// Weight
    pub weight: FontWeight,
    /// Style (normal / italic / oblique)
    pub style: FontStyle,
}

impl Default for FontSelector {
    fn default() -> Self {
        FontSelector {
            family: FamilySelector::default(),
            width: FontWidth::default(),
            weight: FontWeight::default(),
            style: FontStyle::default(),
        }
    }
}

impl From<FamilySelector> for FontSelector {
    fn from(family: FamilySelector) -> Self {
        FontSelector {
            family,
            ..Default::default()
        }
    }
}

impl fmt::Display for FontSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        if self.style != FontStyle::default() {
            parts.push(self.style.to_string());
        }
        if self.weight != FontWeight::default() {
            parts.push(self.weight.to_string());
        }
        if self.width != FontWidth::default() {
            parts.push(self.width.to_string());
        }
        parts.push(self.family.to_css_keyword());
        write!(f, "{}", parts.join(" "))
    }
}

impl FontSelector {
    /// Parse from a CSS-font-shorthand-like single string: `[style] [weight] [width] family`
    pub fn parse(s: &str) -> Option<Self> {
        let mut words: Vec<&str> = s.split_whitespace().collect();
        let family_word = words.pop()?;
        let family = FamilySelector::parse(family_word)?;

        let mut style = FontStyle::default();
        let mut weight = FontWeight::default();
        let mut width = FontWidth::default();
        let mut i = 0;

        if i < words.len() && (words[i] == "oblique" || words[i] == "italic" || words[i] == "normal")
        {
            if words[i] == "oblique" && i + 1 < words.len() {
                let joined = format!("{} {}", words[i], words[i + 1]);
                if let Some(s) = FontStyle::parse(&joined) {
                    style = s;
                    i += 2;
                } else {
                    style = FontStyle::parse(words[i])?;
                    i += 1;
                }
            } else {
                style = FontStyle::parse(words[i])?;
                i += 1;
            }
        }

        if i < words.len() {
            if let Some(w) = FontWeight::parse(words[i]) {
                weight = w;
                i += 1;
            }
        }

        if i < words.len() {
            if let Some(w) = FontWidth::parse(words[i]) {
                width = w;
                i += 1;
            }
        }

        if i != words.len() {
            return None;
        }

        Some(FontSelector {
            family,
            width,
            weight,
            style,
        })
    }

    /// Resolve font faces matching this selector, in fallback priority order
    ///
    /// Invokes `add_face` once per matching [`fontdb::FaceInfo`], in priority
    /// order, stopping at the first error.
    pub(crate) fn select<F>(&self, db: &Database, mut add_face: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: FnMut(&fontdb::FaceInfo) -> Result<(), Box<dyn std::error::Error>>,
    {
        let query_for = |family: &str| Query {
            families: &[FamilySelector::fontdb_family(family)],
            weight: fontdb::Weight(self.weight.value()),
            stretch: width_to_stretch(self.width),
            style: style_to_fontdb(self.style),
        };

        let mut seen = Vec::new();
        let mut any = false;
        for name in self.family.candidate_names() {
            let query = query_for(name);
            if let Some(id) = db.query(&query) {
                if seen.contains(&id) {
                    continue;
                }
                seen.push(id);
                if let Some(face) = db.face(id) {
                    any = true;
                    add_face(face)?;
                }
            }
        }

        if !any {
            let query = Query {
                families: &[Family::SansSerif],
                ..Query::default()
            };
            if let Some(id) = db.query(&query) {
                if let Some(face) = db.face(id) {
                    add_face(face)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(feature = "serde")]
impl Serialize for FontSelector {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for FontSelector {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        FontSelector::parse(&s).ok_or_else(|| D::Error::custom(format!("invalid font selector: {s}")))
    }
}

fn width_to_stretch(width: FontWidth) -> fontdb::Stretch {
    let pct = width.percentage();
    if pct <= 56.25 {
        fontdb::Stretch::UltraCondensed
    } else if pct <= 68.75 {
        fontdb::Stretch::ExtraCondensed
    } else if pct <= 81.25 {
        fontdb::Stretch::Condensed
    } else if pct <= 93.75 {
        fontdb::Stretch::SemiCondensed
    } else if pct <= 106.25 {
        fontdb::Stretch::Normal
    } else if pct <= 118.75 {
        fontdb::Stretch::SemiExpanded
    } else if pct <= 137.5 {
        fontdb::Stretch::Expanded
    } else if pct <= 175.0 {
        fontdb::Stretch::ExtraExpanded
    } else {
        fontdb::Stretch::UltraExpanded
    }
}

fn style_to_fontdb(style: FontStyle) -> fontdb::Style {
    match style {
        FontStyle::Normal => fontdb::Style::Normal,
        FontStyle::Italic => fontdb::Style::Italic,
        FontStyle::Oblique(_) => fontdb::Style::Oblique,
    }
}
