// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font resolver
//!
//! [`Resolver`] wraps a [`fontique`] font collection purely to resolve CSS
//! generic family keywords (`sans-serif`, `serif`, ...) to a concrete,
//! system-appropriate family name once at startup. Actual font matching and
//! loading is done via [`fontdb`] (see [`super::selector`] and
//! [`super::library`]); `fontique`'s own query/shaping machinery is not used
//! on the hot path, avoiding a second font-loading stack.

use fontdb::Database;
use fontique::{Collection, GenericFamily, SourceCache};
use log::info;

/// A tool to resolve generic font families to concrete names
pub struct Resolver {
    collection: Collection,
    cache: SourceCache,
}

impl Resolver {
    pub(crate) fn new() -> Self {
        Resolver {
            collection: Collection::new(Default::default()),
            cache: SourceCache::new(Default::default()),
        }
    }

    /// Get a font family name for some generic font family
    pub fn font_family_from_generic(&mut self, generic: GenericFamily) -> Option<&str> {
        let id = self.collection.generic_families(generic).next()?;
        self.collection.family_name(id)
    }

    /// Init db and self: register system generic-family aliases in `db`
    pub(crate) fn init(&mut self, db: &mut Database) {
        info!("Found {} fonts", db.len());

        // Set family names in DB: this is what `FontSelector::select` relies
        // on when a generic family has no curated fallback list, and lets
        // the DB also be used directly (e.g. to render an SVG with resvg).
        if let Some(name) = self.font_family_from_generic(GenericFamily::Serif) {
            info!("Default serif font: {name}");
            db.set_serif_family(name);
        }
        if let Some(name) = self.font_family_from_generic(GenericFamily::SansSerif) {
            info!("Default sans-serif font: {name}");
            db.set_sans_serif_family(name);
        }
        if let Some(name) = self.font_family_from_generic(GenericFamily::Monospace) {
            info!("Default monospace font: {name}");
            db.set_monospace_family(name);
        }
        if let Some(name) = self.font_family_from_generic(GenericFamily::Cursive) {
            info!("Default cursive font: {name}");
            db.set_cursive_family(name);
        }
        if let Some(name) = self.font_family_from_generic(GenericFamily::Fantasy) {
            info!("Default fantasy font: {name}");
            db.set_fantasy_family(name);
        }
    }
}
