//! In-process skill modules shipped with the binary.
//!
//! Manifests under `skills/` reference these by name through their `module`
//! field.

mod brand_deck;
mod groom_speech;

use std::sync::Arc;

use skillroute_skills::ModuleTable;

pub use brand_deck::BrandDeck;
pub use groom_speech::GroomSpeech;

/// Module table with every built-in module registered.
pub fn module_table() -> ModuleTable {
    ModuleTable::new()
        .with("brand-deck", Arc::new(BrandDeck))
        .with("groom-speech", Arc::new(GroomSpeech))
}
