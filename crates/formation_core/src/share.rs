use std::collections::HashMap;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tracing::warn;
use url::Url;

use shared::{
    domain::{Character, CharacterId, Formation, Pet, PetId},
    protocol::FormationShareData,
};

pub const SHARE_QUERY_PARAM: &str = "formation";

/// Encodes the reduced share projection as a compact URL-safe string:
/// JSON, lz4 (size-prepended), then unpadded URL-safe base64.
pub fn encode_formation(formation: &Formation) -> String {
    let share = FormationShareData::project(formation);
    let json = match serde_json::to_vec(&share) {
        Ok(json) => json,
        Err(err) => {
            warn!("failed to serialize share payload: {err}");
            return String::new();
        }
    };
    URL_SAFE_NO_PAD.encode(lz4_flex::compress_prepend_size(&json))
}

/// Exact inverse of [`encode_formation`]; fails closed on any stage.
pub fn decode_formation(encoded: &str) -> Option<FormationShareData> {
    let compressed = URL_SAFE_NO_PAD.decode(encoded.as_bytes()).ok()?;
    let json = lz4_flex::decompress_size_prepended(&compressed).ok()?;
    serde_json::from_slice(&json).ok()
}

pub fn share_url(base: &str, formation: &Formation) -> Result<Url> {
    let mut url =
        Url::parse(base).with_context(|| format!("invalid share base url: {base}"))?;
    url.query_pairs_mut()
        .append_pair(SHARE_QUERY_PARAM, &encode_formation(formation));
    Ok(url)
}

/// Extracts and decodes the share payload from a full URL, if any.
pub fn share_data_from_url(raw: &str) -> Option<FormationShareData> {
    let url = Url::parse(raw).ok()?;
    let encoded = url
        .query_pairs()
        .find(|(key, _)| key == SHARE_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())?;
    decode_formation(&encoded)
}

/// The external collaborator holding the canonical character/pet lists,
/// referenced by id from formation slots.
pub trait Roster: Send + Sync {
    fn character(&self, id: &CharacterId) -> Option<Character>;
    fn pet(&self, id: &PetId) -> Option<Pet>;
}

/// Roster stand-in that resolves nothing.
pub struct EmptyRoster;

impl Roster for EmptyRoster {
    fn character(&self, _id: &CharacterId) -> Option<Character> {
        None
    }

    fn pet(&self, _id: &PetId) -> Option<Pet> {
        None
    }
}

#[derive(Default)]
pub struct InMemoryRoster {
    characters: HashMap<CharacterId, Character>,
    pets: HashMap<PetId, Pet>,
}

impl InMemoryRoster {
    pub fn new(
        characters: impl IntoIterator<Item = Character>,
        pets: impl IntoIterator<Item = Pet>,
    ) -> Self {
        Self {
            characters: characters
                .into_iter()
                .map(|character| (character.id.clone(), character))
                .collect(),
            pets: pets.into_iter().map(|pet| (pet.id.clone(), pet)).collect(),
        }
    }
}

impl Roster for InMemoryRoster {
    fn character(&self, id: &CharacterId) -> Option<Character> {
        self.characters.get(id).cloned()
    }

    fn pet(&self, id: &PetId) -> Option<Pet> {
        self.pets.get(id).cloned()
    }
}

pub struct RehydratedFormation {
    pub formation: Formation,
    /// Ids the roster could not resolve; surfaced to the caller, never an
    /// error.
    pub unresolved: Vec<String>,
}

/// Rebuilds a full formation from a decoded share payload by resolving each
/// id against the roster.
pub fn rehydrate(share: &FormationShareData, roster: &dyn Roster) -> RehydratedFormation {
    let mut formation = Formation::empty(share.formation_type);
    let mut unresolved = Vec::new();

    for entry in &share.characters {
        match roster.character(&entry.character_id) {
            Some(character) => formation.slot_mut(entry.position).character = Some(character),
            None => unresolved.push(entry.character_id.0.clone()),
        }
    }

    if let Some(pet_id) = &share.pet_id {
        match roster.pet(pet_id) {
            Some(pet) => formation.pet_slot.pet = Some(pet),
            None => unresolved.push(pet_id.0.clone()),
        }
    }

    RehydratedFormation {
        formation,
        unresolved,
    }
}

#[cfg(test)]
#[path = "tests/share_tests.rs"]
mod tests;
