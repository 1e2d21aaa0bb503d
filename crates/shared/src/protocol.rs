use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Character, CharacterId, CharacterPosition, Formation, FormationType, Pet, PetId},
    error::DomainError,
};

/// A caller-facing description of a desired mutation, produced by an input
/// controller and applied by the formation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PlacementIntent {
    PlaceCharacter {
        character: Character,
        position: CharacterPosition,
    },
    PlacePet {
        pet: Pet,
    },
    RemoveCharacter {
        position: CharacterPosition,
    },
    RemovePet,
    SwapCharacters {
        from: CharacterPosition,
        to: CharacterPosition,
    },
}

/// A placement destination as seen by the click-to-place flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementTarget {
    Position(CharacterPosition),
    Pet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSlot {
    pub position: CharacterPosition,
    pub character_id: CharacterId,
}

/// Reduced share projection: formation type, occupied positions and ids only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationShareData {
    pub formation_type: FormationType,
    pub characters: Vec<SharedSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_id: Option<PetId>,
}

impl FormationShareData {
    pub fn project(formation: &Formation) -> Self {
        Self {
            formation_type: formation.formation_type,
            characters: formation
                .character_slots
                .iter()
                .filter_map(|slot| {
                    slot.character.as_ref().map(|character| SharedSlot {
                        position: slot.position,
                        character_id: character.id.clone(),
                    })
                })
                .collect(),
            pet_id: formation.pet_slot.pet.as_ref().map(|pet| pet.id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "item", rename_all = "snake_case")]
pub enum DraggedItem {
    Character(Character),
    Pet(Pet),
}

impl DraggedItem {
    pub fn is_character(&self) -> bool {
        matches!(self, DraggedItem::Character(_))
    }

    pub fn name(&self) -> &str {
        match self {
            DraggedItem::Character(character) => &character.name,
            DraggedItem::Pet(pet) => &pet.name,
        }
    }
}

/// Where a drag started: the roster listing or an already-occupied slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DragSource {
    Roster,
    CharacterSlot(CharacterPosition),
    PetSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DropTarget {
    Position(CharacterPosition),
    Pet,
    Trash,
}

impl DropTarget {
    /// Parses the wire form used by the hosting view layer: `"1"`..`"5"`,
    /// `"pet"`, or `"trash"`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "pet" => Ok(DropTarget::Pet),
            "trash" => Ok(DropTarget::Trash),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(|value| CharacterPosition::new(value).ok())
                .map(DropTarget::Position)
                .ok_or_else(|| DomainError::UnknownDropTarget(other.to_string())),
        }
    }
}

impl fmt::Display for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropTarget::Position(position) => write!(f, "{position}"),
            DropTarget::Pet => f.write_str("pet"),
            DropTarget::Trash => f.write_str("trash"),
        }
    }
}

/// The in-flight payload carried across the native drag channel. Serialized
/// at drag-start, decoded defensively at drop-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    pub item: DraggedItem,
    pub source: DragSource,
}

/// A completed drag resolution handed back to the hosting view layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DragTransfer {
    pub item: DraggedItem,
    pub source: DragSource,
    pub target: DropTarget,
}

/// Versioned export envelope for a single formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub formation: Formation,
}

pub const EXPORT_VERSION: u32 = 1;
