use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(CharacterId);
id_newtype!(PetId);

/// Rarity tier, 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rarity(u8);

impl Rarity {
    pub fn new(tier: u8) -> Result<Self, DomainError> {
        if (1..=6).contains(&tier) {
            Ok(Self(tier))
        } else {
            Err(DomainError::RarityOutOfRange(tier))
        }
    }

    pub fn tier(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rarity {
    type Error = DomainError;

    fn try_from(tier: u8) -> Result<Self, Self::Error> {
        Self::new(tier)
    }
}

impl From<Rarity> for u8 {
    fn from(rarity: Rarity) -> Self {
        rarity.0
    }
}

/// Enhancement level, 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EnhancementLevel(u8);

impl EnhancementLevel {
    pub fn new(level: u8) -> Result<Self, DomainError> {
        if level <= 5 {
            Ok(Self(level))
        } else {
            Err(DomainError::EnhancementOutOfRange(level))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for EnhancementLevel {
    type Error = DomainError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<EnhancementLevel> for u8 {
    fn from(level: EnhancementLevel) -> Self {
        level.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Warrior,
    Tank,
    Mage,
    Ranger,
    Assassin,
    Support,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub image: String,
    pub level: u32,
    pub rarity: Rarity,
    pub class: CharacterClass,
    pub enhancement_level: EnhancementLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub image: String,
    pub level: u32,
    pub rarity: Rarity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<String>,
}

/// One of the five fixed character positions. Constructing any other value
/// is a programmer error, surfaced through `DomainError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CharacterPosition(u8);

impl CharacterPosition {
    pub const ALL: [CharacterPosition; 5] = [
        CharacterPosition(1),
        CharacterPosition(2),
        CharacterPosition(3),
        CharacterPosition(4),
        CharacterPosition(5),
    ];

    pub fn new(position: u8) -> Result<Self, DomainError> {
        if (1..=5).contains(&position) {
            Ok(Self(position))
        } else {
            Err(DomainError::PositionOutOfRange(position))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<u8> for CharacterPosition {
    type Error = DomainError;

    fn try_from(position: u8) -> Result<Self, Self::Error> {
        Self::new(position)
    }
}

impl From<CharacterPosition> for u8 {
    fn from(position: CharacterPosition) -> Self {
        position.0
    }
}

impl fmt::Display for CharacterPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationType {
    #[default]
    Basic,
    Normal,
    Attack,
    Defense,
}

/// Static per-type layout: which of the five positions stand in front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormationConfig {
    pub formation_type: FormationType,
    pub name: &'static str,
    pub level: u32,
    pub front_positions: &'static [CharacterPosition],
    pub back_positions: &'static [CharacterPosition],
}

const P1: CharacterPosition = CharacterPosition(1);
const P2: CharacterPosition = CharacterPosition(2);
const P3: CharacterPosition = CharacterPosition(3);
const P4: CharacterPosition = CharacterPosition(4);
const P5: CharacterPosition = CharacterPosition(5);

const BASIC_CONFIG: FormationConfig = FormationConfig {
    formation_type: FormationType::Basic,
    name: "Basic Formation",
    level: 1,
    front_positions: &[P1, P2],
    back_positions: &[P3, P4, P5],
};

const NORMAL_CONFIG: FormationConfig = FormationConfig {
    formation_type: FormationType::Normal,
    name: "Normal Formation",
    level: 1,
    front_positions: &[P1, P2, P3],
    back_positions: &[P4, P5],
};

const ATTACK_CONFIG: FormationConfig = FormationConfig {
    formation_type: FormationType::Attack,
    name: "Attack Formation",
    level: 5,
    front_positions: &[P1],
    back_positions: &[P2, P3, P4, P5],
};

const DEFENSE_CONFIG: FormationConfig = FormationConfig {
    formation_type: FormationType::Defense,
    name: "Defense Formation",
    level: 1,
    front_positions: &[P1, P2, P3, P4],
    back_positions: &[P5],
};

impl FormationType {
    pub const ALL: [FormationType; 4] = [
        FormationType::Basic,
        FormationType::Normal,
        FormationType::Attack,
        FormationType::Defense,
    ];

    pub fn config(self) -> &'static FormationConfig {
        match self {
            FormationType::Basic => &BASIC_CONFIG,
            FormationType::Normal => &NORMAL_CONFIG,
            FormationType::Attack => &ATTACK_CONFIG,
            FormationType::Defense => &DEFENSE_CONFIG,
        }
    }

    pub fn position_type(self, position: CharacterPosition) -> PositionType {
        if self.config().front_positions.contains(&position) {
            PositionType::Front
        } else {
            PositionType::Back
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSlot {
    pub position: CharacterPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<Character>,
    pub position_type: PositionType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PetSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet: Option<Pet>,
}

/// A full team configuration: five character slots plus one pet slot.
///
/// The fixed-length slot array keeps one slot per position 1..=5 by
/// construction; deserializing anything else fails outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub formation_type: FormationType,
    pub character_slots: [CharacterSlot; 5],
    pub pet_slot: PetSlot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Formation {
    pub fn empty(formation_type: FormationType) -> Self {
        Self {
            id: None,
            name: None,
            formation_type,
            character_slots: CharacterPosition::ALL.map(|position| CharacterSlot {
                position,
                character: None,
                position_type: formation_type.position_type(position),
            }),
            pet_slot: PetSlot::default(),
            created_at: None,
            updated_at: None,
            tags: Vec::new(),
            notes: None,
        }
    }

    pub fn slot(&self, position: CharacterPosition) -> &CharacterSlot {
        &self.character_slots[position.index()]
    }

    pub fn slot_mut(&mut self, position: CharacterPosition) -> &mut CharacterSlot {
        &mut self.character_slots[position.index()]
    }

    pub fn character_at(&self, position: CharacterPosition) -> Option<&Character> {
        self.slot(position).character.as_ref()
    }

    pub fn filled_slots(&self) -> usize {
        self.character_slots
            .iter()
            .filter(|slot| slot.character.is_some())
            .count()
    }

    pub fn has_pet(&self) -> bool {
        self.pet_slot.pet.is_some()
    }

    /// Advisory validation: one message per extra occurrence of a character
    /// id already placed in an earlier slot.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let mut seen: HashSet<&CharacterId> = HashSet::new();
        for slot in &self.character_slots {
            if let Some(character) = &slot.character {
                if !seen.insert(&character.id) {
                    errors.push(format!("Duplicate character: {}", character.name));
                }
            }
        }
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}
