use std::sync::mpsc::{channel, Receiver, Sender};

use tracing::warn;

use shared::{
    domain::{Character, CharacterId, CharacterPosition, Formation, FormationType, Pet, PetId},
    protocol::{DragSource, DragTransfer, DraggedItem, DropTarget, PlacementIntent},
};
use storage::FormationArchive;

pub mod drag;
pub mod selection;
pub mod share;

pub use drag::DragController;
pub use selection::SelectionController;

/// Emitted after each mutation, once the auto-save attempt has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    TypeChanged(FormationType),
    CharacterPlaced(CharacterPosition),
    CharacterRemoved(CharacterPosition),
    PetPlaced,
    PetRemoved,
    CharactersSwapped(CharacterPosition, CharacterPosition),
    Cleared,
    Replaced,
}

/// The single mutator of the active formation. Both input controllers
/// terminate here; every mutation runs to completion, auto-saves through the
/// archive, then notifies subscribers.
pub struct FormationStore {
    formation: Formation,
    archive: FormationArchive,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl FormationStore {
    /// Seeds from the persisted current formation; absent or unparseable
    /// state falls back to an empty basic formation.
    pub fn new(archive: FormationArchive) -> Self {
        let formation = archive
            .current_formation()
            .unwrap_or_else(|| Formation::empty(FormationType::Basic));
        Self {
            formation,
            archive,
            subscribers: Vec::new(),
        }
    }

    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    pub fn archive(&self) -> &FormationArchive {
        &self.archive
    }

    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Rebuilds the slot set for `new_type`, keeping each character at its
    /// position and recomputing only the front/back role. The pet carries
    /// over unchanged.
    pub fn change_formation_type(&mut self, new_type: FormationType) {
        let mut rebuilt = Formation::empty(new_type);
        for slot in &self.formation.character_slots {
            if let Some(character) = &slot.character {
                rebuilt.slot_mut(slot.position).character = Some(character.clone());
            }
        }
        rebuilt.pet_slot = self.formation.pet_slot.clone();
        self.formation = rebuilt;
        self.commit(StoreEvent::TypeChanged(new_type));
    }

    /// Overwrites any prior occupant. Duplicate placement is not blocked
    /// here; `validation_errors` surfaces it on demand.
    pub fn add_character(&mut self, character: Character, position: CharacterPosition) {
        self.formation.slot_mut(position).character = Some(character);
        self.commit(StoreEvent::CharacterPlaced(position));
    }

    pub fn remove_character(&mut self, position: CharacterPosition) {
        self.formation.slot_mut(position).character = None;
        self.commit(StoreEvent::CharacterRemoved(position));
    }

    pub fn add_pet(&mut self, pet: Pet) {
        self.formation.pet_slot.pet = Some(pet);
        self.commit(StoreEvent::PetPlaced);
    }

    pub fn remove_pet(&mut self) {
        self.formation.pet_slot.pet = None;
        self.commit(StoreEvent::PetRemoved);
    }

    /// Swap semantics; moving onto an empty slot leaves the origin empty.
    pub fn move_character(&mut self, from: CharacterPosition, to: CharacterPosition) {
        self.swap_characters(from, to);
    }

    pub fn swap_characters(&mut self, first: CharacterPosition, second: CharacterPosition) {
        let taken = self.formation.slot_mut(first).character.take();
        let displaced = std::mem::replace(&mut self.formation.slot_mut(second).character, taken);
        self.formation.slot_mut(first).character = displaced;
        self.commit(StoreEvent::CharactersSwapped(first, second));
    }

    /// Replaces the current formation with a fresh empty one of the same
    /// type.
    pub fn clear_formation(&mut self) {
        self.formation = Formation::empty(self.formation.formation_type);
        self.commit(StoreEvent::Cleared);
    }

    /// Full replacement, used when loading a saved or shared formation.
    pub fn set_formation(&mut self, formation: Formation) {
        self.formation = formation;
        self.commit(StoreEvent::Replaced);
    }

    pub fn is_character_in_formation(&self, id: &CharacterId) -> bool {
        self.formation
            .character_slots
            .iter()
            .any(|slot| slot.character.as_ref().is_some_and(|c| &c.id == id))
    }

    pub fn is_pet_in_formation(&self, id: &PetId) -> bool {
        self.formation
            .pet_slot
            .pet
            .as_ref()
            .is_some_and(|pet| &pet.id == id)
    }

    pub fn character_at(&self, position: CharacterPosition) -> Option<&Character> {
        self.formation.character_at(position)
    }

    /// Advisory validation messages; never blocks a mutation.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = self.formation.validate().errors;
        if self.formation.filled_slots() > 5 {
            errors.push("Maximum 5 characters allowed".to_string());
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Routes a controller-produced intent to the matching mutation.
    pub fn apply(&mut self, intent: &PlacementIntent) {
        match intent {
            PlacementIntent::PlaceCharacter {
                character,
                position,
            } => self.add_character(character.clone(), *position),
            PlacementIntent::PlacePet { pet } => self.add_pet(pet.clone()),
            PlacementIntent::RemoveCharacter { position } => self.remove_character(*position),
            PlacementIntent::RemovePet => self.remove_pet(),
            PlacementIntent::SwapCharacters { from, to } => self.swap_characters(*from, *to),
        }
    }

    fn commit(&mut self, event: StoreEvent) {
        if let Err(err) = self.archive.store_current(&self.formation) {
            warn!("failed to auto-save formation: {err:#}");
        }
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

/// Interprets a completed drag as a placement intent: a drop on the discard
/// zone removes the slot occupant that was dragged, a slot-to-slot drop
/// swaps, and a roster drop places. Returns `None` when the transfer has no
/// effect on the formation (e.g. discarding a roster card).
pub fn intent_for_transfer(transfer: &DragTransfer) -> Option<PlacementIntent> {
    match (&transfer.item, transfer.source, transfer.target) {
        (DraggedItem::Character(character), source, DropTarget::Position(to)) => match source {
            DragSource::CharacterSlot(from) => Some(PlacementIntent::SwapCharacters { from, to }),
            DragSource::Roster => Some(PlacementIntent::PlaceCharacter {
                character: character.clone(),
                position: to,
            }),
            DragSource::PetSlot => None,
        },
        (DraggedItem::Pet(pet), source, DropTarget::Pet) => match source {
            DragSource::Roster | DragSource::PetSlot => {
                Some(PlacementIntent::PlacePet { pet: pet.clone() })
            }
            DragSource::CharacterSlot(_) => None,
        },
        (_, DragSource::CharacterSlot(position), DropTarget::Trash) => {
            Some(PlacementIntent::RemoveCharacter { position })
        }
        (_, DragSource::PetSlot, DropTarget::Trash) => Some(PlacementIntent::RemovePet),
        (_, DragSource::Roster, DropTarget::Trash) => None,
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
