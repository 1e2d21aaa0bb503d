use shared::{
    domain::{Character, CharacterPosition, Pet},
    protocol::{PlacementIntent, PlacementTarget},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectedItem {
    Character(Character),
    Pet(Pet),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Idle,
    Selecting(SelectedItem),
}

/// Candidate-target highlight, tracked independently of the selection and
/// only meaningful while selecting an item of the matching type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    pub character_slot: Option<CharacterPosition>,
    pub pet_slot: bool,
}

/// Outcome of tapping a roster card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardClick {
    Selected,
    /// The already-selected card was tapped again; the selection is gone and
    /// the caller can give cancel-specific feedback.
    Cancelled,
}

/// Outcome of tapping a destination slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotClick {
    Place(PlacementIntent),
    /// Nothing placeable was selected; the caller treats the tap as picking
    /// the slot occupant instead.
    Select,
}

/// Click-to-place state machine: tap a roster card, then tap a slot. Only
/// produces intents; the formation store applies them.
#[derive(Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
    hover: HoverState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting(_))
    }

    pub fn selected_item(&self) -> Option<&SelectedItem> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Selecting(item) => Some(item),
        }
    }

    /// Replaces any prior selection.
    pub fn select_character(&mut self, character: Character) {
        self.state = SelectionState::Selecting(SelectedItem::Character(character));
    }

    pub fn select_pet(&mut self, pet: Pet) {
        self.state = SelectionState::Selecting(SelectedItem::Pet(pet));
    }

    pub fn clear_selection(&mut self) {
        self.state = SelectionState::Idle;
        self.hover = HoverState::default();
    }

    pub fn handle_character_card_click(&mut self, character: Character) -> CardClick {
        if let SelectionState::Selecting(SelectedItem::Character(selected)) = &self.state {
            if selected.id == character.id {
                self.clear_selection();
                return CardClick::Cancelled;
            }
        }
        self.select_character(character);
        CardClick::Selected
    }

    pub fn handle_pet_card_click(&mut self, pet: Pet) -> CardClick {
        if let SelectionState::Selecting(SelectedItem::Pet(selected)) = &self.state {
            if selected.id == pet.id {
                self.clear_selection();
                return CardClick::Cancelled;
            }
        }
        self.select_pet(pet);
        CardClick::Selected
    }

    /// The caller gates this on [`Self::is_valid_placement`]; with a
    /// mismatched or absent selection the tap falls through to `Select`.
    pub fn handle_character_slot_click(&mut self, position: CharacterPosition) -> SlotClick {
        if let SelectionState::Selecting(SelectedItem::Character(character)) = &self.state {
            let intent = PlacementIntent::PlaceCharacter {
                character: character.clone(),
                position,
            };
            self.clear_selection();
            return SlotClick::Place(intent);
        }
        SlotClick::Select
    }

    pub fn handle_pet_slot_click(&mut self) -> SlotClick {
        if let SelectionState::Selecting(SelectedItem::Pet(pet)) = &self.state {
            let intent = PlacementIntent::PlacePet { pet: pet.clone() };
            self.clear_selection();
            return SlotClick::Place(intent);
        }
        SlotClick::Select
    }

    /// No-op unless a character is currently selected.
    pub fn set_character_slot_hover(&mut self, position: Option<CharacterPosition>) {
        if matches!(
            self.state,
            SelectionState::Selecting(SelectedItem::Character(_))
        ) {
            self.hover.character_slot = position;
        }
    }

    /// No-op unless a pet is currently selected.
    pub fn set_pet_slot_hover(&mut self, hovering: bool) {
        if matches!(self.state, SelectionState::Selecting(SelectedItem::Pet(_))) {
            self.hover.pet_slot = hovering;
        }
    }

    /// Advisory placement check for the caller's click routing.
    pub fn is_valid_placement(&self, target: PlacementTarget) -> bool {
        match (&self.state, target) {
            (
                SelectionState::Selecting(SelectedItem::Character(_)),
                PlacementTarget::Position(_),
            ) => true,
            (SelectionState::Selecting(SelectedItem::Pet(_)), PlacementTarget::Pet) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
