use super::*;

use std::sync::Arc;

use anyhow::anyhow;
use shared::domain::{CharacterClass, EnhancementLevel, PositionType, Rarity};
use storage::{KeyValueStore, MemoryStore, CURRENT_FORMATION_KEY};

fn pos(raw: u8) -> CharacterPosition {
    CharacterPosition::new(raw).expect("position")
}

fn character(id: &str, name: &str) -> Character {
    Character {
        id: CharacterId::new(id),
        name: name.to_string(),
        image: format!("/images/{id}.png"),
        level: 50,
        rarity: Rarity::new(6).expect("rarity"),
        class: CharacterClass::Warrior,
        enhancement_level: EnhancementLevel::new(5).expect("enhancement"),
    }
}

fn pet(id: &str, name: &str) -> Pet {
    Pet {
        id: PetId::new(id),
        name: name.to_string(),
        image: format!("/images/{id}.png"),
        level: 30,
        rarity: Rarity::new(5).expect("rarity"),
        abilities: vec!["ATK Boost".to_string()],
    }
}

fn memory_store() -> (FormationStore, FormationArchive, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::new());
    let archive = FormationArchive::new(backend.clone());
    (FormationStore::new(archive.clone()), archive, backend)
}

struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Err(anyhow!("storage offline"))
    }

    fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        Err(anyhow!("storage offline"))
    }

    fn remove(&self, _key: &str) -> anyhow::Result<()> {
        Err(anyhow!("storage offline"))
    }
}

#[test]
fn seeds_from_the_persisted_current_formation() {
    let backend = Arc::new(MemoryStore::new());
    let archive = FormationArchive::new(backend.clone());

    let mut persisted = Formation::empty(FormationType::Attack);
    persisted.slot_mut(pos(2)).character = Some(character("char_3", "Rachel"));
    archive.store_current(&persisted).expect("seed");

    let store = FormationStore::new(archive);
    assert_eq!(store.formation(), &persisted);
}

#[test]
fn falls_back_to_an_empty_basic_formation() {
    let (store, _, backend) = memory_store();
    assert_eq!(store.formation(), &Formation::empty(FormationType::Basic));

    backend
        .set(CURRENT_FORMATION_KEY, "garbled{{")
        .expect("seed garbage");
    let store = FormationStore::new(FormationArchive::new(backend));
    assert_eq!(store.formation(), &Formation::empty(FormationType::Basic));
}

#[test]
fn every_mutation_auto_saves() {
    let (mut store, archive, _) = memory_store();

    store.add_character(character("char_1", "Shane"), pos(2));
    let persisted = archive.current_formation().expect("saved after add");
    assert!(persisted.character_at(pos(2)).is_some());

    store.remove_character(pos(2));
    let persisted = archive.current_formation().expect("saved after remove");
    assert!(persisted.character_at(pos(2)).is_none());

    store.add_pet(pet("pet_1", "Mini Shane"));
    assert!(archive.current_formation().expect("saved after pet").has_pet());
}

#[test]
fn add_then_remove_leaves_other_slots_untouched() {
    let (mut store, _, _) = memory_store();
    store.add_character(character("char_1", "Shane"), pos(1));
    store.add_character(character("char_2", "Rudy"), pos(3));

    store.remove_character(pos(3));

    assert!(store.character_at(pos(3)).is_none());
    assert_eq!(
        store.character_at(pos(1)).map(|c| c.name.as_str()),
        Some("Shane")
    );
    assert_eq!(store.formation().filled_slots(), 1);
}

#[test]
fn removing_an_empty_slot_is_a_noop() {
    let (mut store, _, _) = memory_store();
    store.remove_character(pos(4));
    assert_eq!(store.formation(), &Formation::empty(FormationType::Basic));
}

#[test]
fn move_character_is_self_inverse() {
    let (mut store, _, _) = memory_store();
    store.add_character(character("char_1", "Shane"), pos(1));
    store.add_character(character("char_2", "Rudy"), pos(4));
    let before = store.formation().clone();

    store.move_character(pos(1), pos(4));
    assert_eq!(
        store.character_at(pos(1)).map(|c| c.name.as_str()),
        Some("Rudy")
    );
    assert_eq!(
        store.character_at(pos(4)).map(|c| c.name.as_str()),
        Some("Shane")
    );

    store.move_character(pos(1), pos(4));
    assert_eq!(store.formation(), &before);
}

#[test]
fn moving_onto_an_empty_slot_vacates_the_origin() {
    let (mut store, _, _) = memory_store();
    store.add_character(character("char_1", "Shane"), pos(2));

    store.move_character(pos(2), pos(5));

    assert!(store.character_at(pos(2)).is_none());
    assert_eq!(
        store.character_at(pos(5)).map(|c| c.name.as_str()),
        Some("Shane")
    );
}

#[test]
fn swap_characters_matches_move_semantics() {
    let (mut store, _, _) = memory_store();
    store.add_character(character("char_1", "Shane"), pos(1));
    store.add_character(character("char_2", "Rudy"), pos(2));

    store.swap_characters(pos(1), pos(2));

    assert_eq!(
        store.character_at(pos(1)).map(|c| c.name.as_str()),
        Some("Rudy")
    );
    assert_eq!(
        store.character_at(pos(2)).map(|c| c.name.as_str()),
        Some("Shane")
    );
}

#[test]
fn changing_type_preserves_positions_and_recomputes_roles() {
    let (mut store, _, _) = memory_store();
    store.add_character(character("char_1", "Shane"), pos(3));
    store.add_pet(pet("pet_1", "Mini Shane"));
    assert_eq!(store.formation().slot(pos(3)).position_type, PositionType::Back);

    store.change_formation_type(FormationType::Normal);

    let slot = store.formation().slot(pos(3));
    assert_eq!(slot.position_type, PositionType::Front);
    assert_eq!(
        slot.character.as_ref().map(|c| c.name.as_str()),
        Some("Shane")
    );
    assert!(store.formation().has_pet());
    assert_eq!(store.formation().formation_type, FormationType::Normal);
}

#[test]
fn clear_keeps_the_formation_type() {
    let (mut store, _, _) = memory_store();
    store.change_formation_type(FormationType::Defense);
    store.add_character(character("char_1", "Shane"), pos(1));
    store.add_pet(pet("pet_1", "Mini Shane"));

    store.clear_formation();

    assert_eq!(store.formation().formation_type, FormationType::Defense);
    assert_eq!(store.formation().filled_slots(), 0);
    assert!(!store.formation().has_pet());
}

#[test]
fn set_formation_replaces_the_active_instance() {
    let (mut store, archive, _) = memory_store();
    let mut loaded = Formation::empty(FormationType::Attack);
    loaded.slot_mut(pos(5)).character = Some(character("char_2", "Rudy"));

    store.set_formation(loaded.clone());

    assert_eq!(store.formation(), &loaded);
    assert_eq!(archive.current_formation().expect("saved"), loaded);
}

#[test]
fn membership_queries_track_slot_contents() {
    let (mut store, _, _) = memory_store();
    store.add_character(character("char_1", "Shane"), pos(1));
    store.add_pet(pet("pet_1", "Mini Shane"));

    assert!(store.is_character_in_formation(&CharacterId::new("char_1")));
    assert!(!store.is_character_in_formation(&CharacterId::new("char_2")));
    assert!(store.is_pet_in_formation(&PetId::new("pet_1")));
    assert!(!store.is_pet_in_formation(&PetId::new("pet_2")));

    store.remove_pet();
    assert!(!store.is_pet_in_formation(&PetId::new("pet_1")));
}

#[test]
fn duplicate_placement_is_reachable_and_reported() {
    let (mut store, _, _) = memory_store();
    let shane = character("char_1", "Shane");
    store.add_character(shane.clone(), pos(1));
    store.add_character(shane, pos(4));

    let errors = store.validation_errors();
    assert_eq!(errors, vec!["Duplicate character: Shane".to_string()]);
    assert!(!store.is_valid());
}

#[test]
fn distinct_characters_validate_cleanly() {
    let (mut store, _, _) = memory_store();
    store.add_character(character("char_1", "Shane"), pos(1));
    store.add_character(character("char_2", "Rudy"), pos(2));
    store.swap_characters(pos(1), pos(2));

    assert!(store.validation_errors().is_empty());
    assert!(store.is_valid());
}

#[test]
fn autosave_failure_is_swallowed_and_memory_stays_authoritative() {
    let archive = FormationArchive::new(Arc::new(FailingStore));
    let mut store = FormationStore::new(archive);

    store.add_character(character("char_1", "Shane"), pos(1));

    assert_eq!(
        store.character_at(pos(1)).map(|c| c.name.as_str()),
        Some("Shane")
    );
}

#[test]
fn subscribers_observe_mutations_in_order() {
    let (mut store, _, _) = memory_store();
    let events = store.subscribe();

    store.add_character(character("char_1", "Shane"), pos(2));
    store.change_formation_type(FormationType::Attack);
    store.clear_formation();

    assert_eq!(events.try_recv().expect("event"), StoreEvent::CharacterPlaced(pos(2)));
    assert_eq!(
        events.try_recv().expect("event"),
        StoreEvent::TypeChanged(FormationType::Attack)
    );
    assert_eq!(events.try_recv().expect("event"), StoreEvent::Cleared);
    assert!(events.try_recv().is_err());
}

#[test]
fn dropped_subscribers_do_not_block_mutations() {
    let (mut store, _, _) = memory_store();
    drop(store.subscribe());
    let live = store.subscribe();

    store.add_pet(pet("pet_1", "Mini Shane"));

    assert_eq!(live.try_recv().expect("event"), StoreEvent::PetPlaced);
}

#[test]
fn apply_routes_every_intent_variant() {
    let (mut store, _, _) = memory_store();

    store.apply(&PlacementIntent::PlaceCharacter {
        character: character("char_1", "Shane"),
        position: pos(1),
    });
    store.apply(&PlacementIntent::PlacePet {
        pet: pet("pet_1", "Mini Shane"),
    });
    store.apply(&PlacementIntent::SwapCharacters {
        from: pos(1),
        to: pos(3),
    });
    assert!(store.character_at(pos(3)).is_some());
    assert!(store.formation().has_pet());

    store.apply(&PlacementIntent::RemoveCharacter { position: pos(3) });
    store.apply(&PlacementIntent::RemovePet);
    assert_eq!(store.formation().filled_slots(), 0);
    assert!(!store.formation().has_pet());
}

#[test]
fn transfers_map_to_the_expected_intents() {
    let shane = character("char_1", "Shane");
    let mini = pet("pet_1", "Mini Shane");

    let place = intent_for_transfer(&DragTransfer {
        item: DraggedItem::Character(shane.clone()),
        source: DragSource::Roster,
        target: DropTarget::Position(pos(2)),
    });
    assert_eq!(
        place,
        Some(PlacementIntent::PlaceCharacter {
            character: shane.clone(),
            position: pos(2),
        })
    );

    let swap = intent_for_transfer(&DragTransfer {
        item: DraggedItem::Character(shane.clone()),
        source: DragSource::CharacterSlot(pos(4)),
        target: DropTarget::Position(pos(2)),
    });
    assert_eq!(
        swap,
        Some(PlacementIntent::SwapCharacters {
            from: pos(4),
            to: pos(2),
        })
    );

    let discard_slot = intent_for_transfer(&DragTransfer {
        item: DraggedItem::Character(shane),
        source: DragSource::CharacterSlot(pos(4)),
        target: DropTarget::Trash,
    });
    assert_eq!(
        discard_slot,
        Some(PlacementIntent::RemoveCharacter { position: pos(4) })
    );

    let discard_pet = intent_for_transfer(&DragTransfer {
        item: DraggedItem::Pet(mini.clone()),
        source: DragSource::PetSlot,
        target: DropTarget::Trash,
    });
    assert_eq!(discard_pet, Some(PlacementIntent::RemovePet));

    let place_pet = intent_for_transfer(&DragTransfer {
        item: DraggedItem::Pet(mini.clone()),
        source: DragSource::Roster,
        target: DropTarget::Pet,
    });
    assert_eq!(place_pet, Some(PlacementIntent::PlacePet { pet: mini.clone() }));

    let discard_roster = intent_for_transfer(&DragTransfer {
        item: DraggedItem::Pet(mini),
        source: DragSource::Roster,
        target: DropTarget::Trash,
    });
    assert_eq!(discard_roster, None);
}
