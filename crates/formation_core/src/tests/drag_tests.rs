use super::*;

use shared::domain::{
    Character, CharacterClass, CharacterId, EnhancementLevel, Pet, PetId, Rarity,
};

fn pos(raw: u8) -> CharacterPosition {
    CharacterPosition::new(raw).expect("position")
}

fn character(id: &str, name: &str) -> DraggedItem {
    DraggedItem::Character(Character {
        id: CharacterId::new(id),
        name: name.to_string(),
        image: format!("/images/{id}.png"),
        level: 50,
        rarity: Rarity::new(6).expect("rarity"),
        class: CharacterClass::Tank,
        enhancement_level: EnhancementLevel::new(2).expect("enhancement"),
    })
}

fn pet(id: &str, name: &str) -> DraggedItem {
    DraggedItem::Pet(Pet {
        id: PetId::new(id),
        name: name.to_string(),
        image: format!("/images/{id}.png"),
        level: 30,
        rarity: Rarity::new(5).expect("rarity"),
        abilities: vec!["DEF Boost".to_string()],
    })
}

#[test]
fn character_drag_marks_all_positions_and_the_discard_zone() {
    let mut controller = DragController::new();
    controller.start_drag(character("char_2", "Rudy"), DragSource::Roster);

    let zones = controller.zones();
    assert_eq!(zones.character_slots.len(), 5);
    for raw in 1..=5 {
        assert!(zones.character_slots.contains(&pos(raw)));
    }
    assert!(!zones.pet_slot);
    assert!(zones.trash);
}

#[test]
fn pet_drag_marks_only_the_pet_slot_and_the_discard_zone() {
    let mut controller = DragController::new();
    controller.start_drag(pet("pet_2", "Mini Rudy"), DragSource::Roster);

    let zones = controller.zones();
    assert!(zones.character_slots.is_empty());
    assert!(zones.pet_slot);
    assert!(zones.trash);
}

#[test]
fn dropping_on_position_three_yields_a_transfer_record() {
    let mut controller = DragController::new();
    let item = character("char_2", "Rudy");
    controller.start_drag(item.clone(), DragSource::Roster);
    let envelope = controller.encode_payload().expect("envelope");

    let target = DropTarget::parse("3").expect("target");
    let transfer = controller.drop_on(target, &envelope).expect("transfer");

    assert_eq!(transfer.target.to_string(), "3");
    assert_eq!(transfer.item, item);
    assert_eq!(transfer.source, DragSource::Roster);
    assert_eq!(controller.state(), &DragState::Idle);
    assert_eq!(controller.zones(), &DropZones::default());
}

#[test]
fn dropping_on_a_mismatched_target_resets_without_a_transfer() {
    let mut controller = DragController::new();
    controller.start_drag(character("char_2", "Rudy"), DragSource::Roster);
    let envelope = controller.encode_payload().expect("envelope");

    assert!(controller.drop_on(DropTarget::Pet, &envelope).is_none());
    assert_eq!(controller.state(), &DragState::Idle);

    let mut controller = DragController::new();
    controller.start_drag(pet("pet_2", "Mini Rudy"), DragSource::Roster);
    let envelope = controller.encode_payload().expect("envelope");

    assert!(controller
        .drop_on(DropTarget::Position(pos(1)), &envelope)
        .is_none());
    assert_eq!(controller.state(), &DragState::Idle);
}

#[test]
fn out_of_range_wire_targets_fail_to_parse() {
    assert!(DropTarget::parse("0").is_err());
    assert!(DropTarget::parse("6").is_err());
    assert!(DropTarget::parse("bench").is_err());
}

#[test]
fn an_out_of_range_wire_drop_resets_without_a_transfer() {
    let mut controller = DragController::new();
    controller.start_drag(character("char_2", "Rudy"), DragSource::Roster);
    let envelope = controller.encode_payload().expect("envelope");

    assert!(controller.drop_on_raw("9", &envelope).is_none());
    assert_eq!(controller.state(), &DragState::Idle);

    controller.start_drag(character("char_2", "Rudy"), DragSource::Roster);
    let envelope = controller.encode_payload().expect("envelope");
    let transfer = controller.drop_on_raw("3", &envelope).expect("transfer");
    assert_eq!(transfer.target, DropTarget::Position(pos(3)));
}

#[test]
fn a_corrupt_envelope_yields_no_transfer() {
    let mut controller = DragController::new();
    controller.start_drag(character("char_2", "Rudy"), DragSource::Roster);

    let transfer = controller.drop_on(DropTarget::Position(pos(2)), "{half an envelope");

    assert!(transfer.is_none());
    assert_eq!(controller.state(), &DragState::Idle);
}

#[test]
fn the_discard_zone_accepts_every_drag() {
    let mut controller = DragController::new();
    controller.start_drag(
        character("char_2", "Rudy"),
        DragSource::CharacterSlot(pos(4)),
    );
    assert!(controller.is_valid_drop_target(DropTarget::Trash));

    let envelope = controller.encode_payload().expect("envelope");
    let transfer = controller
        .drop_on(DropTarget::Trash, &envelope)
        .expect("transfer");
    assert_eq!(transfer.target, DropTarget::Trash);
    assert_eq!(transfer.source, DragSource::CharacterSlot(pos(4)));
}

#[test]
fn hovering_tracks_accepted_targets_and_ignores_rejected_ones() {
    let mut controller = DragController::new();
    controller.start_drag(character("char_2", "Rudy"), DragSource::Roster);

    assert!(controller.hover_over(DropTarget::Position(pos(5))));
    assert_eq!(
        controller.current_drop_target(),
        Some(DropTarget::Position(pos(5)))
    );

    assert!(!controller.hover_over(DropTarget::Pet));
    assert_eq!(
        controller.current_drop_target(),
        Some(DropTarget::Position(pos(5)))
    );
}

#[test]
fn payloads_survive_the_drag_channel() {
    let mut controller = DragController::new();
    controller.start_drag(pet("pet_2", "Mini Rudy"), DragSource::PetSlot);

    let envelope = controller.encode_payload().expect("envelope");
    let payload = DragController::parse_payload(&envelope).expect("payload");

    assert_eq!(payload.item, pet("pet_2", "Mini Rudy"));
    assert_eq!(payload.source, DragSource::PetSlot);
}

#[test]
fn idle_controllers_reject_targets_and_ignore_tracking() {
    let mut controller = DragController::new();
    assert!(!controller.is_valid_drop_target(DropTarget::Trash));
    assert!(controller.encode_payload().is_none());

    controller.set_drop_target(Some(DropTarget::Pet));
    assert_eq!(controller.current_drop_target(), None);
}

#[test]
fn a_new_drag_replaces_the_previous_session() {
    let mut controller = DragController::new();
    controller.start_drag(character("char_2", "Rudy"), DragSource::Roster);
    controller.start_drag(pet("pet_2", "Mini Rudy"), DragSource::Roster);

    assert!(controller.zones().character_slots.is_empty());
    assert!(controller.zones().pet_slot);
    assert!(controller.is_valid_drop_target(DropTarget::Pet));
    assert!(!controller.is_valid_drop_target(DropTarget::Position(pos(1))));
}
