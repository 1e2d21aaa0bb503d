use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use formation_core::{
    intent_for_transfer,
    selection::SlotClick,
    share::{self, InMemoryRoster},
    DragController, FormationStore, SelectionController,
};
use shared::{
    domain::{
        Character, CharacterClass, CharacterId, CharacterPosition, EnhancementLevel,
        FormationType, Pet, PetId, PositionType, Rarity,
    },
    protocol::{DragSource, DraggedItem, DropTarget, PlacementTarget},
};
use storage::{FileStore, FormationArchive};

mod config;

#[derive(Parser, Debug)]
struct Args {
    /// Overrides the configured storage directory.
    #[arg(long)]
    data_dir: Option<String>,
    /// Saves the assembled formation under this name.
    #[arg(long)]
    save_as: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir;
    }

    let backend = Arc::new(FileStore::new(&settings.data_dir)?);
    let archive = FormationArchive::new(backend);
    let mut store = FormationStore::new(archive.clone());
    info!(data_dir = %settings.data_dir, "formation store ready");

    let characters = sample_characters()?;
    let pets = sample_pets()?;

    store.change_formation_type(FormationType::Normal);

    // Click-to-place: tap the first roster card, then tap position 1.
    let mut selection = SelectionController::new();
    selection.handle_character_card_click(characters[0].clone());
    let front = CharacterPosition::new(1)?;
    if selection.is_valid_placement(PlacementTarget::Position(front)) {
        if let SlotClick::Place(intent) = selection.handle_character_slot_click(front) {
            store.apply(&intent);
        }
    }

    // Drag-and-drop: drag the second card from the roster onto position 4.
    let mut drag = DragController::new();
    drag.start_drag(
        DraggedItem::Character(characters[1].clone()),
        DragSource::Roster,
    );
    let envelope = drag.encode_payload().unwrap_or_default();
    if let Some(transfer) = drag.drop_on_raw("4", &envelope) {
        if let Some(intent) = intent_for_transfer(&transfer) {
            store.apply(&intent);
        }
    }

    // The pet goes in the same way, dropped on the pet slot.
    let mut drag = DragController::new();
    drag.start_drag(DraggedItem::Pet(pets[0].clone()), DragSource::Roster);
    let envelope = drag.encode_payload().unwrap_or_default();
    if let Some(transfer) = drag.drop_on(DropTarget::Pet, &envelope) {
        if let Some(intent) = intent_for_transfer(&transfer) {
            store.apply(&intent);
        }
    }

    let formation = store.formation();
    println!(
        "{} — {}/5 slots filled, pet: {}",
        formation.formation_type.config().name,
        formation.filled_slots(),
        if formation.has_pet() { "yes" } else { "no" }
    );
    for slot in &formation.character_slots {
        let role = match slot.position_type {
            PositionType::Front => "front",
            PositionType::Back => "back",
        };
        let occupant = slot
            .character
            .as_ref()
            .map(|character| character.name.as_str())
            .unwrap_or("-");
        println!("  {} [{role}] {occupant}", slot.position);
    }

    let errors = store.validation_errors();
    if errors.is_empty() {
        println!("formation is valid");
    } else {
        for error in errors {
            println!("validation: {error}");
        }
    }

    let url = share::share_url(&settings.share_base_url, store.formation())?;
    println!("share link: {url}");

    // Prove the link decodes and rehydrates against the roster.
    let roster = InMemoryRoster::new(characters.clone(), pets.clone());
    if let Some(decoded) = share::share_data_from_url(url.as_str()) {
        let rehydrated = share::rehydrate(&decoded, &roster);
        println!(
            "decoded share link: {} characters, {} unresolved",
            decoded.characters.len(),
            rehydrated.unresolved.len()
        );
    }

    if let Some(name) = args.save_as {
        let saved = archive.save_as(store.formation(), &name)?;
        println!(
            "saved formation '{}'",
            saved.name.as_deref().unwrap_or_default()
        );
    }

    let saved = archive.saved_formations()?;
    if !saved.is_empty() {
        println!("saved formations:");
        for formation in saved {
            println!(
                "  {} — updated {}",
                formation.name.as_deref().unwrap_or("(unnamed)"),
                formation
                    .updated_at
                    .map(|ts| ts.to_string())
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn character(
    id: &str,
    name: &str,
    level: u32,
    rarity: u8,
    class: CharacterClass,
    enhancement: u8,
) -> Result<Character> {
    Ok(Character {
        id: CharacterId::new(id),
        name: name.to_string(),
        image: format!("/images/characters/{id}.png"),
        level,
        rarity: Rarity::new(rarity)?,
        class,
        enhancement_level: EnhancementLevel::new(enhancement)?,
    })
}

fn pet(id: &str, name: &str, level: u32, rarity: u8, abilities: &[&str]) -> Result<Pet> {
    Ok(Pet {
        id: PetId::new(id),
        name: name.to_string(),
        image: format!("/images/pets/{id}.png"),
        level,
        rarity: Rarity::new(rarity)?,
        abilities: abilities.iter().map(|s| s.to_string()).collect(),
    })
}

fn sample_characters() -> Result<Vec<Character>> {
    Ok(vec![
        character("char_1", "Shane", 50, 6, CharacterClass::Warrior, 5)?,
        character("char_2", "Rudy", 50, 6, CharacterClass::Tank, 5)?,
        character("char_3", "Rachel", 48, 5, CharacterClass::Mage, 3)?,
    ])
}

fn sample_pets() -> Result<Vec<Pet>> {
    Ok(vec![
        pet("pet_1", "Mini Shane", 30, 5, &["ATK Boost", "Crit Damage"])?,
        pet("pet_2", "Mini Rudy", 30, 5, &["DEF Boost", "HP Regen"])?,
    ])
}
