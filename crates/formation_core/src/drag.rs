use std::collections::BTreeSet;

use shared::{
    domain::CharacterPosition,
    protocol::{DragPayload, DragSource, DragTransfer, DraggedItem, DropTarget},
};

/// Zones marked active for the drag in flight. The discard zone is active
/// for every drag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropZones {
    pub character_slots: BTreeSet<CharacterPosition>,
    pub pet_slot: bool,
    pub trash: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        payload: DragPayload,
        drop_target: Option<DropTarget>,
    },
}

/// Pointer drag-and-drop state machine. Tracks the transient drag session
/// and resolves drops into transfer records; it never mutates the formation.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
    zones: DropZones,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn zones(&self) -> &DropZones {
        &self.zones
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn start_drag(&mut self, item: DraggedItem, source: DragSource) {
        self.zones = match &item {
            DraggedItem::Character(_) => DropZones {
                character_slots: CharacterPosition::ALL.into_iter().collect(),
                pet_slot: false,
                trash: true,
            },
            DraggedItem::Pet(_) => DropZones {
                character_slots: BTreeSet::new(),
                pet_slot: true,
                trash: true,
            },
        };
        self.state = DragState::Dragging {
            payload: DragPayload { item, source },
            drop_target: None,
        };
    }

    /// Abandons the session: empty-area release, Escape, a new drag taking
    /// over.
    pub fn end_drag(&mut self) {
        self.state = DragState::Idle;
        self.zones = DropZones::default();
    }

    pub fn set_drop_target(&mut self, target: Option<DropTarget>) {
        if let DragState::Dragging { drop_target, .. } = &mut self.state {
            *drop_target = target;
        }
    }

    pub fn current_drop_target(&self) -> Option<DropTarget> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { drop_target, .. } => *drop_target,
        }
    }

    /// A target is accepted only if it is the discard zone or matches the
    /// dragged type's legal zone set.
    pub fn is_valid_drop_target(&self, target: DropTarget) -> bool {
        let DragState::Dragging { payload, .. } = &self.state else {
            return false;
        };
        match (&payload.item, target) {
            (_, DropTarget::Trash) => true,
            (DraggedItem::Character(_), DropTarget::Position(_)) => true,
            (DraggedItem::Pet(_), DropTarget::Pet) => true,
            _ => false,
        }
    }

    /// Pointer moved over `target`. A rejected target leaves the drag state
    /// untouched so the caller can render it as non-acceptable.
    pub fn hover_over(&mut self, target: DropTarget) -> bool {
        if self.is_valid_drop_target(target) {
            self.set_drop_target(Some(target));
            true
        } else {
            false
        }
    }

    /// Serializes the in-flight payload for the platform drag channel. The
    /// drop side may not share memory with this controller, so everything it
    /// needs travels inside the envelope.
    pub fn encode_payload(&self) -> Option<String> {
        let DragState::Dragging { payload, .. } = &self.state else {
            return None;
        };
        serde_json::to_string(payload).ok()
    }

    /// Decodes an envelope recovered from the drag channel; any parse error
    /// means "no transfer".
    pub fn parse_payload(raw: &str) -> Option<DragPayload> {
        serde_json::from_str(raw).ok()
    }

    /// Resolves a release over `target`. The session always ends; a transfer
    /// record comes back only for an accepted target with a readable
    /// envelope.
    pub fn drop_on(&mut self, target: DropTarget, envelope: &str) -> Option<DragTransfer> {
        let accepted = self.is_valid_drop_target(target);
        self.end_drag();
        if !accepted {
            return None;
        }
        let payload = Self::parse_payload(envelope)?;
        Some(DragTransfer {
            item: payload.item,
            source: payload.source,
            target,
        })
    }

    /// Wire-level drop entry: parses the view layer's target string first.
    /// An unrecognized or out-of-range target ends the drag with no
    /// transfer.
    pub fn drop_on_raw(&mut self, target: &str, envelope: &str) -> Option<DragTransfer> {
        match DropTarget::parse(target) {
            Ok(target) => self.drop_on(target, envelope),
            Err(_) => {
                self.end_drag();
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/drag_tests.rs"]
mod tests;
