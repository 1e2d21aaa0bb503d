use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("character position out of range 1..=5: {0}")]
    PositionOutOfRange(u8),
    #[error("rarity tier out of range 1..=6: {0}")]
    RarityOutOfRange(u8),
    #[error("enhancement level out of range 0..=5: {0}")]
    EnhancementOutOfRange(u8),
    #[error("unrecognized drop target: {0:?}")]
    UnknownDropTarget(String),
}
