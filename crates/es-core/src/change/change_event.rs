use crate::{ChangeKind, Entity};

use uuid::Uuid;

/// A typed change to apply to a local collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T> {
    Insert(T),
    Update(T),
    Delete(Uuid),
}

impl<T: Entity> ChangeEvent<T> {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Insert(entity) | Self::Update(entity) => entity.id(),
            Self::Delete(id) => *id,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Insert(_) => ChangeKind::Insert,
            Self::Update(_) => ChangeKind::Update,
            Self::Delete(_) => ChangeKind::Delete,
        }
    }
}
