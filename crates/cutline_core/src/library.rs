use crate::error::{CoreError, Result};
use crate::types::*;
use uuid::Uuid;

/// Partial update for a library item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryUpdate {
    pub name: Option<String>,
    pub media_ref: Option<MediaRef>,
    pub native_duration: Option<TimeUs>,
}

/// Uploaded media that clips are instantiated from. Clips only hold a
/// `MediaRef` copy, so removing an item never touches the timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    items: Vec<LibraryItem>,
}

impl Library {
    pub fn items(&self) -> &[LibraryItem] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&LibraryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn add(&mut self, item: LibraryItem) -> Result<Uuid> {
        if self.get(item.id).is_some() {
            return Err(CoreError::InvalidOperation(format!(
                "library item {} already exists",
                item.id
            )));
        }
        let id = item.id;
        tracing::debug!(%id, name = %item.name, "library item added");
        self.items.push(item);
        Ok(id)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<LibraryItem> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(CoreError::NotFound(id))?;
        Ok(self.items.remove(idx))
    }

    /// Update metadata, typically once probing resolves the duration.
    pub fn update(&mut self, id: Uuid, update: LibraryUpdate) -> Result<()> {
        if let Some(duration) = update.native_duration {
            if duration <= TimeUs::ZERO {
                return Err(CoreError::InvalidDuration(format!(
                    "duration {} must be positive",
                    duration
                )));
            }
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(CoreError::NotFound(id))?;
        if let Some(name) = update.name {
            item.name = name;
        }
        if let Some(media_ref) = update.media_ref {
            item.media_ref = media_ref;
        }
        if let Some(duration) = update.native_duration {
            item.native_duration = Some(duration);
        }
        Ok(())
    }
}
