use crate::{Entity, Error, Result, SaveOptions};

/// Hooks invoked by a table gateway around each save.
///
/// `before_save` may mutate the entity; returning `Err` aborts the save
/// before any remote call.
pub trait SaveListener: Send + Sync {
    fn before_save(&self, _entity: &mut Entity, _options: &SaveOptions) -> Result<()> {
        Ok(())
    }

    fn after_save(&self, _entity: &Entity, _options: &SaveOptions) {}

    fn save_error(&self, _entity: &Entity, _options: &SaveOptions, _error: &Error) {}
}
