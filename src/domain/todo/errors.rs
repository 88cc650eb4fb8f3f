// ============================================================================
// To-Do Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("to-do item already exists")]
    AlreadyExists,

    #[error("to-do item is not initialized")]
    NotInitialized,
}
