use crate::helper::form_helpers::FieldErrors;
use thiserror::Error;

/// Failure taxonomy shared by the retrieval, moderation and submission
/// helpers. The route layer decides how each variant is answered.
#[derive(Error, Debug)]
pub enum BlogError {
    /// Missing entity, or a private post asked for anonymously. The two are
    /// deliberately not told apart.
    #[error("Not found")]
    NotFound,
    #[error("Submitted data is invalid")]
    Validation(FieldErrors),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}
