pub mod form_helpers;
pub mod moderation_helpers;
pub mod public_helpers;
pub mod sanitization_helpers;
pub mod submission_helpers;

#[cfg(test)]
pub(crate) mod test_fixtures;
