//! The errors surfaced to callers of the gateway and the mutation coordinator.

use crate::Error;

/// Why a read or write against the data gateway failed.
///
/// Every variant carries a short, human-readable message that can be shown
/// to the user as is.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ClientError {
    /// The input was rejected before or by the gateway, e.g. a non-positive
    /// amount or a malformed month.
    #[error("{0}")]
    Validation(String),

    /// The write clashes with existing data, e.g. a duplicate category name
    /// or a second budget for the same category and month.
    #[error("{0}")]
    Conflict(String),

    /// The target no longer exists.
    #[error("{0}")]
    NotFound(String),

    /// The request could not be completed.
    #[error("{0}")]
    Network(String),

    /// The gateway failed unexpectedly or replied with something unreadable.
    #[error("{0}")]
    Server(String),
}

impl ClientError {
    /// The message to display to the user.
    pub fn message(&self) -> &str {
        match self {
            ClientError::Validation(message)
            | ClientError::Conflict(message)
            | ClientError::NotFound(message)
            | ClientError::Network(message)
            | ClientError::Server(message) => message,
        }
    }

    /// Whether the error means the target is already gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<Error> for ClientError {
    fn from(error: Error) -> Self {
        match error {
            Error::EmptyCategoryName
            | Error::InvalidCategoryType(_)
            | Error::MissingField(_)
            | Error::EmptyDescription
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_)
            | Error::InvalidMonth(_)
            | Error::InvalidCategory(_) => ClientError::Validation(error.to_string()),
            Error::DuplicateCategoryName(_) | Error::DuplicateBudget(_, _) => {
                ClientError::Conflict(error.to_string())
            }
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingBudget
            | Error::DeleteMissingBudget => ClientError::NotFound(error.to_string()),
            Error::SqlError(_) | Error::DatabaseLockError => {
                tracing::error!("gateway failure: {error}");
                ClientError::Server("An error occurred while accessing the database".to_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ClientError, Error};

    #[test]
    fn classifies_persistence_errors() {
        assert!(matches!(
            ClientError::from(Error::EmptyDescription),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            ClientError::from(Error::DuplicateCategoryName("Food".to_owned())),
            ClientError::Conflict(_)
        ));
        assert!(ClientError::from(Error::DeleteMissingBudget).is_not_found());
        assert!(matches!(
            ClientError::from(Error::DatabaseLockError),
            ClientError::Server(_)
        ));
    }

    #[test]
    fn message_is_the_display_text() {
        let error = ClientError::Conflict("the category \"Food\" already exists".to_owned());

        assert_eq!(error.message(), "the category \"Food\" already exists");
        assert_eq!(error.to_string(), error.message());
    }
}
