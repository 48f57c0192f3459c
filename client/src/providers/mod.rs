//! # Data Providers
//!
//! Single sources of truth for the signed-in user's data. Each provider keeps
//! an in-memory list, performs the API calls that change it, re-fetches the
//! full list after every successful mutation and reports every outcome as a
//! toast.
//!
//! ## Providers
//!
//! - **goals**: savings goals, plus upkeep of the "goals" category that must
//!   exist exactly while the user has goals
//! - **categories**: spending categories
//! - **transactions**: income/expense entries
//!
//! ## Error Reporting
//!
//! No operation panics or leaves an error unreported. Each failure produces
//! exactly one error toast and is also returned as a [`ProviderError`].

pub mod categories;
pub mod goals;
pub mod transactions;

pub use categories::CategoryProvider;
pub use goals::GoalProvider;
pub use transactions::TransactionProvider;

use crate::error::ProviderError;

pub(crate) const ERROR_OCCURRED: &str = "An error occurred: ";

/// Toast text for a failed operation.
///
/// A 2xx answer with the wrong status gets the operation's own message,
/// everything else the generic one.
pub(crate) fn failure_message(error: &ProviderError, unexpected: impl FnOnce(&str) -> String) -> String {
    match error {
        ProviderError::UnexpectedStatus { body, .. } => unexpected(body),
        other => format!("{}{}", ERROR_OCCURRED, other),
    }
}
