//! Load state shared by every view.

use std::fmt::Display;

/// What a view has to show: still fetching, a failure message, or data.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Error(String),
    Ready(T),
}

impl<T> ViewState<T> {
    /// Fold a fetch result into a view state. The error's display text is
    /// what the user sees.
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Ready(data),
            Err(e) => Self::Error(e.to_string()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ViewState<U> {
        match self {
            Self::Loading => ViewState::Loading,
            Self::Error(e) => ViewState::Error(e),
            Self::Ready(data) => ViewState::Ready(f(data)),
        }
    }
}
