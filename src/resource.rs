//! Resource
//!
//! Load state for data fetched from the backend. One value carries the status together with the
//! data or error, so the three can never disagree.

use std::fmt::Display;

/// Something fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    /// Not requested yet
    Idle,

    /// Request in flight
    Loading,

    /// Request succeeded
    Loaded(T),

    /// Request failed with a human-readable message
    Failed(String),
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> Resource<T> {
    /// Marks a request as started. Previously loaded data is dropped.
    pub fn begin(&mut self) {
        *self = Self::Loading;
    }

    /// Records the outcome of a request.
    pub fn finish<E: Display>(&mut self, result: Result<T, E>) {
        *self = match result {
            Ok(value) => Self::Loaded(value),
            Err(err) => Self::Failed(err.to_string()),
        };
    }

    /// Back to [`Resource::Idle`].
    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    /// Check if a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Loaded data, if any.
    #[must_use]
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable access to loaded data.
    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Failure message, if the last request failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_maps_ok_and_err() {
        let mut loaded = Resource::<u32>::default();

        loaded.begin();
        assert!(loaded.is_loading());

        loaded.finish(Ok::<_, String>(7));
        assert_eq!(loaded.loaded(), Some(&7));
        assert_eq!(loaded.error(), None);

        let mut failed = Resource::<u32>::Idle;

        failed.begin();
        failed.finish(Err("backend unavailable"));
        assert_eq!(failed.error(), Some("backend unavailable"));
        assert_eq!(failed.loaded(), None);

        failed.reset();
        assert_eq!(failed, Resource::Idle);
    }
}
