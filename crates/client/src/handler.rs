//! Routing of retrieval results to caller-supplied handlers.
//!
//! Selection order, first match wins:
//!
//! | result      | slot                             |
//! |-------------|----------------------------------|
//! | redirect    | `redirect`                       |
//! | success     | `complete`                       |
//! | not found   | `not_found`, else `error`        |
//! | other error | `error`                          |
//!
//! An empty slot is never a silent drop. A missing redirect or complete
//! handler is `DispatchError::Unhandled`; a missing error handler hands the
//! result back as `DispatchError::Unresolved`.

use std::fmt;

use thiserror::Error;

use crate::result::{Document, Redirect, RetrievalResult};

/// The four handler slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Redirect,
    Complete,
    NotFound,
    Error,
}

impl Action {
    fn handler_name(self) -> &'static str {
        match self {
            Action::Redirect => "redirect",
            Action::Complete => "completion",
            Action::NotFound => "not found",
            Action::Error => "error",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Redirect => "redirect",
            Action::Complete => "complete",
            Action::NotFound => "not_found",
            Action::Error => "error",
        })
    }
}

/// A result no registered handler accepted.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no result {} handler defined for {uri}", .action.handler_name())]
    Unhandled { action: Action, uri: String },

    #[error("{0}")]
    Unresolved(Box<RetrievalResult>),
}

impl DispatchError {
    /// The slot that was needed.
    pub fn action(&self) -> Action {
        match self {
            DispatchError::Unhandled { action, .. } => *action,
            DispatchError::Unresolved(result) if result.is_not_found() => Action::NotFound,
            DispatchError::Unresolved(_) => Action::Error,
        }
    }

    /// The escalated result, for errors nobody handled.
    pub fn result(&self) -> Option<&RetrievalResult> {
        match self {
            DispatchError::Unresolved(result) => Some(result),
            DispatchError::Unhandled { .. } => None,
        }
    }
}

type Slot<'a, A, T> = Option<Box<dyn FnOnce(A) -> T + Send + 'a>>;

/// Handlers for the outcomes a caller cares about.
pub struct HandlerTable<'a, T> {
    redirect: Slot<'a, Redirect, T>,
    complete: Slot<'a, Document, T>,
    not_found: Slot<'a, RetrievalResult, T>,
    error: Slot<'a, RetrievalResult, T>,
}

impl<T> Default for HandlerTable<'_, T> {
    fn default() -> Self {
        Self { redirect: None, complete: None, not_found: None, error: None }
    }
}

impl<'a, T> HandlerTable<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_redirect(mut self, handler: impl FnOnce(Redirect) -> T + Send + 'a) -> Self {
        self.redirect = Some(Box::new(handler));
        self
    }

    pub fn on_complete(mut self, handler: impl FnOnce(Document) -> T + Send + 'a) -> Self {
        self.complete = Some(Box::new(handler));
        self
    }

    pub fn on_not_found(mut self, handler: impl FnOnce(RetrievalResult) -> T + Send + 'a) -> Self {
        self.not_found = Some(Box::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl FnOnce(RetrievalResult) -> T + Send + 'a) -> Self {
        self.error = Some(Box::new(handler));
        self
    }

    /// Slots that hold a handler.
    pub fn registered(&self) -> Vec<Action> {
        [
            (Action::Redirect, self.redirect.is_some()),
            (Action::Complete, self.complete.is_some()),
            (Action::NotFound, self.not_found.is_some()),
            (Action::Error, self.error.is_some()),
        ]
        .into_iter()
        .filter_map(|(action, set)| set.then_some(action))
        .collect()
    }

    /// Run the handler selected for `result`.
    pub fn dispatch(self, result: RetrievalResult) -> Result<T, DispatchError> {
        match result {
            RetrievalResult::Redirect(redirect) => match self.redirect {
                Some(handler) => Ok(handler(redirect)),
                None => Err(DispatchError::Unhandled { action: Action::Redirect, uri: redirect.uri().to_string() }),
            },
            RetrievalResult::Document(doc) => match self.complete {
                Some(handler) => Ok(handler(doc)),
                None => Err(DispatchError::Unhandled { action: Action::Complete, uri: doc.uri().to_string() }),
            },
            result => {
                let handler = if result.is_not_found() { self.not_found.or(self.error) } else { self.error };
                match handler {
                    Some(handler) => Ok(handler(result)),
                    None => Err(DispatchError::Unresolved(Box::new(result))),
                }
            }
        }
    }
}

impl<T> fmt::Debug for HandlerTable<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable").field("registered", &self.registered()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{GATEWAY_TIMEOUT, GatewayError};
    use docrepo_core::CachedResponse;

    fn not_found() -> RetrievalResult {
        RetrievalResult::from_response("/missing.md", CachedResponse::new(404, "Any Error Details").with_reason("Not Found"))
    }

    fn server_error() -> RetrievalResult {
        RetrievalResult::from_response("/a.md", CachedResponse::new(500, "boom").with_reason("Internal Server Error"))
    }

    fn document() -> RetrievalResult {
        RetrievalResult::from_response("/a.md", CachedResponse::new(200, "# Title"))
    }

    fn redirect() -> RetrievalResult {
        RetrievalResult::Redirect(Redirect::to("/o/r/b/docs/img.png", "https://y.test/b"))
    }

    fn full_table<'a>() -> HandlerTable<'a, String> {
        HandlerTable::new()
            .on_redirect(|r| format!("redirect {}", r.url()))
            .on_complete(|d| format!("complete {}", d.content()))
            .on_not_found(|r| format!("not_found {}", r.code()))
            .on_error(|r| format!("error {}", r.code()))
    }

    #[test]
    fn test_each_result_reaches_its_slot() {
        assert_eq!(full_table().dispatch(redirect()).unwrap(), "redirect https://y.test/b");
        assert_eq!(full_table().dispatch(document()).unwrap(), "complete # Title");
        assert_eq!(full_table().dispatch(not_found()).unwrap(), "not_found 404");
        assert_eq!(full_table().dispatch(server_error()).unwrap(), "error 500");
    }

    #[test]
    fn test_gateway_error_reaches_error_slot() {
        let result = RetrievalResult::Gateway(GatewayError::new("/a.md", GATEWAY_TIMEOUT, "timed out"));
        assert_eq!(full_table().dispatch(result).unwrap(), "error 504");
    }

    #[test]
    fn test_not_found_falls_back_to_error() {
        let table = HandlerTable::new().on_error(|r: RetrievalResult| r);
        let handled = table.dispatch(not_found()).unwrap();

        assert!(handled.is_not_found());
        assert_eq!(handled.uri(), "/missing.md");
        assert_eq!(handled.details().as_deref(), Some("Any Error Details"));
    }

    #[test]
    fn test_not_found_handler_ignores_other_errors() {
        let table = HandlerTable::new().on_not_found(|_| "not found");
        let err = table.dispatch(server_error()).unwrap_err();

        assert_eq!(err.action(), Action::Error);
        assert_eq!(err.result().map(RetrievalResult::code), Some(500));
        assert_eq!(err.to_string(), "500 \"Internal Server Error\"");
    }

    #[test]
    fn test_unhandled_redirect() {
        let err = HandlerTable::<()>::new().dispatch(redirect()).unwrap_err();

        assert!(matches!(err, DispatchError::Unhandled { action: Action::Redirect, .. }));
        assert_eq!(err.to_string(), "no result redirect handler defined for /o/r/b/docs/img.png");
        assert!(err.result().is_none());
    }

    #[test]
    fn test_unhandled_completion() {
        let err = HandlerTable::<()>::new().on_error(|_| ()).dispatch(document()).unwrap_err();

        assert_eq!(err.action(), Action::Complete);
        assert_eq!(err.to_string(), "no result completion handler defined for /a.md");
    }

    #[test]
    fn test_unresolved_not_found() {
        let err = HandlerTable::<()>::new().dispatch(not_found()).unwrap_err();

        assert_eq!(err.action(), Action::NotFound);
        assert!(err.result().is_some_and(RetrievalResult::is_not_found));
        assert_eq!(err.to_string(), "404 \"Not Found\"");
    }

    #[test]
    fn test_registered_slots() {
        let table = HandlerTable::<()>::new().on_complete(|_| ()).on_error(|_| ());
        assert_eq!(table.registered(), vec![Action::Complete, Action::Error]);
        assert!(HandlerTable::<()>::new().registered().is_empty());
        assert_eq!(format!("{table:?}"), "HandlerTable { registered: [Complete, Error] }");
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Redirect.to_string(), "redirect");
        assert_eq!(Action::Complete.to_string(), "complete");
        assert_eq!(Action::NotFound.to_string(), "not_found");
        assert_eq!(Action::Error.to_string(), "error");
    }

    #[test]
    fn test_handlers_can_borrow() {
        let mut seen = Vec::new();
        HandlerTable::new()
            .on_complete(|d: Document| seen.push(d.content()))
            .dispatch(document())
            .unwrap();
        assert_eq!(seen, vec!["# Title".to_string()]);
    }
}
