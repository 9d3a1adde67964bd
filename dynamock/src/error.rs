// vim: tw=80
//! Errors reported by the matching engine.

use std::sync::Arc;

use thiserror::Error;

use crate::value::{Dump, Value};

/// A user-declared error, shared between every call that raises it.
pub type Raised = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can go wrong while declaring, calling, or verifying a mock.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A symbolic call count that isn't `any`, `never`, `once`, or a number.
    #[error("times doesn't take the parameter {0}")]
    InvalidExpectationSpec(String),

    /// A call matched an expectation whose exact call count was already
    /// reached.  The offending call is not recorded.
    #[error("Function {method} with args: {}\nWas called {calls} times, only {allowed} calls expected", Dump(.args))]
    OverCalled {
        method: String,
        args: Vec<Value>,
        calls: usize,
        allowed: usize,
    },

    /// No expectation accepted the call.  `expectations` is the rendered list
    /// of everything declared on the mock.
    #[error("{mock}: No match for method {method} with args: {}\nExpectations: {expectations}", Dump(.args))]
    NoMatchFound {
        mock: String,
        method: String,
        args: Vec<Value>,
        expectations: String,
    },

    /// At least one expectation was not satisfied when the mock was verified.
    /// `report` has one entry per unsatisfied expectation.
    #[error("{report}")]
    VerificationFailed {
        mock: String,
        report: String,
    },

    /// The response configured with
    /// [`Expectation::raises`](crate::Expectation::raises).
    #[error(transparent)]
    Raised(Raised),
}

impl Error {
    /// The user-declared error, if this is a [`Error::Raised`] outcome.
    ///
    /// # Examples
    /// ```
    /// # use dynamock::*;
    /// #[derive(Debug)]
    /// struct Boom;
    /// impl std::fmt::Display for Boom {
    ///     fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    ///         f.write_str("boom")
    ///     }
    /// }
    /// impl std::error::Error for Boom {}
    ///
    /// let mock = Mock::new("Thingy");
    /// mock.expects("explode").raises(Boom);
    /// let err = mock.invoke("explode", args![]).unwrap_err();
    /// assert!(err.raised().unwrap().downcast_ref::<Boom>().is_some());
    /// ```
    pub fn raised(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Raised(e) => Some(e.as_ref()),
            _ => None
        }
    }

    /// Was this produced by the engine itself, as opposed to a user-declared
    /// response?
    pub fn is_engine_failure(&self) -> bool {
        !matches!(self, Error::Raised(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
