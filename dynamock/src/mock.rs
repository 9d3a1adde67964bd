// vim: tw=80
use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak}
};

use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    expectation::{Call, Expectation},
    registry::Tracked,
    value::Value
};

struct Inner {
    name: String,
    expectations: RefCell<Vec<Expectation>>,
    /// The registry that created this mock, if any.  It is emptied whenever
    /// this mock reports a failure.
    registry: Weak<Tracked>,
}

/// A scripted stand-in object.
///
/// Declare calls with [`expects`](Self::expects), exercise the mock with
/// [`invoke`](Self::invoke), and finish with [`verify`](Self::verify).
/// Expectations are tried in the order they were declared and the first one
/// that accepts a call answers it.
///
/// `Mock` is a handle: clones share the same expectations.
///
/// # Examples
/// ```
/// # use dynamock::*;
/// let mock = Mock::new("Thingy");
/// mock.expects("some_call").times(2).with(args![24]).returns(200);
///
/// assert_eq!(mock.invoke("some_call", args![24]).unwrap(), 200);
/// assert_eq!(mock.invoke("some_call", args![24]).unwrap(), 200);
/// mock.verify().unwrap();
///
/// let err = mock.invoke("some_call", args![24]).unwrap_err();
/// assert!(matches!(err, Error::OverCalled{calls: 3, allowed: 2, ..}));
/// ```
#[derive(Clone)]
pub struct Mock(Rc<Inner>);

impl Mock {
    /// Create a mock that isn't tracked by any [`Registry`](crate::Registry).
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self::with_registry(name.into(), Weak::new())
    }

    pub(crate) fn with_registry(name: String, registry: Weak<Tracked>)
        -> Self
    {
        Mock(Rc::new(Inner {
            name,
            expectations: RefCell::new(Vec::new()),
            registry
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Declare a new expectation for calls to `method`.
    ///
    /// By default it accepts any arguments, must be called exactly once, and
    /// answers with [`Value::Null`].
    pub fn expects<S: Into<String>>(&self, method: S) -> Expectation {
        let method = method.into();
        debug!(mock = %self.0.name, %method, "expectation declared");
        let expectation = Expectation::new(method);
        self.0.expectations.borrow_mut().push(expectation.clone());
        expectation
    }

    /// Deliver a call to the mock.
    ///
    /// The first expectation, in declaration order, that accepts the call
    /// answers it with its configured value, or with
    /// [`Error::Raised`].  If none accepts it the call fails with
    /// [`Error::OverCalled`] when it matches an expectation that has already
    /// reached its limit, and with [`Error::NoMatchFound`] otherwise.
    pub fn invoke<I>(&self, method: &str, args: I) -> Result<Value>
        where I: IntoIterator,
              I::Item: Into<Value>
    {
        let call = Call::new(method, args);
        self.dispatch(call).map_err(|e| self.fail(e))
    }

    fn dispatch(&self, call: Call) -> Result<Value> {
        // Work on a snapshot, so that predicates may use the mock
        let expectations = self.expectations();
        for expectation in expectations.iter() {
            if expectation.check_match(&call, true)? {
                debug!(mock = %self.0.name, method = call.method(),
                    calls = expectation.calls(), "call matched");
                return expectation.respond();
            }
        }
        // Give exhausted expectations a chance to see the call, so that an
        // extra call is reported as such.
        trace!(mock = %self.0.name, method = call.method(),
            "no open expectation matched");
        for expectation in expectations.iter() {
            expectation.check_match(&call, false)?;
        }
        let listing = list(&expectations);
        let (method, args) = call.into_parts();
        Err(Error::NoMatchFound {
            mock: self.0.name.clone(),
            method,
            args,
            expectations: listing
        })
    }

    /// Check that every expectation has been satisfied.
    pub fn verify(&self) -> Result<()> {
        let report = self.0.expectations.borrow()
            .iter()
            .filter(|e| !e.is_satisfied())
            .map(|e| format!("Mock {} expected {}", self.0.name, e.describe()))
            .collect::<Vec<_>>();
        if report.is_empty() {
            Ok(())
        } else {
            Err(self.fail(Error::VerificationFailed {
                mock: self.0.name.clone(),
                report: report.join("\n")
            }))
        }
    }

    /// Verify the mock, then discard all of its expectations.
    ///
    /// The expectations are discarded even if verification fails, so the
    /// mock can be reused for another round of calls.
    pub fn checkpoint(&self) -> Result<()> {
        let result = self.verify();
        self.0.expectations.borrow_mut().clear();
        result
    }

    /// Handles to every expectation, in declaration order
    pub fn expectations(&self) -> Vec<Expectation> {
        self.0.expectations.borrow().clone()
    }

    /// The number of declared expectations
    pub fn len(&self) -> usize {
        self.0.expectations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expectations.borrow().is_empty()
    }

    /// Empty the owning registry on an engine failure, then hand the error
    /// back.
    fn fail(&self, error: Error) -> Error {
        if error.is_engine_failure() {
            if let Some(registry) = self.0.registry.upgrade() {
                debug!(mock = %self.0.name, "failure; resetting registry");
                registry.borrow_mut().clear();
            }
        }
        error
    }
}

impl Default for Mock {
    fn default() -> Self {
        Mock::new("Mock")
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mock")
            .field("name", &self.0.name)
            .field("expectations", &*self.0.expectations.borrow())
            .finish()
    }
}

fn list(expectations: &[Expectation]) -> String {
    expectations.iter()
        .map(|e| format!("Function {}\n", e.describe()))
        .collect()
}
