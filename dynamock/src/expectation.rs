// vim: tw=80
//! A single declared call pattern and its call-count state machine.

use std::{
    cell::RefCell,
    fmt::{self, Display, Formatter},
    rc::Rc,
    sync::Arc
};

use predicates::prelude::{Predicate, predicate};

use crate::{
    error::{Error, Raised, Result},
    times::Times,
    value::{Dump, Fingerprint, Value, canonicalize}
};

/// One incoming call, with its arguments fingerprinted once up front so that
/// every expectation can compare against it cheaply.
#[derive(Clone, Debug)]
pub struct Call {
    method: String,
    args: Vec<Value>,
    fingerprint: Fingerprint,
}

impl Call {
    pub fn new<S, I>(method: S, args: I) -> Self
        where S: Into<String>,
              I: IntoIterator,
              I::Item: Into<Value>
    {
        let args = args.into_iter().map(Into::into).collect::<Vec<_>>();
        let fingerprint = Fingerprint::of(&args);
        Call{method: method.into(), args, fingerprint}
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Value>) {
        (self.method, self.args)
    }
}

/// Which argument lists an expectation accepts
enum Matcher {
    Any,
    Args {
        args: Vec<Value>,
        fingerprint: Fingerprint,
    },
    Pred(Box<dyn Predicate<[Value]>>),
}

impl Matcher {
    fn matches(&self, call: &Call) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Args{fingerprint, ..} => *fingerprint == call.fingerprint,
            Matcher::Pred(p) => p.eval(call.args())
        }
    }
}

impl Display for Matcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("with any arguments"),
            Matcher::Args{args, ..} => {
                let dump = Dump(args).to_string();
                write!(f, "with arguments: {}", dump.trim_end())
            },
            Matcher::Pred(p) => write!(f, "with arguments matching {}", p)
        }
    }
}

/// What a matching call produces
enum Response {
    /// Nothing was configured.  The call is allowed and yields `Null`.
    Default,
    Return(Value),
    Raise(Raised),
}

struct State {
    method: String,
    matcher: Matcher,
    times: Times,
    calls: usize,
    satisfied: bool,
    /// Set by the first call past an exact limit.  Never cleared.
    overcalled: bool,
    response: Response,
}

/// One expected call on a [`Mock`](crate::Mock).
///
/// Returned by [`Mock::expects`](crate::Mock::expects).  Every builder method
/// consumes and returns the handle, so configuration chains:
///
/// ```
/// # use dynamock::*;
/// let mock = Mock::new("Thingy");
/// mock.expects("some_call")
///     .times(2)
///     .with(args![24])
///     .returns(200);
/// ```
///
/// The handle shares state with the copy the mock keeps, so it can also be
/// held on to and inspected later.
#[derive(Clone)]
pub struct Expectation(Rc<RefCell<State>>);

impl Expectation {
    pub(crate) fn new(method: String) -> Self {
        Expectation(Rc::new(RefCell::new(State {
            method,
            matcher: Matcher::Any,
            times: Times::default(),
            calls: 0,
            satisfied: false,
            overcalled: false,
            response: Response::Default,
        })))
    }

    /// Only accept calls whose arguments equal `args`.
    ///
    /// Arguments are compared positionally.  Maps inside them compare without
    /// regard to key order, at any depth.
    pub fn with<I>(self, args: I) -> Self
        where I: IntoIterator,
              I::Item: Into<Value>
    {
        let args = args.into_iter()
            .map(|arg| canonicalize(&arg.into()))
            .collect::<Vec<_>>();
        let fingerprint = Fingerprint::of(&args);
        self.0.borrow_mut().matcher = Matcher::Args{args, fingerprint};
        self
    }

    /// Only accept calls whose argument list satisfies `p`.
    pub fn with_predicate<P>(self, p: P) -> Self
        where P: Predicate<[Value]> + 'static
    {
        self.0.borrow_mut().matcher = Matcher::Pred(Box::new(p));
        self
    }

    /// Only accept calls for which `f` returns true.
    ///
    /// `f` may inspect the mock, but must not deliver calls to it.
    ///
    /// Shorthand for `with_predicate(predicate::function(f))`.
    ///
    /// ```
    /// # use dynamock::*;
    /// let mock = Mock::new("Thingy");
    /// mock.expects("add")
    ///     .withf(|args| args.len() == 2)
    ///     .returns(3);
    /// assert_eq!(mock.invoke("add", [1, 2]).unwrap(), 3);
    /// ```
    pub fn withf<F>(self, f: F) -> Self
        where F: Fn(&[Value]) -> bool + 'static
    {
        self.with_predicate(predicate::function(f))
    }

    /// Require this many matching calls.
    ///
    /// `Times::Exactly(0)` and `Times::Any` are satisfied immediately.
    pub fn times<T: Into<Times>>(self, times: T) -> Self {
        {
            let mut state = self.0.borrow_mut();
            state.times = times.into();
            state.satisfied = !state.overcalled &&
                state.times.is_satisfied_by(state.calls);
        }
        self
    }

    /// Expect exactly one call.  This is the default.
    pub fn once(self) -> Self {
        self.times(Times::once())
    }

    /// Forbid this call.  The first match fails with
    /// [`Error::OverCalled`](crate::Error::OverCalled).
    pub fn never(self) -> Self {
        self.times(Times::never())
    }

    /// Allow any number of calls, including none.
    pub fn times_any(self) -> Self {
        self.times(Times::Any)
    }

    /// Answer matching calls with `value`.
    pub fn returns<V: Into<Value>>(self, value: V) -> Self {
        self.0.borrow_mut().response = Response::Return(value.into());
        self
    }

    /// Fail matching calls with `error`.
    ///
    /// Every matching call yields [`Error::Raised`](crate::Error::Raised)
    /// holding this same error object.
    pub fn raises<E>(self, error: E) -> Self
        where E: std::error::Error + Send + Sync + 'static
    {
        self.0.borrow_mut().response = Response::Raise(Arc::new(error));
        self
    }

    /// Try to match `call`, recording it if it matches.
    ///
    /// With `count_toward_match` set, an exact-count expectation that is
    /// already satisfied declines the call, so that a later expectation for
    /// the same method can take it.  Without it, such an expectation still
    /// counts the call, which fails with
    /// [`Error::OverCalled`](crate::Error::OverCalled) once the limit is
    /// passed.  An expectation that has been called too often stays
    /// unsatisfied for good.
    pub fn check_match(&self, call: &Call, count_toward_match: bool)
        -> Result<bool>
    {
        {
            // Only a shared borrow while a predicate runs, so that it may
            // inspect this expectation.
            let state = self.0.borrow();
            if count_toward_match && state.times.is_exact() && state.satisfied
            {
                return Ok(false);
            }
            if state.method != call.method || !state.matcher.matches(call) {
                return Ok(false);
            }
        }
        let mut state = self.0.borrow_mut();
        let calls = state.calls + 1;
        if let Some(allowed) = state.times.limit() {
            if calls > allowed {
                state.overcalled = true;
                state.satisfied = false;
                return Err(Error::OverCalled {
                    method: call.method.clone(),
                    args: call.args.clone(),
                    calls,
                    allowed
                });
            }
        }
        state.calls = calls;
        state.satisfied = state.times.is_satisfied_by(calls);
        Ok(true)
    }

    /// Produce the configured response for a matched call.
    pub(crate) fn respond(&self) -> Result<Value> {
        match &self.0.borrow().response {
            Response::Default => Ok(Value::Null),
            Response::Return(value) => Ok(value.clone()),
            Response::Raise(error) => Err(Error::Raised(error.clone()))
        }
    }

    pub fn method(&self) -> String {
        self.0.borrow().method.clone()
    }

    /// The canonicalized argument pattern, if one was set with
    /// [`with`](Self::with).
    pub fn arguments(&self) -> Option<Vec<Value>> {
        match &self.0.borrow().matcher {
            Matcher::Args{args, ..} => Some(args.clone()),
            _ => None
        }
    }

    /// How many matching calls have been recorded
    pub fn calls(&self) -> usize {
        self.0.borrow().calls
    }

    pub fn is_satisfied(&self) -> bool {
        self.0.borrow().satisfied
    }

    /// `"<method> with arguments: ..."` or `"<method> with any arguments"`
    pub(crate) fn describe(&self) -> String {
        let state = self.0.borrow();
        format!("{} {}", state.method, state.matcher)
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("Expectation")
            .field("method", &state.method)
            .field("times", &state.times)
            .field("calls", &state.calls)
            .field("satisfied", &state.satisfied)
            .finish()
    }
}
