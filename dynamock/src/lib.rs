// vim: tw=80
//! Scripted mock objects with runtime expectation matching.
//!
//! Dynamock provides a [`Mock`] that can stand in for any collaborator.
//! Calls are described by a method name and a list of [`Value`] arguments, so
//! no code generation is needed to mock something.  For traits, the
//! [`#[forward]`](macro@forward) attribute writes the glue.
//!
//! # Usage
//!
//! * Create a [`Mock`], either standalone or through a [`Registry`].
//! * Declare the calls it should receive with [`Mock::expects`].  Each
//!   [`Expectation`] can have an argument pattern, a call count, and a response.
//! * Hand the mock to the code under test, which calls it through
//!   [`Mock::invoke`].
//! * At the end of the test, check that every expectation was met with
//!   [`Mock::verify`] or [`Registry::verify_all`].
//!
//! ## Getting started
//! ```
//! use dynamock::*;
//!
//! fn fetch(service: &Mock) -> i64 {
//!     service.invoke("some_call", args![24]).unwrap().as_i64().unwrap()
//! }
//!
//! let mock = Mock::new("Thingy");
//! mock.expects("some_call")
//!     .with(args![24])
//!     .returns(200);
//! assert_eq!(200, fetch(&mock));
//! mock.verify().unwrap();
//! ```
//!
//! ## Matching arguments
//!
//! An expectation without [`with`](Expectation::with) accepts any arguments,
//! including none.  With a pattern, arguments are compared positionally, but
//! maps inside them are compared without regard to key order, at any depth.
//!
//! ```
//! # use dynamock::*;
//! let mock = Mock::new("Thingy");
//! mock.expects("get")
//!     .with(args!["Items.GetList", {"page": 1, "per_page": 2}])
//!     .returns("test");
//! let result = mock.invoke("get", args!["Items.GetList", {"per_page": 2, "page": 1}]);
//! assert_eq!(result.unwrap(), "test");
//! ```
//!
//! Arbitrary conditions can be expressed with [`withf`](Expectation::withf)
//! or any [`Predicate`] over the argument list.
//!
//! ### Matching multiple calls
//!
//! Several expectations may be declared for the same method.  Each call is
//! offered to them in declaration order, and the first one that accepts it
//! answers.  An expectation that has already received all of its calls steps
//! aside for later ones.
//!
//! ```
//! # use dynamock::*;
//! let mock = Mock::new("Thingy");
//! mock.expects("some_call").with(args!["23"]).returns(json!([1, 2, 3, 4]));
//! mock.expects("some_call").with(args!["24"]).returns(json!([5, 6, 7, 8]));
//!
//! assert_eq!(mock.invoke("some_call", args!["24"]).unwrap(), json!([5, 6, 7, 8]));
//! assert_eq!(mock.invoke("some_call", args!["23"]).unwrap(), json!([1, 2, 3, 4]));
//! mock.verify().unwrap();
//! ```
//!
//! ## Call counts
//!
//! By default, every expectation must be called exactly once.  Use
//! [`times`](Expectation::times) for another count, [`never`](Expectation::never)
//! to forbid a call, or [`times_any`](Expectation::times_any) to allow any
//! number of calls.  A call beyond an exact count fails immediately with
//! [`Error::OverCalled`]; too few calls are reported by
//! [`verify`](Mock::verify).  Symbolic counts can be parsed into a [`Times`].
//!
//! ```
//! # use dynamock::*;
//! let mock = Mock::new("Thingy");
//! mock.expects("some_call").times("any".parse::<Times>().unwrap());
//! mock.expects("other_call").never();
//! mock.verify().unwrap();
//! ```
//!
//! ## Responses
//!
//! [`returns`](Expectation::returns) answers with a value;
//! [`raises`](Expectation::raises) answers with an error, which the caller
//! receives as [`Error::Raised`].  Without either, a matching call yields
//! [`Value::Null`].
//!
//! ## Registries
//!
//! A [`Registry`] keeps track of the mocks created through it, so a test can
//! verify all of them at once.  It is emptied after every
//! [`verify_all`](Registry::verify_all) and whenever one of its mocks reports
//! a failure.  Registries are plain values; give each test its own.
//!
//! ## Mocking traits
//!
//! With the default **derive** feature, [`#[forward]`](macro@forward)
//! implements a trait for [`Mock`] by forwarding every method to
//! [`invoke`](Mock::invoke).  Arguments must implement `serde::Serialize` and
//! return types `serde::de::DeserializeOwned`.
//!
//! ```
//! # use dynamock::*;
//! #[forward]
//! trait Renderer {
//!     fn render(&self, width: u32, title: &str) -> String;
//! }
//!
//! let mock = Mock::new("Renderer");
//! mock.expects("render").with(args![80, "hello"]).returns("ok");
//! assert_eq!(mock.render(80, "hello"), "ok");
//! ```
//!
//! ## Crate features
//!
//! * **derive** (default) - re-export [`#[forward]`](macro@forward).
//! * **nightly** - better compile errors from [`#[forward]`](macro@forward).
//!   Requires a nightly compiler.

pub mod error;
mod expectation;
mod mock;
mod registry;
mod times;
mod value;

pub use crate::{
    error::{Error, Raised},
    expectation::{Call, Expectation},
    mock::Mock,
    registry::Registry,
    times::Times,
    value::{Dump, Fingerprint, Value, canonicalize}
};
pub use predicates::prelude::{Predicate, predicate};
pub use serde_json::json;

#[cfg(feature = "derive")]
pub use dynamock_derive::forward;

/// Support code for [`#[forward]`](macro@forward).  Not public API.
#[doc(hidden)]
pub mod __private {
    use std::any::type_name;

    use serde::{Serialize, de::DeserializeOwned};

    use crate::{Error, Mock, Value};

    pub fn argument<T: Serialize + ?Sized>(method: &str, arg: &T) -> Value {
        serde_json::to_value(arg).unwrap_or_else(|e|
            panic!("{}: argument is not representable as a Value: {}",
                method, e))
    }

    fn decode<T: DeserializeOwned>(method: &str, value: Value) -> T {
        serde_json::from_value(value).unwrap_or_else(|e|
            panic!("{}: response is not a {}: {}", method, type_name::<T>(), e))
    }

    /// Forward a method without a return value.  Whatever the expectation
    /// answers with is discarded.
    pub fn forward_unit(mock: &Mock, method: &str, args: Vec<Value>) {
        if let Err(e) = mock.invoke(method, args) {
            panic!("{}", e);
        }
    }

    pub fn forward<T>(mock: &Mock, method: &str, args: Vec<Value>) -> T
        where T: DeserializeOwned
    {
        match mock.invoke(method, args) {
            Ok(value) => decode(method, value),
            Err(e) => panic!("{}", e)
        }
    }

    /// Forward a method returning `Result<T, E>`.  A raised `E` becomes the
    /// method's `Err`.
    pub fn forward_fallible<T, E>(mock: &Mock, method: &str, args: Vec<Value>)
        -> Result<T, E>
        where T: DeserializeOwned,
              E: std::error::Error + Clone + 'static
    {
        match mock.invoke(method, args) {
            Ok(value) => Ok(decode(method, value)),
            Err(Error::Raised(raised)) => match raised.downcast_ref::<E>() {
                Some(e) => Err(e.clone()),
                None => panic!("{}: raised error is not a {}: {}",
                    method, type_name::<E>(), raised)
            },
            Err(e) => panic!("{}", e)
        }
    }
}
