// vim: tw=80
//! Declaring expectations: counts, responses, and raised errors

use std::{fmt, sync::Arc};

use dynamock::*;
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Oops(&'static str);

impl fmt::Display for Oops {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for Oops {}

#[test]
fn raises() {
    let mock = Mock::new("Thingy");
    mock.expects("some_call").with(args!["23"]).raises(Oops("This is an error!"));

    let err = mock.invoke("some_call", args!["23"]).unwrap_err();
    assert!(!err.is_engine_failure());
    assert_eq!(err.to_string(), "This is an error!");
    let oops = err.raised().unwrap().downcast_ref::<Oops>().unwrap();
    assert_eq!(oops.0, "This is an error!");
}

/// Every call sees the very same error object
#[test]
fn raised_error_is_shared() {
    let mock = Mock::new("Thingy");
    mock.expects("some_call").times(2).raises(Oops("again"));

    let Err(Error::Raised(first)) = mock.invoke("some_call", args![]) else {
        panic!("Expected a raised error");
    };
    let Err(Error::Raised(second)) = mock.invoke("some_call", args![]) else {
        panic!("Expected a raised error");
    };
    assert!(Arc::ptr_eq(&first, &second));
    mock.verify().unwrap();
}

#[test]
fn raises_counts_toward_times() {
    let mock = Mock::new("Thingy");
    mock.expects("some_call").raises(Oops("once"));

    assert!(mock.invoke("some_call", args![]).is_err());
    let err = mock.invoke("some_call", args![]).unwrap_err();
    assert!(matches!(err, Error::OverCalled{calls: 2, allowed: 1, ..}));
}

#[test]
fn no_raise_for_other_arguments() {
    let mock = Mock::new("Thingy");
    mock.expects("some_call").with(args![1]).raises(Oops("one"));
    mock.expects("some_call").with(args![2]).returns("two");

    assert_eq!(mock.invoke("some_call", args![2]).unwrap(), "two");
    assert!(mock.invoke("some_call", args![1]).unwrap_err().raised().is_some());
}

#[test]
fn times_from_integer() {
    let mock = Mock::new("Thingy");
    let e = mock.expects("f").times(3);
    for _ in 0..3 {
        mock.invoke("f", args![]).unwrap();
    }
    assert!(e.is_satisfied());
    assert!(mock.invoke("f", args![]).is_err());
    assert_eq!(e.calls(), 3);
}

#[test]
fn times_parsed() {
    for (s, t) in [("any", Times::Any),
                   ("never", Times::Exactly(0)),
                   ("once", Times::Exactly(1)),
                   ("12", Times::Exactly(12))]
    {
        assert_eq!(s.parse::<Times>().unwrap(), t);
    }
}

#[test]
fn times_invalid() {
    let err = "twice".parse::<Times>().unwrap_err();
    assert!(matches!(err, Error::InvalidExpectationSpec(ref s) if s == "twice"));
    assert_eq!(err.to_string(), "times doesn't take the parameter twice");
}

#[test]
fn once_is_default() {
    let mock = Mock::new("Thingy");
    let e = mock.expects("f");
    assert!(!e.is_satisfied());
    mock.invoke("f", args![]).unwrap();
    assert!(e.is_satisfied());

    let e = mock.expects("g").times(5).once();
    mock.invoke("g", args![]).unwrap();
    assert!(e.is_satisfied());
}

/// The last call to `times` wins
#[test]
fn times_overrides() {
    let mock = Mock::new("Thingy");
    let e = mock.expects("f").never().times_any();
    assert!(e.is_satisfied());
    mock.invoke("f", args![]).unwrap();
    mock.verify().unwrap();
}

#[test]
fn with_replaces_predicate() {
    let mock = Mock::new("Thingy");
    let e = mock.expects("f").withf(|_| false).with(args![1]);
    assert_eq!(e.arguments(), Some(args![1]));
    mock.invoke("f", args![1]).unwrap();
}

#[test]
fn accessors() {
    let mock = Mock::new("Thingy");
    let e = mock.expects("f");
    assert_eq!(e.method(), "f");
    assert_eq!(e.arguments(), None);
    assert_eq!(e.calls(), 0);
    assert_eq!(mock.len(), 1);
    assert_eq!(mock.name(), "Thingy");
}

#[test]
fn returns_structured_value() {
    let mock = Mock::new("Thingy");
    mock.expects("f").returns(json!({"id": 7, "tags": ["a", "b"]}));

    let value = mock.invoke("f", args![]).unwrap();
    assert_eq!(value["id"], 7);
    assert_eq!(value["tags"][1], "b");
}
