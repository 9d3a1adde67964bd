// vim: tw=80
use std::{fmt, str::FromStr};

use crate::error::Error;

/// How many matching calls an [`Expectation`](crate::Expectation) requires.
///
/// Integers convert to [`Times::Exactly`].  The symbolic spellings `"any"`,
/// `"never"` and `"once"` are accepted by [`FromStr`]:
///
/// ```
/// # use dynamock::*;
/// assert_eq!("once".parse::<Times>().unwrap(), Times::Exactly(1));
/// assert_eq!("never".parse::<Times>().unwrap(), Times::Exactly(0));
/// assert_eq!("any".parse::<Times>().unwrap(), Times::Any);
/// assert_eq!("3".parse::<Times>().unwrap(), Times::from(3));
/// assert!("sometimes".parse::<Times>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Times {
    /// Exactly this many calls; one more is an error.
    Exactly(usize),
    /// Any number of calls, including none.
    Any,
}

impl Times {
    pub const fn never() -> Self {
        Times::Exactly(0)
    }

    pub const fn once() -> Self {
        Times::Exactly(1)
    }

    /// Is it required that this expectation be called an exact number of
    /// times?
    pub fn is_exact(&self) -> bool {
        matches!(self, Times::Exactly(_))
    }

    /// Would `calls` matching calls satisfy this policy?
    pub fn is_satisfied_by(&self, calls: usize) -> bool {
        match self {
            Times::Exactly(n) => calls == *n,
            Times::Any => true
        }
    }

    /// The largest number of calls this policy allows, if there is one.
    pub fn limit(&self) -> Option<usize> {
        match self {
            Times::Exactly(n) => Some(*n),
            Times::Any => None
        }
    }
}

impl Default for Times {
    fn default() -> Self {
        Times::once()
    }
}

impl From<usize> for Times {
    fn from(n: usize) -> Self {
        Times::Exactly(n)
    }
}

impl FromStr for Times {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "any" => Ok(Times::Any),
            "never" => Ok(Times::never()),
            "once" => Ok(Times::once()),
            other => other.parse::<usize>()
                .map(Times::Exactly)
                .map_err(|_| Error::InvalidExpectationSpec(s.to_owned()))
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Times::Exactly(n) => write!(f, "exactly {}", n),
            Times::Any => f.write_str("any number of times")
        }
    }
}
