// vim: tw=80
use std::{cell::RefCell, mem, rc::Rc};

use tracing::debug;

use crate::{error::Result, mock::Mock};

pub(crate) type Tracked = RefCell<Vec<Mock>>;

/// Tracks every [`Mock`] created through it, so that they can all be verified
/// or forgotten at once.
///
/// A registry belongs to a single test.  It is emptied by
/// [`reset`](Self::reset), by every [`verify_all`](Self::verify_all), and
/// whenever one of its mocks reports a failure, so nothing it tracks outlives
/// the test that failed.
///
/// # Examples
/// ```
/// # use dynamock::*;
/// let registry = Registry::new();
/// let mock1 = registry.mock("Mock 1");
/// let mock2 = registry.mock("Mock 2");
/// mock1.expects("some_call").with(args!["hello"]).returns("world");
/// mock2.expects("another_call").with(args!["hej"]).returns("med dig");
///
/// mock1.invoke("some_call", args!["hello"]).unwrap();
///
/// let err = registry.verify_all().unwrap_err();
/// assert!(err.to_string().starts_with("Mock Mock 2 expected another_call"));
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    mocks: Rc<Tracked>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new mock tracked by this registry.
    pub fn mock<S: Into<String>>(&self, name: S) -> Mock {
        let mock = Mock::with_registry(name.into(), Rc::downgrade(&self.mocks));
        self.mocks.borrow_mut().push(mock.clone());
        mock
    }

    /// Forget every tracked mock.
    pub fn reset(&self) {
        self.mocks.borrow_mut().clear();
    }

    /// Verify every tracked mock, in creation order.
    ///
    /// Stops at the first mock that fails verification and returns its
    /// error.  The registry is empty afterwards either way.
    pub fn verify_all(&self) -> Result<()> {
        let mocks = mem::take(&mut *self.mocks.borrow_mut());
        debug!(mocks = mocks.len(), "verifying all mocks");
        mocks.iter().try_for_each(Mock::verify)
    }

    /// The number of tracked mocks
    pub fn len(&self) -> usize {
        self.mocks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mocks.borrow().is_empty()
    }
}
