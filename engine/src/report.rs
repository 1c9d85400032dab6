//! The violation list accumulated during one validation run.

use crate::error::Error;

/// Ordered content violations found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationList {
    /// Human-readable violations, in discovery order.
    pub violations: Vec<String>,
}

impl ViolationList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a violation.
    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    /// Appends every violation from another list or iterator.
    pub fn extend<I>(&mut self, other: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.violations.extend(other);
    }

    /// Returns the number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if no violation was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Converts the list into the aggregated failure for `doc_type`, or
    /// `Ok(())` when it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] carrying every violation when the list is
    /// non-empty.
    pub fn into_result(self, doc_type: &str) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid {
                doc_type: doc_type.to_owned(),
                violations: self.violations,
            })
        }
    }
}

impl IntoIterator for ViolationList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}
