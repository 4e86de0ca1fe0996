//! # models::quote
//!
//! Defines [`Quote`], the ephemeral price pair fetched for a ticker every
//! cycle.  Never persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price.
    pub last: Option<f64>,
    /// Today's opening price.
    pub open: Option<f64>,
}

impl Quote {
    #[cfg(test)]
    pub fn new(last: f64, open: f64) -> Self {
        Self { last: Some(last), open: Some(open) }
    }

    /// The last price if it can be used for evaluation.
    ///
    /// A missing, non-finite or zero price counts as "no data this cycle".
    #[inline]
    pub fn usable_last(&self) -> Option<f64> {
        self.last.filter(|p| p.is_finite() && *p != 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_last() {
        assert_eq!(Quote::new(101.5, 100.0).usable_last(), Some(101.5));
        assert_eq!(Quote { last: None, open: Some(100.0) }.usable_last(), None);
        assert_eq!(Quote { last: Some(0.0), open: None }.usable_last(), None);
        assert_eq!(Quote { last: Some(f64::NAN), open: None }.usable_last(), None);
    }
}
