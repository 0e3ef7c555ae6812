//! Shared run statistics
//!
//! All failure and rejection counting for a run goes through one tally
//! behind one mutex. Workers update it as they go; the coordinator reads it
//! to decide whether the run is still trustworthy. Keeping a single
//! synchronization point is what makes the abort-threshold contract
//! auditable.

use crate::CoverageError;
use std::sync::{Arc, Mutex};

/// Counters accumulated over one pipeline run.
#[derive(Debug, Default, Clone)]
pub struct RunTally {
    pub listing_pages_attempted: u64,
    pub listing_pages_failed: u64,

    /// Listing pages that fetched fine but contained no records.
    pub zero_yield_pages: u64,

    pub detail_pages_attempted: u64,
    pub detail_pages_failed: u64,

    pub records_extracted: u64,
    pub parse_errors: u64,

    pub records_validated: u64,
    pub records_rejected: u64,

    /// Distinct incoming records that collapsed onto the same identifier.
    pub id_collisions: u64,
}

impl RunTally {
    /// Fraction of attempted pages (listing + detail) that were fetched.
    /// Vacuously 1.0 before anything was attempted.
    pub fn page_coverage(&self) -> f64 {
        let attempted = self.listing_pages_attempted + self.detail_pages_attempted;
        if attempted == 0 {
            return 1.0;
        }
        let failed = self.listing_pages_failed + self.detail_pages_failed;
        (attempted - failed) as f64 / attempted as f64
    }

    /// Fraction of extracted records that survived validation. Vacuously
    /// 1.0 when nothing was extracted.
    pub fn record_coverage(&self) -> f64 {
        if self.records_extracted == 0 {
            return 1.0;
        }
        self.records_validated as f64 / self.records_extracted as f64
    }

    /// Whether every page and record made it through.
    pub fn is_complete(&self) -> bool {
        self.listing_pages_failed == 0
            && self.detail_pages_failed == 0
            && self.parse_errors == 0
            && self.records_rejected == 0
    }

    /// Fails when more than `max_ratio` of listing pages were lost.
    pub fn check_listing_coverage(&self, max_ratio: f64) -> Result<(), CoverageError> {
        if self.listing_pages_attempted == 0 {
            return Ok(());
        }
        let ratio = self.listing_pages_failed as f64 / self.listing_pages_attempted as f64;
        if ratio > max_ratio {
            return Err(CoverageError::Pages {
                failed: self.listing_pages_failed,
                attempted: self.listing_pages_attempted,
                max_ratio,
            });
        }
        Ok(())
    }

    /// Fails when more than `max_ratio` of normalized records were rejected.
    pub fn check_rejections(&self, max_ratio: f64) -> Result<(), CoverageError> {
        let processed = self.records_validated + self.records_rejected;
        if processed == 0 {
            return Ok(());
        }
        let ratio = self.records_rejected as f64 / processed as f64;
        if ratio > max_ratio {
            return Err(CoverageError::Rejections {
                rejected: self.records_rejected,
                processed,
                max_ratio,
            });
        }
        Ok(())
    }
}

/// The tally as shared across worker tasks.
pub type SharedTally = Arc<Mutex<RunTally>>;

/// Creates a fresh shared tally.
pub fn shared() -> SharedTally {
    Arc::new(Mutex::new(RunTally::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_coverage() {
        let tally = RunTally {
            listing_pages_attempted: 4,
            listing_pages_failed: 1,
            detail_pages_attempted: 6,
            detail_pages_failed: 1,
            ..RunTally::default()
        };
        assert!((tally.page_coverage() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_page_coverage_is_vacuously_complete() {
        assert_eq!(RunTally::default().page_coverage(), 1.0);
        assert_eq!(RunTally::default().record_coverage(), 1.0);
    }

    #[test]
    fn test_listing_coverage_under_threshold_passes() {
        let tally = RunTally {
            listing_pages_attempted: 10,
            listing_pages_failed: 4,
            ..RunTally::default()
        };
        assert!(tally.check_listing_coverage(0.5).is_ok());
    }

    #[test]
    fn test_listing_coverage_over_threshold_fails() {
        let tally = RunTally {
            listing_pages_attempted: 5,
            listing_pages_failed: 3,
            ..RunTally::default()
        };
        let err = tally.check_listing_coverage(0.5).unwrap_err();
        assert!(matches!(
            err,
            CoverageError::Pages {
                failed: 3,
                attempted: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_exactly_at_threshold_passes() {
        // "More than a configured fraction" aborts; exactly at it does not.
        let tally = RunTally {
            listing_pages_attempted: 10,
            listing_pages_failed: 5,
            ..RunTally::default()
        };
        assert!(tally.check_listing_coverage(0.5).is_ok());
    }

    #[test]
    fn test_rejection_threshold() {
        let tally = RunTally {
            records_validated: 6,
            records_rejected: 4,
            ..RunTally::default()
        };
        assert!(tally.check_rejections(0.5).is_ok());
        assert!(tally.check_rejections(0.25).is_err());
    }

    #[test]
    fn test_is_complete() {
        let mut tally = RunTally {
            listing_pages_attempted: 3,
            records_extracted: 10,
            records_validated: 10,
            ..RunTally::default()
        };
        assert!(tally.is_complete());

        tally.records_rejected = 1;
        assert!(!tally.is_complete());
    }
}
