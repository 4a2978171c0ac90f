//! Evidence-to-status reduction.
//!
//! Evidence for a profile or requirement is split into positive, negative
//! and not-supported buckets. The conformance status follows a fixed
//! priority: any negative evidence makes the scope NOT_CONFORMANT no matter
//! how much positive evidence exists.

use conformance_report::{ConformanceStatus, Evidence, TestEvidenceType};

/// Evidence classified by how it bears on conformance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceBuckets {
    pub positive: Vec<Evidence>,
    pub negative: Vec<Evidence>,
    pub not_supported: Vec<Evidence>,
}

impl EvidenceBuckets {
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty() && self.not_supported.is_empty()
    }

    /// Derive the status, then fold not-supported evidence into the positive
    /// list for reporting. Returns (status, positive, negative).
    pub fn into_reported(self) -> (ConformanceStatus, Vec<Evidence>, Vec<Evidence>) {
        let status = status_from_evidence(&self);
        let EvidenceBuckets {
            mut positive,
            negative,
            not_supported,
        } = self;
        positive.extend(not_supported);
        (status, positive, negative)
    }
}

/// Split evidence into buckets. NO_DATA_AVAILABLE evidence is ignored.
pub fn process_evidence<'a, I>(evidence: I) -> EvidenceBuckets
where
    I: IntoIterator<Item = &'a Evidence>,
{
    let mut buckets = EvidenceBuckets::default();
    for item in evidence {
        match item.test_evidence_type {
            TestEvidenceType::SuccessfulAssertion | TestEvidenceType::DiscoveredProperty => {
                buckets.positive.push(item.clone())
            }
            TestEvidenceType::UnsuccessfulAssertion | TestEvidenceType::UnexpectedException => {
                buckets.negative.push(item.clone())
            }
            TestEvidenceType::NotSupportedFunction => buckets.not_supported.push(item.clone()),
            TestEvidenceType::NoDataAvailable => {}
        }
    }
    buckets
}

/// Apply the fixed-priority status rule to classified evidence.
pub fn status_from_evidence(buckets: &EvidenceBuckets) -> ConformanceStatus {
    if buckets.is_empty() {
        ConformanceStatus::Unknown
    } else if !buckets.negative.is_empty() {
        ConformanceStatus::NotConformant
    } else if !buckets.positive.is_empty() {
        if buckets.not_supported.is_empty() {
            ConformanceStatus::ConformantFullSupport
        } else {
            ConformanceStatus::ConformantPartialSupport
        }
    } else {
        ConformanceStatus::ConformantNoSupport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(ty: TestEvidenceType) -> Evidence {
        Evidence::new(ty, 5, 2, "tc", "Test case", "url", "A1")
    }

    fn status_of(types: &[TestEvidenceType]) -> ConformanceStatus {
        let items: Vec<Evidence> = types.iter().map(|t| evidence(*t)).collect();
        status_from_evidence(&process_evidence(&items))
    }

    use TestEvidenceType::*;

    #[test]
    fn test_empty_is_unknown() {
        assert_eq!(status_of(&[]), ConformanceStatus::Unknown);
        assert_eq!(status_of(&[NoDataAvailable, NoDataAvailable]), ConformanceStatus::Unknown);
    }

    #[test]
    fn test_negative_dominates() {
        let mut types = vec![SuccessfulAssertion; 50];
        types.push(DiscoveredProperty);
        types.push(NotSupportedFunction);
        types.push(UnsuccessfulAssertion);
        assert_eq!(status_of(&types), ConformanceStatus::NotConformant);

        assert_eq!(
            status_of(&[SuccessfulAssertion, UnexpectedException]),
            ConformanceStatus::NotConformant
        );
        assert_eq!(status_of(&[UnexpectedException]), ConformanceStatus::NotConformant);
    }

    #[test]
    fn test_only_not_supported() {
        assert_eq!(
            status_of(&[NotSupportedFunction, NotSupportedFunction]),
            ConformanceStatus::ConformantNoSupport
        );
    }

    #[test]
    fn test_positive_and_not_supported_is_partial() {
        assert_eq!(
            status_of(&[SuccessfulAssertion, NotSupportedFunction]),
            ConformanceStatus::ConformantPartialSupport
        );
        assert_eq!(
            status_of(&[DiscoveredProperty, NotSupportedFunction]),
            ConformanceStatus::ConformantPartialSupport
        );
    }

    #[test]
    fn test_only_positive_is_full() {
        assert_eq!(
            status_of(&[SuccessfulAssertion, DiscoveredProperty]),
            ConformanceStatus::ConformantFullSupport
        );
    }

    #[test]
    fn test_every_combination_follows_priority() {
        // Exhaustive over presence/absence of each bucket
        for mask in 0u8..8 {
            let mut types = Vec::new();
            if mask & 1 != 0 {
                types.push(SuccessfulAssertion);
            }
            if mask & 2 != 0 {
                types.push(UnsuccessfulAssertion);
            }
            if mask & 4 != 0 {
                types.push(NotSupportedFunction);
            }
            let expected = match (mask & 1 != 0, mask & 2 != 0, mask & 4 != 0) {
                (false, false, false) => ConformanceStatus::Unknown,
                (_, true, _) => ConformanceStatus::NotConformant,
                (true, false, true) => ConformanceStatus::ConformantPartialSupport,
                (true, false, false) => ConformanceStatus::ConformantFullSupport,
                (false, false, true) => ConformanceStatus::ConformantNoSupport,
            };
            assert_eq!(status_of(&types), expected, "mask {:03b}", mask);
        }
    }

    #[test]
    fn test_not_supported_folded_into_positive() {
        let items = vec![
            evidence(SuccessfulAssertion),
            evidence(NotSupportedFunction),
            evidence(NoDataAvailable),
        ];
        let (status, positive, negative) = process_evidence(&items).into_reported();

        assert_eq!(status, ConformanceStatus::ConformantPartialSupport);
        assert_eq!(positive.len(), 2);
        assert!(negative.is_empty());
        assert_eq!(positive[1].test_evidence_type, NotSupportedFunction);
    }
}
