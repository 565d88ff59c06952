use crate::errors::PeakRepError;

///
/// Replicate struct, pairs an experiment sample with its background/control
/// sample. The ordinal addresses the replicate's p-value and q-value slots.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Replicate {
    pub name: String,
    pub ordinal: usize,
    pub experiment: usize,
    pub control: usize,
}

impl Replicate {
    pub fn new(name: impl Into<String>, ordinal: usize, experiment: usize, control: usize) -> Self {
        Replicate {
            name: name.into(),
            ordinal,
            experiment,
            control,
        }
    }
}

///
/// The full replicate configuration of a run, stored in ordinal order.
///
#[derive(Debug, Clone)]
pub struct ReplicateSet {
    replicates: Vec<Replicate>,
}

impl ReplicateSet {
    ///
    /// Validate and build a [ReplicateSet].
    ///
    /// # Arguments
    /// - replicates: replicates in any order; ordinals must be exactly `0..len`
    /// - n_samples: number of samples carried by every window
    pub fn new(mut replicates: Vec<Replicate>, n_samples: usize) -> Result<Self, PeakRepError> {
        if replicates.is_empty() {
            return Err(PeakRepError::NoReplicates);
        }
        if n_samples == 0 {
            return Err(PeakRepError::NoSamples);
        }

        for replicate in &replicates {
            for sample in [replicate.experiment, replicate.control] {
                if sample >= n_samples {
                    return Err(PeakRepError::SampleOutOfRange { sample, n_samples });
                }
            }
        }

        replicates.sort_by_key(|r| r.ordinal);
        for (expected, replicate) in replicates.iter().enumerate() {
            if replicate.ordinal != expected {
                return Err(PeakRepError::InvalidReplicateOrdinal(expected));
            }
        }

        Ok(ReplicateSet { replicates })
    }

    pub fn len(&self) -> usize {
        self.replicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicates.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Replicate> {
        self.replicates.get(ordinal)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Replicate> {
        self.replicates.iter()
    }

    pub fn as_slice(&self) -> &[Replicate] {
        &self.replicates
    }

    /// Distinct control samples referenced by any replicate, ascending.
    pub fn control_samples(&self) -> Vec<usize> {
        let mut controls: Vec<usize> = self.replicates.iter().map(|r| r.control).collect();
        controls.sort_unstable();
        controls.dedup();
        controls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_replicates_sorted_by_ordinal() {
        let set = ReplicateSet::new(
            vec![Replicate::new("rep2", 1, 2, 3), Replicate::new("rep1", 0, 0, 1)],
            4,
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().name, "rep1");
        assert_eq!(set.control_samples(), vec![1, 3]);
    }

    #[rstest]
    #[case(vec![], 2)]
    #[case(vec![Replicate::new("a", 0, 0, 1)], 0)]
    #[case(vec![Replicate::new("a", 0, 0, 5)], 2)]
    #[case(vec![Replicate::new("a", 1, 0, 1)], 2)]
    #[case(vec![Replicate::new("a", 0, 0, 1), Replicate::new("b", 0, 0, 1)], 2)]
    fn test_invalid_replicates(#[case] replicates: Vec<Replicate>, #[case] n_samples: usize) {
        assert!(ReplicateSet::new(replicates, n_samples).is_err());
    }
}
