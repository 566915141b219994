// crates/patcc-decompose/src/workload.rs

//! Workload model (spec §4.4 "Workload model"): deactivate processing
//! units that would fall below the minimum chunk size, redistributing
//! their share across the remaining active units.

use patcc_core::PatccError;

/// An active processing unit: its original index in the input workload
/// vector and its (possibly redistributed) workload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveUnit {
    pub id: u32,
    pub workload: f64,
}

/// Deactivate the smallest unit below `min_points_per_chunk`, spreading its
/// workload proportionally over the rest, until every remaining unit meets
/// the floor or only one unit remains (the degenerate single-unit path is
/// always allowed regardless of the floor).
///
/// # Errors
/// Returns [`PatccError::InputInvalid`] for an empty, non-finite, or
/// negative workload vector, and [`PatccError::WorkloadInfeasible`] if the
/// total workload is zero.
pub fn activate_units(
    workloads: &[f64],
    min_points_per_chunk: u32,
) -> Result<Vec<ActiveUnit>, PatccError> {
    if workloads.is_empty() {
        return Err(PatccError::input_invalid(
            "workload vector must list at least one processing unit",
        ));
    }
    if workloads.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(PatccError::input_invalid(
            "workloads must be finite and non-negative",
        ));
    }
    let total: f64 = workloads.iter().sum();
    if total <= 0.0 {
        return Err(PatccError::WorkloadInfeasible(
            "total workload is zero".into(),
        ));
    }

    let mut units: Vec<ActiveUnit> = workloads
        .iter()
        .enumerate()
        .map(|(i, &workload)| ActiveUnit {
            id: i as u32,
            workload,
        })
        .collect();

    let floor = f64::from(min_points_per_chunk);
    while units.len() > 1 {
        let Some((idx, smallest)) = units
            .iter()
            .enumerate()
            .min_by(|a, b| {
                a.1.workload
                    .partial_cmp(&b.1.workload)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, u)| (i, u.workload))
        else {
            break;
        };
        if smallest >= floor {
            break;
        }
        let removed = units.remove(idx);
        let remaining_total: f64 = units.iter().map(|u| u.workload).sum();
        if remaining_total <= 0.0 {
            units.push(removed);
            break;
        }
        for u in &mut units {
            u.workload += removed.workload * (u.workload / remaining_total);
        }
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_workload_vector() {
        assert!(activate_units(&[], 100).is_err());
    }

    #[test]
    fn rejects_zero_total_workload() {
        let err = activate_units(&[0.0, 0.0], 10).unwrap_err();
        assert!(matches!(err, PatccError::WorkloadInfeasible(_)));
    }

    #[test]
    fn deactivates_smallest_unit_below_floor() {
        let units = activate_units(&[50.0, 30.0, 5.0], 20).unwrap();
        assert_eq!(units.len(), 2);
        let total: f64 = units.iter().map(|u| u.workload).sum();
        assert!((total - 85.0).abs() < 1e-9);
        assert!(units.iter().all(|u| u.workload >= 20.0));
    }

    #[test]
    fn single_unit_survives_below_floor() {
        let units = activate_units(&[5.0], 100).unwrap();
        assert_eq!(units.len(), 1);
        assert!((units[0].workload - 5.0).abs() < 1e-9);
    }

    #[test]
    fn units_at_or_above_floor_are_untouched() {
        let units = activate_units(&[40.0, 60.0], 20).unwrap();
        assert_eq!(units.len(), 2);
        assert!((units[0].workload - 40.0).abs() < 1e-9);
        assert!((units[1].workload - 60.0).abs() < 1e-9);
    }

    proptest::proptest! {
        #[test]
        fn total_workload_is_conserved_across_deactivation(
            weights in proptest::collection::vec(0.01f64..100.0, 1..8),
            floor in 0u32..50,
        ) {
            let total_in: f64 = weights.iter().sum();
            let units = activate_units(&weights, floor).unwrap();
            let total_out: f64 = units.iter().map(|u| u.workload).sum();
            proptest::prop_assert!((total_in - total_out).abs() < 1e-6 * total_in.max(1.0));
            proptest::prop_assert!(!units.is_empty());
        }
    }
}
