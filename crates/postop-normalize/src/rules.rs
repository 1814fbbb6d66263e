//! Discretization rules.
//!
//! Boundary values belong to the normal bucket: the ordinal range is inclusive
//! at both ends and the abnormal flag only fires strictly outside its
//! threshold.

use postop_model::{AsaClass, AsaGrouping, FunctionalStatus, YesNo};

/// Normal bucket code.
pub const NORMAL: i64 = 1;
/// Below-range bucket code.
pub const LOW: i64 = 2;
/// Above-range bucket code.
pub const HIGH: i64 = 3;

/// 1 when `low <= value <= high`, 2 when below, 3 when above.
pub fn ordinal_range(value: f64, low: f64, high: f64) -> i64 {
    if value < low {
        LOW
    } else if value > high {
        HIGH
    } else {
        NORMAL
    }
}

/// 1 when `value` is strictly below `below` or strictly above `above`.
pub fn abnormal_flag(value: f64, below: Option<f64>, above: Option<f64>) -> i64 {
    let too_low = below.is_some_and(|threshold| value < threshold);
    let too_high = above.is_some_and(|threshold| value > threshold);
    i64::from(too_low || too_high)
}

pub fn asa_code(class: AsaClass, grouping: AsaGrouping) -> i64 {
    match grouping {
        AsaGrouping::Ordinal => {
            if class.is_severe() {
                2
            } else {
                1
            }
        }
        AsaGrouping::Binary => i64::from(class.is_severe()),
    }
}

pub fn functional_status_code(status: FunctionalStatus) -> i64 {
    match status {
        FunctionalStatus::Independent => 0,
        FunctionalStatus::Dependent => 1,
    }
}

pub fn yes_no_code(answer: YesNo) -> i64 {
    i64::from(answer.is_yes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_range_boundaries_are_normal() {
        assert_eq!(ordinal_range(3.5, 3.5, 5.49), NORMAL);
        assert_eq!(ordinal_range(5.49, 3.5, 5.49), NORMAL);
        assert_eq!(ordinal_range(3.49, 3.5, 5.49), LOW);
        assert_eq!(ordinal_range(5.5, 3.5, 5.49), HIGH);
    }

    #[test]
    fn abnormal_flag_is_strict() {
        assert_eq!(abnormal_flag(3.5, Some(3.5), None), 0);
        assert_eq!(abnormal_flag(3.2, Some(3.5), None), 1);
        assert_eq!(abnormal_flag(20.0, None, Some(20.0)), 0);
        assert_eq!(abnormal_flag(20.1, None, Some(20.0)), 1);
        assert_eq!(abnormal_flag(2.0, None, Some(20.0)), 0);
    }

    #[test]
    fn asa_groupings() {
        assert_eq!(asa_code(AsaClass::II, AsaGrouping::Ordinal), 1);
        assert_eq!(asa_code(AsaClass::III, AsaGrouping::Ordinal), 2);
        assert_eq!(asa_code(AsaClass::I, AsaGrouping::Binary), 0);
        assert_eq!(asa_code(AsaClass::V, AsaGrouping::Binary), 1);
    }
}
