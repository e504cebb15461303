use sprout_core::MoistureCategory;

/// Moisture strictly below this is Dry.
pub const DRY_BELOW: f64 = 35.0;
/// Moisture strictly above this is Wet.
pub const WET_ABOVE: f64 = 65.0;

/// Map a soil-moisture percentage onto its category.
///
/// Total over `f64`: the boundaries 35 and 65 are Optimal, and so is NaN since
/// it compares false against both thresholds.
pub fn classify(moisture: f64) -> MoistureCategory {
    if moisture < DRY_BELOW {
        MoistureCategory::Dry
    } else if moisture > WET_ABOVE {
        MoistureCategory::Wet
    } else {
        MoistureCategory::Optimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_optimal() {
        assert_eq!(classify(35.0), MoistureCategory::Optimal);
        assert_eq!(classify(65.0), MoistureCategory::Optimal);
    }

    #[test]
    fn ranges() {
        for tenth in 0..=1000 {
            let m = tenth as f64 / 10.0;
            let expected = if m < 35.0 {
                MoistureCategory::Dry
            } else if m <= 65.0 {
                MoistureCategory::Optimal
            } else {
                MoistureCategory::Wet
            };
            assert_eq!(classify(m), expected, "moisture {m}");
        }
    }

    #[test]
    fn just_outside_boundaries() {
        assert_eq!(classify(34.9), MoistureCategory::Dry);
        assert_eq!(classify(65.1), MoistureCategory::Wet);
    }
}
