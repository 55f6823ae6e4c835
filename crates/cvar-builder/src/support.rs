//! Support regions for single-location variation tuples.

/// The (start, peak, end) contribution bounds of one variation tuple,
/// one triple per axis in axis order.
///
/// A zero peak means the axis is at its default position and places no
/// bound on the tuple; a nonzero peak bounds the tuple on the zero side
/// of the axis only, so a single-location tuple peaks exactly at its
/// recorded coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Support {
    axes: Vec<(f32, f32, f32)>,
}

impl Support {
    /// Build the support for a single-location tuple from its per-axis
    /// peak coordinates.
    pub fn from_peaks(peaks: &[f32]) -> Self {
        let axes = peaks
            .iter()
            .map(|&peak| {
                if peak == 0.0 {
                    (0.0, 0.0, 0.0)
                } else if peak > 0.0 {
                    (0.0, peak, peak)
                } else {
                    (peak, peak, 0.0)
                }
            })
            .collect();
        Self { axes }
    }

    pub fn axes(&self) -> &[(f32, f32, f32)] {
        &self.axes
    }

    pub fn peaks(&self) -> impl Iterator<Item = f32> + '_ {
        self.axes.iter().map(|&(_, peak, _)| peak)
    }

    /// A tuple whose start and end equal the bounds implied by its peak
    /// needs no intermediate region when serialized.
    pub fn is_implied_by_peaks(&self) -> bool {
        self.axes.iter().all(|&(start, peak, end)| {
            (start, end) == (peak.min(0.0), peak.max(0.0)) || (start, peak, end) == (0.0, 0.0, 0.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_peak_contributes_no_bound() {
        let support = Support::from_peaks(&[0.5, 0.0]);
        assert_eq!(support.axes(), &[(0.0, 0.5, 0.5), (0.0, 0.0, 0.0)]);
    }

    #[test]
    fn negative_peak_bounds_toward_default() {
        let support = Support::from_peaks(&[-0.75]);
        assert_eq!(support.axes(), &[(-0.75, -0.75, 0.0)]);
    }

    #[test]
    fn single_location_supports_are_implied() {
        assert!(Support::from_peaks(&[1.0, 0.0, -0.5]).is_implied_by_peaks());
    }
}
