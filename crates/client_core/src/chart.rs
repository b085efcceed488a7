use shared::domain::{DrCategory, CATEGORY_COUNT};
use thiserror::Error;

/// One bar of the probability chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub category: DrCategory,
    pub label: &'static str,
    pub value: f32,
}

/// Render-ready series derived from a prediction's probability vector,
/// always in the fixed category order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub bars: Vec<ChartBar>,
}

#[derive(Debug, Error)]
#[error("expected {CATEGORY_COUNT} probabilities, got {actual}")]
pub struct InvalidProbabilityVector {
    pub actual: usize,
}

impl ChartSeries {
    /// Associates each magnitude with its category by position. The service
    /// reports percentages, but magnitudes are used as received so a
    /// fraction-scale vector renders the same shape.
    pub fn from_probabilities(
        probabilities: &[f32],
    ) -> Result<ChartSeries, InvalidProbabilityVector> {
        if probabilities.len() != CATEGORY_COUNT {
            return Err(InvalidProbabilityVector {
                actual: probabilities.len(),
            });
        }

        let bars = DrCategory::ALL
            .iter()
            .zip(probabilities)
            .map(|(&category, &value)| ChartBar {
                category,
                label: category.label(),
                value,
            })
            .collect();
        Ok(ChartSeries { bars })
    }

    /// Largest magnitude in the series; front ends scale bar geometry
    /// against it.
    pub fn max_value(&self) -> f32 {
        self.bars.iter().map(|bar| bar.value).fold(0.0, f32::max)
    }
}
