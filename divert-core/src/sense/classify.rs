//! Ratio-based color classification

use crate::traits::{Color, ColorClassifier, Rgbc};

/// Classifies by channel dominance ratios
///
/// - RED if R >= 1.5 G and R >= 1.5 B
/// - GREEN if G >= 1.33 R and G >= 1.2 B
/// - BLUE if B >= 1.33 R and B >= 1.2 G
/// - OTHER otherwise
///
/// Ratios are compared as scaled integers. The clear channel is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatioClassifier;

impl ColorClassifier for RatioClassifier {
    fn classify(&self, rgbc: Rgbc) -> Color {
        let r = u32::from(rgbc.r);
        let g = u32::from(rgbc.g);
        let b = u32::from(rgbc.b);

        if 2 * r >= 3 * g && 2 * r >= 3 * b {
            Color::Red
        } else if 100 * g >= 133 * r && 5 * g >= 6 * b {
            Color::Green
        } else if 100 * b >= 133 * r && 5 * b >= 6 * g {
            Color::Blue
        } else {
            Color::Other
        }
    }
}
