use tracing::trace;

use super::model::{AnalyzerSample, TrendState};

/// Analyzer trend code for a relaxing reading.
pub const RELAXING_CODE: i32 = 1;
/// Analyzer trend code for a stressing reading.
pub const STRESSING_CODE: i32 = 2;

/// Analyzer codes that map to a directional trend.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TrendCodes {
    pub relaxing: i32,
    pub stressing: i32,
}

impl Default for TrendCodes {
    fn default() -> Self {
        Self {
            relaxing: RELAXING_CODE,
            stressing: STRESSING_CODE,
        }
    }
}

/// Classifies analyzer samples into [`TrendState`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamInterpreter {
    codes: TrendCodes,
}

impl StreamInterpreter {
    #[must_use]
    pub fn new(codes: TrendCodes) -> Self {
        Self { codes }
    }

    /// Classifies one sample. Activity takes precedence over the trend code.
    ///
    /// ```
    /// use pipstream::{AnalyzerSample, StreamInterpreter, TrendState};
    ///
    /// let interpreter = StreamInterpreter::default();
    /// assert_eq!(TrendState::Relaxing, interpreter.classify(AnalyzerSample::active(1)));
    /// assert_eq!(TrendState::Inactive, interpreter.classify(AnalyzerSample::inactive(1)));
    /// ```
    #[must_use]
    pub fn classify(&self, sample: AnalyzerSample) -> TrendState {
        let state = if !sample.active {
            TrendState::Inactive
        } else if sample.trend_value == self.codes.relaxing {
            TrendState::Relaxing
        } else if sample.trend_value == self.codes.stressing {
            TrendState::Stressing
        } else {
            TrendState::Steady
        };
        trace!(
            trend_value = sample.trend_value,
            active = sample.active,
            %state,
            "classified sample"
        );
        state
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RELAXING_CODE)]
    #[case(STRESSING_CODE)]
    #[case(0)]
    #[case(-1)]
    #[case(i32::MAX)]
    fn inactive_samples_are_inactive_for_every_code(#[case] trend_value: i32) {
        let interpreter = StreamInterpreter::default();
        assert_eq!(
            TrendState::Inactive,
            interpreter.classify(AnalyzerSample::inactive(trend_value))
        );
    }

    #[rstest]
    #[case(RELAXING_CODE, TrendState::Relaxing)]
    #[case(STRESSING_CODE, TrendState::Stressing)]
    #[case(0, TrendState::Steady)]
    #[case(3, TrendState::Steady)]
    #[case(-2, TrendState::Steady)]
    fn active_samples_follow_trend_code(#[case] trend_value: i32, #[case] expected: TrendState) {
        let interpreter = StreamInterpreter::default();
        assert_eq!(
            expected,
            interpreter.classify(AnalyzerSample::active(trend_value))
        );
    }

    #[test]
    fn custom_codes_are_respected() {
        let interpreter = StreamInterpreter::new(TrendCodes {
            relaxing: -1,
            stressing: 1,
        });

        assert_eq!(
            TrendState::Relaxing,
            interpreter.classify(AnalyzerSample::active(-1))
        );
        assert_eq!(
            TrendState::Stressing,
            interpreter.classify(AnalyzerSample::active(1))
        );
        assert_eq!(
            TrendState::Steady,
            interpreter.classify(AnalyzerSample::active(RELAXING_CODE + 1))
        );
    }
}
