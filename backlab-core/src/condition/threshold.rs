//! Fixed-level entry/exit rule.

/// Enter when the applied series crosses `entry`, exit when it crosses `exit`.
///
/// Levels are arbitrary finite numbers. Equal entry and exit levels are
/// allowed and only reported as a lint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThresholdCondition {
    pub entry: f64,
    pub exit: f64,
}

impl ThresholdCondition {
    pub const DEFAULT_LEVEL: f64 = 0.0;

    /// Non-finite input keeps the previous level.
    pub fn set_entry(&mut self, level: f64) {
        if level.is_finite() {
            self.entry = level;
        }
    }

    pub fn set_exit(&mut self, level: f64) {
        if level.is_finite() {
            self.exit = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_ignored() {
        let mut t = ThresholdCondition { entry: 10.0, exit: 5.0 };
        t.set_entry(f64::NAN);
        t.set_exit(f64::INFINITY);
        assert_eq!(t, ThresholdCondition { entry: 10.0, exit: 5.0 });
    }
}
