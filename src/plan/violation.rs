//! Capacity bound checks over the projected levels.

use super::timeline::Timeline;
use super::types::Violation;

/// Shortfalls at or below this size are float noise, not violations.
pub const LEVEL_TOLERANCE_KWH: f64 = 0.001;

/// Whether an energy shortfall still left after charging is float noise.
pub fn is_covered(remaining_kwh: f64) -> bool {
    remaining_kwh <= LEVEL_TOLERANCE_KWH
}

impl Timeline<'_> {
    /// First hour at or after `from` whose level exceeds the maximum.
    pub fn scan_above(&self, from: usize) -> Option<Violation> {
        let max = self.config.max_capacity;
        self.rows
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, row)| row.battery_expected > max)
            .map(|(i, row)| Violation::above(i, row.battery_expected - max))
    }

    /// First hour at or after `from` whose level drops below the minimum.
    ///
    /// When no level is short, the final hour is checked as well: an
    /// equalizing last hour that covers a deficit needs that deficit on top
    /// of the buffer.
    pub fn scan_below(&self, from: usize) -> Option<Violation> {
        let min = self.config.min_capacity;
        let short = self
            .rows
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, row)| {
                row.battery_expected < min && (row.battery_expected - min).abs() > LEVEL_TOLERANCE_KWH
            })
            .map(|(i, row)| Violation::below(i, (row.battery_expected - min).abs()));
        short.or_else(|| self.terminal_shortfall())
    }

    fn terminal_shortfall(&self) -> Option<Violation> {
        let last = self.last_index();
        let row = self.rows.get(last)?;
        if !row.action.is_equalize() || row.solar_surplus >= 0.0 {
            return None;
        }
        let capacity = row.battery_expected - self.config.min_capacity;
        let lacking = row.solar_surplus.abs() - capacity;
        (lacking > LEVEL_TOLERANCE_KWH).then(|| Violation::below(last, lacking))
    }

    /// Lowest level over the inclusive hour range.
    ///
    /// If the range ends at the final hour and that hour discharges, the
    /// level after the final hour counts too.
    pub fn min_level_between(&self, a: usize, b: usize) -> f64 {
        let (lo, hi) = (a.min(b), a.max(b));
        let mut lowest = self.rows[lo..=hi]
            .iter()
            .map(|r| r.battery_expected)
            .fold(f64::INFINITY, f64::min);
        let last = &self.rows[hi];
        if hi == self.last_index() && last.action.is_equalize() && last.battery_delta < 0.0 {
            lowest = lowest.min(last.level_after());
        }
        lowest
    }

    /// Highest level over the inclusive hour range.
    pub fn max_level_between(&self, a: usize, b: usize) -> f64 {
        let (lo, hi) = (a.min(b), a.max(b));
        self.rows[lo..=hi]
            .iter()
            .map(|r| r.battery_expected)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Final validation: the first excess and the first shortfall, if any.
    pub fn violations(&self) -> Vec<Violation> {
        self.scan_above(0)
            .into_iter()
            .chain(self.scan_below(0))
            .collect()
    }
}
