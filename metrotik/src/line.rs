//! Position of the rider on the circular monorail.

use crate::config::LineConfig;

/// A circular line of `zone_count` zones numbered from 1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonorailLine {
    zone_count: u32,
    current: u32,
}

impl MonorailLine {
    /// Places the rider at `starting_zone`, clamped onto the line
    #[must_use]
    pub fn new(zone_count: u32, starting_zone: u32) -> Self {
        let zone_count = zone_count.max(1);
        let current = starting_zone.clamp(1, zone_count);
        tracing::debug!(zone_count, current, "Monorail line initialised");
        Self {
            zone_count,
            current,
        }
    }

    /// Builds the line described by `config`
    #[must_use]
    pub fn from_config(config: &LineConfig) -> Self {
        Self::new(config.zone_count, config.starting_zone)
    }

    /// Move to the next zone, wrapping from the last zone back to 1
    pub fn advance(&mut self) -> u32 {
        self.current = if self.current >= self.zone_count {
            1
        } else {
            self.current + 1
        };
        tracing::debug!(zone = self.current, "Monorail moved to next zone");
        self.current
    }

    /// Current zone number
    #[must_use]
    pub const fn current_zone(&self) -> u32 {
        self.current
    }

    /// Zones on the line
    #[must_use]
    pub const fn zone_count(&self) -> u32 {
        self.zone_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_after_last_zone() {
        let mut line = MonorailLine::new(10, 9);
        assert_eq!(line.advance(), 10);
        assert_eq!(line.advance(), 1);
        assert_eq!(line.advance(), 2);
    }

    #[test]
    fn test_starting_zone_is_clamped() {
        assert_eq!(MonorailLine::new(10, 0).current_zone(), 1);
        assert_eq!(MonorailLine::new(10, 42).current_zone(), 10);
        assert_eq!(MonorailLine::new(0, 3).zone_count(), 1);
    }
}
