use serde::{Deserialize, Serialize};

use super::config::SizesConfig;

/// Footprint presets, in cycling order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    Small,
    #[default]
    Medium,
    Large,
}

impl SizePreset {
    pub const ALL: [SizePreset; 3] = [SizePreset::Small, SizePreset::Medium, SizePreset::Large];

    /// The following preset, wrapping from the largest back to the smallest.
    pub fn next(self) -> Self {
        match self {
            SizePreset::Small => SizePreset::Medium,
            SizePreset::Medium => SizePreset::Large,
            SizePreset::Large => SizePreset::Small,
        }
    }
}

/// Preset plus the orthogonal minimized flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SizeState {
    pub preset: SizePreset,
    pub minimized: bool,
}

impl SizeState {
    pub fn new(preset: SizePreset) -> Self {
        Self {
            preset,
            minimized: false,
        }
    }

    pub fn toggle_minimized(&mut self) {
        self.minimized = !self.minimized;
    }

    /// Advance to the next preset. A minimized overlay is restored at the
    /// same time, otherwise the change would be invisible.
    pub fn cycle(&mut self) {
        self.preset = self.preset.next();
        self.minimized = false;
    }

    pub fn footprint(&self, sizes: &SizesConfig) -> Footprint {
        let edge = if self.minimized {
            sizes.minimized
        } else {
            sizes.edge(self.preset)
        };
        Footprint {
            width: edge,
            height: edge,
            minimized: self.minimized,
        }
    }
}

/// Requested window size, and which overlay set the widget should show.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
    pub minimized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_state_and_footprint() {
        let sizes = SizesConfig::default();
        let original = SizeState::new(SizePreset::Large);
        let mut state = original;
        let before = state.footprint(&sizes);

        state.toggle_minimized();
        assert!(state.minimized);
        assert_eq!(state.footprint(&sizes).width, sizes.minimized);

        state.toggle_minimized();
        assert_eq!(state, original);
        assert_eq!(state.footprint(&sizes), before);
    }

    #[test]
    fn cycling_every_preset_returns_to_start() {
        let mut state = SizeState::new(SizePreset::Small);
        for _ in 0..SizePreset::ALL.len() {
            state.cycle();
        }
        assert_eq!(state.preset, SizePreset::Small);
    }

    #[test]
    fn cycle_restores_minimized_overlay() {
        let mut state = SizeState::new(SizePreset::Medium);
        state.toggle_minimized();
        state.cycle();
        assert!(!state.minimized);
        assert_eq!(state.preset, SizePreset::Large);
    }

    #[test]
    fn footprint_uses_configured_edges() {
        let sizes = SizesConfig::default();
        let state = SizeState::new(SizePreset::Medium);
        assert_eq!(
            state.footprint(&sizes),
            Footprint {
                width: 180,
                height: 180,
                minimized: false
            }
        );
    }
}
