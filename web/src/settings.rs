use serde::{Deserialize, Serialize};
use skirmish_core::{AnimationTimings, Coord, MatchConfig, Position};

use crate::utils::StorageKey;

/// Per-browser preferences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct Settings {
    pub tooltip_position: Position,
    pub show_state_tooltips: bool,
    /// Plays every animation without delays.
    pub skip_animations: bool,
    pub timings: AnimationTimings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tooltip_position: Position::Top,
            show_state_tooltips: true,
            skip_animations: false,
            timings: AnimationTimings::default(),
        }
    }
}

impl Settings {
    pub fn match_config(&self, board_size: Coord) -> MatchConfig {
        MatchConfig {
            timings: if self.skip_animations {
                AnimationTimings::instant()
            } else {
                self.timings
            },
            ..MatchConfig::new(board_size)
        }
    }
}

impl StorageKey for Settings {
    const KEY: &'static str = "skirmish:settings:v1";
}
