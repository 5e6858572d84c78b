//! Client-side presentation runtime for a turn-based two-player grid game.
//!
//! The authoritative engine lives on the server. This crate queues and plays the visual effects of the events it
//! pushes, reconciles the rendered board with authoritative snapshots, gates local input by turn and animation
//! state, and places floating overlays inside the viewport. Everything is driven by an explicit millisecond clock so
//! the host decides how time passes.

use serde::{Deserialize, Serialize};

pub use action::*;
pub use animation::*;
pub use board::*;
pub use cell::*;
pub use countdown::*;
pub use error::*;
pub use event::*;
pub use flash::*;
pub use gate::*;
pub use overlay::*;
pub use placement::*;
pub use queue::*;
pub use reconcile::*;
pub use types::*;
pub use view::*;

mod action;
mod animation;
mod board;
mod cell;
mod countdown;
mod error;
mod event;
mod flash;
mod gate;
mod overlay;
mod placement;
mod queue;
mod reconcile;
mod types;
mod view;

/// Board edge length used by the reference server.
pub const DEFAULT_BOARD_SIZE: Coord = 11;

/// Delays between the effect steps of an animation, in milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationTimings {
    pub highlight_ms: Millis,
    pub move_ms: Millis,
    pub strike_ms: Millis,
    pub ranged_flight_ms: Millis,
    pub spawn_ms: Millis,
    pub spell_group_ms: Millis,
    pub explosion_ms: Millis,
    pub death_ms: Millis,
}

impl AnimationTimings {
    /// Every delay set to zero, animations then resolve within a single poll.
    pub const fn instant() -> Self {
        Self {
            highlight_ms: 0,
            move_ms: 0,
            strike_ms: 0,
            ranged_flight_ms: 0,
            spawn_ms: 0,
            spell_group_ms: 0,
            explosion_ms: 0,
            death_ms: 0,
        }
    }
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self {
            highlight_ms: 250,
            move_ms: 350,
            strike_ms: 300,
            ranged_flight_ms: 450,
            spawn_ms: 300,
            spell_group_ms: 400,
            explosion_ms: 500,
            death_ms: 400,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    pub board_size: Coord,
    /// How long the turn-swap indicator stays up before input unlocks.
    pub turn_swap_ms: Millis,
    pub spell_description_ms: Millis,
    pub action_error_ms: Millis,
    pub countdown_tick_ms: Millis,
    /// Subtracted from every server countdown so the local one never outlasts it.
    pub countdown_lead_ms: Millis,
    pub overlay_gap: f64,
    pub timings: AnimationTimings,
}

impl MatchConfig {
    pub fn new(board_size: Coord) -> Self {
        Self {
            board_size: board_size.max(1),
            ..Self::default()
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            turn_swap_ms: 2000,
            spell_description_ms: 3500,
            action_error_ms: 1400,
            countdown_tick_ms: 500,
            countdown_lead_ms: 250,
            overlay_gap: DEFAULT_OVERLAY_GAP,
            timings: AnimationTimings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_reference_timings() {
        let config = MatchConfig::default();

        assert_eq!(config.board_size, 11);
        assert_eq!(config.turn_swap_ms, 2000);
        assert_eq!(config.spell_description_ms, 3500);
        assert_eq!(config.action_error_ms, 1400);
        assert_eq!(config.countdown_tick_ms, 500);
    }

    #[test]
    fn partial_config_fills_missing_fields_with_defaults() {
        let config: MatchConfig =
            serde_json::from_str(r#"{"boardSize": 7, "timings": {"moveMs": 10}}"#).unwrap();

        assert_eq!(config.board_size, 7);
        assert_eq!(config.turn_swap_ms, 2000);
        assert_eq!(config.timings.move_ms, 10);
        assert_eq!(config.timings.death_ms, 400);
    }
}
