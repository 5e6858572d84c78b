use crate::*;

/// Local turn countdown, advanced on a fixed tick between authoritative refreshes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnCountdown {
    remaining_ms: Millis,
    duration_ms: Millis,
    next_tick: Option<Millis>,
    tick_ms: Millis,
    lead_ms: Millis,
}

impl TurnCountdown {
    pub fn new(tick_ms: Millis, lead_ms: Millis) -> Self {
        Self {
            remaining_ms: 0,
            duration_ms: 0,
            next_tick: None,
            tick_ms: tick_ms.max(1),
            lead_ms,
        }
    }

    /// Overwrites the local countdown from a fresh turn context. Remaining time is capped at the turn duration.
    pub fn refresh(&mut self, context: &TurnContext, now: Millis) {
        self.duration_ms = Millis::from(context.duration_s) * 1000;
        let remaining_s = context.remaining_time_s.min(context.duration_s);
        self.remaining_ms = (Millis::from(remaining_s) * 1000).saturating_sub(self.lead_ms);
        self.next_tick = (self.remaining_ms > 0 && !context.pre_match_start)
            .then(|| now.saturating_add(self.tick_ms));
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn remaining_ms(&self) -> Millis {
        self.remaining_ms
    }

    /// Whole seconds left, rounded up so a display shows 0 only once time is out.
    pub fn remaining_secs(&self) -> u32 {
        u32::try_from(self.remaining_ms.div_ceil(1000)).unwrap_or(u32::MAX)
    }

    pub fn duration_secs(&self) -> u32 {
        u32::try_from(self.duration_ms / 1000).unwrap_or(u32::MAX)
    }

    pub fn fraction_remaining(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            (self.remaining_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
        }
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.next_tick
    }

    /// Applies every tick due at `now`, returns whether the displayed seconds changed.
    pub fn poll(&mut self, now: Millis) -> bool {
        let before = self.remaining_secs();
        while let Some(tick) = self.next_tick.filter(|&tick| tick <= now) {
            self.remaining_ms = self.remaining_ms.saturating_sub(self.tick_ms);
            self.next_tick = (self.remaining_ms > 0).then(|| tick + self.tick_ms);
        }
        before != self.remaining_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(remaining_time_s: u32, duration_s: u32) -> TurnContext {
        TurnContext {
            current_player_id: "p1".into(),
            is_player1_turn: true,
            remaining_time_s,
            duration_s,
            notify_turn_change: false,
            pre_match_start: false,
            game_context: GameContext::new(Board::empty(1), ResourceBundle::default()),
        }
    }

    #[test]
    fn refresh_biases_ahead_of_server() {
        let mut countdown = TurnCountdown::new(500, 250);

        countdown.refresh(&turn(10, 60), 0);

        assert_eq!(countdown.remaining_ms(), 9750);
        assert_eq!(countdown.remaining_secs(), 10);
        assert_eq!(countdown.duration_secs(), 60);
        assert_eq!(countdown.next_deadline(), Some(500));
    }

    #[test]
    fn ticks_catch_up_and_stop_at_zero() {
        let mut countdown = TurnCountdown::new(500, 0);
        countdown.refresh(&turn(2, 60), 0);

        assert!(!countdown.poll(499));
        assert!(countdown.poll(1000));
        assert_eq!(countdown.remaining_ms(), 1000);
        assert!(countdown.poll(10_000));
        assert_eq!(countdown.remaining_ms(), 0);
        assert_eq!(countdown.next_deadline(), None);
    }

    #[test]
    fn fresh_context_overwrites_local_progress() {
        let mut countdown = TurnCountdown::new(500, 0);
        countdown.refresh(&turn(30, 30), 0);
        countdown.poll(5000);

        countdown.refresh(&turn(30, 30), 5000);

        assert_eq!(countdown.remaining_ms(), 30_000);
        assert_eq!(countdown.fraction_remaining(), 1.0);
    }

    #[test]
    fn remaining_time_is_capped_at_duration() {
        let mut countdown = TurnCountdown::new(500, 0);

        countdown.refresh(&turn(61, 60), 0);

        assert_eq!(countdown.remaining_secs(), 60);
        assert_eq!(countdown.fraction_remaining(), 1.0);
    }
}
