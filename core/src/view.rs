use std::rc::Rc;

use crate::*;

/// Rendering side of a match: everything the view pushes out.
///
/// Boards and resources are always whole replacements. Effects play on the board rendered at the time.
pub trait Presenter {
    fn render_board(&mut self, board: &Rc<Board>);

    fn render_resources(&mut self, resources: &ResourceBundle);

    /// Plays one animation effect. An error skips the effect, the animation carries on.
    fn play_effect(&mut self, effect: &Effect) -> Result<()>;

    fn set_interaction_enabled(&mut self, enabled: bool);

    fn set_turn_swap_visible(&mut self, _visible: bool) {}

    fn set_spell_description(&mut self, _spell: Option<&Spell>) {}

    fn set_action_error(&mut self, _message: Option<&str>) {}

    fn set_countdown(&mut self, _remaining_secs: u32, _duration_secs: u32) {}
}

/// Whose turn it is, as of the last turn context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnStatus {
    pub current_player_id: String,
    pub player_to_act: Player,
    pub pre_match_start: bool,
}

struct DrainContext<'a, P: ?Sized> {
    now: Millis,
    config: &'a MatchConfig,
    reconciler: &'a mut BoardReconciler,
    spell_flash: &'a mut TimedFlash<Spell>,
    presenter: &'a mut P,
}

impl<P: Presenter + ?Sized> DrainTarget for DrainContext<'_, P> {
    fn animation_for(&self, job: &QueuedJob) -> Result<Animation> {
        job.animation(self.reconciler.rendered(), &self.config.timings)
    }

    fn apply_effect(&mut self, effect: &Effect) -> Result<()> {
        match effect {
            Effect::SpellDescription(spell) => {
                self.spell_flash
                    .show(spell.clone(), self.now, self.config.spell_description_ms);
                self.presenter.set_spell_description(Some(spell));
                Ok(())
            }
            effect => self.presenter.play_effect(effect),
        }
    }

    fn settle(&mut self, job: QueuedJob, arrival: Arrival) {
        self.reconciler.settle(job, arrival);
        self.presenter.render_board(self.reconciler.rendered());
        self.presenter.render_resources(self.reconciler.resources());
    }
}

/// One mounted match: routes engine events through the queue, the reconciler and the gate.
///
/// Nothing here owns a timer. Both [`MatchView::handle_event`] and [`MatchView::poll`] return the next time the view
/// wants to be polled; the host arms a single timer for it.
#[derive(Debug)]
pub struct MatchView {
    config: MatchConfig,
    gate: TurnGate,
    queue: ActionQueue,
    reconciler: BoardReconciler,
    countdown: TurnCountdown,
    spell_flash: TimedFlash<Spell>,
    error_flash: TimedFlash<String>,
    turn: Option<TurnStatus>,
    interaction_enabled: bool,
    swap_visible: bool,
    torn_down: bool,
}

impl MatchView {
    pub fn new(config: MatchConfig, local_player: Player) -> Self {
        Self {
            gate: TurnGate::new(local_player, config.turn_swap_ms),
            queue: ActionQueue::new(),
            reconciler: BoardReconciler::new(local_player, config.board_size),
            countdown: TurnCountdown::new(config.countdown_tick_ms, config.countdown_lead_ms),
            spell_flash: TimedFlash::new(),
            error_flash: TimedFlash::new(),
            turn: None,
            interaction_enabled: false,
            swap_visible: false,
            torn_down: false,
            config,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn local_player(&self) -> Player {
        self.reconciler.local_player()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn rendered_board(&self) -> &Rc<Board> {
        self.reconciler.rendered()
    }

    pub fn board_revision(&self) -> u64 {
        self.reconciler.revision()
    }

    pub fn resources(&self) -> &ResourceBundle {
        self.reconciler.resources()
    }

    pub fn authoritative(&self) -> Option<&GameContext> {
        self.reconciler.authoritative()
    }

    pub fn is_interaction_enabled(&self) -> bool {
        self.interaction_enabled
    }

    /// Whether a command from the local player may go out right now.
    pub fn can_submit(&self) -> bool {
        !self.torn_down && self.gate.is_interaction_enabled()
    }

    pub fn is_animating(&self) -> bool {
        self.queue.is_draining()
    }

    pub fn pending_jobs(&self) -> usize {
        self.queue.pending_len()
    }

    pub fn completed_jobs(&self) -> u64 {
        self.queue.completed()
    }

    pub fn countdown(&self) -> &TurnCountdown {
        &self.countdown
    }

    pub fn spell_description(&self) -> Option<&Spell> {
        self.spell_flash.value()
    }

    pub fn action_error(&self) -> Option<&str> {
        self.error_flash.value().map(String::as_str)
    }

    pub fn turn(&self) -> Option<&TurnStatus> {
        self.turn.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Pushes the whole current state to a freshly attached presenter.
    pub fn render_all<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        presenter.render_board(self.reconciler.rendered());
        presenter.render_resources(self.reconciler.resources());
        presenter.set_interaction_enabled(self.interaction_enabled);
        presenter.set_turn_swap_visible(self.swap_visible);
        presenter.set_spell_description(self.spell_flash.value());
        presenter.set_action_error(self.action_error());
        presenter.set_countdown(self.countdown.remaining_secs(), self.countdown.duration_secs());
    }

    /// Feeds one inbound event. Malformed events are logged and dropped.
    pub fn handle_event<P: Presenter + ?Sized>(
        &mut self,
        event: MatchEvent,
        now: Millis,
        presenter: &mut P,
    ) -> Option<Millis> {
        if self.torn_down {
            log::debug!("ignoring {} after teardown", event.kind_name());
            return self.poll(now, presenter);
        }
        if let Err(err) = event.validate(self.config.board_size) {
            log::warn!("dropping malformed {}: {}", event.kind_name(), err);
            return self.poll(now, presenter);
        }
        log::trace!("handling {}", event.kind_name());

        match event {
            MatchEvent::PossibleActions(event) => {
                if let Some(spell) = &event.previewed_spell {
                    self.show_spell(spell.clone(), now, presenter);
                }
                self.reconciler.apply_possible_actions(event);
                presenter.render_board(self.reconciler.rendered());
            }
            MatchEvent::ProcessedAction(event) => self.enqueue(QueuedJob::Processed(event)),
            MatchEvent::ActionCallback(callback) => self.enqueue(QueuedJob::Callback(callback)),
            MatchEvent::TurnContext(context) => self.apply_turn_context(context, now, presenter),
            MatchEvent::ActionError { message } => {
                log::debug!("engine rejected action: {}", message);
                presenter.set_action_error(Some(message.as_str()));
                self.error_flash.show(message, now, self.config.action_error_ms);
            }
        }

        self.poll(now, presenter)
    }

    /// Advances animations and timers up to `now`, returns the next deadline if any.
    pub fn poll<P: Presenter + ?Sized>(&mut self, now: Millis, presenter: &mut P) -> Option<Millis> {
        let mut target = DrainContext {
            now,
            config: &self.config,
            reconciler: &mut self.reconciler,
            spell_flash: &mut self.spell_flash,
            presenter: &mut *presenter,
        };
        let drain = self.queue.poll(now, &mut target);

        if self.torn_down {
            return self.queue.next_deadline();
        }

        if drain == DrainPoll::Drained {
            self.gate.set_queue_busy(false);
            if self.reconciler.flush_deferred() {
                presenter.render_board(self.reconciler.rendered());
            }
        }
        self.gate.poll(now);

        if self.countdown.poll(now) {
            presenter.set_countdown(self.countdown.remaining_secs(), self.countdown.duration_secs());
        }
        if self.spell_flash.poll(now) {
            presenter.set_spell_description(None);
        }
        if self.error_flash.poll(now) {
            presenter.set_action_error(None);
        }
        self.sync_gate(presenter);

        self.next_deadline()
    }

    /// Earliest time any running timer or animation wants attention.
    pub fn next_deadline(&self) -> Option<Millis> {
        if self.torn_down {
            return self.queue.next_deadline();
        }
        [
            self.queue.next_deadline(),
            self.gate.next_deadline(),
            self.countdown.next_deadline(),
            self.spell_flash.next_deadline(),
            self.error_flash.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Stops every timer. An animation in flight still runs out its delays but no longer reaches the presenter.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        log::debug!("tearing down match view");
        self.torn_down = true;
        self.queue.cancel();
        self.gate.teardown();
        self.countdown.stop();
        self.spell_flash.clear();
        self.error_flash.clear();
        self.interaction_enabled = false;
        self.swap_visible = false;
    }

    fn enqueue(&mut self, job: QueuedJob) {
        let arrival = self.reconciler.stamp();
        if self.queue.enqueue(job, arrival) {
            self.gate.set_queue_busy(true);
        }
    }

    fn apply_turn_context<P: Presenter + ?Sized>(&mut self, context: TurnContext, now: Millis, presenter: &mut P) {
        self.gate.on_turn_context(&context, now);
        self.countdown.refresh(&context, now);
        presenter.set_countdown(self.countdown.remaining_secs(), self.countdown.duration_secs());

        self.turn = Some(TurnStatus {
            player_to_act: context.player_to_act(),
            pre_match_start: context.pre_match_start,
            current_player_id: context.current_player_id,
        });

        // rendering now would jump ahead of the animation, the board is flushed once the queue drains
        let render = !self.queue.is_draining();
        self.reconciler.apply_turn_context(context.game_context, render);
        if render {
            presenter.render_board(self.reconciler.rendered());
        }
        presenter.render_resources(self.reconciler.resources());
    }

    fn show_spell<P: Presenter + ?Sized>(&mut self, spell: Spell, now: Millis, presenter: &mut P) {
        presenter.set_spell_description(Some(&spell));
        self.spell_flash.show(spell, now, self.config.spell_description_ms);
    }

    fn sync_gate<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        let enabled = self.gate.is_interaction_enabled();
        if enabled != self.interaction_enabled {
            log::debug!("interaction {}", if enabled { "enabled" } else { "disabled" });
            self.interaction_enabled = enabled;
            presenter.set_interaction_enabled(enabled);
        }

        let swap_visible = self.gate.is_swap_pending();
        if swap_visible != self.swap_visible {
            self.swap_visible = swap_visible;
            presenter.set_turn_swap_visible(swap_visible);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[derive(Default)]
    struct Calls {
        boards: usize,
        effects: usize,
        interaction: Vec<bool>,
    }

    impl Presenter for Calls {
        fn render_board(&mut self, _board: &Rc<Board>) {
            self.boards += 1;
        }

        fn render_resources(&mut self, _resources: &ResourceBundle) {}

        fn play_effect(&mut self, _effect: &Effect) -> Result<()> {
            self.effects += 1;
            Ok(())
        }

        fn set_interaction_enabled(&mut self, enabled: bool) {
            self.interaction.push(enabled);
        }
    }

    fn config() -> MatchConfig {
        MatchConfig::new(3)
    }

    fn turn(notify_turn_change: bool) -> MatchEvent {
        MatchEvent::TurnContext(TurnContext {
            current_player_id: "p1".into(),
            is_player1_turn: true,
            remaining_time_s: 20,
            duration_s: 30,
            notify_turn_change,
            pre_match_start: false,
            game_context: GameContext::new(Board::empty(3), ResourceBundle::default()),
        })
    }

    fn callback(id: u64) -> MatchEvent {
        MatchEvent::ActionCallback(ActionCallback {
            id,
            parent_action: GameAction {
                kind: ActionKind::Move,
                player: Player::Player1,
                source: Some((0, 0)),
                impacted: smallvec![(0, 1)],
                meta: ActionMeta::None,
            },
            parent_callback_id: None,
            causing_spell: None,
            impacted_coords: Some(smallvec![(0, 1)]),
            deaths: vec![],
            updated_context: GameContext::new(Board::empty(3), ResourceBundle::default()),
        })
    }

    #[test]
    fn turn_context_while_draining_defers_board_to_the_queue() {
        let mut view = MatchView::new(config(), Player::Player1);
        let mut calls = Calls::default();

        view.handle_event(callback(1), 0, &mut calls);
        let rendered = Rc::clone(view.rendered_board());
        view.handle_event(turn(false), 10, &mut calls);

        assert!(Rc::ptr_eq(&rendered, view.rendered_board()));
        assert_eq!(view.gate_state(), GateState::Locked);
        assert!(view.authoritative().is_some());
    }

    #[test]
    fn teardown_silences_a_running_drain() {
        let mut view = MatchView::new(config(), Player::Player1);
        let mut calls = Calls::default();

        let deadline = view.handle_event(callback(1), 0, &mut calls);
        assert_eq!(calls.effects, 1);
        view.teardown();

        assert_eq!(view.poll(deadline.unwrap_or(0), &mut calls), None);
        assert_eq!(calls.boards, 0);
        assert_eq!(calls.effects, 1);
        assert!(!view.can_submit());
    }

    #[test]
    fn interaction_is_pushed_only_on_change() {
        let mut view = MatchView::new(config(), Player::Player1);
        let mut calls = Calls::default();

        view.handle_event(turn(false), 0, &mut calls);
        view.poll(1, &mut calls);
        view.handle_event(turn(false), 2, &mut calls);

        assert_eq!(calls.interaction, vec![true]);
        assert!(view.can_submit());
    }

    #[test]
    fn possible_actions_with_spell_show_its_description() {
        let mut view = MatchView::new(config(), Player::Player1);
        let spell = Spell {
            id: "ward".into(),
            name: "Ward".into(),
            description: "Shields an ally.".into(),
        };

        view.handle_event(
            MatchEvent::PossibleActions(PossibleActions {
                player: Player::Player1,
                transient_board: Board::empty(3),
                previewed_spell: Some(spell.clone()),
            }),
            0,
            &mut Calls::default(),
        );

        assert_eq!(view.spell_description(), Some(&spell));
        assert_eq!(view.next_deadline(), Some(3500));
    }
}
