use std::cell::Cell as FlagCell;
use std::rc::Rc;

use smallvec::smallvec;

use crate::*;

/// A visual effect the rendering layer plays on the currently rendered board.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Highlight {
        coords: CoordList,
        annotation: TransientState,
    },
    ClearHighlight,
    Move {
        from: Coord2,
        to: Coord2,
        owner: Player,
    },
    Strike {
        from: Coord2,
        to: Coord2,
        ranged: bool,
    },
    Spawn {
        coords: CoordList,
    },
    Explode {
        coords: CoordList,
    },
    Perish {
        coords: CoordList,
    },
    SpellDescription(Spell),
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnimationStep {
    Delay(Millis),
    Effect(Effect),
}

/// Ordered list of timed steps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animation {
    steps: Vec<AnimationStep>,
}

impl Animation {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn total_delay(&self) -> Millis {
        self.steps
            .iter()
            .map(|step| match step {
                AnimationStep::Delay(ms) => *ms,
                AnimationStep::Effect(_) => 0,
            })
            .sum()
    }

    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        self.steps.iter().filter_map(|step| match step {
            AnimationStep::Effect(effect) => Some(effect),
            AnimationStep::Delay(_) => None,
        })
    }

    fn effect(&mut self, effect: Effect) -> &mut Self {
        self.steps.push(AnimationStep::Effect(effect));
        self
    }

    fn delay(&mut self, ms: Millis) -> &mut Self {
        if ms > 0 {
            self.steps.push(AnimationStep::Delay(ms));
        }
        self
    }

    /// Script for a processed action, reading unit positions from the board rendered before the action lands.
    pub fn for_action(action: &GameAction, board: &Board, timings: &AnimationTimings) -> Result<Self> {
        let mut animation = Self::empty();

        match action.kind {
            ActionKind::Move => {
                let (from, to) = source_and_target(action)?;
                let owner = board
                    .cell_at(from)
                    .and_then(|cell| cell.owner)
                    .ok_or(MatchError::MissingCellElement(from.0, from.1))?;
                animation
                    .effect(Effect::Highlight {
                        coords: smallvec![from, to],
                        annotation: TransientState::Selected,
                    })
                    .delay(timings.highlight_ms)
                    .effect(Effect::Move { from, to, owner })
                    .delay(timings.move_ms)
                    .effect(Effect::ClearHighlight);
            }
            ActionKind::Attack => {
                let (from, _) = source_and_target(action)?;
                if board.cell_at(from).is_none_or(|cell| !cell.is_occupied()) {
                    return Err(MatchError::MissingCellElement(from.0, from.1));
                }
                let ranged = action.is_ranged();
                animation
                    .effect(Effect::Highlight {
                        coords: action.impacted.clone(),
                        annotation: TransientState::CanBeAttacked,
                    })
                    .delay(timings.highlight_ms);
                for &to in &action.impacted {
                    animation.effect(Effect::Strike { from, to, ranged }).delay(if ranged {
                        timings.ranged_flight_ms
                    } else {
                        timings.strike_ms
                    });
                }
                animation.effect(Effect::ClearHighlight);
            }
            ActionKind::Spawn => {
                let coords = match &action.meta {
                    ActionMeta::Spawn { coords } if !coords.is_empty() => coords.clone(),
                    _ => action.impacted.clone(),
                };
                if coords.is_empty() {
                    return Err(MatchError::MalformedEvent("spawn without coordinates"));
                }
                animation
                    .effect(Effect::Highlight {
                        coords: coords.clone(),
                        annotation: TransientState::CanBeSpawnedInto,
                    })
                    .delay(timings.highlight_ms)
                    .effect(Effect::Spawn { coords })
                    .delay(timings.spawn_ms)
                    .effect(Effect::ClearHighlight);
            }
            ActionKind::Spell => {
                let ActionMeta::Spell { spell, formation } = &action.meta else {
                    return Err(MatchError::MalformedEvent("spell action without a spell"));
                };
                animation.effect(Effect::SpellDescription(spell.clone()));
                let fallback = [action.impacted.clone()];
                let groups = if formation.is_empty() {
                    &fallback[..]
                } else {
                    &formation[..]
                };
                for group in groups.iter().filter(|group| !group.is_empty()) {
                    animation
                        .effect(Effect::Highlight {
                            coords: group.clone(),
                            annotation: TransientState::CanBeSpellTargeted,
                        })
                        .delay(timings.spell_group_ms);
                }
                animation.effect(Effect::ClearHighlight);
            }
        }

        Ok(animation)
    }

    pub fn for_callback(callback: &ActionCallback, timings: &AnimationTimings) -> Self {
        let mut animation = Self::empty();

        if let Some(spell) = &callback.causing_spell {
            animation.effect(Effect::SpellDescription(spell.clone()));
        }
        if let Some(coords) = callback.impacted_coords.as_ref().filter(|c| !c.is_empty()) {
            animation
                .effect(Effect::Explode {
                    coords: coords.clone(),
                })
                .delay(timings.explosion_ms);
        }
        if !callback.deaths.is_empty() {
            let coords = callback.deaths.iter().map(|death| death.coords).collect();
            animation
                .effect(Effect::Perish { coords })
                .delay(timings.death_ms);
        }

        animation
    }
}

fn source_and_target(action: &GameAction) -> Result<(Coord2, Coord2)> {
    let source = action
        .source
        .ok_or(MatchError::MalformedEvent("positional action without a source"))?;
    let target = action
        .impacted
        .first()
        .copied()
        .ok_or(MatchError::MalformedEvent("positional action without a target"))?;
    Ok((source, target))
}

/// Cooperative cancellation flag shared between a drain and whoever tears the view down.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<FlagCell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerPoll {
    /// Waiting on a delay step until the given time.
    Sleeping(Millis),
    Finished,
}

/// Runs the steps of one animation in order, one delay at a time.
#[derive(Debug)]
pub struct AnimationPlayer {
    steps: std::vec::IntoIter<AnimationStep>,
    resume_at: Millis,
    cancel: CancelToken,
}

impl AnimationPlayer {
    pub fn start(animation: Animation, now: Millis, cancel: CancelToken) -> Self {
        Self {
            steps: animation.steps.into_iter(),
            resume_at: now,
            cancel,
        }
    }

    pub fn resume_at(&self) -> Millis {
        self.resume_at
    }

    /// Runs every step that is due at `now`.
    ///
    /// Effects are skipped once the token is cancelled but delays still elapse. A failing effect is logged and
    /// skipped, it never stops the animation.
    pub fn poll<F>(&mut self, now: Millis, mut apply: F) -> PlayerPoll
    where
        F: FnMut(&Effect) -> Result<()>,
    {
        if now < self.resume_at {
            return PlayerPoll::Sleeping(self.resume_at);
        }

        for step in self.steps.by_ref() {
            match step {
                AnimationStep::Delay(ms) => {
                    self.resume_at = now.saturating_add(ms);
                    return PlayerPoll::Sleeping(self.resume_at);
                }
                AnimationStep::Effect(_) if self.cancel.is_cancelled() => {
                    log::trace!("skipping effect of a cancelled animation");
                }
                AnimationStep::Effect(effect) => {
                    if let Err(err) = apply(&effect) {
                        log::warn!("animation step failed, skipping: {}", err);
                    }
                }
            }
        }

        PlayerPoll::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with_unit(size: Coord, coords: Coord2, owner: Player) -> Board {
        let mut board = Board::empty(size);
        if let Some(cell) = board.cell_at_mut(coords) {
            cell.owner = Some(owner);
        }
        board
    }

    fn action(kind: ActionKind, source: Option<Coord2>, impacted: CoordList, meta: ActionMeta) -> GameAction {
        GameAction {
            kind,
            player: Player::Player1,
            source,
            impacted,
            meta,
        }
    }

    #[test]
    fn move_reads_owner_from_rendered_board() {
        let board = board_with_unit(4, (1, 1), Player::Player2);
        let mv = action(ActionKind::Move, Some((1, 1)), smallvec![(1, 2)], ActionMeta::None);

        let animation = Animation::for_action(&mv, &board, &AnimationTimings::default()).unwrap();

        assert!(animation.effects().any(|effect| *effect
            == Effect::Move {
                from: (1, 1),
                to: (1, 2),
                owner: Player::Player2
            }));
        assert_eq!(animation.total_delay(), 250 + 350);
    }

    #[test]
    fn move_from_empty_cell_is_a_missing_element() {
        let board = Board::empty(4);
        let mv = action(ActionKind::Move, Some((0, 0)), smallvec![(0, 1)], ActionMeta::None);

        assert_eq!(
            Animation::for_action(&mv, &board, &AnimationTimings::default()),
            Err(MatchError::MissingCellElement(0, 0))
        );
    }

    #[test]
    fn ranged_attack_uses_flight_delay_per_target() {
        let board = board_with_unit(4, (2, 2), Player::Player1);
        let attack = action(
            ActionKind::Attack,
            Some((2, 2)),
            smallvec![(2, 3), (0, 0)],
            ActionMeta::Attack { ranged: true },
        );
        let timings = AnimationTimings::default();

        let animation = Animation::for_action(&attack, &board, &timings).unwrap();

        let strikes = animation
            .effects()
            .filter(|effect| matches!(effect, Effect::Strike { ranged: true, .. }))
            .count();
        assert_eq!(strikes, 2);
        assert_eq!(
            animation.total_delay(),
            timings.highlight_ms + 2 * timings.ranged_flight_ms
        );
    }

    #[test]
    fn spell_highlights_each_formation_group() {
        let spell = Spell {
            id: "nova".into(),
            name: "Nova".into(),
            description: "Burns a ring.".into(),
        };
        let cast = action(
            ActionKind::Spell,
            None,
            smallvec![],
            ActionMeta::Spell {
                spell: spell.clone(),
                formation: vec![smallvec![(0, 0)], smallvec![], smallvec![(1, 1), (1, 2)]],
            },
        );

        let animation = Animation::for_action(&cast, &Board::empty(3), &AnimationTimings::default()).unwrap();

        let mut effects = animation.effects();
        assert_eq!(effects.next(), Some(&Effect::SpellDescription(spell)));
        let highlights = animation
            .effects()
            .filter(|effect| matches!(effect, Effect::Highlight { .. }))
            .count();
        assert_eq!(highlights, 2);
    }

    #[test]
    fn callback_explodes_then_kills() {
        let callback = ActionCallback {
            id: 7,
            parent_action: action(ActionKind::Move, Some((0, 0)), smallvec![(0, 1)], ActionMeta::None),
            parent_callback_id: None,
            causing_spell: None,
            impacted_coords: Some(smallvec![(0, 1)]),
            deaths: vec![CellDeath {
                coords: (0, 1),
                owner: Some(Player::Player1),
                was_master: false,
            }],
            updated_context: GameContext::new(Board::empty(3), ResourceBundle::default()),
        };

        let animation = Animation::for_callback(&callback, &AnimationTimings::default());

        let effects: Vec<_> = animation.effects().collect();
        assert!(matches!(effects[0], Effect::Explode { .. }));
        assert!(matches!(effects[1], Effect::Perish { .. }));
    }

    #[test]
    fn player_waits_on_each_delay() {
        let mut animation = Animation::empty();
        animation
            .effect(Effect::ClearHighlight)
            .delay(100)
            .effect(Effect::ClearHighlight);
        let mut player = AnimationPlayer::start(animation, 0, CancelToken::new());
        let mut applied = 0;

        assert_eq!(
            player.poll(0, |_| {
                applied += 1;
                Ok(())
            }),
            PlayerPoll::Sleeping(100)
        );
        assert_eq!(player.poll(50, |_| Ok(())), PlayerPoll::Sleeping(100));
        assert_eq!(
            player.poll(100, |_| {
                applied += 1;
                Ok(())
            }),
            PlayerPoll::Finished
        );
        assert_eq!(applied, 2);
    }

    #[test]
    fn failing_effect_does_not_stop_the_player() {
        let mut animation = Animation::empty();
        animation
            .effect(Effect::ClearHighlight)
            .effect(Effect::Spawn {
                coords: smallvec![(0, 0)],
            });
        let mut player = AnimationPlayer::start(animation, 0, CancelToken::new());
        let mut seen = Vec::new();

        let poll = player.poll(0, |effect| {
            seen.push(effect.clone());
            Err(MatchError::MissingCellElement(0, 0))
        });

        assert_eq!(poll, PlayerPoll::Finished);
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn cancelled_player_keeps_time_but_skips_effects() {
        let mut animation = Animation::empty();
        animation
            .delay(10)
            .effect(Effect::ClearHighlight)
            .delay(10);
        let cancel = CancelToken::new();
        let mut player = AnimationPlayer::start(animation, 0, cancel.clone());
        let mut applied = 0;

        assert_eq!(player.poll(0, |_| Ok(())), PlayerPoll::Sleeping(10));
        cancel.cancel();
        assert_eq!(
            player.poll(10, |_| {
                applied += 1;
                Ok(())
            }),
            PlayerPoll::Sleeping(20)
        );
        assert_eq!(player.poll(20, |_| Ok(())), PlayerPoll::Finished);
        assert_eq!(applied, 0);
    }
}
