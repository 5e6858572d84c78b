use std::rc::Rc;

use crate::*;

/// Arrival order of events carrying an authoritative context, stamped as they come in.
pub type Arrival = u64;

/// Single writer of the rendered board and resources.
///
/// Every update swaps in a fresh `Rc<Board>`, cells are never patched in place, so a reader can compare pointers to
/// know when to redraw. Resources only ever come from authoritative contexts, and a context never replaces one that
/// arrived after it.
#[derive(Clone, Debug)]
pub struct BoardReconciler {
    local_player: Player,
    authoritative: Option<GameContext>,
    authoritative_arrival: Arrival,
    arrivals: Arrival,
    deferred: bool,
    rendered: Rc<Board>,
    resources: ResourceBundle,
    revision: u64,
}

impl BoardReconciler {
    pub fn new(local_player: Player, size: Coord) -> Self {
        Self {
            local_player,
            authoritative: None,
            authoritative_arrival: 0,
            arrivals: 0,
            deferred: false,
            rendered: Rc::new(Board::empty(size)),
            resources: ResourceBundle::default(),
            revision: 0,
        }
    }

    pub fn local_player(&self) -> Player {
        self.local_player
    }

    pub fn rendered(&self) -> &Rc<Board> {
        &self.rendered
    }

    /// Bumped on every board replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn resources(&self) -> &ResourceBundle {
        &self.resources
    }

    /// Last context confirmed by the engine, `None` before the first one arrives.
    ///
    /// Stored without transient annotations.
    pub fn authoritative(&self) -> Option<&GameContext> {
        self.authoritative.as_ref()
    }

    /// Next arrival stamp, for a job about to enter the queue.
    pub fn stamp(&mut self) -> Arrival {
        self.arrivals += 1;
        self.arrivals
    }

    /// Renders the preview board as is. The authoritative context stays untouched.
    pub fn apply_possible_actions(&mut self, event: PossibleActions) {
        log::trace!("rendering possible actions of {:?}", event.player);
        self.replace(event.transient_board);
    }

    /// Settles a processed action after its animation.
    ///
    /// The submitter sees its optimistic board when the engine sent one, everybody else the authoritative board.
    pub fn settle_processed(&mut self, event: ProcessedAction, arrival: Arrival) {
        let ProcessedAction {
            player,
            updated_context,
            overriding_transient_board,
            ..
        } = event;

        let authoritative_board = self.accept(updated_context, arrival);
        let board = match overriding_transient_board {
            Some(board) if player == self.local_player => {
                log::trace!("rendering overriding board for {:?}", player);
                board
            }
            _ => authoritative_board,
        };
        self.replace(board);
    }

    pub fn settle_callback(&mut self, callback: ActionCallback, arrival: Arrival) {
        log::trace!("rendering context of callback #{}", callback.id);
        let board = self.accept(callback.updated_context, arrival);
        self.replace(board);
    }

    /// Takes a turn context's snapshot as authoritative. Without `render` its board waits for
    /// [`Self::flush_deferred`].
    pub fn apply_turn_context(&mut self, context: GameContext, render: bool) {
        let arrival = self.stamp();
        let board = self.accept(context, arrival);
        if render {
            self.replace(board);
        } else {
            self.deferred = true;
        }
    }

    pub fn settle(&mut self, job: QueuedJob, arrival: Arrival) {
        match job {
            QueuedJob::Processed(event) => self.settle_processed(event, arrival),
            QueuedJob::Callback(callback) => self.settle_callback(callback, arrival),
        }
    }

    /// Renders the authoritative board held back during a drain. Returns whether the board changed.
    pub fn flush_deferred(&mut self) -> bool {
        if !std::mem::take(&mut self.deferred) {
            return false;
        }
        let Some(board) = self.authoritative.as_ref().map(|context| context.board.clone()) else {
            return false;
        };
        log::trace!("rendering deferred authoritative board");
        self.replace(board);
        true
    }

    /// Adopts `context` unless a newer one is already authoritative, returns its board to render.
    fn accept(&mut self, mut context: GameContext, arrival: Arrival) -> Board {
        context.board = context.board.without_transient();
        let board = context.board.clone();
        if arrival < self.authoritative_arrival {
            log::debug!(
                "context #{} is older than authoritative #{}, keeping the newer one",
                arrival,
                self.authoritative_arrival
            );
        } else {
            self.deferred = false;
            self.resources = context.resources;
            self.authoritative_arrival = arrival;
            self.authoritative = Some(context);
        }
        board
    }

    fn replace(&mut self, board: Board) {
        self.rendered = Rc::new(board);
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn resources(hp: u32) -> ResourceBundle {
        ResourceBundle {
            player1: PlayerResources {
                hp,
                max_hp: 30,
                mp: 1,
                max_mp: 10,
            },
            player2: PlayerResources::default(),
        }
    }

    fn board_marked(size: Coord, coords: Coord2) -> Board {
        Board::empty(size).annotated(&[coords], TransientState::Selected)
    }

    fn board_with_unit(size: Coord, coords: Coord2) -> Board {
        let mut board = Board::empty(size);
        if let Some(cell) = board.cell_at_mut(coords) {
            cell.owner = Some(Player::Player1);
        }
        board
    }

    fn processed(player: Player, overriding: Option<Board>) -> ProcessedAction {
        ProcessedAction {
            action: GameAction {
                kind: ActionKind::Attack,
                player,
                source: Some((2, 2)),
                impacted: smallvec![(2, 3)],
                meta: ActionMeta::None,
            },
            player,
            updated_context: GameContext::new(board_with_unit(4, (0, 0)), resources(20)),
            overriding_transient_board: overriding,
        }
    }

    fn callback(id: u64, board: Board, hp: u32) -> ActionCallback {
        ActionCallback {
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
            impacted_coords: None,
            deaths: vec![],
            updated_context: GameContext::new(board, resources(hp)),
        }
    }

    #[test]
    fn possible_actions_replace_board_but_not_authoritative_state() {
        let mut reconciler = BoardReconciler::new(Player::Player1, 4);
        let before = Rc::clone(reconciler.rendered());
        let preview = board_marked(4, (1, 1));

        reconciler.apply_possible_actions(PossibleActions {
            player: Player::Player1,
            transient_board: preview.clone(),
            previewed_spell: None,
        });

        assert!(!Rc::ptr_eq(&before, reconciler.rendered()));
        assert_eq!(**reconciler.rendered(), preview);
        assert_eq!(reconciler.authoritative(), None);
        assert_eq!(reconciler.resources(), &ResourceBundle::default());
    }

    #[test]
    fn local_processed_action_prefers_overriding_board() {
        let mut reconciler = BoardReconciler::new(Player::Player1, 4);
        let optimistic = board_marked(4, (3, 3));

        let arrival = reconciler.stamp();
        reconciler.settle_processed(processed(Player::Player1, Some(optimistic.clone())), arrival);

        assert_eq!(**reconciler.rendered(), optimistic);
        assert_eq!(reconciler.resources().player1.hp, 20);
        assert_eq!(
            reconciler.authoritative().map(|context| &context.board),
            Some(&board_with_unit(4, (0, 0)))
        );
    }

    #[test]
    fn opponent_processed_action_renders_authoritative_board() {
        let mut reconciler = BoardReconciler::new(Player::Player1, 4);

        let arrival = reconciler.stamp();
        reconciler.settle_processed(processed(Player::Player2, Some(board_marked(4, (3, 3)))), arrival);

        assert_eq!(**reconciler.rendered(), board_with_unit(4, (0, 0)));
    }

    #[test]
    fn authoritative_snapshots_drop_transient_annotations() {
        let mut reconciler = BoardReconciler::new(Player::Player1, 4);
        let mut annotated = board_marked(4, (1, 1));
        if let Some(cell) = annotated.cell_at_mut((2, 2)) {
            cell.hidden = HiddenState::MINE_TRAP;
        }

        let arrival = reconciler.stamp();
        reconciler.settle_callback(callback(1, annotated.clone(), 5), arrival);

        let stored = reconciler.authoritative().map(|context| &context.board);
        assert_eq!(stored, Some(&annotated.without_transient()));
        assert_eq!(**reconciler.rendered(), annotated.without_transient());
        assert_eq!(reconciler.rendered()[(1, 1)].transient, TransientState::None);
        assert_eq!(reconciler.rendered()[(2, 2)].hidden, HiddenState::MINE_TRAP);

        reconciler.apply_turn_context(GameContext::new(annotated, resources(5)), true);
        assert_eq!(reconciler.rendered()[(1, 1)].transient, TransientState::None);
    }

    #[test]
    fn silent_turn_context_updates_resources_without_rendering() {
        let mut reconciler = BoardReconciler::new(Player::Player2, 4);

        reconciler.apply_turn_context(GameContext::new(board_marked(4, (1, 2)), resources(7)), false);

        assert_eq!(reconciler.revision(), 0);
        assert_eq!(reconciler.resources().player1.hp, 7);
        assert!(reconciler.authoritative().is_some());
    }

    #[test]
    fn older_job_settles_its_board_but_keeps_newer_context() {
        let mut reconciler = BoardReconciler::new(Player::Player1, 4);
        let job_board = board_with_unit(4, (0, 0));
        let turn_board = board_with_unit(4, (3, 3));

        let arrival = reconciler.stamp();
        reconciler.apply_turn_context(GameContext::new(turn_board.clone(), resources(9)), false);
        reconciler.settle_callback(callback(1, job_board.clone(), 5), arrival);

        assert_eq!(**reconciler.rendered(), job_board);
        assert_eq!(reconciler.resources().player1.hp, 9);
        assert_eq!(
            reconciler.authoritative().map(|context| &context.board),
            Some(&turn_board)
        );

        assert!(reconciler.flush_deferred());
        assert_eq!(**reconciler.rendered(), turn_board);
        assert!(!reconciler.flush_deferred());
    }

    #[test]
    fn newer_job_supersedes_deferred_turn_board() {
        let mut reconciler = BoardReconciler::new(Player::Player1, 4);
        let job_board = board_with_unit(4, (1, 0));

        reconciler.apply_turn_context(GameContext::new(Board::empty(4), resources(9)), false);
        let arrival = reconciler.stamp();
        reconciler.settle_callback(callback(2, job_board.clone(), 3), arrival);

        assert_eq!(reconciler.resources().player1.hp, 3);
        assert!(!reconciler.flush_deferred());
        assert_eq!(**reconciler.rendered(), job_board);
    }

    #[test]
    fn every_update_is_a_new_board() {
        let mut reconciler = BoardReconciler::new(Player::Player1, 4);
        let context = GameContext::new(Board::empty(4), resources(5));

        reconciler.apply_turn_context(context.clone(), true);
        let first = Rc::clone(reconciler.rendered());
        reconciler.apply_turn_context(context, true);

        assert_eq!(*first, **reconciler.rendered());
        assert!(!Rc::ptr_eq(&first, reconciler.rendered()));
        assert_eq!(reconciler.revision(), 2);
    }
}
