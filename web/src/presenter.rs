use std::collections::HashMap;
use std::rc::Rc;

use skirmish_core::*;

/// Everything the page draws, written by the match view through [`Presenter`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RenderState {
    pub board: Rc<Board>,
    pub resources: ResourceBundle,
    pub highlights: HashMap<Coord2, TransientState>,
    pub effects: HashMap<Coord2, &'static str>,
    pub interaction_enabled: bool,
    pub swap_visible: bool,
    pub spell: Option<Spell>,
    pub error: Option<String>,
    pub countdown: (u32, u32),
    dirty: bool,
}

impl RenderState {
    pub fn new(size: Coord) -> Self {
        Self {
            board: Rc::new(Board::empty(size)),
            resources: ResourceBundle::default(),
            highlights: HashMap::new(),
            effects: HashMap::new(),
            interaction_enabled: false,
            swap_visible: false,
            spell: None,
            error: None,
            countdown: (0, 0),
            dirty: true,
        }
    }

    /// Whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Annotation to draw on a cell: a running highlight wins over the board's own.
    pub fn transient_at(&self, cell: &Cell) -> TransientState {
        self.highlights
            .get(&cell.coords())
            .copied()
            .unwrap_or(cell.transient)
    }

    fn check(&self, coords: Coord2) -> Result<Coord2> {
        self.board
            .cell_at(coords)
            .map(Cell::coords)
            .ok_or(MatchError::MissingCellElement(coords.0, coords.1))
    }

    fn mark(&mut self, coords: &[Coord2], class: &'static str) -> Result<()> {
        for &pos in coords {
            self.check(pos)?;
            self.effects.insert(pos, class);
        }
        Ok(())
    }
}

impl Presenter for RenderState {
    fn render_board(&mut self, board: &Rc<Board>) {
        if !Rc::ptr_eq(&self.board, board) {
            self.board = Rc::clone(board);
            self.effects.clear();
            self.dirty = true;
        }
    }

    fn render_resources(&mut self, resources: &ResourceBundle) {
        if self.resources != *resources {
            self.resources = *resources;
            self.dirty = true;
        }
    }

    fn play_effect(&mut self, effect: &Effect) -> Result<()> {
        self.dirty = true;
        match effect {
            Effect::Highlight { coords, annotation } => {
                for &pos in coords {
                    self.check(pos)?;
                    self.highlights.insert(pos, *annotation);
                }
                Ok(())
            }
            Effect::ClearHighlight => {
                self.highlights.clear();
                self.effects.clear();
                Ok(())
            }
            Effect::Move { from, to, .. } => {
                self.mark(&[*from], "moving-out")?;
                self.mark(&[*to], "moving-in")
            }
            Effect::Strike { to, ranged, .. } => {
                self.mark(&[*to], if *ranged { "shot" } else { "struck" })
            }
            Effect::Spawn { coords } => self.mark(coords, "spawning"),
            Effect::Explode { coords } => self.mark(coords, "exploding"),
            Effect::Perish { coords } => self.mark(coords, "perishing"),
            Effect::SpellDescription(spell) => {
                self.spell = Some(spell.clone());
                Ok(())
            }
        }
    }

    fn set_interaction_enabled(&mut self, enabled: bool) {
        self.interaction_enabled = enabled;
        self.dirty = true;
    }

    fn set_turn_swap_visible(&mut self, visible: bool) {
        self.swap_visible = visible;
        self.dirty = true;
    }

    fn set_spell_description(&mut self, spell: Option<&Spell>) {
        self.spell = spell.cloned();
        self.dirty = true;
    }

    fn set_action_error(&mut self, message: Option<&str>) {
        self.error = message.map(str::to_owned);
        self.dirty = true;
    }

    fn set_countdown(&mut self, remaining_secs: u32, duration_secs: u32) {
        if self.countdown != (remaining_secs, duration_secs) {
            self.countdown = (remaining_secs, duration_secs);
            self.dirty = true;
        }
    }
}
