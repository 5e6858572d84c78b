use gloo::timers::callback::Timeout;
use skirmish_core as game;
use skirmish_protocol::{self as protocol, ClientMsg};
use wasm_bindgen::JsCast;
use web_time::Instant;
use yew::prelude::*;

use game::{Coord, Coord2, GameAction, Millis, OverlayLease, OverlaySlot, Player, TransientState};

use crate::presenter::RenderState;
use crate::settings::Settings;
use crate::socket::MatchSocket;
use crate::utils::*;

/// Rough tooltip box, a line per state description.
fn tooltip_size(lines: usize) -> game::Size {
    game::Size::new(220.0, 16.0 + 20.0 * lines as f64)
}

fn viewport_size() -> game::Size {
    let window = gloo::utils::window();
    let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value.ok().and_then(|value| value.as_f64()).unwrap_or(0.0)
    };
    game::Size::new(dimension(window.inner_width()), dimension(window.inner_height()))
}

fn state_descriptions(cell: &game::Cell) -> Vec<&'static str> {
    cell.state
        .active_state_descriptions()
        .filter(|text| !text.is_empty())
        .collect()
}

fn css_name(flag: &str) -> String {
    flag.to_lowercase().replace('_', "-")
}

const fn transient_class(transient: TransientState) -> Option<&'static str> {
    match transient {
        TransientState::None => None,
        TransientState::Selected => Some("selected"),
        TransientState::CanBeMovedInto => Some("can-move"),
        TransientState::CanBeSpawnedInto => Some("can-spawn"),
        TransientState::CanBeAttacked => Some("can-attack"),
        TransientState::CanBeSpellTargeted => Some("can-target"),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CellMsg {
    Click(Coord2),
    Hover(Coord2, game::Rect),
    Leave,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Server(String),
    Tick,
    CellEvent(CellMsg),
    EndTurn,
    ToggleTooltips,
    Disconnected,
}

#[derive(Properties, Clone, PartialEq)]
struct CellProps {
    cell: game::Cell,
    transient: TransientState,
    #[prop_or_default]
    effect: Option<&'static str>,
    #[prop_or_default]
    locked: bool,
    callback: Callback<CellMsg>,
}

#[function_component(CellView)]
fn cell_component(props: &CellProps) -> Html {
    let CellProps {
        cell,
        transient,
        effect,
        locked,
        callback,
    } = props.clone();
    let pos = cell.coords();

    let mut class = classes!("cell", transient_class(transient), effect);
    match cell.owner {
        Some(Player::Player1) => class.push("p1"),
        Some(Player::Player2) => class.push("p2"),
        None => {}
    }
    if cell.is_master {
        class.push("master");
    }
    for (name, _) in cell.state.core().iter_names() {
        class.push(format!("core-{}", css_name(name)));
    }
    for (name, _) in cell.state.modifiers().iter_names() {
        class.push(css_name(name));
    }
    if cell.hidden.contains(game::HiddenState::MINE_TRAP) {
        class.push("trap");
    }
    if locked {
        class.push("locked");
    }

    let onclick = {
        let callback = callback.clone();
        Callback::from(move |_: MouseEvent| {
            log::trace!("{:?} click", pos);
            callback.emit(CellMsg::Click(pos));
        })
    };

    let onmouseenter = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            let Some(element) = e
                .current_target()
                .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
            else {
                return;
            };
            let rect = element.get_bounding_client_rect();
            callback.emit(CellMsg::Hover(
                pos,
                game::Rect::new(rect.left(), rect.top(), rect.width(), rect.height()),
            ));
        })
    };

    let onmouseleave = Callback::from(move |_: MouseEvent| callback.emit(CellMsg::Leave));

    html! {
        <td {class} {onclick} {onmouseenter} {onmouseleave}/>
    }
}

#[derive(Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    pub local_player: Player,
    pub server_url: AttrValue,
    pub board_size: Coord,
}

pub(crate) struct GameView {
    settings: Settings,
    view: game::MatchView,
    render: RenderState,
    clock: Instant,
    timer: Option<Timeout>,
    socket: Option<MatchSocket>,
    tooltip: OverlaySlot<Coord2>,
    tooltip_lease: Option<OverlayLease<Coord2>>,
    tooltip_at: Option<game::Point>,
    selected: Option<Coord2>,
    connected: bool,
}

impl GameView {
    fn now(&self) -> Millis {
        Millis::try_from(self.clock.elapsed().as_millis()).unwrap_or(Millis::MAX)
    }

    /// Keeps a single timeout armed for the next deadline of the match view.
    fn schedule(&mut self, ctx: &Context<Self>, deadline: Option<Millis>) {
        let now = self.now();
        self.timer = deadline.map(|at| {
            let delay = u32::try_from(at.saturating_sub(now)).unwrap_or(u32::MAX);
            let link = ctx.link().clone();
            Timeout::new(delay, move || link.send_message(Msg::Tick))
        });
    }

    fn send(&self, msg: ClientMsg) {
        let Some(socket) = &self.socket else {
            log::warn!("not connected, dropping {:?}", msg);
            return;
        };
        if let Err(err) = socket.send(&msg) {
            log::error!("could not send {:?}: {:#}", msg, err);
        }
    }

    fn on_cell_click(&mut self, coords: Coord2) -> bool {
        use game::{ActionKind, ActionMeta};

        if !self.view.can_submit() {
            log::trace!("input locked, ignoring click on {:?}", coords);
            return false;
        }
        let Some(cell) = self.view.rendered_board().cell_at(coords).copied() else {
            return false;
        };

        let player = self.view.local_player();
        let impacted: game::CoordList = [coords].into_iter().collect();
        let action = match (self.selected, cell.transient) {
            (_, transient) if !transient.is_selectable() => None,
            (Some(source), TransientState::CanBeMovedInto) => Some(GameAction {
                kind: ActionKind::Move,
                player,
                source: Some(source),
                impacted,
                meta: ActionMeta::None,
            }),
            (Some(source), TransientState::CanBeAttacked) => Some(GameAction {
                kind: ActionKind::Attack,
                player,
                source: Some(source),
                impacted,
                meta: ActionMeta::None,
            }),
            (_, TransientState::CanBeSpawnedInto) => Some(GameAction {
                kind: ActionKind::Spawn,
                player,
                source: None,
                impacted: impacted.clone(),
                meta: ActionMeta::Spawn { coords: impacted },
            }),
            (_, TransientState::CanBeSpellTargeted) => {
                self.view.spell_description().cloned().map(|spell| GameAction {
                    kind: ActionKind::Spell,
                    player,
                    source: None,
                    impacted,
                    meta: ActionMeta::Spell {
                        spell,
                        formation: Vec::new(),
                    },
                })
            }
            _ => None,
        };

        match action {
            Some(action) => {
                log::debug!("submitting {:?} on {:?}", action.kind, coords);
                self.selected = None;
                self.send(ClientMsg::SubmitAction { action });
            }
            None => {
                self.selected = Some(coords);
                self.send(ClientMsg::RequestPossibleActions { coords });
            }
        }
        true
    }

    fn on_cell_hover(&mut self, coords: Coord2, anchor: game::Rect) -> bool {
        let descriptions = self
            .view
            .rendered_board()
            .cell_at(coords)
            .map(state_descriptions)
            .unwrap_or_default();
        if !self.settings.show_state_tooltips || descriptions.is_empty() {
            return self.hide_tooltip();
        }

        let lease = self.tooltip.acquire(coords, self.settings.tooltip_position);
        self.tooltip_at = lease.place(&anchor, tooltip_size(descriptions.len()), viewport_size());
        self.tooltip_lease = Some(lease);
        true
    }

    fn hide_tooltip(&mut self) -> bool {
        self.tooltip_at = None;
        self.tooltip_lease.take().is_some()
    }

    /// Drops the tooltip once the board no longer has anything to describe under it.
    fn sync_tooltip(&mut self) -> bool {
        let Some(anchor) = self.tooltip.active_anchor() else {
            return false;
        };
        let still_described = self
            .view
            .rendered_board()
            .cell_at(anchor)
            .is_some_and(|cell| !state_descriptions(cell).is_empty());
        if still_described || !self.tooltip.anchor_removed(anchor) {
            return false;
        }
        self.hide_tooltip()
    }

    fn resources_view(&self, player: Player, class: &'static str) -> Html {
        let resources = self.render.resources.of(player);
        html! {
            <aside {class}>
                <span class="hp">{format!("{}/{}", resources.hp, resources.max_hp)}</span>
                <span class="mp">{format!("{}/{}", resources.mp, resources.max_mp)}</span>
            </aside>
        }
    }

    fn tooltip_view(&self) -> Html {
        let (Some(lease), Some(point)) = (&self.tooltip_lease, self.tooltip_at) else {
            return html! {};
        };
        let descriptions = self
            .render
            .board
            .cell_at(lease.anchor())
            .map(state_descriptions)
            .unwrap_or_default();
        let style = format!("left: {}px; top: {}px;", point.left, point.top);
        html! {
            <ul class="tooltip" {style}>
                { for descriptions.into_iter().map(|text| html! { <li>{text}</li> }) }
            </ul>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let settings: Settings = LocalOrDefault::local_or_default();
        let config = settings.match_config(props.board_size);
        let view = game::MatchView::new(config, props.local_player);
        let mut render = RenderState::new(config.board_size);
        view.render_all(&mut render);

        let socket = MatchSocket::connect(
            &props.server_url,
            ctx.link().callback(Msg::Server),
            ctx.link().callback(|_| Msg::Disconnected),
        )
        .map_err(|err| log::error!("{:#}", err))
        .ok();

        Self {
            tooltip: OverlaySlot::new(config.overlay_gap),
            settings,
            view,
            render,
            clock: Instant::now(),
            timer: None,
            connected: socket.is_some(),
            socket,
            tooltip_lease: None,
            tooltip_at: None,
            selected: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use CellMsg::*;
        use Msg::*;

        let now = self.now();
        let mut updated = false;
        let deadline = match msg {
            Server(text) => match protocol::decode(&text, self.view.config().board_size) {
                Ok(event) => self.view.handle_event(event, now, &mut self.render),
                Err(err) => {
                    log::warn!("dropping server message: {}", err);
                    self.view.next_deadline()
                }
            },
            Tick => self.view.poll(now, &mut self.render),
            CellEvent(Click(coords)) => {
                updated = self.on_cell_click(coords);
                self.view.next_deadline()
            }
            CellEvent(Hover(coords, anchor)) => {
                updated = self.on_cell_hover(coords, anchor);
                self.view.next_deadline()
            }
            CellEvent(Leave) => {
                updated = self.hide_tooltip();
                self.view.next_deadline()
            }
            EndTurn => {
                if self.view.can_submit() {
                    self.selected = None;
                    self.send(ClientMsg::EndTurn);
                }
                self.view.next_deadline()
            }
            ToggleTooltips => {
                self.settings.show_state_tooltips = !self.settings.show_state_tooltips;
                self.settings.local_save();
                self.hide_tooltip();
                updated = true;
                self.view.next_deadline()
            }
            Disconnected => {
                updated = std::mem::take(&mut self.connected);
                self.socket = None;
                self.view.next_deadline()
            }
        };

        self.schedule(ctx, deadline);
        let tooltip_changed = self.sync_tooltip();
        self.render.take_dirty() || tooltip_changed || updated
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let local_player = self.view.local_player();
        let interactive = self.render.interaction_enabled;
        let callback = ctx.link().callback(Msg::CellEvent);

        let rows = self.render.board.rows().map(|cells| {
            let cells = cells.map(|cell| {
                let transient = if self.selected == Some(cell.coords()) {
                    TransientState::Selected
                } else {
                    self.render.transient_at(cell)
                };
                let effect = self.render.effects.get(&cell.coords()).copied();
                html! {
                    <CellView
                        cell={*cell}
                        {transient}
                        {effect}
                        locked={!interactive}
                        callback={callback.clone()}
                    />
                }
            });
            html! { <tr>{ for cells }</tr> }
        });

        let (remaining, duration) = self.render.countdown;
        let countdown_style = format!("--remaining: {:.3};", self.view.countdown().fraction_remaining());
        let swap_text = match self.view.turn() {
            Some(turn) if turn.player_to_act == local_player => "Your turn",
            _ => "Opponent's turn",
        };
        let cb_end_turn = ctx.link().callback(|_: MouseEvent| Msg::EndTurn);
        let cb_tooltips = ctx.link().callback(|_: MouseEvent| Msg::ToggleTooltips);

        html! {
            <div class="skirmish" oncontextmenu={Callback::from(move |e: MouseEvent| e.prevent_default())}>
                <nav>
                    { self.resources_view(Player::Player1, "p1") }
                    <span class="countdown" style={countdown_style}>{format!("{}/{}", remaining, duration)}</span>
                    { self.resources_view(Player::Player2, "p2") }
                </nav>
                <table class={classes!(interactive.then_some("playable"))}>
                    { for rows }
                </table>
                if self.render.swap_visible {
                    <div class="turn-swap">{swap_text}</div>
                }
                if let Some(spell) = &self.render.spell {
                    <div class="spell">{spell.display_text()}</div>
                }
                if let Some(error) = &self.render.error {
                    <div class="error">{error.clone()}</div>
                }
                if !self.connected {
                    <div class="error">{"Disconnected"}</div>
                }
                <button onclick={cb_end_turn} disabled={!interactive}>{"End turn"}</button>
                <label class="setting">
                    <input type="checkbox" checked={self.settings.show_state_tooltips} onclick={cb_tooltips}/>
                    {"State tooltips"}
                </label>
                { self.tooltip_view() }
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.view.teardown();
        self.tooltip.release_all();
        self.timer = None;
    }
}
