use anyhow::{anyhow, bail};
use skirmish_protocol::ClientMsg;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, MessageEvent, WebSocket};
use yew::Callback;

/// Text websocket to the match server. Handlers are detached and the socket closed on drop.
pub(crate) struct MatchSocket {
    ws: WebSocket,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onclose: Closure<dyn FnMut(Event)>,
}

impl MatchSocket {
    pub fn connect(url: &str, on_text: Callback<String>, on_close: Callback<()>) -> anyhow::Result<Self> {
        let ws = WebSocket::new(url).map_err(|err| anyhow!("could not open {}: {:?}", url, err))?;

        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match event.data().as_string() {
                Some(text) => on_text.emit(text),
                None => log::warn!("ignoring non-text frame"),
            }
        });
        let onclose = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            log::debug!("match socket closed");
            on_close.emit(());
        });
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        log::debug!("connecting to {}", url);

        Ok(Self {
            ws,
            _onmessage: onmessage,
            _onclose: onclose,
        })
    }

    pub fn send(&self, msg: &ClientMsg) -> anyhow::Result<()> {
        if self.ws.ready_state() != WebSocket::OPEN {
            bail!("match socket is not open");
        }
        let text = msg.encode()?;
        log::trace!("sending {}", text);
        self.ws
            .send_with_str(&text)
            .map_err(|err| anyhow!("could not send: {:?}", err))
    }
}

impl Drop for MatchSocket {
    fn drop(&mut self) {
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
        if let Err(err) = self.ws.close() {
            log::debug!("closing match socket failed: {:?}", err);
        }
    }
}
