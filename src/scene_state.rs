//! Application state shared by the frame loop and the blessing flow.
//!
//! [`SceneState`] is mutated only by the display toggle and by blessing
//! completions; everything else reads it. Blessing requests are tagged with
//! a monotonically increasing sequence number so a slow, superseded response
//! cannot overwrite a newer one.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use crate::blessing::{Blessing, BlessingClient, BlessingTransport};

/// Proof that a request was started, carrying its sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneState {
    is_formed: bool,
    blessing: Option<Blessing>,
    loading: bool,
    info_open: bool,
    latest_request: u64,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            is_formed: true,
            blessing: None,
            loading: false,
            info_open: false,
            latest_request: 0,
        }
    }
}

impl SceneState {
    pub fn new(is_formed: bool) -> Self {
        Self {
            is_formed,
            ..Self::default()
        }
    }

    pub fn is_formed(&self) -> bool {
        self.is_formed
    }

    pub fn blessing(&self) -> Option<&Blessing> {
        self.blessing.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_info_open(&self) -> bool {
        self.info_open
    }

    /// Flip the display state.
    pub fn toggle(&mut self) -> bool {
        self.is_formed = !self.is_formed;
        self.is_formed
    }

    /// Open or close the info panel.
    pub fn toggle_info(&mut self) -> bool {
        self.info_open = !self.info_open;
        self.info_open
    }

    /// Start a request: show loading, clear the old blessing and assemble
    /// the tree. The returned ticket supersedes every earlier one.
    pub fn begin_blessing_request(&mut self) -> RequestTicket {
        self.latest_request += 1;
        self.loading = true;
        self.blessing = None;
        self.is_formed = true;
        RequestTicket(self.latest_request)
    }

    /// Apply a result if `ticket` is still the latest. Returns whether it was
    /// applied.
    pub fn complete_blessing_request(&mut self, ticket: RequestTicket, blessing: Blessing) -> bool {
        if ticket.0 != self.latest_request {
            log::debug!(
                "Discarding stale blessing #{} (latest is #{})",
                ticket.0,
                self.latest_request
            );
            return false;
        }
        self.blessing = Some(blessing);
        self.loading = false;
        true
    }
}

/// Centre panel content.
#[derive(Clone, Debug, PartialEq)]
pub enum Panel {
    Empty,
    Loading { text: &'static str },
    Blessing { blessing: Blessing, again_label: &'static str },
}

/// Side panel describing the piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoPanel {
    pub title: &'static str,
    pub body: &'static str,
}

pub const INFO_PANEL: InfoPanel = InfoPanel {
    title: "The Arix Tree",
    body: "A digital sculpture exploring the intersection of procedural geometry and luxury \
           aesthetics. Toggle \"Deconstruct\" to witness the entropy of the emerald stars.",
};

/// Everything the overlay shows for a given state.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayView {
    pub info_label: &'static str,
    pub info_panel: Option<InfoPanel>,
    pub toggle_label: &'static str,
    pub panel: Panel,
    /// "RECEIVE BLESSING" button, when shown.
    pub request_button: Option<&'static str>,
}

pub const INFO_OPEN_LABEL: &str = "Experience Info";
pub const INFO_CLOSE_LABEL: &str = "Close Controls";
pub const DECONSTRUCT_LABEL: &str = "DECONSTRUCT";
pub const HARMONIZE_LABEL: &str = "HARMONIZE";
pub const LOADING_TEXT: &str = "DIVINING WISH...";
pub const REQUEST_LABEL: &str = "RECEIVE BLESSING";
pub const AGAIN_LABEL: &str = "Request Another";

/// Pure mapping from state to visible overlay. Loading wins over a blessing.
pub fn overlay_view(state: &SceneState) -> OverlayView {
    let panel = if state.loading {
        Panel::Loading { text: LOADING_TEXT }
    } else if let Some(blessing) = &state.blessing {
        Panel::Blessing {
            blessing: blessing.clone(),
            again_label: AGAIN_LABEL,
        }
    } else {
        Panel::Empty
    };

    OverlayView {
        info_label: if state.info_open {
            INFO_CLOSE_LABEL
        } else {
            INFO_OPEN_LABEL
        },
        info_panel: state.info_open.then_some(INFO_PANEL),
        toggle_label: if state.is_formed {
            DECONSTRUCT_LABEL
        } else {
            HARMONIZE_LABEL
        },
        request_button: matches!(panel, Panel::Empty).then_some(REQUEST_LABEL),
        panel,
    }
}

/// Drives blessing requests against shared state on a single thread.
pub struct BlessingFlow<T> {
    state: Rc<RefCell<SceneState>>,
    client: Rc<BlessingClient<T>>,
}

impl<T> Clone for BlessingFlow<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            client: Rc::clone(&self.client),
        }
    }
}

impl<T: BlessingTransport + 'static> BlessingFlow<T> {
    pub fn new(state: Rc<RefCell<SceneState>>, client: BlessingClient<T>) -> Self {
        Self {
            state,
            client: Rc::new(client),
        }
    }

    pub fn state(&self) -> &Rc<RefCell<SceneState>> {
        &self.state
    }

    /// Start a request now and return the future that completes it.
    ///
    /// The state changes to loading before this returns. The future resolves
    /// to whether its result was applied (false when superseded).
    pub fn request_blessing(&self, name: Option<String>) -> impl Future<Output = bool> + 'static {
        let ticket = self.state.borrow_mut().begin_blessing_request();
        let state = Rc::clone(&self.state);
        let client = Rc::clone(&self.client);
        async move {
            let blessing = client.request_blessing(name.as_deref()).await;
            let mut state = state.borrow_mut();
            state.complete_blessing_request(ticket, blessing)
        }
    }
}
