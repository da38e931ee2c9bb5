use std::sync::Arc;
use std::time::Duration;

use ersha_client::CollectionClient;
use ersha_core::{Device, Page};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, HELP};
use crate::config::ConsoleSettings;
use crate::controller::{Generation, ListController, Reconciled, ReloadRequest};
use crate::error::ConsoleError;
use crate::modal::{Completion, Modal, ModalFlow, ModalOutcome, PendingAction};
use crate::render::{PaginationView, TableView, render_pagination, render_table};
use crate::schedule::Debouncer;
use crate::session::SessionGuard;

/// A one-line message shown under the table until the next command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Everything a view needs to draw the console once.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub table: TableView,
    pub pagination: PaginationView,
    pub modal: Modal,
    /// False while a dialog request is in flight.
    pub trigger_enabled: bool,
    /// Search text typed but not committed yet.
    pub search_pending: bool,
    pub search_text: String,
    pub notice: Option<Notice>,
}

pub trait View {
    fn render(&mut self, frame: &Frame);
}

/// Why [`Console::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    SessionExpired,
    Cancelled,
}

enum Event {
    Loaded {
        generation: Generation,
        result: Result<Page<Device>, ConsoleError>,
    },
    Dialog(Completion),
}

/// The single writer of all console state.
///
/// Requests run as spawned tasks and report back over a channel; nothing else
/// touches the controller, the dialogs or the debouncer.
pub struct Console<C, V> {
    client: Arc<C>,
    view: V,
    controller: ListController,
    modal: ModalFlow,
    session: SessionGuard,
    debouncer: Debouncer<String>,
    search_rx: mpsc::UnboundedReceiver<String>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    refresh_interval: Duration,
    notice: Option<Notice>,
}

impl<C, V> Console<C, V>
where
    C: CollectionClient,
    V: View,
{
    pub fn new(client: C, view: V, session: SessionGuard, settings: ConsoleSettings) -> Self {
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            client: Arc::new(client),
            view,
            controller: ListController::new(settings.page_size),
            modal: ModalFlow::new(),
            session,
            debouncer: Debouncer::new(settings.debounce, search_tx),
            search_rx,
            events_tx,
            events_rx,
            refresh_interval: settings.refresh_interval,
            notice: None,
        }
    }

    /// Drive the console until `quit`, end of input, cancellation or a
    /// rejected session.
    pub async fn run(mut self, mut lines: mpsc::Receiver<String>, cancel: CancellationToken) -> Exit {
        info!(
            page_size = self.controller.query().page_size(),
            refresh_secs = self.refresh_interval.as_secs(),
            "console started"
        );

        let mut refresh =
            tokio::time::interval_at(Instant::now() + self.refresh_interval, self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let initial = self.controller.refresh();
        self.fetch(initial);
        self.redraw();

        let exit = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("console shutting down");
                    break Exit::Cancelled;
                }
                line = lines.recv() => {
                    let Some(line) = line else {
                        info!("input closed");
                        break Exit::Quit;
                    };
                    if self.handle_line(&line) {
                        break Exit::Quit;
                    }
                }
                Some(text) = self.search_rx.recv() => {
                    let request = self.controller.set_search(text);
                    self.fetch(request);
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                _ = refresh.tick() => {
                    if let Some(request) = self.controller.auto_refresh(self.modal.is_active()) {
                        self.fetch(request);
                    }
                }
            }

            if self.session.is_torn_down() {
                break Exit::SessionExpired;
            }
            self.redraw();
        };

        self.debouncer.cancel();
        exit
    }

    fn frame(&self) -> Frame {
        let query = self.controller.query();
        let summary = self.controller.summary();

        Frame {
            table: render_table(self.controller.state(), summary, query),
            pagination: render_pagination(query, summary),
            modal: self.modal.modal().clone(),
            trigger_enabled: self.modal.trigger().is_enabled(),
            search_pending: self.debouncer.is_pending(),
            search_text: query.search_text().to_string(),
            notice: self.notice.clone(),
        }
    }

    fn redraw(&mut self) {
        let frame = self.frame();
        self.view.render(&frame);
    }

    fn fetch(&self, request: ReloadRequest) {
        let client = Arc::clone(&self.client);
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let result = client
                .fetch_page(&request.query)
                .await
                .map_err(ConsoleError::from);
            // Only fails once the console is gone.
            let _ = events.send(Event::Loaded {
                generation: request.generation,
                result,
            });
        });
    }

    fn perform(&self, pending: PendingAction) {
        let client = Arc::clone(&self.client);
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let completion = pending.run(&*client).await;
            let _ = events.send(Event::Dialog(completion));
        });
    }

    fn escalate(&mut self, origin: &str) {
        if !self.session.escalate(origin) {
            debug!(origin, "session already torn down");
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Loaded { generation, result } => {
                match self.controller.apply(generation, result) {
                    Reconciled::Applied | Reconciled::Stale => {}
                    Reconciled::Clamped(request) => self.fetch(request),
                    Reconciled::Failed(e) => {
                        self.notice = Some(Notice::Error(format!("could not load devices: {e}")));
                    }
                    Reconciled::Unauthorized => self.escalate("list reload"),
                }
            }
            Event::Dialog(completion) => match self.modal.finish(completion) {
                ModalOutcome::Opened | ModalOutcome::Kept(_) => {}
                ModalOutcome::Saved(device) => {
                    self.notice = Some(Notice::Info(format!("saved {}", device.name)));
                    let request = self.controller.refresh();
                    self.fetch(request);
                }
                ModalOutcome::Deleted(id) => {
                    self.notice = Some(Notice::Info(format!("deleted {id}")));
                    let request = self.controller.refresh();
                    self.fetch(request);
                }
                ModalOutcome::Aborted(e) => self.notice = Some(Notice::Error(e.to_string())),
                ModalOutcome::Unauthorized => self.escalate("dialog request"),
            },
        }
    }

    /// Returns true when the operator asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        self.notice = None;

        match line.parse::<Command>() {
            Ok(Command::Quit) => true,
            Ok(command) => {
                if let Err(e) = self.handle_command(command) {
                    self.notice = Some(Notice::Error(e.to_string()));
                }
                false
            }
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                false
            }
        }
    }

    fn handle_command(&mut self, command: Command) -> Result<(), ConsoleError> {
        debug!(?command, "handling command");

        match command {
            Command::Sort(column) => {
                let request = self.controller.set_sort(column);
                self.fetch(request);
            }
            Command::Filter(filter) => {
                let request = self.controller.set_filter(filter);
                self.fetch(request);
            }
            Command::Search(text) => self.debouncer.notify(text),
            Command::Page(page) => {
                if let Some(request) = self.controller.go_to_page(page) {
                    self.fetch(request);
                }
            }
            Command::Next => {
                if let Some(request) = self.controller.next_page() {
                    self.fetch(request);
                }
            }
            Command::Prev => {
                if let Some(request) = self.controller.previous_page() {
                    self.fetch(request);
                }
            }
            Command::Refresh => {
                let request = self.controller.refresh();
                self.fetch(request);
            }
            Command::Reset => {
                self.debouncer.cancel();
                let request = self.controller.reset();
                self.fetch(request);
            }
            Command::New => self.modal.open_create()?,
            Command::Edit(id) => {
                let pending = self.modal.begin_edit(id)?;
                self.perform(pending);
            }
            Command::Audit(id) => {
                let pending = self.modal.begin_audit(id)?;
                self.perform(pending);
            }
            Command::Set(field, value) => self.modal.set_field(field, &value)?,
            Command::Save => {
                // Validation failures are shown inside the dialog.
                match self.modal.begin_submit() {
                    Ok(pending) => self.perform(pending),
                    Err(ConsoleError::Validation(_))
                        if matches!(self.modal.modal(), Modal::Create { .. } | Modal::Edit { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
            Command::Delete(id) => {
                let name = self
                    .controller
                    .summary()
                    .and_then(|summary| summary.items.iter().find(|device| device.id == id))
                    .map(|device| device.name.clone());
                self.modal.request_delete(id, name)?;
            }
            Command::Confirm => {
                let pending = self.modal.confirm_delete()?;
                self.perform(pending);
            }
            Command::Cancel => {
                if !self.modal.cancel() {
                    warn!("dialog request still in flight");
                    return Err(ConsoleError::Busy);
                }
            }
            Command::Help => self.notice = Some(Notice::Info(HELP.to_string())),
            Command::Quit => {}
        }

        Ok(())
    }
}
