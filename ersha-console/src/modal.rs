use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ersha_client::CollectionClient;
use ersha_core::{AuditEntry, Device, DeviceDraft, DeviceId, DraftField};
use tracing::{info, warn};

use crate::error::ConsoleError;

/// Enabled/disabled state of the button that starts a request.
#[derive(Debug, Clone, Default)]
pub struct TriggerControl {
    busy: Arc<AtomicBool>,
}

impl TriggerControl {
    pub fn is_enabled(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// Disable the trigger until the returned guard is dropped.
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }
}

/// Re-enables its trigger when dropped, however the request ended.
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    Closed,
    /// Waiting for a device or its audit log before anything can be shown.
    Opening { id: DeviceId },
    Create {
        draft: DeviceDraft,
        error: Option<ConsoleError>,
    },
    Edit {
        id: DeviceId,
        draft: DeviceDraft,
        error: Option<ConsoleError>,
    },
    ConfirmDelete {
        id: DeviceId,
        name: Option<Box<str>>,
        error: Option<ConsoleError>,
    },
    Audit {
        id: DeviceId,
        entries: Vec<AuditEntry>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    FetchForEdit(DeviceId),
    FetchAudit(DeviceId),
    Create(DeviceDraft),
    Update(DeviceId, DeviceDraft),
    Delete(DeviceId),
}

/// A request the modal flow wants performed.
///
/// Holds the trigger disabled until [`run`](PendingAction::run) completes or
/// the action is dropped.
#[derive(Debug)]
pub struct PendingAction {
    action: Action,
    _guard: InFlightGuard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Fetched(Result<Device, ConsoleError>),
    Audit(Result<Vec<AuditEntry>, ConsoleError>),
    Saved(Result<Device, ConsoleError>),
    Deleted {
        id: DeviceId,
        result: Result<(), ConsoleError>,
    },
}

impl PendingAction {
    pub async fn run<C>(self, client: &C) -> Completion
    where
        C: CollectionClient + ?Sized,
    {
        match self.action {
            Action::FetchForEdit(id) => {
                Completion::Fetched(client.fetch_one(&id).await.map_err(Into::into))
            }
            Action::FetchAudit(id) => {
                Completion::Audit(client.fetch_audit_log(&id).await.map_err(Into::into))
            }
            Action::Create(draft) => {
                Completion::Saved(client.create(&draft).await.map_err(Into::into))
            }
            Action::Update(id, draft) => {
                Completion::Saved(client.update(&id, &draft).await.map_err(Into::into))
            }
            Action::Delete(id) => {
                let result = client.delete(&id).await.map_err(Into::into);
                Completion::Deleted { id, result }
            }
        }
    }
}

/// What the list controller has to do after a completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalOutcome {
    /// An edit form or audit view is now showing.
    Opened,
    Saved(Device),
    Deleted(DeviceId),
    /// The dialog stays open with the error shown inline.
    Kept(ConsoleError),
    /// The dialog could not be opened.
    Aborted(ConsoleError),
    Unauthorized,
}

/// Create, edit, delete and audit dialogs as short request/response cycles.
#[derive(Debug)]
pub struct ModalFlow {
    modal: Modal,
    trigger: TriggerControl,
}

impl Default for ModalFlow {
    fn default() -> Self {
        Self {
            modal: Modal::Closed,
            trigger: TriggerControl::default(),
        }
    }
}

impl ModalFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn trigger(&self) -> &TriggerControl {
        &self.trigger
    }

    /// Open dialogs and requests in flight both count.
    pub fn is_active(&self) -> bool {
        self.modal != Modal::Closed || !self.trigger.is_enabled()
    }

    fn ensure_closed(&self) -> Result<(), ConsoleError> {
        if self.modal == Modal::Closed {
            Ok(())
        } else {
            Err(ConsoleError::Validation(
                "close the current dialog first".to_string(),
            ))
        }
    }

    fn acquire(&self, action: Action) -> Result<PendingAction, ConsoleError> {
        let guard = self.trigger.try_acquire().ok_or(ConsoleError::Busy)?;
        Ok(PendingAction {
            action,
            _guard: guard,
        })
    }

    pub fn open_create(&mut self) -> Result<(), ConsoleError> {
        self.ensure_closed()?;
        self.modal = Modal::Create {
            draft: DeviceDraft::default(),
            error: None,
        };
        Ok(())
    }

    pub fn begin_edit(&mut self, id: DeviceId) -> Result<PendingAction, ConsoleError> {
        self.ensure_closed()?;
        let pending = self.acquire(Action::FetchForEdit(id.clone()))?;
        self.modal = Modal::Opening { id };
        Ok(pending)
    }

    pub fn begin_audit(&mut self, id: DeviceId) -> Result<PendingAction, ConsoleError> {
        self.ensure_closed()?;
        let pending = self.acquire(Action::FetchAudit(id.clone()))?;
        self.modal = Modal::Opening { id };
        Ok(pending)
    }

    pub fn set_field(&mut self, field: DraftField, value: &str) -> Result<(), ConsoleError> {
        match &mut self.modal {
            Modal::Create { draft, .. } | Modal::Edit { draft, .. } => {
                draft.set(field, value).map_err(ConsoleError::from)
            }
            _ => Err(ConsoleError::Validation(
                "no create or edit dialog is open".to_string(),
            )),
        }
    }

    /// Validate the open draft and hand back the save request.
    ///
    /// A draft that fails validation is never sent; the error is kept inline.
    pub fn begin_submit(&mut self) -> Result<PendingAction, ConsoleError> {
        let action = match &self.modal {
            Modal::Create { draft, .. } => Action::Create(draft.clone()),
            Modal::Edit { id, draft, .. } => Action::Update(id.clone(), draft.clone()),
            _ => {
                return Err(ConsoleError::Validation(
                    "no create or edit dialog is open".to_string(),
                ));
            }
        };

        if let Action::Create(draft) | Action::Update(_, draft) = &action
            && let Err(e) = draft.validate()
        {
            let e = ConsoleError::from(e);
            self.set_inline_error(Some(e.clone()));
            return Err(e);
        }

        let pending = self.acquire(action)?;
        self.set_inline_error(None);
        Ok(pending)
    }

    /// First phase of a delete: ask for confirmation.
    pub fn request_delete(
        &mut self,
        id: DeviceId,
        name: Option<Box<str>>,
    ) -> Result<(), ConsoleError> {
        self.ensure_closed()?;
        self.modal = Modal::ConfirmDelete {
            id,
            name,
            error: None,
        };
        Ok(())
    }

    pub fn confirm_delete(&mut self) -> Result<PendingAction, ConsoleError> {
        let Modal::ConfirmDelete { id, .. } = &self.modal else {
            return Err(ConsoleError::Validation(
                "nothing is awaiting confirmation".to_string(),
            ));
        };
        self.acquire(Action::Delete(id.clone()))
    }

    /// Close the dialog. Refused while its request is in flight.
    pub fn cancel(&mut self) -> bool {
        if !self.trigger.is_enabled() {
            return false;
        }
        self.modal = Modal::Closed;
        true
    }

    fn set_inline_error(&mut self, err: Option<ConsoleError>) {
        match &mut self.modal {
            Modal::Create { error, .. }
            | Modal::Edit { error, .. }
            | Modal::ConfirmDelete { error, .. } => *error = err,
            _ => {}
        }
    }

    pub fn finish(&mut self, completion: Completion) -> ModalOutcome {
        let failed = match &completion {
            Completion::Fetched(Err(e))
            | Completion::Audit(Err(e))
            | Completion::Saved(Err(e))
            | Completion::Deleted { result: Err(e), .. } => Some(e),
            _ => None,
        };
        if let Some(e) = failed {
            if e.is_auth() {
                self.modal = Modal::Closed;
                return ModalOutcome::Unauthorized;
            }
            warn!(error = %e, "dialog request failed");
        }

        match completion {
            Completion::Fetched(Ok(device)) => {
                self.modal = Modal::Edit {
                    draft: DeviceDraft::from(&device),
                    id: device.id,
                    error: None,
                };
                ModalOutcome::Opened
            }
            Completion::Audit(Ok(entries)) => {
                let Modal::Opening { id } = &self.modal else {
                    return ModalOutcome::Opened;
                };
                self.modal = Modal::Audit {
                    id: id.clone(),
                    entries,
                };
                ModalOutcome::Opened
            }
            Completion::Fetched(Err(e)) | Completion::Audit(Err(e)) => {
                self.modal = Modal::Closed;
                ModalOutcome::Aborted(e)
            }
            Completion::Saved(Ok(device)) => {
                info!(id = %device.id, name = %device.name, "device saved");
                self.modal = Modal::Closed;
                ModalOutcome::Saved(device)
            }
            Completion::Deleted { id, result: Ok(()) } => {
                info!(id = %id, "device deleted");
                self.modal = Modal::Closed;
                ModalOutcome::Deleted(id)
            }
            Completion::Saved(Err(e)) | Completion::Deleted { result: Err(e), .. } => {
                self.set_inline_error(Some(e.clone()));
                ModalOutcome::Kept(e)
            }
        }
    }
}
