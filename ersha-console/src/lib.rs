pub mod command;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod modal;
pub mod query;
pub mod render;
pub mod schedule;
pub mod session;

pub use command::{Command, CommandError};
pub use config::{BackendConfig, Config, ConsoleConfig, ConsoleSettings};
pub use console::{Console, Exit, Frame, Notice, View};
pub use controller::{
    Generation, ListController, LoadState, Reconciled, ReloadRequest, ResultSummary,
};
pub use error::ConsoleError;
pub use modal::{Completion, Modal, ModalFlow, ModalOutcome, PendingAction, TriggerControl};
pub use query::{Filter, QueryState};
pub use schedule::{Debouncer, ScheduledTask};
pub use session::{SessionGuard, SessionHandler};
