pub mod config;
pub mod editor;
pub mod history;
pub mod ingest;
pub mod input;
pub mod scheduler;
pub mod session;
pub mod shortcuts;
pub mod store;

pub use config::{ConfigError, EditorConfig};
pub use editor::Editor;
pub use history::{HistoryManager, HistorySnapshot};
pub use ingest::IngestError;
pub use input::InputEvent;
pub use scheduler::{Clock, Scheduler, SystemClock, TimerKey, VirtualClock};
pub use session::{
    CoordinateMapper, InteractionSession, NoCapture, PointerCapture, PointerTarget, SessionAction, SessionState,
    ViewportMapper,
};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{DocumentChange, DocumentStore, EditorTab, SubscriptionId};
