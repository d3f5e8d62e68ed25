//! Panic button services.
//!
//! Collaborators are traits so hosts can plug real location, storage and
//! network implementations; in-memory versions live next to each trait.

pub mod context;
pub mod geo;
pub mod gesture;
pub mod history;
pub mod lifecycle;
pub mod panic_button;
pub mod remote;
pub mod session;
pub mod storage;

pub use context::{AlertContext, AlertSnapshot, LifecyclePhase};
pub use geo::{FixedGeoProvider, GeoProvider};
pub use gesture::{
    ActivationIntent, GestureEvent, GestureInterpreter, GesturePhase, GestureThresholds,
};
pub use history::AlertHistory;
pub use lifecycle::{AlertLifecycleController, LifecycleConfig, Transition};
pub use panic_button::{GestureOutcome, PanicButton};
pub use remote::{AlertRemoteClient, MockAlertRemoteClient};
pub use session::{clear_session, load_session, save_session};
pub use storage::{InMemoryStateStore, SecureStateStore, ACTIVE_ALERT_KEY, USER_SESSION_KEY};
