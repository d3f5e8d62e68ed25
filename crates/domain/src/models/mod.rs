//! Domain models for the panic button.

pub mod alert;
pub mod notification;
pub mod user;

pub use alert::{AlertKind, AlertRecord, Coordinates};
pub use notification::{AlertNotification, NotificationCategory, ReadStatus};
pub use user::UserRef;
