//! Host-side implementations of the domain collaborators.

pub mod http_alert_client;
pub mod location;

pub use http_alert_client::HttpAlertClient;
pub use location::geo_provider;
