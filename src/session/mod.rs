//! Session state: what this client has sent and where each job stands.

mod tracker;

pub use tracker::{JobRecord, SessionTracker, Stage};
