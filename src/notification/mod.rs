//! Outbound notification delivery

mod dispatcher;

pub use dispatcher::{NotificationDispatch, NotificationHandler};
