//! Data types for the mail relay

mod notification;

pub use notification::{
    NotificationDefaults, NotificationEvent, WebhookFields, DEFAULT_FROM, DEFAULT_SUBJECT,
    NEW_MAIL_EVENT,
};
