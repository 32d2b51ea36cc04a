//! Notification delivery.

pub mod telegram;
