//! Live update fan-out for the analytics core.
//!
//! This crate provides:
//! - `Subscriber` trait for pluggable delivery channels
//! - In-process channel and HTTP webhook subscriber implementations
//! - `SubscriberRegistry` with heartbeat expiry and send-failure pruning
//! - `LiveMessage`, the envelope every update travels in

pub mod channel;
pub mod registry;
pub mod traits;
pub mod webhook;

pub use channel::ChannelSubscriber;
pub use registry::SubscriberRegistry;
pub use traits::{DeliveryResult, LiveMessage, NotifyError, Subscriber};
pub use webhook::WebhookSubscriber;
