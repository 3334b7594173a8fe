//! Mock implementations for broadcast testing
//!
//! This module provides a scripted messenger so fan-out behavior can be
//! tested without any network traffic.

pub mod mock_messenger;

pub use mock_messenger::{MockMessenger, MockMessengerConfig};
