//! Change notification settings.

pub mod propagator;

pub use propagator::NotificationPropagator;
