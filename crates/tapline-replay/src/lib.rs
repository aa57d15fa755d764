//! A recorded-device bridge.
//!
//! [`ReplayBridge`] serves UI trees from a [`DeviceFixture`] instead of a live
//! accessibility service, applies the effects of node operations to its copy
//! of the screens, and keeps an [`ReplayEvent`] log of everything the engine
//! asked for.

pub mod bridge;
pub mod fixture;

pub use bridge::{ReplayBridge, ReplayEvent};
pub use fixture::{DeviceFixture, FixtureApp, ReplayError, Transition, Trigger};
