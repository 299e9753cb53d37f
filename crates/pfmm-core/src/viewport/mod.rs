//! Viewport-intersection signals for view animations.
//!
//! A `ViewportNotifier` attaches to one element, drives a boundary-crossing
//! watcher supplied by the host environment, and turns each observation into
//! an `enterViewport` or `exitViewport` signal dispatched on the entry's
//! target. `Element` is a ready-made target with `on_enter` / `on_exit`
//! listener registration.

pub mod element;
pub mod notifier;

pub use element::Element;
pub use notifier::{
    same_target, BatchCallback, BoundingRect, CrossingRecord, IntersectionWatcher,
    ObserverOptions, Threshold, ViewportNotifier, ViewportSignal, ViewportTarget, WatcherFactory,
};
