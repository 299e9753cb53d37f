use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// The two signals a notifier emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportSignal {
    Enter,
    Exit,
}

impl ViewportSignal {
    /// Event name as seen by listeners
    pub fn event_name(&self) -> &'static str {
        match self {
            ViewportSignal::Enter => "enterViewport",
            ViewportSignal::Exit => "exitViewport",
        }
    }
}

impl fmt::Display for ViewportSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Something signals can be dispatched on. Owned by the host, never by the notifier.
pub trait ViewportTarget: Send + Sync {
    fn dispatch(&self, signal: ViewportSignal, record: &CrossingRecord);
}

/// Identity comparison for targets (data pointer only).
pub fn same_target(a: &Arc<dyn ViewportTarget>, b: &Arc<dyn ViewportTarget>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One observation delivered by the watcher.
#[derive(Clone)]
pub struct CrossingRecord {
    pub target: Arc<dyn ViewportTarget>,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
    pub bounding_rect: BoundingRect,
}

impl CrossingRecord {
    pub fn new(target: Arc<dyn ViewportTarget>, is_intersecting: bool) -> Self {
        Self {
            target,
            is_intersecting,
            intersection_ratio: if is_intersecting { 1.0 } else { 0.0 },
            bounding_rect: BoundingRect::default(),
        }
    }

    pub fn signal(&self) -> ViewportSignal {
        if self.is_intersecting {
            ViewportSignal::Enter
        } else {
            ViewportSignal::Exit
        }
    }
}

impl fmt::Debug for CrossingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossingRecord")
            .field("target", &Arc::as_ptr(&self.target))
            .field("is_intersecting", &self.is_intersecting)
            .field("intersection_ratio", &self.intersection_ratio)
            .field("bounding_rect", &self.bounding_rect)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    Single(f64),
    List(Vec<f64>),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Single(0.0)
    }
}

/// Passed through to the watcher untouched.
#[derive(Clone, Default)]
pub struct ObserverOptions {
    pub threshold: Threshold,
    /// Reference viewport; `None` means the top-level viewport.
    pub root: Option<Arc<dyn ViewportTarget>>,
    /// CSS-style margin around the root, e.g. `"0px 0px -10% 0px"`.
    pub root_margin: Option<String>,
}

impl fmt::Debug for ObserverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverOptions")
            .field("threshold", &self.threshold)
            .field("root", &self.root.as_ref().map(Arc::as_ptr))
            .field("root_margin", &self.root_margin)
            .finish()
    }
}

/// Called by the watcher with each batch of observations, in its own order.
pub type BatchCallback = Arc<dyn Fn(&[CrossingRecord]) + Send + Sync>;

/// Boundary-crossing observation primitive provided by the host environment.
///
/// Delivery of batches happens out of band through the callback handed to
/// the factory; `observe` must not deliver synchronously.
pub trait IntersectionWatcher: Send {
    fn observe(&mut self, target: &Arc<dyn ViewportTarget>);
    fn unobserve(&mut self, target: &Arc<dyn ViewportTarget>);
}

pub trait WatcherFactory {
    type Watcher: IntersectionWatcher;

    fn create(&self, options: &ObserverOptions, on_batch: BatchCallback) -> Self::Watcher;
}

impl<F, W> WatcherFactory for F
where
    F: Fn(&ObserverOptions, BatchCallback) -> W,
    W: IntersectionWatcher,
{
    type Watcher = W;

    fn create(&self, options: &ObserverOptions, on_batch: BatchCallback) -> W {
        self(options, on_batch)
    }
}

fn dispatch_batch(entries: &[CrossingRecord]) {
    for entry in entries {
        entry.target.dispatch(entry.signal(), entry);
    }
}

/// Watches one element and signals when it enters or leaves the viewport.
///
/// The watcher is released exactly once: on the first `destroy()` or on drop.
pub struct ViewportNotifier<W: IntersectionWatcher> {
    element: Arc<dyn ViewportTarget>,
    watcher: Option<W>,
}

impl<W: IntersectionWatcher> ViewportNotifier<W> {
    pub fn attach<F>(element: Arc<dyn ViewportTarget>, options: ObserverOptions, factory: &F) -> Self
    where
        F: WatcherFactory<Watcher = W>,
    {
        let on_batch: BatchCallback = Arc::new(|entries: &[CrossingRecord]| dispatch_batch(entries));
        let mut watcher = factory.create(&options, on_batch);
        watcher.observe(&element);
        debug!(options = ?options, "Viewport notifier attached");

        Self {
            element,
            watcher: Some(watcher),
        }
    }

    pub fn element(&self) -> &Arc<dyn ViewportTarget> {
        &self.element
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stop observing the element. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.unobserve(&self.element);
            debug!("Viewport notifier destroyed");
        }
    }
}

impl<W: IntersectionWatcher> Drop for ViewportNotifier<W> {
    fn drop(&mut self) {
        self.destroy();
    }
}
