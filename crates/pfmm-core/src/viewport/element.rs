use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::notifier::{CrossingRecord, ViewportSignal, ViewportTarget};

type Listener = Box<dyn Fn(&CrossingRecord) + Send + Sync>;

/// A named viewport target with enter/exit listener registration.
///
/// Listeners run in registration order on the thread that delivers the batch.
/// Registering a listener from inside a listener deadlocks.
#[derive(Default)]
pub struct Element {
    name: String,
    enter: Mutex<Vec<Listener>>,
    exit: Mutex<Vec<Listener>>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            ..Self::default()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn on_enter<F>(&self, listener: F)
    where
        F: Fn(&CrossingRecord) + Send + Sync + 'static,
    {
        self.listeners(ViewportSignal::Enter).push(Box::new(listener));
    }

    pub fn on_exit<F>(&self, listener: F)
    where
        F: Fn(&CrossingRecord) + Send + Sync + 'static,
    {
        self.listeners(ViewportSignal::Exit).push(Box::new(listener));
    }

    fn listeners(&self, signal: ViewportSignal) -> std::sync::MutexGuard<'_, Vec<Listener>> {
        let slot = match signal {
            ViewportSignal::Enter => &self.enter,
            ViewportSignal::Exit => &self.exit,
        };
        // A panicking listener must not silence the element for good
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ViewportTarget for Element {
    fn dispatch(&self, signal: ViewportSignal, record: &CrossingRecord) {
        for listener in self.listeners(signal).iter() {
            listener(record);
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_listeners_receive_their_signal_only() {
        let element = Element::new("gallery");
        let entered = Arc::new(AtomicUsize::new(0));
        let exited = Arc::new(AtomicUsize::new(0));

        let counter = entered.clone();
        element.on_enter(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = exited.clone();
        element.on_exit(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let record = CrossingRecord::new(element.clone(), true);
        element.dispatch(ViewportSignal::Enter, &record);
        element.dispatch(ViewportSignal::Enter, &record);
        element.dispatch(ViewportSignal::Exit, &record);

        assert_eq!(entered.load(Ordering::SeqCst), 2);
        assert_eq!(exited.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_sees_crossing_record() {
        let element = Element::new("banner");
        let ratio = Arc::new(Mutex::new(None));
        let seen = ratio.clone();
        element.on_enter(move |record| {
            *seen.lock().unwrap() = Some(record.intersection_ratio);
        });

        let mut record = CrossingRecord::new(element.clone(), true);
        record.intersection_ratio = 0.75;
        element.dispatch(ViewportSignal::Enter, &record);

        assert_eq!(*ratio.lock().unwrap(), Some(0.75));
        assert_eq!(element.name(), "banner");
    }
}
