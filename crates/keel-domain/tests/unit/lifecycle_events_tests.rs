//! Unit tests for lifecycle events

use keel_domain::error::Result;
use keel_domain::events::LifecycleEvent;
use keel_domain::ports::{EventListener, EventPublisher};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<&'static str>>,
}

impl EventListener for Recorder {
    fn on_event(&self, event: &LifecycleEvent) {
        self.seen.lock().unwrap().push(event.name());
    }
}

#[derive(Default)]
struct MockEventPublisher {
    listeners: Mutex<Vec<Arc<dyn EventListener>>>,
}

impl EventPublisher for MockEventPublisher {
    fn register(&self, listener: Arc<dyn EventListener>) -> Result<()> {
        self.listeners.lock().unwrap().push(listener);
        Ok(())
    }

    fn unregister_all(&self) {
        self.listeners.lock().unwrap().clear();
    }

    fn publish(&self, event: &LifecycleEvent) -> Result<()> {
        for listener in self.listeners.lock().unwrap().iter() {
            listener.on_event(event);
        }
        Ok(())
    }
}

#[test]
fn test_event_names() {
    assert_eq!(LifecycleEvent::ManagerStarted.name(), "manager_started");
    assert_eq!(
        LifecycleEvent::ManagerShuttingDown.name(),
        "manager_shutting_down"
    );
}

#[test]
fn test_event_serialization_round_trip() {
    let json = serde_json::to_string(&LifecycleEvent::ManagerShuttingDown).unwrap();
    assert_eq!(json, r#"{"type":"manager_shutting_down"}"#);
    let back: LifecycleEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, LifecycleEvent::ManagerShuttingDown);
}

#[test]
fn test_publisher_delivers_to_listeners() {
    let publisher = MockEventPublisher::default();
    let recorder = Arc::new(Recorder::default());
    publisher.register(recorder.clone()).unwrap();

    publisher.publish(&LifecycleEvent::ManagerStarted).unwrap();
    publisher.unregister_all();
    publisher.publish(&LifecycleEvent::ManagerShuttingDown).unwrap();

    assert_eq!(*recorder.seen.lock().unwrap(), vec!["manager_started"]);
}

#[test]
fn test_listener_name_defaults_to_type_name() {
    let recorder = Recorder::default();
    assert!(recorder.listener_name().ends_with("Recorder"));
}
