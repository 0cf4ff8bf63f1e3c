//! Unit tests for lifecycle states and readiness flags

use keel_domain::value_objects::LifecycleState;

#[test]
fn test_default_state_is_not_started() {
    assert_eq!(LifecycleState::default(), LifecycleState::NotStarted);
    assert_eq!(LifecycleState::NotStarted.readiness().flags(), [false; 4]);
}

#[test]
fn test_skipping_a_state_is_rejected() {
    let err = LifecycleState::ContainerInitialised
        .transition_to(LifecycleState::ComponentsRegistered)
        .unwrap_err();
    assert!(err.is_illegal_state());
    assert!(err.to_string().contains("CONTAINER_INITIALISED"));
    assert!(err.to_string().contains("COMPONENTS_REGISTERED"));
}

#[test]
fn test_staying_in_place_is_rejected() {
    for state in LifecycleState::ALL.into_iter().skip(1) {
        assert!(!state.can_transition_to(state));
    }
}

#[test]
fn test_readiness_flags_are_monotonic() {
    let mut previous = [false; 4];
    for state in LifecycleState::ALL {
        let flags = state.readiness().flags();
        for (before, now) in previous.iter().zip(flags.iter()) {
            assert!(!before || *now, "{state} cleared a readiness flag");
        }
        assert_eq!(flags.iter().filter(|f| **f).count(), state.ordinal());
        previous = flags;
    }
}

#[test]
fn test_readiness_reports_state() {
    let readiness = LifecycleState::PluginSystemStarted.readiness();
    assert_eq!(readiness.state, LifecycleState::PluginSystemStarted);
    assert!(readiness.container_initialised);
    assert!(readiness.plugin_system_started);
    assert!(!readiness.components_registered);
    assert!(!readiness.started);
}

#[test]
fn test_readiness_serializes_for_health_checks() {
    let json = serde_json::to_value(LifecycleState::Started.readiness()).unwrap();
    assert_eq!(json["state"], "started");
    assert_eq!(json["started"], true);
}
