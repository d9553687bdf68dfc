use super::*;
use glam::Vec3;
use trajectory_engine::Direction;

fn state_with_object() -> AppState {
    let mut state = AppState::new();
    state
        .scene
        .apply(&SceneUpdate::AddCurve {
            points: vec![Vec3::ZERO, Vec3::X],
            closed: false,
            tension: 0.5,
        })
        .expect("Kurve");
    state.scene.objects.insert(AnimatedObject::new(0));
    state
}

#[test]
fn test_object_edit_maps_to_put_object_with_full_state() {
    let state = state_with_object();
    let commands = map_intent_to_commands(
        &state,
        AppIntent::ObjectDirectionChanged {
            index: 0,
            direction: Direction::Rtl,
        },
    );
    let [AppCommand::ApplySceneEdit {
        update: SceneUpdate::PutObject { index, object },
    }] = commands.as_slice()
    else {
        panic!("PutObject erwartet: {:?}", commands);
    };
    assert_eq!(*index, 0);
    assert_eq!(object.direction, Direction::Rtl);
    assert_eq!(object.speed, AnimatedObject::DEFAULT_SPEED);
}

#[test]
fn test_edit_on_missing_object_maps_to_nothing() {
    let state = state_with_object();
    let commands = map_intent_to_commands(
        &state,
        AppIntent::ObjectSpeedChanged {
            index: 5,
            speed: 1.0,
        },
    );
    assert!(commands.is_empty());
}

#[test]
fn test_object_add_uses_selected_curve_and_next_slot() {
    let mut state = state_with_object();
    assert!(map_intent_to_commands(&state, AppIntent::ObjectAddRequested { trajectory_index: None }).is_empty());

    state.selected_curve = Some(0);
    let commands =
        map_intent_to_commands(&state, AppIntent::ObjectAddRequested { trajectory_index: None });
    assert!(matches!(
        commands.as_slice(),
        [AppCommand::ApplySceneEdit {
            update: SceneUpdate::PutObject { index: 1, .. }
        }]
    ));
}

#[test]
fn test_deleting_selected_curve_clears_selection() {
    let mut state = state_with_object();
    state.selected_curve = Some(0);
    let commands =
        map_intent_to_commands(&state, AppIntent::CurveDeleteRequested { curve_index: 0 });
    assert_eq!(commands.len(), 2);
    assert!(matches!(
        commands[1],
        AppCommand::SelectCurve { curve_index: None }
    ));
}

#[test]
fn test_route_remove_stops_sender_first() {
    let state = AppState::new();
    let commands =
        map_intent_to_commands(&state, AppIntent::RouteRemoveRequested { route_id: 3 });
    assert!(matches!(
        commands.as_slice(),
        [
            AppCommand::DisableRoute { route_id: 3 },
            AppCommand::RemoveRoute { route_id: 3 }
        ]
    ));
}

#[test]
fn test_blank_chat_is_dropped() {
    let state = AppState::new();
    assert!(map_intent_to_commands(
        &state,
        AppIntent::ChatSubmitted {
            text: "   ".to_string()
        }
    )
    .is_empty());
}
