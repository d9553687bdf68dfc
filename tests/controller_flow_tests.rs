use approx::assert_abs_diff_eq;
use std::time::Instant;
use trajectory_osc_studio::osc::Axis;
use trajectory_osc_studio::session::ClientId;
use trajectory_osc_studio::{AppCommand, AppController, AppIntent, AppState, ClientMessage, ServerMessage};
use trajectory_engine::Vec3;

fn connect(controller: &mut AppController, state: &mut AppState, authority: bool) {
    controller
        .handle_intent(
            state,
            AppIntent::ServerMessageReceived {
                message: ServerMessage::Welcome {
                    client_id: ClientId(1),
                    authority,
                    udp_ports: vec![],
                },
            },
        )
        .expect("Welcome sollte ohne Fehler durchlaufen");
}

fn add_line(controller: &mut AppController, state: &mut AppState) {
    controller
        .handle_intent(
            state,
            AppIntent::CurveAddRequested {
                points: vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(11.0, 0.0, 0.0)],
                closed: false,
            },
        )
        .expect("Kurve sollte angelegt werden");
}

#[test]
fn test_offline_edits_are_not_queued() {
    let mut controller = AppController::new();
    let mut state = AppState::new();

    add_line(&mut controller, &mut state);

    assert_eq!(state.curve_count(), 1);
    assert!(state.drain_outbox().is_empty());
    assert!(matches!(
        state.command_log.entries().last(),
        Some(AppCommand::ApplySceneEdit { .. })
    ));
}

#[test]
fn test_local_edit_is_published_after_welcome() {
    let mut controller = AppController::new();
    let mut state = AppState::new();
    connect(&mut controller, &mut state, true);

    add_line(&mut controller, &mut state);

    let outbox = state.drain_outbox();
    assert_eq!(outbox.len(), 1);
    match &outbox[0] {
        ClientMessage::UpdateScene(payload) => assert_eq!(payload["kind"], "addCurve"),
        other => panic!("Unerwartete Nachricht: {other:?}"),
    }
}

#[test]
fn test_remote_edit_is_applied_but_not_echoed() {
    let mut controller = AppController::new();
    let mut state = AppState::new();
    connect(&mut controller, &mut state, false);

    let update = serde_json::json!({
        "kind": "addCurve",
        "points": [[0.0, 0.0, 0.0], [5.0, 0.0, 0.0]],
    });
    controller
        .handle_intent(
            &mut state,
            AppIntent::ServerMessageReceived {
                message: ServerMessage::UpdateScene {
                    from: ClientId(7),
                    update,
                },
            },
        )
        .expect("Remote-Edit sollte ohne Fehler durchlaufen");

    assert_eq!(state.curve_count(), 1);
    assert!(state.drain_outbox().is_empty());
}

#[test]
fn test_route_toggle_is_idempotent_and_drives_send_osc() {
    let mut controller = AppController::new();
    let mut state = AppState::new();
    connect(&mut controller, &mut state, true);
    add_line(&mut controller, &mut state);
    controller
        .handle_intent(&mut state, AppIntent::ObjectAddRequested { trajectory_index: Some(0) })
        .expect("Objekt sollte angelegt werden");
    controller
        .handle_intent(&mut state, AppIntent::RouteAddRequested)
        .expect("Route sollte angelegt werden");
    state.drain_outbox();

    for _ in 0..2 {
        controller
            .handle_intent(&mut state, AppIntent::RouteToggled { route_id: 0, enabled: true })
            .expect("Route sollte starten");
    }
    let starts = state
        .drain_outbox()
        .into_iter()
        .filter(|m| matches!(m, ClientMessage::StartSendOsc { route_id: 0 }))
        .count();
    assert_eq!(starts, 1, "Doppeltes Aktivieren darf nur einmal starten");

    controller.tick_animation(&mut state, 1.0);
    let sent = controller.tick_osc(&mut state, Instant::now());
    assert_eq!(sent, 1);
    match state.drain_outbox().as_slice() {
        [ClientMessage::SendOsc {
            route_id: 0,
            port_index: 0,
            messages,
        }] => {
            assert_eq!(messages[0].address, "/source/1/xyz");
            assert_eq!(messages[0].args.len(), 3);
            assert_abs_diff_eq!(messages[0].args[0], 1.0, epsilon = 1e-4);
            assert_abs_diff_eq!(messages[0].args[1], 0.0, epsilon = 1e-4);
        }
        other => panic!("Unerwartete Nachrichten: {other:?}"),
    }

    for _ in 0..2 {
        controller
            .handle_intent(&mut state, AppIntent::RouteToggled { route_id: 0, enabled: false })
            .expect("Route sollte stoppen");
    }
    assert_eq!(state.drain_outbox(), vec![ClientMessage::StopSendOsc { route_id: 0 }]);
    assert_eq!(controller.tick_osc(&mut state, Instant::now()), 0);
}

#[test]
fn test_invalid_route_input_is_reported_to_caller() {
    let mut controller = AppController::new();
    let mut state = AppState::new();
    controller
        .handle_intent(&mut state, AppIntent::RouteAddRequested)
        .expect("Route sollte angelegt werden");

    let err = controller
        .handle_intent(
            &mut state,
            AppIntent::RouteScaleChanged {
                route_id: 0,
                axis: Axis::Y,
                expr: "/0".into(),
            },
        )
        .expect_err("Division durch 0 muss abgelehnt werden");
    assert!(!err.to_string().is_empty());

    let route = state.routes.get(0).expect("Route sollte existieren");
    assert!(route.scale[Axis::Y.index()].is_identity());
}

#[test]
fn test_invalid_udp_port_is_rejected_without_message() {
    let mut controller = AppController::new();
    let mut state = AppState::new();
    connect(&mut controller, &mut state, true);

    let result = controller.handle_intent(
        &mut state,
        AppIntent::UdpPortAddRequested {
            local_port: "80".into(),
            remote_port: "7002".into(),
            remote_address: "127.0.0.1".into(),
        },
    );
    assert!(result.is_err());
    assert!(state.drain_outbox().is_empty());

    controller
        .handle_intent(
            &mut state,
            AppIntent::UdpPortAddRequested {
                local_port: "5002".into(),
                remote_port: "7002".into(),
                remote_address: "127.0.0.1".into(),
            },
        )
        .expect("Gültiger Port sollte akzeptiert werden");
    assert_eq!(
        state.drain_outbox(),
        vec![ClientMessage::AddUdpPort {
            local_port: 5002,
            remote_port: 7002,
            remote_address: "127.0.0.1".into(),
        }]
    );
}

#[test]
fn test_follower_cannot_load_scene() {
    let mut controller = AppController::new();
    let mut state = AppState::new();
    connect(&mut controller, &mut state, false);

    let result = controller.handle_intent(
        &mut state,
        AppIntent::SceneLoaded {
            snapshot: Default::default(),
        },
    );
    assert!(result.is_err());
}

#[test]
fn test_connection_lost_resets_session() {
    let mut controller = AppController::new();
    let mut state = AppState::new();
    connect(&mut controller, &mut state, true);
    assert!(state.session.is_connected());

    controller
        .handle_intent(&mut state, AppIntent::ConnectionLost)
        .expect("ConnectionLost sollte ohne Fehler durchlaufen");
    assert!(!state.session.is_connected());

    controller
        .handle_intent(&mut state, AppIntent::PingRequested)
        .expect("Ping sollte ohne Fehler durchlaufen");
    assert!(state.drain_outbox().is_empty());
}

#[test]
fn test_authority_clear_and_load_are_published() {
    let mut controller = AppController::new();
    let mut state = AppState::new();
    connect(&mut controller, &mut state, true);
    add_line(&mut controller, &mut state);
    let saved = state.scene.snapshot();
    state.drain_outbox();

    controller
        .handle_intent(&mut state, AppIntent::SceneClearRequested)
        .expect("Leeren sollte ohne Fehler durchlaufen");
    match state.drain_outbox().as_slice() {
        [ClientMessage::UpdateScene(payload)] => assert_eq!(payload["kind"], "clearScene"),
        other => panic!("Unerwartete Nachrichten: {other:?}"),
    }

    controller
        .handle_intent(&mut state, AppIntent::SceneLoaded { snapshot: saved })
        .expect("Laden sollte ohne Fehler durchlaufen");
    assert_eq!(state.curve_count(), 1);
    match state.drain_outbox().as_slice() {
        [ClientMessage::UpdateScene(payload)] => {
            assert_eq!(payload["kind"], "replaceScene");
            assert_eq!(payload["scene"]["curves"].as_array().map(Vec::len), Some(1));
        }
        other => panic!("Unerwartete Nachrichten: {other:?}"),
    }
}
