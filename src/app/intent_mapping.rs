//! Mapping von UI-Intents auf mutierende App-Commands.

use super::{AppCommand, AppIntent, AppState};
use trajectory_engine::{AnimatedObject, SceneUpdate};

/// Übersetzt einen `AppIntent` in eine Sequenz ausführbarer `AppCommand`s.
pub fn map_intent_to_commands(state: &AppState, intent: AppIntent) -> Vec<AppCommand> {
    let edit = |update| vec![AppCommand::ApplySceneEdit { update }];

    match intent {
        AppIntent::CurveAddRequested { points, closed } => edit(SceneUpdate::AddCurve {
            points,
            closed,
            tension: trajectory_engine::spline::DEFAULT_TENSION,
        }),
        AppIntent::ControlPointAddRequested {
            curve_index,
            position,
        } => edit(SceneUpdate::AddControlPoint {
            curve_index,
            position,
        }),
        AppIntent::ControlPointMoved {
            point_index,
            position,
        } => edit(SceneUpdate::MoveControlPoint {
            point_index,
            position,
        }),
        AppIntent::ControlPointDeleteRequested { point_index } => {
            edit(SceneUpdate::DeleteControlPoint { point_index })
        }
        AppIntent::CurveDeleteRequested { curve_index } => {
            let mut commands = edit(SceneUpdate::DeleteCurve { curve_index });
            if state.selected_curve == Some(curve_index) {
                commands.push(AppCommand::SelectCurve { curve_index: None });
            }
            commands
        }
        AppIntent::TensionChanged {
            curve_index,
            tension,
        } => edit(SceneUpdate::SetTension {
            curve_index,
            tension,
        }),
        AppIntent::ClosedToggled {
            curve_index,
            closed,
        } => edit(SceneUpdate::SetClosed {
            curve_index,
            closed,
        }),
        AppIntent::CurveSelected { curve_index } => vec![AppCommand::SelectCurve { curve_index }],

        AppIntent::ObjectAddRequested { trajectory_index } => {
            let Some(trajectory_index) = trajectory_index.or(state.selected_curve) else {
                log::warn!("Objekt nicht angelegt: keine Kurve ausgewählt");
                return vec![];
            };
            edit(SceneUpdate::PutObject {
                index: state.scene.objects.slot_count(),
                object: AnimatedObject::new(trajectory_index),
            })
        }
        AppIntent::ObjectDeleteRequested { index } => edit(SceneUpdate::DeleteObject { index }),
        AppIntent::ObjectSpeedChanged { index, speed } => {
            modify_object(state, index, |o| o.speed = speed)
        }
        AppIntent::ObjectAnimateToggled { index, animate } => {
            modify_object(state, index, |o| o.animate = animate)
        }
        AppIntent::ObjectLoopToggled { index, looping } => {
            modify_object(state, index, |o| o.looping = looping)
        }
        AppIntent::ObjectDirectionChanged { index, direction } => {
            modify_object(state, index, |o| o.direction = direction)
        }
        AppIntent::ObjectTrajectoryChanged {
            index,
            trajectory_index,
        } => modify_object(state, index, |o| {
            o.trajectory_index = trajectory_index;
            o.position = 0.0;
        }),
        AppIntent::ObjectPositionChanged { index, position } => {
            modify_object(state, index, |o| o.position = position.clamp(0.0, 1.0))
        }
        AppIntent::TriggerAddRequested { trajectory_index } => {
            let Some(trajectory_index) = trajectory_index.or(state.selected_curve) else {
                log::warn!("Trigger nicht angelegt: keine Kurve ausgewählt");
                return vec![];
            };
            edit(SceneUpdate::PutTrigger {
                index: state.scene.triggers.slot_count(),
                trigger: AnimatedObject::trigger(trajectory_index),
            })
        }
        AppIntent::TriggerDeleteRequested { index } => edit(SceneUpdate::DeleteTrigger { index }),

        AppIntent::SceneLoaded { snapshot } => vec![AppCommand::LoadScene { snapshot }],
        AppIntent::SceneClearRequested => vec![AppCommand::ClearScene],

        AppIntent::UdpPortAddRequested {
            local_port,
            remote_port,
            remote_address,
        } => vec![AppCommand::AddUdpPort {
            local_port,
            remote_port,
            remote_address,
        }],
        AppIntent::UdpPortRemoveRequested {
            local_port,
            remote_port,
        } => vec![AppCommand::RemoveUdpPort {
            local_port,
            remote_port,
        }],

        AppIntent::RouteAddRequested => vec![AppCommand::AddRoute],
        AppIntent::RouteRemoveRequested { route_id } => vec![
            AppCommand::DisableRoute { route_id },
            AppCommand::RemoveRoute { route_id },
        ],
        AppIntent::RoutePortChanged {
            route_id,
            port_index,
        } => vec![AppCommand::SetRoutePort {
            route_id,
            port_index,
        }],
        AppIntent::RouteAddressChanged { route_id, address } => {
            vec![AppCommand::SetRouteAddress { route_id, address }]
        }
        AppIntent::RouteScaleChanged {
            route_id,
            axis,
            expr,
        } => vec![AppCommand::SetRouteScale {
            route_id,
            axis,
            expr,
        }],
        AppIntent::RouteSourceChanged {
            route_id,
            axis,
            source,
        } => vec![AppCommand::SetRouteSource {
            route_id,
            axis,
            source,
        }],
        AppIntent::RouteToggled { route_id, enabled } => {
            if enabled {
                vec![AppCommand::EnableRoute { route_id }]
            } else {
                vec![AppCommand::DisableRoute { route_id }]
            }
        }

        AppIntent::ServerMessageReceived { message } => {
            vec![AppCommand::ApplyServerMessage { message }]
        }
        AppIntent::ConnectionLost => vec![AppCommand::ResetSession],
        AppIntent::PingRequested => vec![AppCommand::SendPing],
        AppIntent::ChatSubmitted { text } => {
            let text = text.trim();
            if text.is_empty() {
                vec![]
            } else {
                vec![AppCommand::SendChat {
                    text: text.to_string(),
                }]
            }
        }
        AppIntent::AuthorityClaimRequested => vec![AppCommand::ClaimAuthority],

        AppIntent::OptionsChanged { options } => vec![AppCommand::ApplyOptions { options }],
    }
}

/// Ändert eine Kopie des Objekts und setzt sie als Ganzes (`PutObject`).
fn modify_object(
    state: &AppState,
    index: usize,
    change: impl FnOnce(&mut AnimatedObject),
) -> Vec<AppCommand> {
    let Some(object) = state.scene.objects.get(index) else {
        log::warn!("Objekt {} existiert nicht", index);
        return vec![];
    };
    let mut object = object.clone();
    change(&mut object);
    vec![AppCommand::ApplySceneEdit {
        update: SceneUpdate::PutObject { index, object },
    }]
}

#[cfg(test)]
mod tests;
