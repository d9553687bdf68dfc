//! Headless-Wiedergabe: Szene animieren und Routen direkt über UDP senden.
//!
//! Ohne Relay und ohne Session. Animation und OSC laufen mit getrennten
//! Taktungen; der OSC-Takt liest immer den zuletzt berechneten Frame.

use crate::osc::{dispatch_route, EndpointConfig, EndpointFactory, EndpointPool, OscRoute, OscRouteTable};
use crate::shared::StudioOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use trajectory_engine::{FrameSnapshot, Scene, SceneSnapshot};

/// UDP-Endpunkte und Routen für `play`, als TOML ladbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    pub endpoints: Vec<EndpointConfig>,
    pub routes: Vec<OscRoute>,
}

impl PlayConfig {
    /// Ein Endpunkt aus den Optionen plus eine aktive Broadcast-Route.
    pub fn from_options(options: &StudioOptions) -> Self {
        Self {
            endpoints: vec![EndpointConfig {
                local_port: options.osc_local_port,
                remote_port: options.osc_remote_port,
                remote_address: options.osc_remote_address,
            }],
            routes: vec![OscRoute {
                enabled: true,
                ..OscRoute::default()
            }],
        }
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Routen-Datei nicht lesbar: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Routen-Datei fehlerhaft: {}", path.display()))?;
        log::info!("Routen geladen aus: {}", path.display());
        Ok(config)
    }
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self::from_options(&StudioOptions::default())
    }
}

/// Liest einen Szenen-Snapshot (JSON) von der Platte.
pub fn load_scene(path: &Path, options: &StudioOptions) -> anyhow::Result<Scene> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Szenen-Datei nicht lesbar: {}", path.display()))?;
    let snapshot: SceneSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Szenen-Datei fehlerhaft: {}", path.display()))?;
    let scene = Scene::from_snapshot(snapshot, options.sampling_settings())?;
    log::info!(
        "Szene geladen: {} Kurven, {} Objekte, {} Trigger",
        scene.curves.len(),
        scene.objects.len(),
        scene.triggers.len()
    );
    Ok(scene)
}

/// Besitzt Szene, Routen und UDP-Pool einer Wiedergabe.
pub struct Player<F: EndpointFactory> {
    scene: Scene,
    routes: OscRouteTable,
    pool: EndpointPool<F>,
    frame: FrameSnapshot,
    source_id_offset: usize,
}

impl<F: EndpointFactory> Player<F> {
    /// Öffnet alle Endpunkte und übernimmt die Routen.
    /// Ein einzelner fehlerhafter Endpunkt bricht nicht ab.
    pub fn new(
        scene: Scene,
        config: PlayConfig,
        mut pool: EndpointPool<F>,
        options: &StudioOptions,
        now: Instant,
    ) -> Self {
        for endpoint in &config.endpoints {
            if let Err(e) = pool.open(
                endpoint.local_port,
                endpoint.remote_port,
                endpoint.remote_address,
            ) {
                log::warn!("UDP-Port {} übersprungen: {}", endpoint.local_port, e);
            }
        }

        let mut routes = OscRouteTable::new(options.osc_interval());
        for route in config.routes {
            routes.add(route, now);
        }

        Self {
            scene,
            routes,
            pool,
            frame: FrameSnapshot::default(),
            source_id_offset: options.source_id_offset,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn routes(&self) -> &OscRouteTable {
        &self.routes
    }

    pub fn pool(&self) -> &EndpointPool<F> {
        &self.pool
    }

    pub fn frame(&self) -> &FrameSnapshot {
        &self.frame
    }

    /// Ein Animations-Frame.
    pub fn step_animation(&mut self, step: f32) -> &FrameSnapshot {
        self.frame = self.scene.tick(step);
        &self.frame
    }

    /// Sendet alle fälligen Routen; liefert die Anzahl der Pakete.
    pub fn dispatch_due(&mut self, now: Instant) -> usize {
        let mut sent = 0;
        for route_id in self.routes.due(now) {
            if let Some(route) = self.routes.get(route_id) {
                sent += dispatch_route(route, &self.frame.objects, self.source_id_offset, &mut self.pool);
            }
        }
        sent
    }

    /// Läuft bis Ctrl-C.
    pub async fn run(&mut self, options: &StudioOptions) -> anyhow::Result<()> {
        let mut animation = tokio::time::interval(options.animation_tick());
        animation.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let step = 1.0;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        log::info!(
            "Wiedergabe gestartet: {} Routen, {} UDP-Ports",
            self.routes.len(),
            self.pool.len()
        );

        loop {
            let next_osc = self
                .routes
                .next_due()
                .map(tokio::time::Instant::from_std)
                .unwrap_or_else(|| tokio::time::Instant::now() + options.osc_interval());

            tokio::select! {
                result = &mut shutdown => {
                    result.context("Ctrl-C-Handler fehlgeschlagen")?;
                    log::info!("Wiedergabe beendet");
                    break;
                }
                _ = animation.tick() => {
                    self.step_animation(step);
                }
                _ = tokio::time::sleep_until(next_osc) => {
                    let sent = self.dispatch_due(Instant::now());
                    log::trace!("{} OSC-Pakete gesendet", sent);
                }
            }
        }

        self.routes.disable_all();
        self.pool.close_all();
        Ok(())
    }
}
