//! Round-Trip-Messung über `pingCheck`/`pongCheck`.

use std::collections::VecDeque;

/// Hält die letzten RTT-Messungen in Millisekunden.
#[derive(Debug, Clone, Default)]
pub struct LatencyProbe {
    samples: VecDeque<u64>,
}

impl LatencyProbe {
    const MAX_SAMPLES: usize = 16;

    pub fn new() -> Self {
        Self::default()
    }

    /// Verbucht ein Pong. Zeitstempel aus der Zukunft zählen als 0 ms.
    pub fn record_pong(&mut self, sent_at_ms: u64, now_ms: u64) -> u64 {
        let rtt = now_ms.saturating_sub(sent_at_ms);
        if self.samples.len() >= Self::MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt);
        rtt
    }

    pub fn last_rtt_ms(&self) -> Option<u64> {
        self.samples.back().copied()
    }

    pub fn average_rtt_ms(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().sum();
        Some(sum as f32 / self.samples.len() as f32)
    }
}
