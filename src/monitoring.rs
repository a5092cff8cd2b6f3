//! Modulo per il monitoraggio delle statistiche del processo server
//!
//! Raccoglie e logga l'utilizzo **del processo corrente** (CPU e memoria)
//! a intervalli configurabili tramite `sysinfo`. Lo scopo è isolare il
//! consumo dell'applicazione, non la media della macchina.

use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::time;
use tracing::{info, warn};

/// Intervallo di campionamento di default (2 minuti)
pub const DEFAULT_INTERVAL_SECS: u64 = 120;

/// Statistiche del processo raccolte in un dato momento
#[derive(Debug, Clone)]
pub struct ProcessStats {
    /// Timestamp della raccolta
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Percentuale di utilizzo CPU nell'intervallo
    pub cpu_percentage: f32,
    /// Memoria usata dal processo in MB
    pub memory_usage_mb: f64,
}

impl ProcessStats {
    /// Formatta le statistiche come stringa per il logging
    pub fn format_for_log(&self) -> String {
        format!(
            "[{}] CPU Usage: {:.2}% | Memory: {:.2} MB",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.cpu_percentage,
            self.memory_usage_mb
        )
    }
}

fn sample(system: &mut System, pid: Pid) -> Option<ProcessStats> {
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    let process = system.process(pid)?;

    Some(ProcessStats {
        timestamp: chrono::Utc::now(),
        cpu_percentage: process.cpu_usage(),
        memory_usage_mb: process.memory() as f64 / (1024.0 * 1024.0),
    })
}

/// Avvia il task di monitoraggio del processo corrente
pub fn spawn_process_monitor(interval_secs: u64) {
    tokio::spawn(async move {
        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new();
        let mut interval = time::interval(Duration::from_secs(interval_secs.max(1)));

        // il primo tick scatta subito, lo consumiamo per avere un intervallo pieno
        interval.tick().await;

        loop {
            interval.tick().await;

            match sample(&mut system, pid) {
                Some(stats) => info!("{}", stats.format_for_log()),
                None => warn!("Process stats not available"),
            }
        }
    });
}
