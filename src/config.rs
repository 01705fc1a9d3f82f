// src/config.rs
//
// =============================================================================
// RENDER-MANAGER: CONFIGURATION (v 0.1)
// =============================================================================
//
// No flags, no environment variables - the Manager's defaults are the
// contract. This differs from the teacher's `main.rs`, which drives
// everything through `clap::Subcommand`; that flexibility has no
// counterpart here because the original this spec was distilled from reads
// no configuration at all, and nothing downstream needs it to.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub struct ManagerConfig {
    pub bind_addr: SocketAddr,
    pub worker_timeout: Duration,
    pub tick_interval: Duration,
    pub history_path: PathBuf,
    pub worker_config_path: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000),
            worker_timeout: Duration::from_secs(10),
            tick_interval: Duration::from_secs(1),
            history_path: PathBuf::from("job_history.json"),
            worker_config_path: PathBuf::from("worker_config.xml"),
        }
    }
}
