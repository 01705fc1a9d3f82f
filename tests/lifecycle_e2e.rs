// tests/lifecycle_e2e.rs
//
// Drives `CoordinatorState` directly (no HTTP) through full dispatch cycles,
// including a real output directory so frame-count progress and history
// persistence both exercise the filesystem the way the Manager actually
// will in production.

use render_manager::model::{JobDescriptor, WorkerStatus};
use render_manager::registry::HeartbeatInput;
use render_manager::{CoordinatorState, ManagerConfig};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn config(tmp: &TempDir) -> ManagerConfig {
    ManagerConfig {
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
        worker_timeout: Duration::from_secs(10),
        tick_interval: Duration::from_secs(1),
        history_path: tmp.path().join("job_history.json"),
        worker_config_path: tmp.path().join("worker_config.xml"),
    }
}

fn heartbeat(name: &str, status: WorkerStatus) -> HeartbeatInput {
    HeartbeatInput {
        name: name.to_string(),
        status,
        job_id: None,
        ip: "127.0.0.1".into(),
        frames_rendered: 0,
        jobs_completed: 0,
        errors: 0,
        system_info: None,
    }
}

#[test]
fn single_worker_job_persists_to_history_file_on_disk() {
    let tmp = TempDir::new().unwrap();
    let output_dir = tmp.path().join("scene").join("render");
    fs::create_dir_all(&output_dir).unwrap();
    for i in 0..5 {
        fs::write(output_dir.join(format!("frame_{i:04}.png")), b"x").unwrap();
    }

    let mut state = CoordinatorState::new(config(&tmp));
    let t0 = Instant::now();

    state.queue.append(JobDescriptor {
        blend_file: "scene/scene.blend".into(),
        output_path: output_dir.to_string_lossy().to_string(),
        total_frames: 5,
        frame_range: Default::default(),
        resolution: Default::default(),
        render_engine: "CYCLES".into(),
    });
    state
        .registry
        .observe_heartbeat(heartbeat("W1", WorkerStatus::Ready), t0);

    state.tick(t0);
    assert_eq!(
        state.lifecycle.state(),
        render_manager::model::LifecycleState::Working
    );

    let t1 = t0 + Duration::from_secs(5);
    state
        .registry
        .observe_heartbeat(heartbeat("W1", WorkerStatus::Done), t1);
    state.tick(t1);
    assert_eq!(
        state.lifecycle.state(),
        render_manager::model::LifecycleState::Config
    );

    let t2 = t1 + Duration::from_millis(10);
    state.tick(t2);
    assert_eq!(
        state.lifecycle.state(),
        render_manager::model::LifecycleState::Free
    );

    assert_eq!(state.history.len(), 1);
    assert_eq!(state.history[0].completed_frames, 5);

    let persisted = fs::read_to_string(tmp.path().join("job_history.json")).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&persisted).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0]["blend_file"], "scene/scene.blend");
}

#[test]
fn stale_worker_is_evicted_and_does_not_block_the_barrier() {
    let tmp = TempDir::new().unwrap();
    let mut state = CoordinatorState::new(config(&tmp));
    let t0 = Instant::now();

    state.queue.append(JobDescriptor {
        blend_file: "a.blend".into(),
        output_path: String::new(),
        total_frames: 10,
        frame_range: Default::default(),
        resolution: Default::default(),
        render_engine: "CYCLES".into(),
    });
    state
        .registry
        .observe_heartbeat(heartbeat("W1", WorkerStatus::Ready), t0);
    state
        .registry
        .observe_heartbeat(heartbeat("W2", WorkerStatus::Ready), t0);
    state.tick(t0);
    assert_eq!(
        state.lifecycle.state(),
        render_manager::model::LifecycleState::Working
    );

    // W2 goes silent; only W1 keeps heartbeating and eventually reports done.
    let t1 = t0 + Duration::from_secs(15);
    state
        .registry
        .observe_heartbeat(heartbeat("W1", WorkerStatus::Done), t1);
    state.tick(t1);

    assert_eq!(state.registry.len(), 1, "W2 should have been evicted");
    assert_eq!(
        state.lifecycle.state(),
        render_manager::model::LifecycleState::Config,
        "the only remaining worker is done, so the barrier should clear"
    );
}

#[test]
fn five_queued_jobs_with_no_workers_dispatch_the_head_on_first_tick() {
    let tmp = TempDir::new().unwrap();
    let mut state = CoordinatorState::new(config(&tmp));
    let t0 = Instant::now();

    for i in 0..5 {
        state.queue.append(JobDescriptor {
            blend_file: format!("job_{i}.blend"),
            output_path: String::new(),
            total_frames: 10,
            frame_range: Default::default(),
            resolution: Default::default(),
            render_engine: "CYCLES".into(),
        });
    }
    assert_eq!(state.queue.size(), 5);
    assert_eq!(
        state.lifecycle.state(),
        render_manager::model::LifecycleState::Free,
        "nothing dispatches until the ticker runs"
    );

    // An empty fleet doesn't block dispatch - workers may connect after the
    // job is already in flight. Only a fleet with stragglers still in `done`
    // or with zero `ready` workers holds the barrier.
    state.tick(t0);
    assert_eq!(
        state.lifecycle.state(),
        render_manager::model::LifecycleState::Working
    );
    assert_eq!(state.queue.size(), 4, "head of queue dispatched onto the empty fleet");
}
