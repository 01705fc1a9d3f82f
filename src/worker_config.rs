// src/worker_config.rs
//
// =============================================================================
// RENDER-MANAGER: WORKER CONFIG (v 0.1)
// =============================================================================
//
// `GET /worker_config` hands out the bootstrap XML a worker reads before it
// ever sends a heartbeat: where the Manager lives and what local binary to
// launch. Parsed with `quick-xml`'s serde integration rather than hand-walked
// like the teacher's `workflow/importer.rs` DSL importer, since the document
// shape here is fixed and flat enough that a derived struct reads cleaner
// than a manual element walk.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerConfig {
    pub manager_ip: String,
    pub manager_port: u16,
    pub worker_name: String,
    pub blender_path: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            manager_ip: "localhost".to_string(),
            manager_port: 8000,
            worker_name: "WORKER".to_string(),
            blender_path: "blender".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ManagerSection {
    ip: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct IdentitySection {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlenderSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
struct WorkerConfigXml {
    manager: Option<ManagerSection>,
    identity: Option<IdentitySection>,
    blender: Option<BlenderSection>,
}

/// Reads and parses the XML file at `path`. Any failure - missing file,
/// malformed XML, missing elements - falls back to `WorkerConfig::default()`
/// rather than failing the request; a worker with no config is still worth
/// serving defaults to.
pub fn load_worker_config(path: &Path) -> WorkerConfig {
    let bytes = match std::fs::read_to_string(path) {
        Ok(bytes) => bytes,
        Err(_) => return WorkerConfig::default(),
    };

    match quick_xml::de::from_str::<WorkerConfigXml>(&bytes) {
        Ok(parsed) => {
            let defaults = WorkerConfig::default();
            WorkerConfig {
                manager_ip: parsed
                    .manager
                    .as_ref()
                    .and_then(|m| m.ip.clone())
                    .unwrap_or(defaults.manager_ip),
                manager_port: parsed
                    .manager
                    .as_ref()
                    .and_then(|m| m.port)
                    .unwrap_or(defaults.manager_port),
                worker_name: parsed
                    .identity
                    .as_ref()
                    .and_then(|i| i.name.clone())
                    .unwrap_or(defaults.worker_name),
                blender_path: parsed
                    .blender
                    .as_ref()
                    .and_then(|b| b.path.clone())
                    .unwrap_or(defaults.blender_path),
            }
        }
        Err(e) => {
            log::warn!("Error loading worker config: {e}");
            WorkerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_returns_defaults() {
        let cfg = load_worker_config(Path::new("/does/not/exist.xml"));
        assert_eq!(cfg, WorkerConfig::default());
    }

    #[test]
    fn well_formed_file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("worker_config.xml");
        std::fs::write(
            &path,
            r#"<config>
                <manager><ip>192.168.1.10</ip><port>9000</port></manager>
                <identity><name>RENDER_NODE_1</name></identity>
                <blender><path>/opt/blender/blender</path></blender>
            </config>"#,
        )
        .unwrap();

        let cfg = load_worker_config(&path);
        assert_eq!(cfg.manager_ip, "192.168.1.10");
        assert_eq!(cfg.manager_port, 9000);
        assert_eq!(cfg.worker_name, "RENDER_NODE_1");
        assert_eq!(cfg.blender_path, "/opt/blender/blender");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("worker_config.xml");
        std::fs::write(&path, "<not valid xml").unwrap();
        let cfg = load_worker_config(&path);
        assert_eq!(cfg, WorkerConfig::default());
    }

    #[test]
    fn partial_file_fills_missing_fields_with_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("worker_config.xml");
        std::fs::write(
            &path,
            r#"<config><identity><name>ONLY_NAME</name></identity></config>"#,
        )
        .unwrap();

        let cfg = load_worker_config(&path);
        assert_eq!(cfg.worker_name, "ONLY_NAME");
        assert_eq!(cfg.manager_ip, "localhost");
        assert_eq!(cfg.manager_port, 8000);
        assert_eq!(cfg.blender_path, "blender");
    }
}
