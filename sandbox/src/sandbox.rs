//! [`SharedSandbox`]: one long-lived container holding per-user workspace
//! subtrees, talked to over the local Docker Engine API via `bollard`.
//!
//! `ensure()` resolves or creates the container; every other operation calls
//! `ensure()` first so a container that disappeared out from under us (host
//! restart, manual `docker rm`) gets transparently recreated. Per-user
//! isolation is by working-directory scoping only — the container itself is
//! shared, matching the project's emphasis on bounded shared state over one
//! process-per-tenant.

use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use bollard::container::{Config, CreateContainerOptions, DownloadFromContainerOptions, UploadToContainerOptions};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::models::{HostConfig, Mount, MountTypeEnum};
use bollard::volume::CreateVolumeOptions;
use bollard::Docker;
use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::sync::{Mutex as AsyncMutex, OnceCell};

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::path_safety::resolve_in_workspace;
use crate::state::SandboxState;

/// Exit code reported when a `shell_exec` call's watchdog fires.
pub const TIMEOUT_EXIT_CODE: i64 = -124;
/// Grace period between SIGTERM and SIGKILL when killing a timed-out exec.
const KILL_GRACE_PERIOD: Duration = Duration::from_secs(3);
const TOOL_ASSET_DIR: &str = ".tools";

/// Result of [`SharedSandbox::exec`].
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
    pub truncated: bool,
}

/// One entry from [`SharedSandbox::list`].
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// One long-lived, resource-limited container shared by every user, with
/// filesystem isolation via subdirectory pinning (`/<root>/<user_id>/`).
pub struct SharedSandbox {
    docker: Docker,
    config: SandboxConfig,
    state: StdMutex<SandboxState>,
    ensure_lock: AsyncMutex<()>,
    provisioned: DashMap<String, Arc<OnceCell<()>>>,
}

impl SharedSandbox {
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            config,
            state: StdMutex::new(SandboxState::Uninitialized),
            ensure_lock: AsyncMutex::new(()),
            provisioned: DashMap::new(),
        })
    }

    fn state(&self) -> SandboxState {
        *self.state.lock().expect("sandbox state lock poisoned")
    }

    fn set_state(&self, next: SandboxState) {
        *self.state.lock().expect("sandbox state lock poisoned") = next;
    }

    /// Idempotent, serialized by an internal mutex. Resolves or creates the
    /// named volume and container; re-creates the container if a prior
    /// health check found it missing.
    pub async fn ensure(&self) -> Result<(), SandboxError> {
        let _guard = self.ensure_lock.lock().await;
        if self.state().is_ready() && self.container_is_running().await {
            return Ok(());
        }
        self.set_state(SandboxState::Starting);
        match self.ensure_inner().await {
            Ok(()) => {
                self.set_state(SandboxState::Ready);
                Ok(())
            }
            Err(err) => {
                self.set_state(SandboxState::Degraded);
                Err(err)
            }
        }
    }

    async fn container_is_running(&self) -> bool {
        match self.docker.inspect_container(&self.config.container_name, None).await {
            Ok(inspect) => inspect.state.and_then(|s| s.running).unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn ensure_inner(&self) -> Result<(), SandboxError> {
        self.ensure_volume().await?;
        self.ensure_container().await?;
        Ok(())
    }

    async fn ensure_volume(&self) -> Result<(), SandboxError> {
        if self.docker.inspect_volume(&self.config.volume_name).await.is_ok() {
            return Ok(());
        }
        self.docker
            .create_volume(CreateVolumeOptions {
                name: self.config.volume_name.clone(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    async fn ensure_container(&self) -> Result<(), SandboxError> {
        if self.container_is_running().await {
            return Ok(());
        }
        if self.docker.inspect_container(&self.config.container_name, None).await.is_err() {
            let host_config = HostConfig {
                mounts: Some(vec![Mount {
                    target: Some(self.config.workspace_root.clone()),
                    source: Some(self.config.volume_name.clone()),
                    typ: Some(MountTypeEnum::VOLUME),
                    ..Default::default()
                }]),
                network_mode: Some(if self.config.network_enabled {
                    "bridge".to_string()
                } else {
                    "none".to_string()
                }),
                nano_cpus: self.config.nano_cpus(),
                memory: self.config.memory_limit_bytes,
                cap_drop: Some(vec!["ALL".to_string()]),
                ..Default::default()
            };
            let container_config = Config {
                image: Some(self.config.image.clone()),
                user: Some(self.config.user_spec()),
                host_config: Some(host_config),
                tty: Some(false),
                cmd: Some(vec!["sleep".to_string(), "infinity".to_string()]),
                ..Default::default()
            };
            self.docker
                .create_container(
                    Some(CreateContainerOptions {
                        name: self.config.container_name.clone(),
                        platform: None,
                    }),
                    container_config,
                )
                .await?;
        }
        self.docker
            .start_container::<String>(&self.config.container_name, None)
            .await?;
        Ok(())
    }

    /// Runs `command` in `user_id`'s workspace, provisioning it (and its
    /// `.tools` asset tree) first if this is the first call for that user.
    pub async fn exec(&self, user_id: &str, command: &str, timeout: Option<Duration>) -> Result<ExecOutput, SandboxError> {
        self.ensure().await?;
        let workspace = self.config.user_workspace(user_id);
        self.run_raw(&format!("mkdir -p '{}'", workspace)).await?;
        self.provision_tool_assets(user_id, &workspace).await?;

        let timeout = timeout.unwrap_or(self.config.exec_timeout_default).min(self.config.exec_timeout_max);
        let exec = self
            .docker
            .create_exec(
                &self.config.container_name,
                CreateExecOptions {
                    cmd: Some(vec!["/bin/sh".to_string(), "-c".to_string(), command.to_string()]),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    working_dir: Some(workspace.clone()),
                    user: Some(self.config.user_spec()),
                    ..Default::default()
                },
            )
            .await?;

        let collect = self.collect_exec_output(&exec.id);
        let (stdout, stderr, truncated) = match tokio::time::timeout(timeout, collect).await {
            Ok(result) => result?,
            Err(_) => {
                self.kill_exec(&exec.id).await;
                return Ok(ExecOutput {
                    stdout: String::new(),
                    stderr: format!("command timed out after {:?}", timeout),
                    exit_code: TIMEOUT_EXIT_CODE,
                    truncated: false,
                });
            }
        };

        let exit_code = self
            .docker
            .inspect_exec(&exec.id)
            .await?
            .exit_code
            .unwrap_or(-1);

        Ok(ExecOutput {
            stdout: hide_workspace_path(&stdout, &workspace),
            stderr: hide_workspace_path(&stderr, &workspace),
            exit_code,
            truncated,
        })
    }

    async fn collect_exec_output(&self, exec_id: &str) -> Result<(String, String, bool), SandboxError> {
        let cap = self.config.output_cap_bytes;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut truncated = false;

        if let StartExecResults::Attached { mut output, .. } = self.docker.start_exec(exec_id, None).await? {
            while let Some(chunk) = output.next().await {
                let chunk = chunk?;
                let (sink, bytes) = match &chunk {
                    bollard::container::LogOutput::StdOut { message } => (&mut stdout, message),
                    bollard::container::LogOutput::StdErr { message } => (&mut stderr, message),
                    _ => continue,
                };
                if sink.len() >= cap {
                    truncated = true;
                    continue;
                }
                let remaining = cap - sink.len();
                if bytes.len() > remaining {
                    sink.extend_from_slice(&bytes[..remaining]);
                    truncated = true;
                } else {
                    sink.extend_from_slice(bytes);
                }
            }
        }

        Ok((
            String::from_utf8_lossy(&stdout).into_owned(),
            String::from_utf8_lossy(&stderr).into_owned(),
            truncated,
        ))
    }

    /// Kills a timed-out exec's process: resolves its pid via `/proc`,
    /// SIGTERM, then SIGKILL after a grace period. Never touches the shared
    /// container itself.
    async fn kill_exec(&self, exec_id: &str) {
        let pid = match self.docker.inspect_exec(exec_id).await {
            Ok(inspect) => inspect.pid,
            Err(_) => None,
        };
        let Some(pid) = pid else { return };
        let _ = self.run_raw(&format!("kill -TERM {}", pid)).await;
        tokio::time::sleep(KILL_GRACE_PERIOD).await;
        let _ = self.run_raw(&format!("kill -KILL {} 2>/dev/null || true", pid)).await;
    }

    /// Runs a command in the container root (not scoped to a user workspace)
    /// for internal bookkeeping (`mkdir -p`, kill signals).
    async fn run_raw(&self, command: &str) -> Result<(), SandboxError> {
        let exec = self
            .docker
            .create_exec(
                &self.config.container_name,
                CreateExecOptions {
                    cmd: Some(vec!["/bin/sh".to_string(), "-c".to_string(), command.to_string()]),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        if let StartExecResults::Attached { mut output, .. } = self.docker.start_exec(&exec.id, None).await? {
            while output.next().await.is_some() {}
        }
        Ok(())
    }

    /// Provisions the fixed tool-asset bundle into `workspace/.tools` the
    /// first time this workspace is seen. Later callers for the same user
    /// wait on the same `OnceCell` rather than re-provisioning.
    async fn provision_tool_assets(&self, user_id: &str, workspace: &str) -> Result<(), SandboxError> {
        let cell = self
            .provisioned
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        cell.get_or_try_init(|| async {
            let tools_dir = format!("{}/{}", workspace, TOOL_ASSET_DIR);
            self.run_raw(&format!("mkdir -p '{}'", tools_dir)).await?;
            let tar = build_tar(&[("README", TOOL_ASSET_README.as_bytes())])?;
            self.docker
                .upload_to_container(
                    &self.config.container_name,
                    Some(UploadToContainerOptions {
                        path: tools_dir,
                        ..Default::default()
                    }),
                    bytes::Bytes::from(tar).into(),
                )
                .await?;
            Ok::<(), SandboxError>(())
        })
        .await?;
        Ok(())
    }

    pub async fn put_file(&self, user_id: &str, relative_path: &str, bytes: &[u8]) -> Result<(), SandboxError> {
        self.ensure().await?;
        let workspace = self.config.user_workspace(user_id);
        let resolved = resolve_in_workspace(&workspace, relative_path)?;
        let (dir, name) = split_parent(&resolved);
        self.run_raw(&format!("mkdir -p '{}'", dir)).await?;
        let tar = build_tar(&[(&name, bytes)])?;
        self.docker
            .upload_to_container(
                &self.config.container_name,
                Some(UploadToContainerOptions {
                    path: dir,
                    ..Default::default()
                }),
                bytes::Bytes::from(tar).into(),
            )
            .await?;
        Ok(())
    }

    pub async fn get_file(&self, user_id: &str, relative_path: &str) -> Result<Vec<u8>, SandboxError> {
        self.ensure().await?;
        let workspace = self.config.user_workspace(user_id);
        let resolved = resolve_in_workspace(&workspace, relative_path)?;
        let mut stream = self.docker.download_from_container(
            &self.config.container_name,
            Some(DownloadFromContainerOptions { path: resolved.clone() }),
        );
        let mut tar_bytes = Vec::new();
        while let Some(chunk) = stream.next().await {
            tar_bytes.extend_from_slice(&chunk?);
        }
        extract_single_file(&tar_bytes)
    }

    pub async fn list(&self, user_id: &str, relative_dir: &str) -> Result<Vec<ListEntry>, SandboxError> {
        self.ensure().await?;
        let workspace = self.config.user_workspace(user_id);
        let resolved = resolve_in_workspace(&workspace, relative_dir)?;
        let output = self
            .exec(
                user_id,
                &format!("find '{}' -mindepth 1 -maxdepth 1 -printf '%f\\t%s\\t%y\\n'", resolved),
                None,
            )
            .await?;
        Ok(output
            .stdout
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(3, '\t');
                let name = parts.next()?.to_string();
                let size = parts.next()?.parse().ok()?;
                let kind = parts.next()?;
                Some(ListEntry {
                    name,
                    size,
                    is_dir: kind == "d",
                })
            })
            .collect())
    }

    pub async fn delete(&self, user_id: &str, relative_path: &str) -> Result<(), SandboxError> {
        self.ensure().await?;
        let workspace = self.config.user_workspace(user_id);
        let resolved = resolve_in_workspace(&workspace, relative_path)?;
        self.run_raw(&format!("rm -f '{}' 2>/dev/null || rmdir '{}'", resolved, resolved))
            .await
    }
}

fn split_parent(path: &str) -> (String, String) {
    let p = Path::new(path);
    let dir = p.parent().map(|d| d.to_string_lossy().into_owned()).unwrap_or_default();
    let name = p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    (dir, name)
}

fn hide_workspace_path(text: &str, workspace: &str) -> String {
    text.replace(workspace, ".")
}

const TOOL_ASSET_README: &str = "Assets provisioned for sandbox-backed tools.\n";

fn build_tar(entries: &[(&str, &[u8])]) -> Result<Vec<u8>, SandboxError> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, bytes) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *bytes)?;
    }
    Ok(builder.into_inner()?)
}

fn extract_single_file(tar_bytes: &[u8]) -> Result<Vec<u8>, SandboxError> {
    let mut archive = tar::Archive::new(tar_bytes);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_file() {
            let mut buf = Vec::new();
            std::io::Read::read_to_end(&mut entry, &mut buf)?;
            return Ok(buf);
        }
    }
    Err(SandboxError::Other("no file found in download stream".to_string()))
}
