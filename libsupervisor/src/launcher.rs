use std::process::Stdio;
use std::sync::Arc;

use common::{JobRequest, PipelineConfig};
use tokio::process::{Child, Command};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::LaunchError;
use crate::handler::{HandlerRecord, WorkerHandle, completion};
use crate::lifecycle::Supervision;
use crate::manager::ProcessManager;

pub const HANDLER_ID_PREFIX: &str = "EGH_";
pub const RUN_HANDLER_COMMAND: &str = "run-handler";

pub fn new_handler_id() -> String {
    format!("{HANDLER_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Encodes the two worker payloads: YAML pipeline config and JSON request.
pub fn encode_payloads(
    conf: &PipelineConfig,
    request: &JobRequest,
) -> Result<(String, String), LaunchError> {
    let conf_string = serde_yaml::to_string(conf)?;
    let request_string = serde_json::to_string(request)?;
    Ok((conf_string, request_string))
}

impl ProcessManager {
    /// Spawns a worker for an already admitted request and registers it.
    ///
    /// The job id is claimed under the write lock before anything is spawned.
    /// On error the claim is dropped, nothing has been registered and no
    /// worker is running.
    #[instrument(name = "launch_handler", skip_all, fields(job_id = %request.job_id))]
    pub async fn launch(&self, request: JobRequest) -> Result<String, LaunchError> {
        request.validate()?;
        if !self.registry.write().await.reserve_job(&request.job_id) {
            return Err(LaunchError::AlreadyActive(request.job_id));
        }

        let handler_id = new_handler_id();
        let pipeline = PipelineConfig::new(&self.conf.base, &handler_id);
        let child = match self.spawn_handler(&pipeline, &request) {
            Ok(child) => child,
            Err(e) => {
                self.registry.write().await.release_job(&request.job_id);
                return Err(e);
            }
        };

        self.monitor.job_started(&request);

        let request = Arc::new(request);
        let worker = WorkerHandle::new(child.id());
        let (done_tx, done) = completion();
        let record = HandlerRecord {
            handler_id: handler_id.clone(),
            request: request.clone(),
            worker: worker.clone(),
            done,
        };
        self.registry.write().await.insert(record);
        info!(handler_id = %handler_id, pid = ?child.id(), "launched handler");

        let supervision = Supervision {
            registry: self.registry.clone(),
            monitor: self.monitor.clone(),
            handler_id: handler_id.clone(),
            request,
            worker,
            tmp_dir: pipeline.tmp_dir,
            done: done_tx,
        };
        tokio::spawn(supervision.await_cleanup(child));

        Ok(handler_id)
    }

    fn spawn_handler(
        &self,
        pipeline: &PipelineConfig,
        request: &JobRequest,
    ) -> Result<Child, LaunchError> {
        let (conf_string, request_string) =
            encode_payloads(pipeline, request).inspect_err(|e| error!("{e}"))?;

        let handler = &self.conf.handler;
        let mut cmd = Command::new(&handler.program);
        cmd.args(&handler.args)
            .arg(RUN_HANDLER_COMMAND)
            .arg("--config")
            .arg(&conf_string)
            .arg("--request")
            .arg(&request_string)
            .current_dir("/")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        cmd.spawn().map_err(|source| {
            error!("could not launch process: {source}");
            LaunchError::Spawn {
                program: handler.program.clone(),
                source,
            }
        })
    }
}
