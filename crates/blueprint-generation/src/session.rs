//! Editor session
//!
//! Ties one canvas to one job orchestrator. Dropping the session stops
//! polling and push listening; a remote job keeps running.

use std::sync::Arc;

use blueprint_canvas::{GraphStore, SnapshotStore};

use crate::architecture::ArchitectureSpec;
use crate::client::GenerationService;
use crate::config::GenerationConfig;
use crate::error::Result;
use crate::events::EventSink;
use crate::job::JobId;
use crate::orchestrator::JobOrchestrator;
use crate::push::PushSubscription;

pub struct EditorSession {
    canvas: GraphStore,
    orchestrator: JobOrchestrator,
}

impl EditorSession {
    /// Start a session on an empty canvas
    pub fn new(
        config: GenerationConfig,
        service: Arc<dyn GenerationService>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        Ok(Self::with_canvas(
            GraphStore::new()?,
            JobOrchestrator::new(config, service, events)?,
        ))
    }

    /// Start a session from a persisted snapshot
    pub fn restore(
        persistence: Box<dyn SnapshotStore>,
        config: GenerationConfig,
        service: Arc<dyn GenerationService>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        Ok(Self::with_canvas(
            GraphStore::restore(persistence)?,
            JobOrchestrator::new(config, service, events)?,
        ))
    }

    pub fn with_canvas(canvas: GraphStore, orchestrator: JobOrchestrator) -> Self {
        Self {
            canvas,
            orchestrator,
        }
    }

    pub fn canvas(&self) -> &GraphStore {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut GraphStore {
        &mut self.canvas
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    /// Describe the current canvas and submit it for generation
    pub async fn generate(&self) -> Result<JobId> {
        let spec = ArchitectureSpec::from_canvas(self.canvas.graph(), self.canvas.identity());
        let project_id = self.canvas.identity().project_id.clone();
        log::info!(
            "Generating '{}' from {} nodes and {} edges",
            spec.name,
            spec.metadata.node_count,
            spec.metadata.edge_count
        );
        self.orchestrator.submit(spec, project_id).await
    }

    /// Follow push events for this session's jobs
    pub fn listen(&self, subscription: PushSubscription) {
        self.orchestrator.listen(subscription);
    }

    pub async fn approve(&self) -> Result<()> {
        self.orchestrator.approve().await
    }

    pub async fn reject(&self) -> Result<()> {
        self.orchestrator.reject().await
    }

    /// Stop background work for this session
    pub fn shutdown(&self) {
        self.orchestrator.shutdown();
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{JobStatusResponse, SubmitRequest, SubmitResponse};
    use crate::events::NullEventSink;
    use crate::job::JobStatus;
    use async_trait::async_trait;
    use blueprint_canvas::{CanvasNode, Connection, NodeData, NodeKind, Position};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingService {
        requests: Mutex<Vec<SubmitRequest>>,
    }

    #[async_trait]
    impl GenerationService for RecordingService {
        async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
            self.requests.lock().push(request.clone());
            Ok(SubmitResponse {
                job_id: "job-1".into(),
            })
        }

        async fn status(&self, _job_id: &str) -> Result<JobStatusResponse> {
            Ok(JobStatusResponse::with_status(JobStatus::Running))
        }

        async fn approve(&self, _job_id: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_submits_canvas() {
        let service = Arc::new(RecordingService::default());
        let mut session = EditorSession::new(
            GenerationConfig::default(),
            service.clone(),
            Arc::new(NullEventSink),
        )
        .unwrap();

        let canvas = session.canvas_mut();
        canvas.set_project_name("Shop");
        canvas.set_project_id(Some("p-42".into()));
        canvas.add_node(CanvasNode::new(
            "web",
            NodeKind::Frontend,
            Position::default(),
            NodeData::labeled("Web").with_framework("React"),
        ));
        canvas.add_node(CanvasNode::new(
            "api",
            NodeKind::Backend,
            Position::new(200.0, 0.0),
            NodeData::labeled("API"),
        ));
        assert!(canvas.connect(Connection::new("web", "api")));

        let job_id = session.generate().await.unwrap();
        assert_eq!(job_id, "job-1");
        assert!(session.orchestrator().is_generating());

        let requests = service.requests.lock();
        let request = &requests[0];
        assert_eq!(request.project_id.as_deref(), Some("p-42"));
        assert_eq!(request.architecture_spec.name, "Shop");
        assert_eq!(request.architecture_spec.metadata.node_count, 2);
        assert_eq!(request.architecture_spec.metadata.edge_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let orchestrator = JobOrchestrator::new(
            GenerationConfig::default(),
            Arc::new(RecordingService::default()),
            Arc::new(NullEventSink),
        )
        .unwrap();
        let session = EditorSession::with_canvas(GraphStore::new().unwrap(), orchestrator.clone());
        session.generate().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        assert!(orchestrator.is_polling());

        drop(session);
        assert!(!orchestrator.is_polling());
        assert!(!orchestrator.is_generating());
    }
}
