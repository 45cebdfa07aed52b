//! Upload session: service status, the picked file, the in-flight request and
//! whatever the last successful upload produced.

use crate::api::{GenerateMapResponse, MapService, SelectedFile};
use crate::config::ClientConfig;
use crate::error::{ClientError, ValidationError, FALLBACK_GENERATE_ERROR};
use crate::progress::ProgressTicker;
use crate::types::{ActiveTab, AnalysisResult, ServiceStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Checks a picked file against the upload rules.
pub fn validate_file(
    picked: Option<SelectedFile>,
    max_bytes: u64,
) -> Result<SelectedFile, ValidationError> {
    let file = picked.ok_or(ValidationError::NoFile)?;
    if !file.name.to_lowercase().ends_with(".csv") {
        return Err(ValidationError::NotCsv);
    }
    if file.size > max_bytes {
        return Err(ValidationError::TooLarge {
            size: file.size,
            limit: max_bytes,
        });
    }
    Ok(file)
}

/// Holds the session's ticker slot for the duration of a request. Dropping it,
/// whether the request finished or its future was cancelled, empties the slot,
/// which stops the ticker and resets progress.
struct InFlight<'a> {
    slot: &'a mut Option<ProgressTicker>,
}

impl<'a> InFlight<'a> {
    fn start(
        slot: &'a mut Option<ProgressTicker>,
        progress: Arc<watch::Sender<u8>>,
        period: Duration,
        step: u8,
    ) -> Self {
        *slot = Some(ProgressTicker::start(progress, period, step));
        Self { slot }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.slot.take();
    }
}

pub struct UploadSession<S: MapService> {
    service: S,
    config: ClientConfig,
    status: ServiceStatus,
    file: Option<SelectedFile>,
    error: Option<String>,
    // Present exactly while a request is in flight.
    in_flight: Option<ProgressTicker>,
    progress: Arc<watch::Sender<u8>>,
    map_url: Option<String>,
    analysis: Option<AnalysisResult>,
    active_tab: ActiveTab,
}

impl<S: MapService> UploadSession<S> {
    pub fn new(service: S, config: ClientConfig) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            service,
            config,
            status: ServiceStatus::Checking,
            file: None,
            error: None,
            in_flight: None,
            progress: Arc::new(progress),
            map_url: None,
            analysis: None,
            active_tab: ActiveTab::Map,
        }
    }

    /// First health check; the status stays `Checking` until it resolves.
    pub async fn mount(&mut self) {
        self.check_health().await;
    }

    pub async fn check_health(&mut self) {
        self.status = match self.service.health().await {
            Ok(health) if health.is_healthy() => ServiceStatus::Ready,
            Ok(health) => {
                error!("Service reported status {:?}", health.status);
                ServiceStatus::Error
            }
            Err(e) => {
                error!("Health check error: {}", e);
                ServiceStatus::Error
            }
        };
        debug!("Service status: {:?}", self.status);
    }

    /// Stores `picked` if it passes validation. A rejected pick only sets the
    /// error and leaves any previously stored file alone.
    pub fn select_file(&mut self, picked: Option<SelectedFile>) -> Result<(), ValidationError> {
        match validate_file(picked, self.config.max_file_bytes) {
            Ok(file) => {
                info!("Selected {} ({} bytes)", file.name, file.size);
                self.file = Some(file);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn can_submit(&self) -> bool {
        self.file.is_some() && self.status == ServiceStatus::Ready && !self.is_loading()
    }

    /// Uploads the stored file.
    ///
    /// When there is no file or the service is not ready nothing is sent and
    /// the session is left untouched. Otherwise the outcome is recorded in the
    /// session, loading is cleared, and the service health is polled again.
    pub async fn submit(&mut self) -> Result<(), ClientError> {
        let file = match (&self.file, self.status) {
            (None, _) => return Err(ValidationError::NoFile.into()),
            (Some(_), ServiceStatus::Checking) => {
                return Err(ClientError::ServiceUnavailable(
                    "still checking service status".to_string(),
                ));
            }
            (Some(_), ServiceStatus::Error) => {
                return Err(ClientError::ServiceUnavailable("health check failed".to_string()));
            }
            (Some(file), _) => file.clone(),
        };
        if self.is_loading() {
            return Err(ClientError::request("An upload is already in progress"));
        }

        self.error = None;
        let response = {
            let _in_flight = InFlight::start(
                &mut self.in_flight,
                Arc::clone(&self.progress),
                Duration::from_millis(self.config.progress_interval_ms),
                self.config.progress_step,
            );
            self.service.generate_map(&file).await
        };

        let result = response.and_then(|r| self.apply_response(r));
        if let Err(e) = &result {
            error!("Submit error: {}", e);
            self.error = Some(e.to_string());
        }

        self.check_health().await;
        result
    }

    fn apply_response(&mut self, response: GenerateMapResponse) -> Result<(), ClientError> {
        match response.map_url {
            Some(path) if response.success => {
                let url = format!("{}{}", self.config.service_origin.trim_end_matches('/'), path);
                info!("Generated Map URL: {}", url);
                self.map_url = Some(url);
                self.analysis = Some(AnalysisResult::placeholder());
                Ok(())
            }
            _ => Err(ClientError::Request(FALLBACK_GENERATE_ERROR.to_string())),
        }
    }

    pub fn has_results(&self) -> bool {
        self.map_url.is_some() || self.analysis.is_some()
    }

    /// Switches tabs; refused until an upload has produced something to show.
    pub fn select_tab(&mut self, tab: ActiveTab) -> bool {
        if !self.has_results() {
            return false;
        }
        self.active_tab = tab;
        true
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> u8 {
        *self.progress.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn map_url(&self) -> Option<&str> {
        self.map_url.as_deref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.active_tab
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HealthResponse;
    use std::cell::Cell;
    use std::path::PathBuf;

    const ORIGIN: &str = "https://maps.example.test";
    const MIB: u64 = 1024 * 1024;

    struct StubService {
        health: Result<HealthResponse, ClientError>,
        upload: Result<GenerateMapResponse, ClientError>,
        upload_delay: Duration,
        health_calls: Cell<usize>,
        upload_calls: Cell<usize>,
    }

    impl StubService {
        fn new(status: &str) -> Self {
            Self {
                health: Ok(HealthResponse { status: status.to_string() }),
                upload: Ok(GenerateMapResponse {
                    success: true,
                    map_url: Some("/maps/x.html".to_string()),
                }),
                upload_delay: Duration::ZERO,
                health_calls: Cell::new(0),
                upload_calls: Cell::new(0),
            }
        }

        fn with_upload(mut self, upload: Result<GenerateMapResponse, ClientError>) -> Self {
            self.upload = upload;
            self
        }
    }

    impl MapService for StubService {
        async fn health(&self) -> Result<HealthResponse, ClientError> {
            self.health_calls.set(self.health_calls.get() + 1);
            self.health.clone()
        }

        async fn generate_map(
            &self,
            _file: &SelectedFile,
        ) -> Result<GenerateMapResponse, ClientError> {
            self.upload_calls.set(self.upload_calls.get() + 1);
            if !self.upload_delay.is_zero() {
                tokio::time::sleep(self.upload_delay).await;
            }
            self.upload.clone()
        }
    }

    fn config() -> ClientConfig {
        ClientConfig { service_origin: ORIGIN.to_string(), ..ClientConfig::default() }
    }

    fn picked(name: &str, size: u64) -> Option<SelectedFile> {
        Some(SelectedFile { path: PathBuf::from(name), name: name.to_string(), size })
    }

    async fn ready_session(service: StubService) -> UploadSession<StubService> {
        let mut session = UploadSession::new(service, config());
        session.mount().await;
        session.select_file(picked("data.csv", 1024)).unwrap();
        session
    }

    #[test]
    fn starts_checking_with_map_tab() {
        let session = UploadSession::new(StubService::new("healthy"), config());
        assert_eq!(session.status(), ServiceStatus::Checking);
        assert_eq!(session.active_tab(), ActiveTab::Map);
        assert!(!session.is_loading());
        assert_eq!(session.progress(), 0);
    }

    #[tokio::test]
    async fn healthy_body_means_ready() {
        let mut session = UploadSession::new(StubService::new("healthy"), config());
        session.mount().await;
        assert_eq!(session.status(), ServiceStatus::Ready);
    }

    #[tokio::test]
    async fn other_status_or_failure_means_error() {
        let mut session = UploadSession::new(StubService::new("degraded"), config());
        session.mount().await;
        assert_eq!(session.status(), ServiceStatus::Error);

        let mut failing = StubService::new("healthy");
        failing.health = Err(ClientError::request("connection refused"));
        let mut session = UploadSession::new(failing, config());
        session.mount().await;
        assert_eq!(session.status(), ServiceStatus::Error);
    }

    #[test]
    fn non_csv_pick_is_rejected_without_storing() {
        let mut session = UploadSession::new(StubService::new("healthy"), config());
        let err = session.select_file(picked("report.txt", 10)).unwrap_err();
        assert_eq!(err, ValidationError::NotCsv);
        assert_eq!(session.error(), Some("Please select a CSV file"));
        assert!(session.file().is_none());
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(validate_file(picked("DATA.CSV", 10), 10 * MIB).is_ok());
        assert_eq!(validate_file(picked("data.csv.bak", 10), 10 * MIB), Err(ValidationError::NotCsv));
    }

    #[test]
    fn oversized_csv_is_rejected() {
        let mut session = UploadSession::new(StubService::new("healthy"), config());
        let err = session.select_file(picked("big.csv", 11 * MIB)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert_eq!(session.error(), Some("File size must be less than 10MB"));
        assert!(session.file().is_none());

        assert!(validate_file(picked("edge.csv", 10 * MIB), 10 * MIB).is_ok());
    }

    #[test]
    fn missing_pick_is_rejected() {
        let mut session = UploadSession::new(StubService::new("healthy"), config());
        assert_eq!(session.select_file(None), Err(ValidationError::NoFile));
        assert_eq!(session.error(), Some("Please select a file"));
    }

    #[test]
    fn rejected_pick_keeps_previous_file_and_valid_pick_clears_error() {
        let mut session = UploadSession::new(StubService::new("healthy"), config());
        session.select_file(picked("first.csv", 10)).unwrap();
        session.select_file(picked("notes.txt", 10)).unwrap_err();
        assert_eq!(session.file().map(|f| f.name.as_str()), Some("first.csv"));
        assert!(session.error().is_some());

        session.select_file(picked("second.csv", 10)).unwrap();
        assert_eq!(session.file().map(|f| f.name.as_str()), Some("second.csv"));
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn submit_is_a_no_op_unless_ready() {
        let mut session = UploadSession::new(StubService::new("down"), config());
        session.mount().await;
        session.select_file(picked("data.csv", 10)).unwrap();

        let result = session.submit().await;
        assert!(matches!(result, Err(ClientError::ServiceUnavailable(_))));
        assert_eq!(session.service.upload_calls.get(), 0);
        assert_eq!(session.error(), None);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn submit_without_file_sends_nothing() {
        let mut session = UploadSession::new(StubService::new("healthy"), config());
        session.mount().await;
        assert!(!session.can_submit());
        assert!(session.submit().await.is_err());
        assert_eq!(session.service.upload_calls.get(), 0);
    }

    #[tokio::test]
    async fn success_builds_absolute_url_and_placeholder_analysis() {
        let mut session = ready_session(StubService::new("healthy")).await;
        session.submit().await.unwrap();

        assert_eq!(session.map_url(), Some("https://maps.example.test/maps/x.html"));
        assert_eq!(session.analysis(), Some(&AnalysisResult::placeholder()));
        assert!(!session.is_loading());
        assert_eq!(session.progress(), 0);
        assert_eq!(session.service.upload_calls.get(), 1);
        // health polled on mount and again once the upload settled
        assert_eq!(session.service.health_calls.get(), 2);
    }

    #[tokio::test]
    async fn server_error_text_is_displayed() {
        let service = StubService::new("healthy")
            .with_upload(Err(ClientError::Request("bad file".to_string())));
        let mut session = ready_session(service).await;

        assert!(session.submit().await.is_err());
        assert_eq!(session.error(), Some("bad file"));
        assert!(!session.is_loading());
        assert_eq!(session.map_url(), None);
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn unsuccessful_body_is_a_generic_failure() {
        let service = StubService::new("healthy").with_upload(Ok(GenerateMapResponse {
            success: false,
            map_url: Some("/maps/ignored.html".to_string()),
        }));
        let mut session = ready_session(service).await;

        assert!(session.submit().await.is_err());
        assert_eq!(session.error(), Some(FALLBACK_GENERATE_ERROR));
        assert_eq!(session.map_url(), None);
        assert!(session.analysis().is_none());
    }

    #[tokio::test]
    async fn success_without_map_url_is_a_failure() {
        let service = StubService::new("healthy")
            .with_upload(Ok(GenerateMapResponse { success: true, map_url: None }));
        let mut session = ready_session(service).await;
        assert!(session.submit().await.is_err());
        assert_eq!(session.error(), Some(FALLBACK_GENERATE_ERROR));
    }

    #[tokio::test]
    async fn new_submission_clears_previous_error() {
        let service = StubService::new("healthy")
            .with_upload(Err(ClientError::Request("bad file".to_string())));
        let mut session = ready_session(service).await;
        session.submit().await.unwrap_err();

        session.service.upload = Ok(GenerateMapResponse {
            success: true,
            map_url: Some("/maps/y.html".to_string()),
        });
        session.submit().await.unwrap();
        assert_eq!(session.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_cycles_while_request_is_in_flight() {
        let mut service = StubService::new("healthy");
        service.upload_delay = Duration::from_millis(2_000);
        let mut session = ready_session(service).await;
        let rx = session.subscribe_progress();

        let (result, mid_flight) = tokio::join!(session.submit(), async move {
            tokio::time::sleep(Duration::from_millis(1_100)).await;
            *rx.borrow()
        });

        assert!(result.is_ok());
        assert_eq!(mid_flight, 20);
        assert_eq!(session.progress(), 0);
        assert!(!session.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_submit_releases_loading() {
        let mut service = StubService::new("healthy");
        service.upload_delay = Duration::from_secs(60);
        let mut session = ready_session(service).await;

        let cancelled = tokio::time::timeout(Duration::from_secs(2), session.submit()).await;
        assert!(cancelled.is_err());

        assert!(!session.is_loading());
        assert_eq!(session.progress(), 0);
        assert!(session.can_submit());

        // the ticker task is gone, not just hidden
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(session.progress(), 0);

        session.service.upload_delay = Duration::ZERO;
        session.submit().await.unwrap();
        assert_eq!(session.service.upload_calls.get(), 2);
        assert!(session.map_url().is_some());
    }

    #[tokio::test]
    async fn not_ready_message_is_readable() {
        let mut session = UploadSession::new(StubService::new("down"), config());
        session.mount().await;
        session.select_file(picked("data.csv", 10)).unwrap();

        let err = session.submit().await.unwrap_err();
        assert_eq!(err.to_string(), "Service unavailable: health check failed");

        let mut checking = UploadSession::new(StubService::new("healthy"), config());
        checking.select_file(picked("data.csv", 10)).unwrap();
        let err = checking.submit().await.unwrap_err();
        assert_eq!(err.to_string(), "Service unavailable: still checking service status");
        assert_eq!(checking.service.upload_calls.get(), 0);
    }

    #[test]
    fn size_error_reports_configured_limit() {
        let config = ClientConfig { max_file_bytes: 512 * 1024, ..config() };
        let mut session = UploadSession::new(StubService::new("healthy"), config);
        session.select_file(picked("data.csv", 600 * 1024)).unwrap_err();
        assert_eq!(session.error(), Some("File size must be less than 512KB"));
    }

    #[tokio::test]
    async fn tabs_unlock_only_after_results() {
        let mut session = ready_session(StubService::new("healthy")).await;
        assert!(!session.select_tab(ActiveTab::Analysis));
        assert_eq!(session.active_tab(), ActiveTab::Map);

        session.submit().await.unwrap();
        assert!(session.select_tab(ActiveTab::Analysis));
        assert_eq!(session.active_tab(), ActiveTab::Analysis);
    }
}
