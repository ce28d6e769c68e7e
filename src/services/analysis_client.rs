use crate::config::ClientConfig;
use crate::error::{AppError, ErrorKind};
use crate::models::analysis_types::{AnalysisResult, ServerErrorBody};
use crate::models::upload_types::SelectedFile;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use reqwest::Url;

/// Sends one selected file to the analysis service.
pub trait AnalysisTransport: Send + Sync {
    fn analyze<'a>(&'a self, file: &'a SelectedFile) -> BoxFuture<'a, Result<AnalysisResult, AppError>>;
}

#[derive(Clone)]
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    endpoint: Url,
    field: String,
}

impl HttpAnalysisClient {
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let endpoint = Url::parse(&config.server_url)
            .and_then(|base| base.join(&config.analyze_path))
            .map_err(|e| {
                AppError::new(
                    ErrorKind::Config,
                    format!(
                        "Invalid analysis endpoint {}{}: {}",
                        config.server_url, config.analyze_path, e
                    ),
                )
            })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint,
            field: config.upload_field.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, file: &SelectedFile) -> Result<AnalysisResult, AppError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = Form::new().part(self.field.clone(), part);

        tracing::debug!(endpoint = %self.endpoint, file = %file.name, size = file.bytes.len(), "posting image for analysis");

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ServerErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(AppError::new(
                ErrorKind::Server,
                format!("Analysis failed: HTTP {}: {}", status, detail),
            ));
        }

        serde_json::from_str::<AnalysisResult>(&body).map_err(|e| {
            AppError::new(
                ErrorKind::Decode,
                format!("Failed to parse analysis response: {}", e),
            )
        })
    }
}

impl AnalysisTransport for HttpAnalysisClient {
    fn analyze<'a>(&'a self, file: &'a SelectedFile) -> BoxFuture<'a, Result<AnalysisResult, AppError>> {
        self.post(file).boxed()
    }
}
