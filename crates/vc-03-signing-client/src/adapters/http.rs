//! HTTP client for the signing authority.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared_types::Validation;
use tracing::{debug, warn};

use crate::domain::{
    ErrorReply, SignReply, SignRequest, SigningClientConfig, SigningError, UnsignedDocument,
    ValidateReply, ValidateRequest,
};
use crate::ports::SigningAuthority;

/// Signing authority reached over HTTP.
pub struct HttpSigningClient {
    client: Client,
    config: SigningClientConfig,
}

impl HttpSigningClient {
    /// Create a client with the configured request timeout.
    pub fn new(config: SigningClientConfig) -> Result<Self, SigningError> {
        if config.url.is_empty() {
            return Err(SigningError::Config("url is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SigningClientConfig {
        &self.config
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.client.post(self.config.endpoint(path));
        if self.config.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.token)
        }
    }

    /// Decode a success body, or turn an error status into [`SigningError::Rejected`].
    async fn read_reply<R: DeserializeOwned>(response: Response) -> Result<R, SigningError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorReply>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(SigningError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| SigningError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SigningAuthority for HttpSigningClient {
    async fn sign_documents(
        &self,
        documents: Vec<UnsignedDocument>,
    ) -> Result<SignReply, SigningError> {
        let count = documents.len();
        let request = SignRequest {
            meta: self.config.request_meta(),
            documents,
        };

        let response = self.post("sign").json(&request).send().await?;
        let reply: SignReply = Self::read_reply(response).await.inspect_err(|e| {
            warn!(error = %e, documents = count, "[vc-03] Sign request failed");
        })?;

        debug!(
            documents = count,
            signatures = reply.signature_values.len(),
            algorithm = %reply.meta.signature_algorithm,
            "[vc-03] Documents signed"
        );
        Ok(reply)
    }

    async fn validate_document(
        &self,
        document: UnsignedDocument,
    ) -> Result<Validation, SigningError> {
        let id = document.id.clone();
        let request = ValidateRequest {
            meta: self.config.request_meta(),
            document,
        };

        let response = self.post("validate").json(&request).send().await?;
        let reply: ValidateReply = Self::read_reply(response).await?;
        debug!(
            transaction_id = %id,
            valid = reply.valid_signature,
            "[vc-03] Document validated"
        );
        Ok(reply.into_validation(&id))
    }
}
