// Authentication service - dispatches credentials to the external API

use tracing::{info, warn};
use validator::Validate;

use crate::api_client::{AuthOutcome, ExternalApi};
use crate::auth::{
    error::AuthRejection,
    models::{AuthFlow, CredentialForm, Role},
};
use crate::session::{SessionError, TokenStore};

/// Authentication service coordinating login, registration and logout
#[derive(Clone)]
pub struct AuthService {
    api: ExternalApi,
}

impl AuthService {
    pub fn new(api: ExternalApi) -> Self {
        Self { api }
    }

    /// Submit credentials for a role and keep the issued token in the session
    ///
    /// Rejections (local validation, upstream refusal, unreachable API) come back as
    /// `AuthOutcome::Rejected`; only session storage failures are errors.
    pub async fn authenticate<F: CredentialForm>(
        &self,
        tokens: &TokenStore,
        role: Role,
        flow: AuthFlow,
        form: &F,
    ) -> Result<AuthOutcome, SessionError> {
        if let Err(errors) = form.validate() {
            let rejection = AuthRejection::invalid(&errors, &form.field_names());
            return Ok(AuthOutcome::Rejected(rejection));
        }

        let outcome = match self.api.authenticate(role, flow, form.submitted()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} {} could not reach the external API: {}", role, flow, e);
                return Ok(AuthOutcome::Rejected(AuthRejection::unreachable()));
            }
        };

        if let AuthOutcome::Authenticated { token, .. } = &outcome {
            tokens.rotate().await?;
            tokens.store(role, token).await?;
            info!("{} {} succeeded", role, flow);
        }

        Ok(outcome)
    }

    /// End a role's session: tell the external API (best effort), then drop the token
    pub async fn logout(&self, tokens: &TokenStore, role: Role) -> Result<(), SessionError> {
        if let Some(token) = tokens.token(role).await? {
            match self.api.logout(role, token).await {
                Ok(response) if response.status.is_success() => {}
                Ok(response) => warn!("{} logout answered {}", role, response.status),
                Err(e) => warn!("{} logout could not reach the external API: {}", role, e),
            }
        }

        tokens.clear(role).await?;
        info!("{} logged out", role);
        Ok(())
    }
}
