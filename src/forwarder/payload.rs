// Reading browser request bodies into upstream bodies

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header,
    Form,
};
use serde_json::Value;
use tracing::debug;

use crate::api_client::body::is_internal_field;
use crate::api_client::{OutboundBody, OutboundForm};
use crate::error::ApiError;
use crate::extract::has_json_body;

/// Whatever body the browser sent, ready to forward
#[derive(Debug)]
pub struct ForwardPayload(pub OutboundBody);

#[async_trait]
impl<S> FromRequest<S> for ForwardPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(request, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            let form = collect_multipart(multipart).await?;
            debug!(
                "Forwarding multipart body with {} fields and {} files",
                form.fields().len(),
                form.files().len()
            );
            return Ok(ForwardPayload(OutboundBody::Multipart(form)));
        }

        if has_json_body(request.headers()) {
            let bytes = Bytes::from_request(request, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            // A JSON content type on a bodiless GET still forwards
            if bytes.is_empty() {
                return Ok(ForwardPayload(OutboundBody::Empty));
            }
            let mut value: Value = serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;
            if let Value::Object(map) = &mut value {
                map.retain(|name, _| !is_internal_field(name));
            }
            return Ok(ForwardPayload(OutboundBody::Json(value)));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(request, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            let fields = fields
                .into_iter()
                .filter(|(name, _)| !is_internal_field(name))
                .collect();
            return Ok(ForwardPayload(OutboundBody::Form(fields)));
        }

        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        if bytes.is_empty() {
            Ok(ForwardPayload(OutboundBody::Empty))
        } else {
            Err(ApiError::BadRequest(format!(
                "Unsupported content type '{}'",
                content_type
            )))
        }
    }
}

/// Read every multipart field; files keep their names, galleries get indexed keys
pub async fn collect_multipart(mut multipart: Multipart) -> Result<OutboundForm, ApiError> {
    let mut form = OutboundForm::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = match field.name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                form.push_file(&name, file_name, content_type, bytes.to_vec());
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                form.push_text(name, value);
            }
        }
    }

    Ok(form)
}
