//! Helpers for the table (`/rest/v1`) endpoints.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::ports::RepositoryError;

use super::client::error_message;

/// `Prefer` header asking the store to echo affected rows.
pub(crate) const RETURN_REPRESENTATION: &str = "return=representation";

/// `eq.` filter value for a query parameter.
pub(crate) fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Send `request` and decode the returned rows.
pub(crate) async fn fetch_rows<T: DeserializeOwned>(
    request: RequestBuilder,
    operation: &'static str,
) -> Result<Vec<T>, RepositoryError> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(operation, error = %e, "Store request failed");
        RepositoryError::unavailable(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        let message = error_message(response).await;
        tracing::error!(operation, %status, %message, "Store rejected request");
        return Err(RepositoryError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    response.json::<Vec<T>>().await.map_err(|e| {
        tracing::error!(operation, error = %e, "Unexpected store response");
        RepositoryError::decode(e.to_string())
    })
}

/// Send `request` where no rows are expected back.
pub(crate) async fn execute(
    request: RequestBuilder,
    operation: &'static str,
) -> Result<(), RepositoryError> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(operation, error = %e, "Store request failed");
        RepositoryError::unavailable(e.to_string())
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let message = error_message(response).await;
    tracing::error!(operation, %status, %message, "Store rejected request");
    Err(RepositoryError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Convert decoded rows into domain values, failing on the first bad row.
pub(crate) fn convert<R, T, E: std::fmt::Display>(
    rows: Vec<R>,
    f: impl Fn(R) -> Result<T, E>,
) -> Result<Vec<T>, RepositoryError> {
    rows.into_iter()
        .map(|row| f(row).map_err(|e| RepositoryError::decode(e.to_string())))
        .collect()
}
