//! Typed request helpers shared by the authenticated and public clients

use async_trait::async_trait;
use jobhub_domain::{ApiResponse, HttpRequest, MultipartPart, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Anything that can execute an [`HttpRequest`] against the API.
///
/// Implementors only provide [`Dispatcher::execute`]; the JSON helpers are
/// built on top of it.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send `request` and return the successful response.
    ///
    /// # Errors
    ///
    /// Non-2xx statuses map through `ApiError::from_status`; transport
    /// failures map to `Network`/`Timeout`.
    async fn execute(&self, request: HttpRequest) -> Result<ApiResponse>;

    /// Execute a GET request and decode the JSON response
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body cannot be decoded
    async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        self.execute(HttpRequest::get(path)).await?.json()
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be serialized, the request fails or
    /// the response cannot be decoded
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned + Send,
    {
        let request = HttpRequest::post(path).json(body)?;
        self.execute(request).await?.json()
    }

    /// Execute a PUT request with a JSON body
    ///
    /// # Errors
    ///
    /// Same as [`Dispatcher::post_json`]
    async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned + Send,
    {
        let request = HttpRequest::put(path).json(body)?;
        self.execute(request).await?.json()
    }

    /// Execute a PATCH request with a JSON body
    ///
    /// # Errors
    ///
    /// Same as [`Dispatcher::post_json`]
    async fn patch_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned + Send,
    {
        let request = HttpRequest::patch(path).json(body)?;
        self.execute(request).await?.json()
    }

    /// Execute a DELETE request, discarding any response body
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    async fn delete(&self, path: &str) -> Result<()> {
        self.execute(HttpRequest::delete(path)).await.map(|_| ())
    }

    /// Upload multipart form data (resumes, logos, attachments)
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    async fn post_multipart<R>(&self, path: &str, parts: Vec<MultipartPart>) -> Result<R>
    where
        R: DeserializeOwned + Send,
    {
        self.execute(HttpRequest::post(path).multipart(parts)).await?.json()
    }
}
