// Visitor pass endpoints
//
// Create / cancel / verify / list. Residents create and cancel their own
// passes; watchmen and admins verify codes at the gate. The backend is the
// authority on validity, the client only proposes.

use serde_json::json;
use tracing::debug;

use crate::client::PassClient;
use crate::error::Error;
use crate::models::{
    CreatePassRequest, CreatePassResponse, ListPassesResponse, PassRecord, VerifyRequest,
    VerifyResponse,
};

impl PassClient {
    /// Register a client-generated pass with the backend.
    ///
    /// `POST /api/visitor-passes` with `{code, visitorName, qrData, expiresAt}`.
    /// A 2xx response without a `pass` object is a failure
    /// ([`Error::MissingPass`]).
    pub async fn create_visitor_pass(&self, req: &CreatePassRequest) -> Result<PassRecord, Error> {
        let url = self.api_url(&["visitor-passes"])?;
        debug!(code = %req.code, visitor = %req.visitor_name, "creating visitor pass");
        let resp: CreatePassResponse = self.post(url, req).await?;
        resp.pass.ok_or(Error::MissingPass {
            message: resp.message,
        })
    }

    /// Cancel a pass by backend id.
    ///
    /// `POST /api/visitor-passes/{id}/cancel`. Callers treat this as
    /// best-effort; the response body is ignored.
    pub async fn cancel_visitor_pass(&self, id: &str) -> Result<(), Error> {
        let url = self.api_url(&["visitor-passes", id, "cancel"])?;
        debug!(id, "cancelling visitor pass");
        let _: serde_json::Value = self.post(url, &json!({})).await?;
        Ok(())
    }

    /// Ask the backend whether a code is currently admissible.
    ///
    /// `POST /api/visitor-passes/verify` with `{code}`.
    pub async fn verify_visitor_pass(&self, code: &str) -> Result<VerifyResponse, Error> {
        let url = self.api_url(&["visitor-passes", "verify"])?;
        debug!(code, "verifying visitor pass");
        self.post(url, &VerifyRequest { code }).await
    }

    /// List the caller's passes, optionally filtered by status.
    ///
    /// `GET /api/visitor-passes[?status=...]`
    pub async fn list_visitor_passes(&self, status: Option<&str>) -> Result<Vec<PassRecord>, Error> {
        let mut url = self.api_url(&["visitor-passes"])?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status);
        }
        debug!(?status, "listing visitor passes");
        let resp: ListPassesResponse = self.get(url).await?;
        Ok(resp.into_passes())
    }
}
