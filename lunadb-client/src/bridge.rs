//! The boundary between a client and the document server
//!
//! Transport is left to implementors. The server contract for
//! [`DocumentBridge::sync_document`]: the response carries every operation
//! committed by other sessions since the request's version, in server order,
//! and the server has committed the request's own changes after them, rebased
//! over that same batch.

use crate::errors::ClientResult;
use lunadb_core::{LoadResponse, SyncRequest, SyncResponse};
use std::future::Future;
use std::sync::Arc;

pub trait DocumentBridge: Send + Sync {
    fn create_document(&self, key: &str) -> impl Future<Output = ClientResult<()>> + Send;

    fn delete_document(&self, key: &str) -> impl Future<Output = ClientResult<()>> + Send;

    fn load_document(&self, key: &str) -> impl Future<Output = ClientResult<LoadResponse>> + Send;

    fn sync_document(
        &self,
        key: &str,
        request: &SyncRequest,
    ) -> impl Future<Output = ClientResult<SyncResponse>> + Send;
}

impl<T: DocumentBridge> DocumentBridge for Arc<T> {
    fn create_document(&self, key: &str) -> impl Future<Output = ClientResult<()>> + Send {
        (**self).create_document(key)
    }

    fn delete_document(&self, key: &str) -> impl Future<Output = ClientResult<()>> + Send {
        (**self).delete_document(key)
    }

    fn load_document(&self, key: &str) -> impl Future<Output = ClientResult<LoadResponse>> + Send {
        (**self).load_document(key)
    }

    fn sync_document(
        &self,
        key: &str,
        request: &SyncRequest,
    ) -> impl Future<Output = ClientResult<SyncResponse>> + Send {
        (**self).sync_document(key, request)
    }
}
