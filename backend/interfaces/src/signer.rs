//! The merchant's optional DID/VC signing microservice (spec §1: out of
//! scope, sketched as an external collaborator; spec §4.2 step 5: "optionally
//! signed by the merchant's DID key"). A no-op implementation that leaves
//! receipts unsigned is the default; a real implementation would call out
//! to the signing service over HTTP.

use async_trait::async_trait;
use domain_types::errors::DomainResult;

#[async_trait]
pub trait ReceiptSigner: Send + Sync {
    /// Returns `None` when no signing endpoint is configured — receipts
    /// are issued unsigned rather than blocking the commit path on an
    /// external collaborator (spec §4.2: "transport errors against
    /// collaborators ... are isolated and never cause double-charging").
    async fn sign_receipt(&self, canonical_receipt: &[u8]) -> DomainResult<Option<Vec<u8>>>;
}
