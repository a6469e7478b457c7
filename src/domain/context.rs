//! Request Context
//!
//! Metadata carried alongside a request for tracing and authorization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for a single request, used for auditing and tracing.
///
/// `asserted_user_id` is the identity presented in `X-User-Id` — the only
/// form of "authentication" this core trusts (spec §1, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub asserted_user_id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl RequestContext {
    pub fn new(asserted_user_id: i64) -> Self {
        Self {
            asserted_user_id,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a correlation id if one isn't already set.
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let correlation_id = Uuid::new_v4();
        let ctx = RequestContext::new(42).with_correlation_id(correlation_id);

        assert_eq!(ctx.asserted_user_id, 42);
        assert_eq!(ctx.correlation_id, Some(correlation_id));
    }

    #[test]
    fn ensure_correlation_id_is_stable() {
        let mut ctx = RequestContext::new(1);
        assert!(ctx.correlation_id.is_none());

        let id = ctx.ensure_correlation_id();
        let id2 = ctx.ensure_correlation_id();
        assert_eq!(id, id2);
    }
}
