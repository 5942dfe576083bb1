use serde::{Deserialize, Serialize};

use crate::{AppResult, NonEmptyString, TenantId};

/// Authenticated principal forwarded by the upstream identity gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: NonEmptyString,
    display_name: String,
    tenant_id: TenantId,
}

impl UserIdentity {
    /// Creates an identity for a subject in a tenant.
    ///
    /// The display name falls back to the subject when blank.
    pub fn new(
        subject: impl Into<String>,
        display_name: Option<String>,
        tenant_id: TenantId,
    ) -> AppResult<Self> {
        let subject = NonEmptyString::new(subject)?;
        let display_name = display_name
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| subject.as_str().to_owned());

        Ok(Self {
            subject,
            display_name,
            tenant_id,
        })
    }

    /// Returns the stable subject claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the principal.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the tenant the principal acts in.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
