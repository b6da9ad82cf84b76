use hireflow_auth::Principal;

/// Authenticated principal for a request.
///
/// Inserted by the required-auth middleware; present for all protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext(Principal);

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self(principal)
    }

    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

/// Principal for optional-auth routes; `None` for anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalPrincipal(Option<Principal>);

impl OptionalPrincipal {
    pub fn new(principal: Option<Principal>) -> Self {
        Self(principal)
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}
