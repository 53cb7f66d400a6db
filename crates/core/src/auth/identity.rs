use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.method == "none"
    }

    /// User to record as the author of a change; anonymous callers record none.
    pub fn actor(&self) -> Option<&str> {
        (!self.is_anonymous()).then_some(self.user_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity_has_no_actor() {
        let identity = Identity::anonymous();
        assert_eq!(identity.user_id, "anonymous");
        assert!(identity.is_anonymous());
        assert_eq!(identity.actor(), None);
    }

    #[test]
    fn test_api_key_identity_is_actor() {
        let identity = Identity {
            user_id: "helpdesk".to_string(),
            method: "api_key".to_string(),
        };
        assert_eq!(identity.actor(), Some("helpdesk"));

        let json = serde_json::to_string(&identity).unwrap();
        let deserialized: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, identity);
    }
}
