//! Company entity type

use serde::{Deserialize, Serialize};

use crate::core::identity::{CompanyId, ResourceKind};
use crate::entities::Resource;

/// A customer company. Owns zero or more locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier
    pub id: CompanyId,

    /// Display name
    pub name: String,
}

impl Resource for Company {
    const KIND: ResourceKind = ResourceKind::Company;
    type Id = CompanyId;

    fn id(&self) -> &CompanyId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_roundtrip() {
        let json = r#"{"id": "cmp-1", "name": "Globex"}"#;
        let company: Company = serde_json::from_str(json).unwrap();
        assert_eq!(company.name, "Globex");

        let back = serde_json::to_string(&company).unwrap();
        let again: Company = serde_json::from_str(&back).unwrap();
        assert_eq!(again.id, company.id);
    }
}
