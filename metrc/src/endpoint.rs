//! Request targets for the Metrc v1 REST endpoints.
//!
//! The same formatting is used for the URLs the client calls and for the
//! request strings recorded by the evaluation, so the two never drift apart.

use std::fmt;

/// Resource families exercised by the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Locations,
    Strains,
    Items,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Locations => "locations",
            Resource::Strains => "strains",
            Resource::Items => "items",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Operation segment following `{resource}/v1/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Active,
    Create,
    Update,
    /// By-id read or delete, depending on the HTTP method.
    Id(i64),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Active => f.write_str("active"),
            Operation::Create => f.write_str("create"),
            Operation::Update => f.write_str("update"),
            Operation::Id(id) => write!(f, "{id}"),
        }
    }
}

/// `{base_url}/{resource}/v1/{operation}?licenseNumber={license}`.
///
/// A trailing slash on `base_url` is ignored.
pub fn request_target(base_url: &str, resource: Resource, op: Operation, license: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/{resource}/v1/{op}?licenseNumber={license}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_create_target() {
        let target = request_target(
            "https://sandbox-api-ca.metrc.com",
            Resource::Items,
            Operation::Create,
            "C12-1000006-LIC",
        );
        assert_eq!(
            target,
            "https://sandbox-api-ca.metrc.com/items/v1/create?licenseNumber=C12-1000006-LIC"
        );
    }

    #[test]
    fn formats_id_target_and_trims_base_slash() {
        let target = request_target("http://localhost/", Resource::Strains, Operation::Id(42), "L");
        assert_eq!(target, "http://localhost/strains/v1/42?licenseNumber=L");
    }
}
