//! Verification rows and bundles.
//!
//! A [`VerificationRow`] mirrors one line of the evaluation spreadsheet: the
//! request sent for a step and the body submitted or received. Rows of one
//! resource cycle are grouped into a bundle and validated before printing.

use anyhow::{Context, Result, bail};
use metrc::Resource;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

/// Status recorded for every successful step.
pub const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationRow {
    pub status_code: u16,
    pub license: String,
    /// Metrc-assigned id, learned from the active listing after create.
    pub id: i64,
    pub name: String,
    /// Fully qualified request target, including `licenseNumber`.
    pub request: String,
    /// Tab-indented JSON: the submitted body for create/update, the response for get.
    pub body_or_response: String,
}

impl VerificationRow {
    pub fn ok(
        license: &str,
        id: i64,
        name: impl Into<String>,
        request: String,
        body_or_response: String,
    ) -> Self {
        Self {
            status_code: STATUS_OK,
            license: license.to_string(),
            id,
            name: name.into(),
            request,
            body_or_response,
        }
    }
}

/// Serialize `value` as JSON indented with tabs.
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer).context("encode json")?;
    String::from_utf8(buf).context("encoded json is not utf-8")
}

/// Rows produced for one resource cycle, create row first.
pub trait Bundle: Serialize {
    const RESOURCE: Resource;

    fn rows(&self) -> Vec<(&'static str, &VerificationRow)>;

    /// Set when the created record could not be deleted but the rows were kept.
    fn cleanup_warning(&self) -> Option<&str> {
        None
    }
}

/// Check a bundle before it is handed out.
///
/// The bundle must encode to JSON, every row must carry the success code and
/// the license under test, and every row must refer to the created id.
pub fn validate_bundle<B: Bundle>(bundle: &B, license: &str) -> Result<()> {
    serde_json::to_value(bundle).context("encode bundle")?;

    let rows = bundle.rows();
    let Some((_, create)) = rows.first() else {
        bail!("{} bundle has no rows", B::RESOURCE);
    };
    if create.id == 0 {
        bail!("{} create row has no id", B::RESOURCE);
    }
    for (step, row) in &rows {
        if row.status_code != STATUS_OK {
            bail!(
                "{} {step} row has status {}, expected {STATUS_OK}",
                B::RESOURCE,
                row.status_code
            );
        }
        if row.license != license {
            bail!(
                "{} {step} row license {} does not match {license}",
                B::RESOURCE,
                row.license
            );
        }
        if row.id != create.id {
            bail!(
                "{} {step} row id {} does not match created id {}",
                B::RESOURCE,
                row.id,
                create.id
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct PairBundle {
        create: VerificationRow,
        get: VerificationRow,
    }

    impl Bundle for PairBundle {
        const RESOURCE: Resource = Resource::Strains;

        fn rows(&self) -> Vec<(&'static str, &VerificationRow)> {
            vec![("create", &self.create), ("get", &self.get)]
        }
    }

    fn row(id: i64) -> VerificationRow {
        VerificationRow::ok("L", id, "n", "r".to_string(), "{}".to_string())
    }

    #[test]
    fn pretty_json_indents_with_tabs() {
        let json = pretty_json(&serde_json::json!({"Name": "X"})).expect("json");
        assert_eq!(json, "{\n\t\"Name\": \"X\"\n}");
    }

    #[test]
    fn accepts_consistent_bundle() {
        let bundle = PairBundle {
            create: row(5),
            get: row(5),
        };
        validate_bundle(&bundle, "L").expect("valid");
    }

    #[test]
    fn rejects_id_mismatch() {
        let bundle = PairBundle {
            create: row(5),
            get: row(6),
        };
        let err = validate_bundle(&bundle, "L").expect_err("mismatch");
        assert!(err.to_string().contains("does not match created id 5"));
    }

    #[test]
    fn rejects_missing_id_and_foreign_license() {
        let unassigned = PairBundle {
            create: row(0),
            get: row(0),
        };
        assert!(validate_bundle(&unassigned, "L").is_err());

        let bundle = PairBundle {
            create: row(5),
            get: row(5),
        };
        let err = validate_bundle(&bundle, "OTHER").expect_err("license");
        assert!(err.to_string().contains("license"));
    }
}
