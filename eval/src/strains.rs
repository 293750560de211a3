//! Strains sheet: create, read back, delete. Metrc's sheet has no update row.

use anyhow::{Context, Result};
use metrc::models::{Named, Strain};
use metrc::{MetrcApi, Operation, Resource};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::clock::NameClock;
use crate::row::{Bundle, VerificationRow, pretty_json, validate_bundle};
use crate::verify::Verifier;

/// Rows for the strains sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrainsBundle {
    pub create: VerificationRow,
    pub get: VerificationRow,
    /// Delete failure tolerated under `cleanup = "warn"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_warning: Option<String>,
}

impl Bundle for StrainsBundle {
    const RESOURCE: Resource = Resource::Strains;

    fn rows(&self) -> Vec<(&'static str, &VerificationRow)> {
        vec![("create", &self.create), ("get", &self.get)]
    }

    fn cleanup_warning(&self) -> Option<&str> {
        self.cleanup_warning.as_deref()
    }
}

impl<M: MetrcApi, C: NameClock> Verifier<'_, M, C> {
    #[instrument(skip(self))]
    pub fn verify_strains(&self, license: &str) -> Result<StrainsBundle> {
        let name = self.names().strain();

        let create = self
            .create_strain(license, &name)
            .context("could not create strain")?;
        let id = create.id;
        let get = self
            .get_strain(license, &name, id)
            .context("could not get strain")?;

        let mut bundle = StrainsBundle {
            create,
            get,
            cleanup_warning: None,
        };
        validate_bundle(&bundle, license).context("invalid strains bundle")?;

        bundle.cleanup_warning = self
            .clean_up(Resource::Strains, id, || {
                self.api.delete_strain_by_id(id, license)
            })
            .context("could not delete strain")?;

        info!(id, "strains verified");
        Ok(bundle)
    }

    /// Step 1: create a strain from the configured profile.
    pub fn create_strain(&self, license: &str, name: &str) -> Result<VerificationRow> {
        let profile = &self.config.strain_profile;
        let strains = vec![Strain {
            id: None,
            name: name.to_string(),
            testing_status: profile.testing_status.clone(),
            thc_level: Some(profile.thc_level),
            cbd_level: Some(profile.cbd_level),
            indica_percentage: Some(profile.indica_percentage),
            sativa_percentage: Some(profile.sativa_percentage),
            ..Strain::default()
        }];
        self.api
            .create_strains(&strains, license)
            .context("could not create strains")?;

        let created = self.find_created(Resource::Strains, name, || {
            self.api.get_strains_active(license)
        })?;
        let body = pretty_json(&strains).context("could not encode create body")?;

        Ok(VerificationRow::ok(
            license,
            created.id(),
            name,
            self.target(Resource::Strains, Operation::Create, license),
            body,
        ))
    }

    /// Step 2: read the strain back by id.
    pub fn get_strain(&self, license: &str, name: &str, id: i64) -> Result<VerificationRow> {
        let strain = self
            .api
            .get_strain_by_id(id, license)
            .context("could not get strain by id")?;
        let body = pretty_json(&strain).context("could not encode strain response")?;

        Ok(VerificationRow::ok(
            license,
            id,
            name,
            self.target(Resource::Strains, Operation::Id(id), license),
            body,
        ))
    }
}
