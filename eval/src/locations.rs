//! Locations sheet: create, rename, read back, delete.

use anyhow::{Context, Result};
use metrc::models::{LocationPost, Named};
use metrc::{MetrcApi, Operation, Resource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::clock::NameClock;
use crate::row::{Bundle, VerificationRow, pretty_json, validate_bundle};
use crate::verify::Verifier;

/// Rows for the locations sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationsBundle {
    pub create: VerificationRow,
    pub update: VerificationRow,
    pub get: VerificationRow,
    /// Delete failure tolerated under `cleanup = "warn"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_warning: Option<String>,
}

impl Bundle for LocationsBundle {
    const RESOURCE: Resource = Resource::Locations;

    fn rows(&self) -> Vec<(&'static str, &VerificationRow)> {
        vec![
            ("create", &self.create),
            ("update", &self.update),
            ("get", &self.get),
        ]
    }

    fn cleanup_warning(&self) -> Option<&str> {
        self.cleanup_warning.as_deref()
    }
}

impl<M: MetrcApi, C: NameClock> Verifier<'_, M, C> {
    /// Run the full locations cycle and clean up the created location.
    #[instrument(skip(self))]
    pub fn verify_locations(&self, license: &str) -> Result<LocationsBundle> {
        let names = self.names();
        let updated_name = names.updated_location();

        let create = self
            .create_location(license, &names.location())
            .context("could not create location")?;
        let id = create.id;
        let update = self
            .update_location(license, &updated_name, id)
            .context("could not update location")?;
        let get = self
            .get_location(license, &updated_name, id)
            .context("could not get final location")?;

        let mut bundle = LocationsBundle {
            create,
            update,
            get,
            cleanup_warning: None,
        };
        validate_bundle(&bundle, license).context("invalid locations bundle")?;

        bundle.cleanup_warning = self
            .clean_up(Resource::Locations, id, || {
                self.api.delete_location_by_id(id, license)
            })
            .context("could not delete location")?;

        info!(id, "locations verified");
        Ok(bundle)
    }

    /// Step 1: create a location and learn its id from the active listing.
    pub fn create_location(&self, license: &str, name: &str) -> Result<VerificationRow> {
        let baseline = self
            .api
            .get_locations_active(license)
            .context("could not initially get active locations")?;
        debug!(active = baseline.len(), "baseline locations");

        let posts = vec![LocationPost {
            id: None,
            name: name.to_string(),
            location_type_name: self.config.location_type.clone(),
        }];
        self.api
            .create_locations(&posts, license)
            .context("could not create initial location")?;

        let created = self.find_created(Resource::Locations, name, || {
            self.api.get_locations_active(license)
        })?;
        let body = pretty_json(&posts).context("could not encode create body")?;

        Ok(VerificationRow::ok(
            license,
            created.id(),
            name,
            self.target(Resource::Locations, Operation::Create, license),
            body,
        ))
    }

    /// Step 2: rename the location.
    pub fn update_location(&self, license: &str, name: &str, id: i64) -> Result<VerificationRow> {
        let posts = vec![LocationPost {
            id: Some(id),
            name: name.to_string(),
            location_type_name: self.config.location_type.clone(),
        }];
        self.api
            .update_locations(&posts, license)
            .context("could not update locations")?;
        let body = pretty_json(&posts).context("could not encode update body")?;

        Ok(VerificationRow::ok(
            license,
            id,
            name,
            self.target(Resource::Locations, Operation::Update, license),
            body,
        ))
    }

    /// Step 3: read the location back by id.
    pub fn get_location(&self, license: &str, name: &str, id: i64) -> Result<VerificationRow> {
        let location = self
            .api
            .get_location_by_id(id, license)
            .context("could not get location by id")?;
        let body = pretty_json(&location).context("could not encode location response")?;

        Ok(VerificationRow::ok(
            license,
            id,
            name,
            self.target(Resource::Locations, Operation::Id(id), license),
            body,
        ))
    }
}
