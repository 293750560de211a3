//! Items sheet: create, change unit of measure, read back.
//!
//! Items are not deleted afterwards; the sandbox keeps them.

use anyhow::{Context, Result};
use metrc::models::{ItemPost, Named};
use metrc::{MetrcApi, Operation, Resource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::clock::NameClock;
use crate::row::{Bundle, VerificationRow, pretty_json, validate_bundle};
use crate::verify::Verifier;

/// Rows for the items sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemsBundle {
    pub create: VerificationRow,
    pub update: VerificationRow,
    pub get: VerificationRow,
}

impl Bundle for ItemsBundle {
    const RESOURCE: Resource = Resource::Items;

    fn rows(&self) -> Vec<(&'static str, &VerificationRow)> {
        vec![
            ("create", &self.create),
            ("update", &self.update),
            ("get", &self.get),
        ]
    }
}

impl<M: MetrcApi, C: NameClock> Verifier<'_, M, C> {
    #[instrument(skip(self))]
    pub fn verify_items(&self, license: &str) -> Result<ItemsBundle> {
        let name = self.names().item();

        let create = self
            .create_item(license, &name)
            .context("could not create item")?;
        let id = create.id;
        let update = self
            .update_item(license, &name, id)
            .context("could not update item")?;
        let get = self
            .get_item(license, &name, id)
            .context("could not get item")?;

        let bundle = ItemsBundle {
            create,
            update,
            get,
        };
        validate_bundle(&bundle, license).context("invalid items bundle")?;

        info!(id, "items verified");
        Ok(bundle)
    }

    fn item_post(&self, name: &str, id: Option<i64>, unit_of_measure: &str) -> ItemPost {
        let profile = &self.config.item_profile;
        ItemPost {
            id,
            item_category: profile.category.clone(),
            name: name.to_string(),
            unit_of_measure: unit_of_measure.to_string(),
            strain: profile.strain.clone(),
            unit_thc_content: profile.unit_thc_content,
            unit_thc_content_unit_of_measure: profile.unit_thc_content_unit_of_measure.clone(),
            unit_thc_content_dose: profile.unit_thc_content_dose,
            unit_thc_content_dose_unit_of_measure: profile
                .unit_thc_content_dose_unit_of_measure
                .clone(),
            unit_weight: profile.unit_weight,
            unit_weight_unit_of_measure: profile.unit_weight_unit_of_measure.clone(),
            number_of_doses: profile.number_of_doses,
        }
    }

    /// Step 1: create an item from the configured profile.
    pub fn create_item(&self, license: &str, name: &str) -> Result<VerificationRow> {
        let baseline = self
            .api
            .get_items_active(license)
            .context("could not initially get active items")?;
        debug!(active = baseline.len(), "baseline items");

        let posts = vec![self.item_post(name, None, &self.config.item_profile.unit_of_measure)];
        self.api
            .create_items(&posts, license)
            .context("could not create initial items")?;

        let created = self.find_created(Resource::Items, name, || {
            self.api.get_items_active(license)
        })?;
        let body = pretty_json(&posts).context("could not encode create body")?;

        Ok(VerificationRow::ok(
            license,
            created.id(),
            name,
            self.target(Resource::Items, Operation::Create, license),
            body,
        ))
    }

    /// Step 2: switch the unit of measure.
    pub fn update_item(&self, license: &str, name: &str, id: i64) -> Result<VerificationRow> {
        let posts = vec![self.item_post(
            name,
            Some(id),
            &self.config.item_profile.updated_unit_of_measure,
        )];
        self.api
            .update_items(&posts, license)
            .context("could not update items")?;
        let body = pretty_json(&posts).context("could not encode update body")?;

        Ok(VerificationRow::ok(
            license,
            id,
            name,
            self.target(Resource::Items, Operation::Update, license),
            body,
        ))
    }

    /// Step 3: read the item back by id.
    pub fn get_item(&self, license: &str, name: &str, id: i64) -> Result<VerificationRow> {
        let item = self
            .api
            .get_item_by_id(id, license)
            .context("could not get item by id")?;
        let body = pretty_json(&item).context("could not encode item response")?;

        Ok(VerificationRow::ok(
            license,
            id,
            name,
            self.target(Resource::Items, Operation::Id(id), license),
            body,
        ))
    }
}

#[cfg(test)]
mod tests {
    use metrc::test_support::{StubMetrc, StubOp};

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::{CorrelationConfig, EvalConfig};
    use crate::test_support::{LICENSE, test_config, verifier};

    const NAME: &str = "Metrc Item Name 2021.01.01 12:00:00";

    #[test]
    fn full_cycle_switches_unit_of_measure() {
        let stub = StubMetrc::new().with_next_id(21);
        let bundle = verifier(&stub).verify_items(LICENSE).expect("verify");

        for (_, row) in bundle.rows() {
            assert_eq!(row.id, 21);
            assert_eq!(row.name, NAME);
        }
        assert!(bundle.create.body_or_response.contains("\"UnitOfMeasure\": \"Ounces\""));
        assert!(bundle.update.body_or_response.contains("\"UnitOfMeasure\": \"Milligrams\""));
        assert!(bundle.update.body_or_response.contains("\"Id\": 21"));
        assert!(
            bundle
                .get
                .body_or_response
                .contains("\"UnitOfMeasureName\": \"Milligrams\"")
        );

        let base = test_config().base_url;
        assert_eq!(
            bundle.update.request,
            format!("{base}/items/v1/update?licenseNumber={LICENSE}")
        );
        assert_eq!(
            bundle.get.request,
            format!("{base}/items/v1/21?licenseNumber={LICENSE}")
        );
    }

    #[test]
    fn items_are_not_deleted() {
        let stub = StubMetrc::new();
        verifier(&stub).verify_items(LICENSE).expect("verify");
        assert!(stub.calls_to(Resource::Items, StubOp::Delete).is_empty());
        assert_eq!(stub.items().len(), 1);
    }

    #[test]
    fn create_lists_before_and_after_submitting() {
        let stub = StubMetrc::new();
        verifier(&stub).create_item(LICENSE, NAME).expect("create");
        let ops: Vec<StubOp> = stub.calls().iter().map(|call| call.op).collect();
        assert_eq!(ops, vec![StubOp::Active, StubOp::Create, StubOp::Active]);
    }

    #[test]
    fn lagging_listing_needs_extra_attempts() {
        let stub = StubMetrc::new().lagging(Resource::Items, 1);
        let err = verifier(&stub)
            .verify_items(LICENSE)
            .expect_err("single relist misses it");
        assert!(format!("{err:#}").contains("matching name not found"));

        let stub = StubMetrc::new().lagging(Resource::Items, 1);
        let config = EvalConfig {
            correlation: CorrelationConfig {
                attempts: 2,
                backoff_ms: 0,
            },
            ..test_config()
        };
        let bundle = Verifier::new(&stub, config, FixedClock::new_year_noon())
            .verify_items(LICENSE)
            .expect("second relist finds it");
        assert_eq!(bundle.create.id, 1);
    }

    #[test]
    fn get_failure_is_attributed_to_get_step() {
        let stub = StubMetrc::new().failing(Resource::Items, StubOp::GetById);
        let err = verifier(&stub)
            .verify_items(LICENSE)
            .expect_err("get fails");
        assert!(format!("{err:#}").starts_with("could not get item: could not get item by id"));
    }
}
