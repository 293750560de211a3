//! In-memory [`MetrcApi`] for tests.
//!
//! `StubMetrc` assigns sequential ids on create, serves the created records
//! from the active listings, records every call, and can be told to fail a
//! given operation, to hide new records from the listings, or to list them
//! only after a few listings have gone by.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use anyhow::{Result, anyhow, bail};

use crate::client::MetrcApi;
use crate::endpoint::Resource;
use crate::models::{Item, ItemPost, Location, LocationPost, Strain};

/// Operation kinds the stub can record or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubOp {
    Create,
    Update,
    Active,
    GetById,
    Delete,
}

/// One recorded call. `id` is set for by-id operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub resource: Resource,
    pub op: StubOp,
    pub id: Option<i64>,
}

#[derive(Debug, Default)]
struct StubState {
    next_id: i64,
    locations: Vec<Location>,
    strains: Vec<Strain>,
    items: Vec<Item>,
    calls: Vec<Call>,
    failures: HashSet<(Resource, StubOp)>,
    hidden: HashSet<Resource>,
    lag: HashMap<Resource, u32>,
    /// Created records not yet listed, with the listings left before they are.
    pending: Vec<(u32, Record)>,
}

#[derive(Debug, Clone)]
enum Record {
    Location(Location),
    Strain(Strain),
    Item(Item),
}

impl Record {
    fn resource(&self) -> Resource {
        match self {
            Record::Location(_) => Resource::Locations,
            Record::Strain(_) => Resource::Strains,
            Record::Item(_) => Resource::Items,
        }
    }
}

impl StubState {
    fn publish(&mut self, record: Record) {
        match record {
            Record::Location(location) => self.locations.push(location),
            Record::Strain(strain) => self.strains.push(strain),
            Record::Item(item) => self.items.push(item),
        }
    }

    /// Store a created record, honouring hidden and lagging resources.
    fn store(&mut self, record: Record) {
        let resource = record.resource();
        if self.hidden.contains(&resource) {
            return;
        }
        match self.lag.get(&resource).copied().unwrap_or(0) {
            0 => self.publish(record),
            listings => self.pending.push((listings, record)),
        }
    }

    /// One active listing of `resource` went by.
    fn advance(&mut self, resource: Resource) {
        let pending = std::mem::take(&mut self.pending);
        for (remaining, record) in pending {
            if record.resource() != resource {
                self.pending.push((remaining, record));
            } else if remaining == 0 {
                self.publish(record);
            } else {
                self.pending.push((remaining - 1, record));
            }
        }
    }
}

#[derive(Debug)]
pub struct StubMetrc {
    state: RefCell<StubState>,
}

impl Default for StubMetrc {
    fn default() -> Self {
        Self::new()
    }
}

impl StubMetrc {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(StubState {
                next_id: 1,
                ..StubState::default()
            }),
        }
    }

    /// Id handed to the next created record.
    pub fn with_next_id(self, id: i64) -> Self {
        self.state.borrow_mut().next_id = id;
        self
    }

    /// Make `op` on `resource` return an error.
    pub fn failing(self, resource: Resource, op: StubOp) -> Self {
        self.state.borrow_mut().failures.insert((resource, op));
        self
    }

    /// Accept creates for `resource` but never list them as active.
    pub fn hiding_creates(self, resource: Resource) -> Self {
        self.state.borrow_mut().hidden.insert(resource);
        self
    }

    /// List new `resource` records only from the `listings + 1`-th active
    /// listing after their creation.
    pub fn lagging(self, resource: Resource, listings: u32) -> Self {
        self.state.borrow_mut().lag.insert(resource, listings);
        self
    }

    pub fn seed_location(&self, location: Location) {
        self.state.borrow_mut().locations.push(location);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn calls_to(&self, resource: Resource, op: StubOp) -> Vec<Call> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.resource == resource && call.op == op)
            .cloned()
            .collect()
    }

    pub fn locations(&self) -> Vec<Location> {
        self.state.borrow().locations.clone()
    }

    pub fn strains(&self) -> Vec<Strain> {
        self.state.borrow().strains.clone()
    }

    pub fn items(&self) -> Vec<Item> {
        self.state.borrow().items.clone()
    }

    /// Record the call, then fail it if a failure was registered.
    fn enter(&self, resource: Resource, op: StubOp, id: Option<i64>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call { resource, op, id });
        if state.failures.contains(&(resource, op)) {
            bail!("stub failure: {resource} {op:?}");
        }
        Ok(())
    }

    fn allocate(&self) -> i64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        id
    }

    fn store(&self, record: Record) {
        self.state.borrow_mut().store(record);
    }

    fn list(&self, resource: Resource) -> Result<()> {
        self.enter(resource, StubOp::Active, None)?;
        self.state.borrow_mut().advance(resource);
        Ok(())
    }
}

fn not_found(resource: Resource, id: i64) -> anyhow::Error {
    anyhow!("stub: no {resource} with id {id}")
}

fn location_record(id: i64, post: &LocationPost) -> Location {
    Location {
        id,
        name: post.name.clone(),
        location_type_name: Some(post.location_type_name.clone()),
        ..Location::default()
    }
}

fn item_record(id: i64, post: &ItemPost) -> Item {
    Item {
        id,
        name: post.name.clone(),
        product_category_name: Some(post.item_category.clone()),
        unit_of_measure_name: Some(post.unit_of_measure.clone()),
        strain_name: Some(post.strain.clone()),
        ..Item::default()
    }
}

impl MetrcApi for StubMetrc {
    fn create_locations(&self, locations: &[LocationPost], _license: &str) -> Result<()> {
        self.enter(Resource::Locations, StubOp::Create, None)?;
        for post in locations {
            let id = self.allocate();
            self.store(Record::Location(location_record(id, post)));
        }
        Ok(())
    }

    fn update_locations(&self, locations: &[LocationPost], _license: &str) -> Result<()> {
        self.enter(Resource::Locations, StubOp::Update, None)?;
        let mut state = self.state.borrow_mut();
        for post in locations {
            let id = post
                .id
                .ok_or_else(|| anyhow!("stub: location update without id"))?;
            let slot = state
                .locations
                .iter_mut()
                .find(|location| location.id == id)
                .ok_or_else(|| not_found(Resource::Locations, id))?;
            *slot = location_record(id, post);
        }
        Ok(())
    }

    fn get_locations_active(&self, _license: &str) -> Result<Vec<Location>> {
        self.list(Resource::Locations)?;
        Ok(self.locations())
    }

    fn get_location_by_id(&self, id: i64, _license: &str) -> Result<Location> {
        self.enter(Resource::Locations, StubOp::GetById, Some(id))?;
        self.locations()
            .into_iter()
            .find(|location| location.id == id)
            .ok_or_else(|| not_found(Resource::Locations, id))
    }

    fn delete_location_by_id(&self, id: i64, _license: &str) -> Result<()> {
        self.enter(Resource::Locations, StubOp::Delete, Some(id))?;
        let mut state = self.state.borrow_mut();
        let before = state.locations.len();
        state.locations.retain(|location| location.id != id);
        if state.locations.len() == before {
            return Err(not_found(Resource::Locations, id));
        }
        Ok(())
    }

    fn create_strains(&self, strains: &[Strain], _license: &str) -> Result<()> {
        self.enter(Resource::Strains, StubOp::Create, None)?;
        for strain in strains {
            let mut record = strain.clone();
            record.id = Some(self.allocate());
            self.store(Record::Strain(record));
        }
        Ok(())
    }

    fn update_strains(&self, strains: &[Strain], _license: &str) -> Result<()> {
        self.enter(Resource::Strains, StubOp::Update, None)?;
        let mut state = self.state.borrow_mut();
        for strain in strains {
            let id = strain
                .id
                .ok_or_else(|| anyhow!("stub: strain update without id"))?;
            let slot = state
                .strains
                .iter_mut()
                .find(|existing| existing.id == Some(id))
                .ok_or_else(|| not_found(Resource::Strains, id))?;
            *slot = strain.clone();
        }
        Ok(())
    }

    fn get_strains_active(&self, _license: &str) -> Result<Vec<Strain>> {
        self.list(Resource::Strains)?;
        Ok(self.strains())
    }

    fn get_strain_by_id(&self, id: i64, _license: &str) -> Result<Strain> {
        self.enter(Resource::Strains, StubOp::GetById, Some(id))?;
        self.strains()
            .into_iter()
            .find(|strain| strain.id == Some(id))
            .ok_or_else(|| not_found(Resource::Strains, id))
    }

    fn delete_strain_by_id(&self, id: i64, _license: &str) -> Result<()> {
        self.enter(Resource::Strains, StubOp::Delete, Some(id))?;
        let mut state = self.state.borrow_mut();
        let before = state.strains.len();
        state.strains.retain(|strain| strain.id != Some(id));
        if state.strains.len() == before {
            return Err(not_found(Resource::Strains, id));
        }
        Ok(())
    }

    fn create_items(&self, items: &[ItemPost], _license: &str) -> Result<()> {
        self.enter(Resource::Items, StubOp::Create, None)?;
        for post in items {
            let id = self.allocate();
            self.store(Record::Item(item_record(id, post)));
        }
        Ok(())
    }

    fn update_items(&self, items: &[ItemPost], _license: &str) -> Result<()> {
        self.enter(Resource::Items, StubOp::Update, None)?;
        let mut state = self.state.borrow_mut();
        for post in items {
            let id = post
                .id
                .ok_or_else(|| anyhow!("stub: item update without id"))?;
            let slot = state
                .items
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or_else(|| not_found(Resource::Items, id))?;
            *slot = item_record(id, post);
        }
        Ok(())
    }

    fn get_items_active(&self, _license: &str) -> Result<Vec<Item>> {
        self.list(Resource::Items)?;
        Ok(self.items())
    }

    fn get_item_by_id(&self, id: i64, _license: &str) -> Result<Item> {
        self.enter(Resource::Items, StubOp::GetById, Some(id))?;
        self.items()
            .into_iter()
            .find(|item| item.id == id)
            .ok_or_else(|| not_found(Resource::Items, id))
    }

    fn delete_item_by_id(&self, id: i64, _license: &str) -> Result<()> {
        self.enter(Resource::Items, StubOp::Delete, Some(id))?;
        let mut state = self.state.borrow_mut();
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        if state.items.len() == before {
            return Err(not_found(Resource::Items, id));
        }
        Ok(())
    }
}
