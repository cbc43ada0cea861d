//! In-process store with the same semantics as the Postgres schema:
//! unique usernames, foreign keys and cascading requirement deletes.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    ApplicationOrder, ApplicationPatch, NewApplication, NewRequirement, NewUser, PlatformStore,
    RequirementPatch, SortField, SortOrder, StoreError,
};
use crate::models::{Application, Requirement, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    requirements: BTreeMap<i64, Requirement>,
    applications: BTreeMap<i64, Application>,
    next_user: i64,
    next_requirement: i64,
    next_application: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

/// Orders by the chosen column with missing values last, then by id.
fn compare(a: &Application, b: &Application, order: ApplicationOrder) -> Ordering {
    let directed = |ord: Ordering| match order.order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    };
    let primary = match order.field {
        SortField::CostEstimation => directed(a.cost_estimation.total_cmp(&b.cost_estimation)),
        SortField::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
        SortField::EstimatedDurationDays => {
            match (a.estimated_duration_days, b.estimated_duration_days) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    };
    primary.then(a.id.cmp(&b.id))
}

#[async_trait]
impl PlatformStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables()?;
        if t.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict("username".into()));
        }
        let user = User {
            id: next_id(&mut t.next_user),
            username: new.username,
            password_hash: new.password_hash,
            role: new.role,
            created_at: Utc::now(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_requirement(&self, new: NewRequirement) -> Result<Requirement, StoreError> {
        let mut t = self.tables()?;
        if !t.users.contains_key(&new.owner_id) {
            return Err(StoreError::MissingReference("user"));
        }
        let now = Utc::now();
        let requirement = Requirement {
            id: next_id(&mut t.next_requirement),
            owner_id: new.owner_id,
            title: new.title,
            description: new.description,
            location: new.location,
            attachment: new.attachment,
            created_at: now,
            updated_at: now,
        };
        t.requirements.insert(requirement.id, requirement.clone());
        Ok(requirement)
    }

    async fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError> {
        Ok(self.tables()?.requirements.values().cloned().collect())
    }

    async fn get_requirement(&self, id: i64) -> Result<Option<Requirement>, StoreError> {
        Ok(self.tables()?.requirements.get(&id).cloned())
    }

    async fn update_requirement(
        &self,
        id: i64,
        patch: RequirementPatch,
    ) -> Result<Option<Requirement>, StoreError> {
        let mut t = self.tables()?;
        let Some(requirement) = t.requirements.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            requirement.title = title;
        }
        if let Some(description) = patch.description {
            requirement.description = description;
        }
        if let Some(location) = patch.location {
            requirement.location = Some(location);
        }
        requirement.updated_at = Utc::now();
        Ok(Some(requirement.clone()))
    }

    async fn delete_requirement(&self, id: i64) -> Result<Option<Requirement>, StoreError> {
        let mut t = self.tables()?;
        let removed = t.requirements.remove(&id);
        if removed.is_some() {
            t.applications.retain(|_, app| app.requirement_id != id);
        }
        Ok(removed)
    }

    async fn create_application(&self, new: NewApplication) -> Result<Application, StoreError> {
        let mut t = self.tables()?;
        if !t.requirements.contains_key(&new.requirement_id) {
            return Err(StoreError::MissingReference("requirement"));
        }
        if !t.users.contains_key(&new.contractor_id) {
            return Err(StoreError::MissingReference("user"));
        }
        let now = Utc::now();
        let application = Application {
            id: next_id(&mut t.next_application),
            requirement_id: new.requirement_id,
            contractor_id: new.contractor_id,
            proposal: new.proposal,
            cost_estimation: new.cost_estimation,
            estimated_duration_days: new.estimated_duration_days,
            created_at: now,
            updated_at: now,
        };
        t.applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn get_application(&self, id: i64) -> Result<Option<Application>, StoreError> {
        Ok(self.tables()?.applications.get(&id).cloned())
    }

    async fn list_applications(
        &self,
        requirement_id: i64,
        order: Option<ApplicationOrder>,
    ) -> Result<Vec<Application>, StoreError> {
        let mut apps: Vec<Application> = self
            .tables()?
            .applications
            .values()
            .filter(|app| app.requirement_id == requirement_id)
            .cloned()
            .collect();
        if let Some(order) = order {
            apps.sort_by(|a, b| compare(a, b, order));
        }
        Ok(apps)
    }

    async fn update_application(
        &self,
        id: i64,
        patch: ApplicationPatch,
    ) -> Result<Option<Application>, StoreError> {
        let mut t = self.tables()?;
        let Some(app) = t.applications.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(proposal) = patch.proposal {
            app.proposal = proposal;
        }
        if let Some(cost) = patch.cost_estimation {
            app.cost_estimation = cost;
        }
        if let Some(days) = patch.estimated_duration_days {
            app.estimated_duration_days = Some(days);
        }
        app.updated_at = Utc::now();
        Ok(Some(app.clone()))
    }

    async fn delete_application(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables()?.applications.remove(&id).is_some())
    }
}
