//! Incident tracking: plain CRUD with a free-form status field.

use crate::db::entities::incidents;
use crate::error::CoreResult;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

pub struct IncidentService {
    db: DatabaseConnection,
}

impl IncidentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_incident(
        &self,
        title: &str,
        description: &str,
        created_by: u64,
    ) -> CoreResult<incidents::Model> {
        let now = Utc::now().naive_utc();
        let model = incidents::ActiveModel {
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            status: Set("open".to_string()),
            created_by: Set(created_by as i64),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?)
    }

    pub async fn get_incident(&self, incident_id: i32) -> CoreResult<Option<incidents::Model>> {
        Ok(incidents::Entity::find_by_id(incident_id)
            .one(&self.db)
            .await?)
    }

    /// Sets the status string; no transition graph is enforced. Returns
    /// `None` for an unknown id.
    pub async fn set_status(
        &self,
        incident_id: i32,
        status: &str,
    ) -> CoreResult<Option<incidents::Model>> {
        let Some(incident) = incidents::Entity::find_by_id(incident_id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut model: incidents::ActiveModel = incident.into();
        model.status = Set(status.to_string());
        model.updated_at = Set(Utc::now().naive_utc());
        Ok(Some(model.update(&self.db).await?))
    }

    /// Returns whether a row was actually removed.
    pub async fn delete_incident(&self, incident_id: i32) -> CoreResult<bool> {
        let result = incidents::Entity::delete_by_id(incident_id)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
