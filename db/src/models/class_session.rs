use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::DeriveActiveEnum;
use sea_orm::QueryFilter;
use sea_orm::QueryOrder;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A lecture instance open for geofenced attendance.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "class_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The creating lecturer.
    pub lecturer_id: i64,
    pub course_code: String,
    pub title: String,

    /// Registered location in decimal degrees.
    pub latitude: f64,
    pub longitude: f64,
    /// Admission radius in meters, always > 0.
    pub radius_meters: i32,

    pub status: ClassStatus,
    /// Attendance gate, independent of `status`.
    pub attendance_open: bool,

    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "class_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClassStatus {
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "paused")]
    Paused,

    #[sea_orm(string_value = "ended")]
    Ended,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LecturerId",
        to = "super::user::Column::Id"
    )]
    Lecturer,

    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Column values for a new class session. Validation happens in the service layer.
#[derive(Debug, Clone)]
pub struct NewClassSession {
    pub lecturer_id: i64,
    pub course_code: String,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: i32,
    pub attendance_open: bool,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl Model {
    pub async fn create(db: &DbConn, new: NewClassSession) -> Result<Model, DbErr> {
        let now = Utc::now();

        let active_model = ActiveModel {
            lecturer_id: Set(new.lecturer_id),
            course_code: Set(new.course_code),
            title: Set(new.title),
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            radius_meters: Set(new.radius_meters),
            status: Set(ClassStatus::Active),
            attendance_open: Set(new.attendance_open),
            starts_at: Set(new.starts_at),
            ends_at: Set(new.ends_at),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    pub async fn find_by_id(db: &DbConn, id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_all_for_lecturer(db: &DbConn, lecturer_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::LecturerId.eq(lecturer_id))
            .order_by_desc(Column::StartsAt)
            .all(db)
            .await
    }

    async fn load(db: &DbConn, id: i64) -> Result<Model, DbErr> {
        Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Class session ID {id} not found")))
    }

    pub async fn set_status(
        db: &DbConn,
        id: i64,
        status: ClassStatus,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        let mut active_model: ActiveModel = Self::load(db, id).await?.into();

        active_model.status = Set(status);
        active_model.updated_at = Set(now);
        active_model.update(db).await
    }

    /// Marks the session ended, closing the time window at `now` unless an
    /// earlier end was already scheduled.
    pub async fn end(db: &DbConn, id: i64, now: DateTime<Utc>) -> Result<Model, DbErr> {
        let model = Self::load(db, id).await?;

        let ends_at = match model.ends_at {
            Some(scheduled) if scheduled <= now => scheduled,
            _ => now,
        };

        let mut active_model: ActiveModel = model.into();
        active_model.status = Set(ClassStatus::Ended);
        active_model.ends_at = Set(Some(ends_at));
        active_model.updated_at = Set(now);
        active_model.update(db).await
    }

    pub async fn set_attendance_open(
        db: &DbConn,
        id: i64,
        open: bool,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr> {
        let mut active_model: ActiveModel = Self::load(db, id).await?.into();

        active_model.attendance_open = Set(open);
        active_model.updated_at = Set(now);
        active_model.update(db).await
    }

    pub async fn delete_by_id(db: &DbConn, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }
}
