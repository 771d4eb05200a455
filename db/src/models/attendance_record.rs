use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, PaginatorTrait, QueryOrder};
use serde::Serialize;

/// One student's admitted presence at one class session.
///
/// `(class_session_id, student_id)` is unique at the storage layer. Records
/// are never updated in place.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_session_id: i64,
    pub student_id: i64,

    /// Submitted coordinates; `None` for manual entries.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters from the class location, rounded to 2 decimals. 0 for manual entries.
    pub distance_meters: f64,

    pub marked_at: DateTime<Utc>,
    pub is_manual: bool,
    /// Lecturer who asserted a manual entry.
    pub marked_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class_session::Entity",
        from = "Column::ClassSessionId",
        to = "super::class_session::Column::Id",
        on_delete = "Cascade"
    )]
    ClassSession,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::class_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassSession.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Column values for a record about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendanceRecord {
    pub class_session_id: i64,
    pub student_id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_meters: f64,
    pub marked_at: DateTime<Utc>,
    pub is_manual: bool,
    pub marked_by: Option<i64>,
}

impl From<NewAttendanceRecord> for ActiveModel {
    fn from(new: NewAttendanceRecord) -> Self {
        ActiveModel {
            class_session_id: Set(new.class_session_id),
            student_id: Set(new.student_id),
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            distance_meters: Set(new.distance_meters),
            marked_at: Set(new.marked_at),
            is_manual: Set(new.is_manual),
            marked_by: Set(new.marked_by),
            ..Default::default()
        }
    }
}

impl Model {
    /// Plain insert. Duplicate pairs surface as a unique-constraint `DbErr`.
    pub async fn insert_new(db: &DbConn, new: NewAttendanceRecord) -> Result<Model, DbErr> {
        ActiveModel::from(new).insert(db).await
    }

    pub async fn find_for(
        db: &DbConn,
        class_session_id: i64,
        student_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassSessionId.eq(class_session_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    pub async fn exists_for(
        db: &DbConn,
        class_session_id: i64,
        student_id: i64,
    ) -> Result<bool, DbErr> {
        let c = Entity::find()
            .filter(Column::ClassSessionId.eq(class_session_id))
            .filter(Column::StudentId.eq(student_id))
            .count(db)
            .await?;
        Ok(c > 0)
    }

    /// Roster for a session in marking order, each record paired with its student.
    pub async fn find_all_for_session_with_students(
        db: &DbConn,
        class_session_id: i64,
    ) -> Result<Vec<(Model, Option<super::user::Model>)>, DbErr> {
        Entity::find()
            .filter(Column::ClassSessionId.eq(class_session_id))
            .order_by_asc(Column::MarkedAt)
            .order_by_asc(Column::Id)
            .find_also_related(super::user::Entity)
            .all(db)
            .await
    }

    pub async fn count_for_session(db: &DbConn, class_session_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ClassSessionId.eq(class_session_id))
            .count(db)
            .await
    }

    /// Removes one student's record. Returns whether a row was deleted.
    pub async fn delete_for(
        db: &DbConn,
        class_session_id: i64,
        student_id: i64,
    ) -> Result<bool, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::ClassSessionId.eq(class_session_id))
            .filter(Column::StudentId.eq(student_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}
