use crate::{
    db::DbPool,
    entities::dining_table::{
        self, ActiveModel as TableActiveModel, Entity as TableEntity, Model as TableModel,
    },
    entities::reservation::{
        self, ActiveModel as ReservationActiveModel, Entity as ReservationEntity,
        Model as ReservationModel, ReservationStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Iterable, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Two bookings on the same table and date conflict when their times lie
/// within a closed two-hour window of each other.
pub fn within_conflict_window(a: NaiveTime, b: NaiveTime) -> bool {
    let delta = if a >= b { a - b } else { b - a };
    delta <= Duration::hours(2)
}

/// A reservation checked against its table and the competing bookings on
/// that table and date.
#[derive(Debug, Clone, Copy)]
pub struct ReservationCandidate {
    pub reservation_time: NaiveTime,
    pub number_of_guests: i32,
}

/// Pre-write validation. Competing entries must already be restricted to
/// the candidate's table and date, hold a blocking status, and exclude the
/// candidate itself. The overlap window is only enforced when
/// `check_overlap` is set — the create path skips it and relies on the
/// exact-slot uniqueness alone.
pub fn validate_reservation(
    candidate: ReservationCandidate,
    capacity: i32,
    competing_times: &[NaiveTime],
    check_overlap: bool,
) -> Result<(), ServiceError> {
    if candidate.number_of_guests > capacity {
        return Err(ServiceError::ValidationError(format!(
            "Party of {} exceeds table capacity of {}",
            candidate.number_of_guests, capacity
        )));
    }
    if candidate.number_of_guests < 1 {
        return Err(ServiceError::ValidationError(
            "Number of guests must be at least 1".into(),
        ));
    }
    if competing_times
        .iter()
        .any(|t| *t == candidate.reservation_time)
    {
        return Err(ServiceError::Conflict(
            "Table is already reserved at this time".into(),
        ));
    }
    if check_overlap {
        if let Some(clash) = competing_times
            .iter()
            .find(|t| within_conflict_window(**t, candidate.reservation_time))
        {
            return Err(ServiceError::Conflict(format!(
                "Table has a reservation at {} within two hours of the requested time",
                clash
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateReservationRequest {
    pub customer_id: Uuid,
    pub table_id: Uuid,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub number_of_guests: i32,
    #[serde(default)]
    pub special_requests: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateReservationRequest {
    pub table_id: Option<Uuid>,
    pub reservation_date: Option<NaiveDate>,
    pub reservation_time: Option<NaiveTime>,
    pub number_of_guests: Option<i32>,
    pub special_requests: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateReservationStatusRequest {
    pub status: ReservationStatus,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTableRequest {
    #[validate(range(min = 1, message = "Table number must be at least 1"))]
    pub table_number: i32,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateTableRequest {
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i32>,
    pub is_available: Option<bool>,
    pub location: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Service for dining tables and reservations.
#[derive(Clone)]
pub struct ReservationService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ReservationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Blocking reservations on one table and date, minus the excluded id.
    async fn competing_times<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        table_id: Uuid,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<NaiveTime>, ServiceError> {
        let blocking = ReservationStatus::iter().filter(ReservationStatus::blocks_table);
        let mut query = ReservationEntity::find()
            .filter(reservation::Column::TableId.eq(table_id))
            .filter(reservation::Column::ReservationDate.eq(date))
            .filter(reservation::Column::Status.is_in(blocking));
        if let Some(exclude) = exclude {
            query = query.filter(reservation::Column::Id.ne(exclude));
        }
        Ok(query
            .all(conn)
            .await?
            .into_iter()
            .map(|r| r.reservation_time)
            .collect())
    }

    #[instrument(skip(self, request), fields(table_id = %request.table_id, date = %request.reservation_date))]
    pub async fn create_reservation(
        &self,
        request: CreateReservationRequest,
    ) -> Result<ReservationModel, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;

        crate::entities::customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;
        let table = TableEntity::find_by_id(request.table_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Table {} not found", request.table_id))
            })?;

        let competing = self
            .competing_times(&txn, request.table_id, request.reservation_date, None)
            .await?;
        validate_reservation(
            ReservationCandidate {
                reservation_time: request.reservation_time,
                number_of_guests: request.number_of_guests,
            },
            table.capacity,
            &competing,
            false,
        )?;

        let now = Utc::now();
        let model = ReservationActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(request.customer_id),
            table_id: Set(request.table_id),
            reservation_date: Set(request.reservation_date),
            reservation_time: Set(request.reservation_time),
            number_of_guests: Set(request.number_of_guests),
            status: Set(ReservationStatus::Pending),
            special_requests: Set(request.special_requests),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        self.event_sender
            .send(Event::ReservationCreated(model.id))
            .await
            .ok();
        info!(reservation_id = %model.id, "Reservation created");
        Ok(model)
    }

    pub async fn get_reservation(&self, id: Uuid) -> Result<ReservationModel, ServiceError> {
        ReservationEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Reservation {} not found", id)))
    }

    pub async fn list_reservations(
        &self,
        page: u64,
        limit: u64,
        date: Option<NaiveDate>,
        status: Option<ReservationStatus>,
    ) -> Result<(Vec<ReservationModel>, u64), ServiceError> {
        let mut query = ReservationEntity::find()
            .order_by_desc(reservation::Column::ReservationDate)
            .order_by_asc(reservation::Column::ReservationTime);
        if let Some(date) = date {
            query = query.filter(reservation::Column::ReservationDate.eq(date));
        }
        if let Some(status) = status {
            query = query.filter(reservation::Column::Status.eq(status));
        }
        let paginator = query.paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Full update. Unlike creation this also enforces the two-hour overlap
    /// window against the other blocking reservations on the table.
    #[instrument(skip(self, request), fields(reservation_id = %id))]
    pub async fn update_reservation(
        &self,
        id: Uuid,
        request: UpdateReservationRequest,
    ) -> Result<ReservationModel, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = ReservationEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Reservation {} not found", id)))?;

        let table_id = request.table_id.unwrap_or(existing.table_id);
        let date = request.reservation_date.unwrap_or(existing.reservation_date);
        let time = request.reservation_time.unwrap_or(existing.reservation_time);
        let guests = request.number_of_guests.unwrap_or(existing.number_of_guests);

        let table = TableEntity::find_by_id(table_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Table {} not found", table_id)))?;

        let competing = self.competing_times(&txn, table_id, date, Some(id)).await?;
        validate_reservation(
            ReservationCandidate {
                reservation_time: time,
                number_of_guests: guests,
            },
            table.capacity,
            &competing,
            true,
        )?;

        let mut active: ReservationActiveModel = existing.into();
        active.table_id = Set(table_id);
        active.reservation_date = Set(date);
        active.reservation_time = Set(time);
        active.number_of_guests = Set(guests);
        if let Some(special_requests) = request.special_requests {
            active.special_requests = Set(special_requests);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self), fields(reservation_id = %id))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: ReservationStatus,
    ) -> Result<ReservationModel, ServiceError> {
        let existing = self.get_reservation(id).await?;
        let old_status = existing.status;
        if old_status == new_status {
            return Ok(existing);
        }

        let mut active: ReservationActiveModel = existing.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db_pool).await?;

        self.event_sender
            .send(Event::ReservationStatusChanged {
                reservation_id: id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await
            .ok();
        info!(from = %old_status, to = %new_status, "Reservation status changed");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_reservation(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_reservation(id).await?;
        ReservationEntity::delete_by_id(existing.id)
            .exec(&*self.db_pool)
            .await?;
        info!(reservation_id = %id, "Reservation deleted");
        Ok(())
    }

    pub async fn today(&self) -> Result<Vec<ReservationModel>, ServiceError> {
        let today = Utc::now().date_naive();
        Ok(ReservationEntity::find()
            .filter(reservation::Column::ReservationDate.eq(today))
            .order_by_asc(reservation::Column::ReservationTime)
            .all(&*self.db_pool)
            .await?)
    }

    /// Bookings from today forward that are still PENDING or CONFIRMED.
    pub async fn upcoming(&self) -> Result<Vec<ReservationModel>, ServiceError> {
        let today = Utc::now().date_naive();
        Ok(ReservationEntity::find()
            .filter(reservation::Column::ReservationDate.gte(today))
            .filter(
                reservation::Column::Status
                    .is_in([ReservationStatus::Pending, ReservationStatus::Confirmed]),
            )
            .order_by_asc(reservation::Column::ReservationDate)
            .order_by_asc(reservation::Column::ReservationTime)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(table_number = request.table_number))]
    pub async fn create_table(
        &self,
        request: CreateTableRequest,
    ) -> Result<TableModel, ServiceError> {
        request.validate()?;

        let clash = TableEntity::find()
            .filter(dining_table::Column::TableNumber.eq(request.table_number))
            .one(&*self.db_pool)
            .await?;
        if clash.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Table number {} already exists",
                request.table_number
            )));
        }

        let model = TableActiveModel {
            id: Set(Uuid::new_v4()),
            table_number: Set(request.table_number),
            capacity: Set(request.capacity),
            is_available: Set(request.is_available),
            location: Set(request.location),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;
        info!(table_id = %model.id, "Table created");
        Ok(model)
    }

    pub async fn get_table(&self, id: Uuid) -> Result<TableModel, ServiceError> {
        TableEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Table {} not found", id)))
    }

    pub async fn list_tables(&self) -> Result<Vec<TableModel>, ServiceError> {
        Ok(TableEntity::find()
            .order_by_asc(dining_table::Column::TableNumber)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_table(
        &self,
        id: Uuid,
        request: UpdateTableRequest,
    ) -> Result<TableModel, ServiceError> {
        request.validate()?;
        let existing = self.get_table(id).await?;

        let mut active: TableActiveModel = existing.into();
        if let Some(capacity) = request.capacity {
            active.capacity = Set(capacity);
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }
        if let Some(location) = request.location {
            active.location = Set(location);
        }
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_table(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_table(id).await?;
        TableEntity::delete_by_id(existing.id)
            .exec(&*self.db_pool)
            .await?;
        info!(table_id = %id, "Table deleted");
        Ok(())
    }

    /// Tables marked available, optionally excluding those with a blocking
    /// reservation at exactly the given slot.
    pub async fn available_tables(
        &self,
        slot: Option<(NaiveDate, NaiveTime)>,
    ) -> Result<Vec<TableModel>, ServiceError> {
        let tables = TableEntity::find()
            .filter(dining_table::Column::IsAvailable.eq(true))
            .order_by_asc(dining_table::Column::TableNumber)
            .all(&*self.db_pool)
            .await?;

        let Some((date, time)) = slot else {
            return Ok(tables);
        };

        let blocking = ReservationStatus::iter().filter(ReservationStatus::blocks_table);
        let taken: Vec<Uuid> = ReservationEntity::find()
            .filter(reservation::Column::ReservationDate.eq(date))
            .filter(reservation::Column::ReservationTime.eq(time))
            .filter(reservation::Column::Status.is_in(blocking))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|r| r.table_id)
            .collect();

        Ok(tables
            .into_iter()
            .filter(|t| !taken.contains(&t.id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn candidate(t: NaiveTime, guests: i32) -> ReservationCandidate {
        ReservationCandidate {
            reservation_time: t,
            number_of_guests: guests,
        }
    }

    #[test]
    fn blocking_statuses_hold_the_table() {
        let blocking: Vec<ReservationStatus> = ReservationStatus::iter()
            .filter(ReservationStatus::blocks_table)
            .collect();
        assert_eq!(
            blocking,
            vec![
                ReservationStatus::Pending,
                ReservationStatus::Confirmed,
                ReservationStatus::Seated,
            ]
        );
    }

    #[test]
    fn window_is_closed_at_two_hours() {
        assert!(within_conflict_window(time(18, 0), time(20, 0)));
        assert!(within_conflict_window(time(20, 0), time(18, 0)));
        assert!(!within_conflict_window(time(18, 0), time(20, 1)));
    }

    #[test]
    fn capacity_checked_before_anything_else() {
        let err = validate_reservation(candidate(time(19, 0), 10), 4, &[time(19, 0)], true)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn guests_must_be_positive() {
        let err = validate_reservation(candidate(time(19, 0), 0), 4, &[], true).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn exact_slot_clash_is_conflict_even_without_overlap_check() {
        let err =
            validate_reservation(candidate(time(19, 0), 2), 4, &[time(19, 0)], false).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn overlap_window_only_applies_when_enabled() {
        // 19:30 is within two hours of an existing 18:00 booking.
        assert!(validate_reservation(candidate(time(19, 30), 2), 4, &[time(18, 0)], false).is_ok());
        let err = validate_reservation(candidate(time(19, 30), 2), 4, &[time(18, 0)], true)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn bookings_beyond_the_window_pass() {
        // 22:00 is more than two hours after 18:00; 20:00 exactly is not.
        assert!(validate_reservation(candidate(time(22, 0), 2), 4, &[time(18, 0)], true).is_ok());
        assert!(validate_reservation(candidate(time(20, 0), 2), 4, &[time(18, 0)], true).is_err());
    }
}
