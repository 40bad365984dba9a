use async_trait::async_trait;
use chrono::{DateTime, Utc};
use covoit_core::repository::{RepoResult, ReservationRepository, StatusUpdate};
use covoit_core::{CityName, Reservation, ReservationStatus};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    ride_id: Uuid,
    passenger_id: Uuid,
    seats: i32,
    from_index: Option<i32>,
    to_index: Option<i32>,
    from_city: Option<String>,
    to_city: Option<String>,
    price_per_seat: i32,
    total_price: i32,
    status: String,
    driver_message: Option<String>,
    ticket_code: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: row.id,
            ride_id: row.ride_id,
            passenger_id: row.passenger_id,
            seats: row.seats,
            from_index: row.from_index,
            to_index: row.to_index,
            from_city: row.from_city.as_deref().and_then(CityName::parse),
            to_city: row.to_city.as_deref().and_then(CityName::parse),
            price_per_seat: row.price_per_seat,
            total_price: row.total_price,
            status: row.status.parse::<ReservationStatus>()?,
            driver_message: row.driver_message,
            ticket_code: row.ticket_code,
            created_at: row.created_at,
        })
    }
}

fn into_reservations(rows: Vec<ReservationRow>) -> RepoResult<Vec<Reservation>> {
    rows.into_iter().map(Reservation::try_from).collect()
}

const RESERVATION_COLUMNS: &str = "id, ride_id, passenger_id, seats, from_index, to_index, \
                                   from_city, to_city, price_per_seat, total_price, status, \
                                   driver_message, ticket_code, created_at";

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn insert_reservation(&self, reservation: &Reservation) -> RepoResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO reservations (id, ride_id, passenger_id, seats, from_index, to_index,
                                      from_city, to_city, price_per_seat, total_price, status,
                                      driver_message, ticket_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.ride_id)
        .bind(reservation.passenger_id)
        .bind(reservation.seats)
        .bind(reservation.from_index)
        .bind(reservation.to_index)
        .bind(reservation.from_city.as_ref().map(CityName::display))
        .bind(reservation.to_city.as_ref().map(CityName::display))
        .bind(reservation.price_per_seat)
        .bind(reservation.total_price)
        .bind(reservation.status.as_str())
        .bind(&reservation.driver_message)
        .bind(&reservation.ticket_code)
        .bind(reservation.created_at)
        .execute(&self.pool)
        .await?;

        Ok(reservation.id)
    }

    async fn find_reservation(&self, id: Uuid) -> RepoResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE id = $1",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Reservation::try_from).transpose()
    }

    async fn find_confirmed_reservations_for_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE ride_id = $1 AND status = $2 ORDER BY created_at",
            RESERVATION_COLUMNS
        ))
        .bind(ride_id)
        .bind(ReservationStatus::Confirmed.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_reservations(rows)
    }

    async fn find_reservations_for_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE ride_id = $1 ORDER BY created_at",
            RESERVATION_COLUMNS
        ))
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await?;

        into_reservations(rows)
    }

    async fn find_reservations_for_passenger(&self, passenger_id: Uuid) -> RepoResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE passenger_id = $1 ORDER BY created_at DESC",
            RESERVATION_COLUMNS
        ))
        .bind(passenger_id)
        .fetch_all(&self.pool)
        .await?;

        into_reservations(rows)
    }

    async fn update_reservation_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
        driver_message: &str,
        ticket_code: Option<&str>,
    ) -> RepoResult<StatusUpdate> {
        let result = sqlx::query(
            "UPDATE reservations SET status = $1, driver_message = $2, ticket_code = $3 \
             WHERE id = $4 AND status = $5",
        )
        .bind(status.as_str())
        .bind(driver_message)
        .bind(ticket_code)
        .bind(id)
        .bind(ReservationStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(StatusUpdate::Applied);
        }

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            None => Ok(StatusUpdate::Missing),
            Some(raw) => Ok(StatusUpdate::NotPending(raw.parse::<ReservationStatus>()?)),
        }
    }
}
