use async_trait::async_trait;
use chrono::{DateTime, Utc};
use covoit_core::repository::{RepoResult, RideRepository};
use covoit_core::{CityName, Ride};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgRideRepository {
    pool: PgPool,
}

impl PgRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RideRow {
    id: Uuid,
    driver_id: Uuid,
    path: Vec<String>,
    departure_time: DateTime<Utc>,
    total_seats: i32,
    price_per_seat: i32,
    leg_prices: Json<Vec<Option<i32>>>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RideRow> for Ride {
    fn from(row: RideRow) -> Self {
        Ride {
            id: row.id,
            driver_id: row.driver_id,
            path: row.path.iter().filter_map(|c| CityName::parse(c)).collect(),
            departure_time: row.departure_time,
            total_seats: row.total_seats,
            price_per_seat: row.price_per_seat,
            leg_prices: row.leg_prices.0,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

const RIDE_COLUMNS: &str = "id, driver_id, path, departure_time, total_seats, price_per_seat, \
                            leg_prices, description, created_at";

#[async_trait]
impl RideRepository for PgRideRepository {
    async fn insert_ride(&self, ride: &Ride) -> RepoResult<Uuid> {
        let path: Vec<String> = ride.path.iter().map(|c| c.display().to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO rides (id, driver_id, path, departure_time, total_seats, price_per_seat,
                               leg_prices, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(ride.id)
        .bind(ride.driver_id)
        .bind(&path)
        .bind(ride.departure_time)
        .bind(ride.total_seats)
        .bind(ride.price_per_seat)
        .bind(Json(&ride.leg_prices))
        .bind(&ride.description)
        .bind(ride.created_at)
        .execute(&self.pool)
        .await?;

        Ok(ride.id)
    }

    async fn find_ride(&self, id: Uuid) -> RepoResult<Option<Ride>> {
        let row: Option<RideRow> =
            sqlx::query_as(&format!("SELECT {} FROM rides WHERE id = $1", RIDE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Ride::from))
    }

    async fn find_rides_departing_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<Ride>> {
        let rows: Vec<RideRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rides WHERE departure_time >= $1 AND departure_time < $2 \
             ORDER BY departure_time, id",
            RIDE_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Ride::from).collect())
    }

    async fn find_upcoming_rides(&self, after: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Ride>> {
        let rows: Vec<RideRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rides WHERE departure_time > $1 ORDER BY departure_time, id LIMIT $2",
            RIDE_COLUMNS
        ))
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Ride::from).collect())
    }

    async fn find_rides_by_driver(&self, driver_id: Uuid) -> RepoResult<Vec<Ride>> {
        let rows: Vec<RideRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rides WHERE driver_id = $1 ORDER BY departure_time, id",
            RIDE_COLUMNS
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Ride::from).collect())
    }
}
