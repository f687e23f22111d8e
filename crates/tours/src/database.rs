use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Tour, TourFilter, TourType};
use crate::query_builder::QueryBuilder;
use crate::store::TourStore;

const TOUR_COLUMNS: &str = r#"
    id, name, tour_type, date, distance_km, duration_s, speed_kmh,
    elevation_up, elevation_down, start_lat, start_lon, electric_assist,
    external_id, external_href, geometry
"#;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn start_of_day(date: Date) -> OffsetDateTime {
    date.midnight().assume_utc()
}

#[async_trait]
impl TourStore for Database {
    async fn exists_by_external_id(&self, external_id: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tours WHERE external_id = $1)")
                .bind(external_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn insert(&self, tour: &Tour) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tours (id, name, tour_type, date, distance_km, duration_s, speed_kmh,
                               elevation_up, elevation_down, start_lat, start_lon,
                               electric_assist, external_id, external_href, geometry)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(tour.id)
        .bind(&tour.name)
        .bind(tour.tour_type)
        .bind(tour.date)
        .bind(tour.distance_km)
        .bind(tour.duration_s)
        .bind(tour.speed_kmh)
        .bind(tour.elevation_up)
        .bind(tour.elevation_down)
        .bind(tour.start_lat)
        .bind(tour.start_lon)
        .bind(tour.electric_assist)
        .bind(&tour.external_id)
        .bind(&tour.external_href)
        .bind(Json(&tour.geometry))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, tour.external_id.as_deref()))?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Tour>, AppError> {
        let tour = sqlx::query_as(&format!("SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tour)
    }

    async fn query_all(&self) -> Result<Vec<Tour>, AppError> {
        let tours = sqlx::query_as(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours ORDER BY date DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tours)
    }

    async fn query(&self, filter: &TourFilter) -> Result<Vec<Tour>, AppError> {
        let mut qb = QueryBuilder::new();
        qb.add_optional(&filter.tour_type, |idx| format!("tour_type = ${idx}"))
            .add_optional(&filter.date_from, |idx| format!("date >= ${idx}"))
            .add_optional(&filter.date_to, |idx| format!("date < ${idx}"))
            .add_optional(&filter.ebike_only, |idx| format!("electric_assist = ${idx}"))
            .add_optional(&filter.min_distance, |idx| format!("distance_km >= ${idx}"))
            .add_optional(&filter.max_distance, |idx| format!("distance_km <= ${idx}"))
            .add_optional(&filter.min_elevation, |idx| format!("elevation_up >= ${idx}"));

        let limit_idx = qb.next_param_idx();
        let offset_idx = qb.next_param_idx();
        let sql = format!(
            "SELECT {TOUR_COLUMNS} FROM tours {} ORDER BY date DESC LIMIT ${limit_idx} OFFSET ${offset_idx}",
            qb.build_where_clause()
        );

        // Bind in the same order the conditions were added
        let mut query = sqlx::query_as::<_, Tour>(&sql);
        if let Some(tour_type) = filter.tour_type {
            query = query.bind(tour_type);
        }
        if let Some(from) = filter.date_from {
            query = query.bind(start_of_day(from));
        }
        if let Some(to) = filter.date_to {
            query = query.bind(start_of_day(to) + Duration::days(1));
        }
        if let Some(ebike) = filter.ebike_only {
            query = query.bind(ebike);
        }
        if let Some(min) = filter.min_distance {
            query = query.bind(min);
        }
        if let Some(max) = filter.max_distance {
            query = query.bind(max);
        }
        if let Some(min) = filter.min_elevation {
            query = query.bind(min);
        }

        let tours = query
            .bind(filter.limit.max(0))
            .bind(filter.offset.max(0))
            .fetch_all(&self.pool)
            .await?;

        Ok(tours)
    }

    async fn tour_types(&self) -> Result<Vec<TourType>, AppError> {
        // Enum columns sort in declaration order
        let types: Vec<TourType> =
            sqlx::query_scalar("SELECT DISTINCT tour_type FROM tours ORDER BY tour_type")
                .fetch_all(&self.pool)
                .await?;

        Ok(types)
    }
}
