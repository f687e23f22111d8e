//! The narrow storage contract the ingestion and query code depend on.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Tour, TourFilter, TourType};

#[async_trait]
pub trait TourStore: Send + Sync {
    async fn exists_by_external_id(&self, external_id: &str) -> Result<bool, AppError>;

    /// Persist a new tour. A repeated external id fails with
    /// [`AppError::Duplicate`], whatever an earlier existence check returned.
    async fn insert(&self, tour: &Tour) -> Result<(), AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Tour>, AppError>;

    async fn query_all(&self) -> Result<Vec<Tour>, AppError>;

    /// Tours matching the filter, newest first, paginated by its limit/offset.
    async fn query(&self, filter: &TourFilter) -> Result<Vec<Tour>, AppError>;

    /// The distinct types of the stored tours, in [`TourType`] order.
    async fn tour_types(&self) -> Result<Vec<TourType>, AppError>;
}

/// In-process store with the same uniqueness rule as the database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tours: Arc<RwLock<Vec<Tour>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tours.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tours.read().await.is_empty()
    }
}

#[async_trait]
impl TourStore for MemoryStore {
    async fn exists_by_external_id(&self, external_id: &str) -> Result<bool, AppError> {
        let tours = self.tours.read().await;
        Ok(tours
            .iter()
            .any(|t| t.external_id.as_deref() == Some(external_id)))
    }

    async fn insert(&self, tour: &Tour) -> Result<(), AppError> {
        let mut tours = self.tours.write().await;

        if let Some(id) = tour.external_id.as_deref()
            && tours.iter().any(|t| t.external_id.as_deref() == Some(id))
        {
            return Err(AppError::Duplicate(id.to_string()));
        }

        tours.push(tour.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Tour>, AppError> {
        let tours = self.tours.read().await;
        Ok(tours.iter().find(|t| t.id == id).cloned())
    }

    async fn query_all(&self) -> Result<Vec<Tour>, AppError> {
        Ok(self.tours.read().await.clone())
    }

    async fn query(&self, filter: &TourFilter) -> Result<Vec<Tour>, AppError> {
        let tours = self.tours.read().await.clone();
        Ok(filter.apply(tours))
    }

    async fn tour_types(&self) -> Result<Vec<TourType>, AppError> {
        let tours = self.tours.read().await;
        let types: BTreeSet<TourType> = tours.iter().map(|t| t.tour_type).collect();
        Ok(types.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn tour(external_id: Option<&str>) -> Tour {
        Tour {
            id: Uuid::new_v4(),
            name: "Runde".to_string(),
            tour_type: TourType::Hike,
            date: OffsetDateTime::UNIX_EPOCH,
            distance_km: 1.0,
            duration_s: 600.0,
            speed_kmh: 6.0,
            elevation_up: 0.0,
            elevation_down: 0.0,
            start_lat: 47.0,
            start_lon: 8.0,
            electric_assist: false,
            external_id: external_id.map(str::to_string),
            external_href: None,
            geometry: vec![[8.0, 47.0]],
        }
    }

    #[tokio::test]
    async fn test_unique_external_id() {
        let store = MemoryStore::new();
        store.insert(&tour(Some("42"))).await.unwrap();

        assert!(store.exists_by_external_id("42").await.unwrap());
        assert!(!store.exists_by_external_id("43").await.unwrap());

        let err = store.insert(&tour(Some("42"))).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate(id) if id == "42"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_tours_without_external_id_may_repeat() {
        let store = MemoryStore::new();
        store.insert(&tour(None)).await.unwrap();
        store.insert(&tour(None)).await.unwrap();

        assert_eq!(store.query_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = MemoryStore::new();
        let stored = tour(Some("7"));
        store.insert(&tour(None)).await.unwrap();
        store.insert(&stored).await.unwrap();

        assert_eq!(store.get_by_id(stored.id).await.unwrap(), Some(stored));
        assert_eq!(store.get_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tour_types_lists_only_stored_types() {
        let store = MemoryStore::new();
        assert!(store.tour_types().await.unwrap().is_empty());

        for tour_type in [TourType::Undefined, TourType::Hike, TourType::Bike, TourType::Hike] {
            store
                .insert(&Tour {
                    tour_type,
                    ..tour(None)
                })
                .await
                .unwrap();
        }

        assert_eq!(
            store.tour_types().await.unwrap(),
            [TourType::Bike, TourType::Hike, TourType::Undefined]
        );
    }
}
