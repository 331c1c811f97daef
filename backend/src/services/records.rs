//! Write-once store for completed advisories

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{AdvisoryResult, FarmAdvisoryRecord, FarmProfile};
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Destination for finished pipeline runs
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist one run; the sink assigns `id` and `created_at`
    async fn store(
        &self,
        profile: &FarmProfile,
        result: &AdvisoryResult,
    ) -> AppResult<FarmAdvisoryRecord>;
}

/// PostgreSQL-backed sink writing to `farm_advisories`
#[derive(Clone)]
pub struct PgRecordSink {
    db: PgPool,
}

impl PgRecordSink {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordSink for PgRecordSink {
    async fn store(
        &self,
        profile: &FarmProfile,
        result: &AdvisoryResult,
    ) -> AppResult<FarmAdvisoryRecord> {
        let profile_json = serde_json::to_value(profile)
            .map_err(|e| AppError::StorageError(format!("Failed to encode profile: {}", e)))?;
        let result_json = serde_json::to_value(result)
            .map_err(|e| AppError::StorageError(format!("Failed to encode result: {}", e)))?;

        let coordinates = result.location.coordinates.or(profile.coordinates);
        let index = result.estimate.estimate().map(|e| i16::from(e.index));

        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO farm_advisories (
                id, farm_name, crop_type, area_acres, soil_moisture_percent,
                address, latitude, longitude, water_index, stage, error_code,
                farm_profile, result
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&profile.farm_name)
        .bind(profile.crop_type.to_string())
        .bind(profile.area_acres)
        .bind(profile.soil_moisture_percent)
        .bind(result.location.address.as_deref())
        .bind(coordinates.map(|c| c.latitude))
        .bind(coordinates.map(|c| c.longitude))
        .bind(index)
        .bind(result.stage.to_string())
        .bind(result.error.map(|e| e.to_string()))
        .bind(profile_json)
        .bind(result_json)
        .fetch_one(&self.db)
        .await?;

        Ok(FarmAdvisoryRecord {
            id,
            farm_profile: profile.clone(),
            result: result.clone(),
            created_at,
        })
    }
}

/// Records kept by [`MemoryRecordSink::new`]
pub const DEFAULT_MEMORY_RECORDS: usize = 500;

/// In-process sink used when no database is configured.
///
/// Holds at most `capacity` records; the oldest is dropped to make room.
pub struct MemoryRecordSink {
    capacity: usize,
    records: RwLock<VecDeque<FarmAdvisoryRecord>>,
}

impl MemoryRecordSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_RECORDS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records still held, oldest first
    pub async fn records(&self) -> Vec<FarmAdvisoryRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordSink for MemoryRecordSink {
    async fn store(
        &self,
        profile: &FarmProfile,
        result: &AdvisoryResult,
    ) -> AppResult<FarmAdvisoryRecord> {
        let record = FarmAdvisoryRecord {
            id: Uuid::new_v4(),
            farm_profile: profile.clone(),
            result: result.clone(),
            created_at: Utc::now(),
        };
        let mut records = self.records.write().await;
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(record)
    }
}

impl Default for MemoryRecordSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        CropType, PipelineStage, ResolvedLocation, WaterDemand, WeatherSnapshot,
    };

    #[tokio::test]
    async fn test_memory_sink_assigns_id_and_timestamp() {
        let sink = MemoryRecordSink::new();
        let profile = FarmProfile::new("Creekside", CropType::Wheat).with_address("Salina, KS");
        let result = AdvisoryResult {
            farm_profile: profile.clone(),
            location: ResolvedLocation::default(),
            weather: WeatherSnapshot::Unavailable,
            estimate: WaterDemand::InsufficientData,
            water_need: None,
            advice_text: "Irrigate weekly.".to_string(),
            stage: PipelineStage::Done,
            error: None,
            degradations: Vec::new(),
        };

        let before = Utc::now();
        let first = sink.store(&profile, &result).await.unwrap();
        let second = sink.store(&profile, &result).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(first.created_at >= before);
        assert_eq!(sink.len().await, 2);
        assert_eq!(sink.records().await[0].result, result);
    }

    #[tokio::test]
    async fn test_memory_sink_drops_oldest_at_capacity() {
        let sink = MemoryRecordSink::with_capacity(3);
        let mut stored = Vec::new();
        for i in 0..5 {
            let profile = FarmProfile::new(format!("Farm {}", i), CropType::Corn).with_address("Ames");
            let result = AdvisoryResult {
                farm_profile: profile.clone(),
                location: ResolvedLocation::default(),
                weather: WeatherSnapshot::Unavailable,
                estimate: WaterDemand::InsufficientData,
                water_need: None,
                advice_text: String::new(),
                stage: PipelineStage::Done,
                error: None,
                degradations: Vec::new(),
            };
            stored.push(sink.store(&profile, &result).await.unwrap().id);
        }

        assert_eq!(sink.len().await, 3);
        let kept: Vec<_> = sink.records().await.iter().map(|r| r.id).collect();
        assert_eq!(kept, stored[2..].to_vec());
        assert_eq!(sink.records().await[0].farm_profile.farm_name, "Farm 2");
    }

    #[test]
    fn test_capacity_is_at_least_one() {
        assert_eq!(MemoryRecordSink::with_capacity(0).capacity(), 1);
        assert_eq!(MemoryRecordSink::new().capacity(), DEFAULT_MEMORY_RECORDS);
    }
}
