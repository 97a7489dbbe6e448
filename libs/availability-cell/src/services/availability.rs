use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{
    AppointmentFilter, AppointmentRepository, AvailabilityRepository, DoctorRepository, Store,
    StoreError, StoreTransaction,
};
use shared_models::{AvailabilityWindow, BookingStatus};
use shared_utils::Clock;

use crate::models::{AvailabilityError, AvailableSlotsResponse, CreateAvailabilityRequest};
use crate::services::slots::SlotAllocator;

pub struct AvailabilityService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    allocator: SlotAllocator,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            allocator: SlotAllocator::from_config(config),
        }
    }

    pub fn allocator(&self) -> SlotAllocator {
        self.allocator
    }

    /// Register a doctor's window for one date.
    #[instrument(skip(self, request), fields(date = %request.date))]
    pub async fn create_availability(
        &self,
        doctor_id: Uuid,
        request: CreateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, AvailabilityError> {
        let (start_time, end_time) = SlotAllocator::parse_window(&request.available_time)
            .ok_or_else(|| {
                AvailabilityError::InvalidWindow(format!(
                    "expected HH:MM-HH:MM, got '{}'",
                    request.available_time
                ))
            })?;
        if start_time >= end_time {
            return Err(AvailabilityError::InvalidWindow(
                "start time must be before end time".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let doctor = tx
            .find_doctor(doctor_id)
            .await?
            .ok_or(AvailabilityError::DoctorNotFound)?;
        if !doctor.approved {
            warn!("Rejected availability for unapproved doctor {}", doctor_id);
            return Err(AvailabilityError::DoctorNotApproved);
        }

        if tx.find_availability(doctor_id, request.date).await?.is_some() {
            return Err(AvailabilityError::WindowExists(request.date));
        }

        let window = AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id,
            date: request.date,
            start_time,
            end_time,
            created_at: self.clock.now(),
        };

        tx.insert_availability(window.clone())
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => AvailabilityError::WindowExists(request.date),
                other => other.into(),
            })?;
        tx.commit().await?;

        info!(
            "Created availability {} for doctor {} on {}",
            window.available_time(),
            doctor_id,
            window.date
        );
        Ok(window)
    }

    /// Slots of the doctor's window on `date` not held by a confirmed or
    /// completed appointment.
    #[instrument(skip(self))]
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<AvailableSlotsResponse, AvailabilityError> {
        if date < self.clock.today() {
            return Err(AvailabilityError::PastDate(date));
        }

        let mut tx = self.store.begin().await?;
        let window = tx
            .find_availability(doctor_id, date)
            .await?
            .ok_or(AvailabilityError::WindowNotFound(date))?;

        let taken = taken_slots(tx.as_mut(), doctor_id, date).await?;
        tx.rollback().await?;

        let now = self.clock.now();
        let slots: Vec<String> = self
            .allocator
            .available(&window, &taken)
            .into_iter()
            .filter(|label| !SlotAllocator::has_started(label, date, now))
            .collect();
        debug!(
            "Doctor {} on {}: {} free of {} taken",
            doctor_id,
            date,
            slots.len(),
            taken.len()
        );

        Ok(AvailableSlotsResponse {
            doctor_id,
            date,
            available_time: window.available_time(),
            slots,
        })
    }
}

/// Labels held by confirmed or completed appointments for the doctor's day.
pub async fn taken_slots(
    tx: &mut dyn StoreTransaction,
    doctor_id: Uuid,
    date: NaiveDate,
) -> Result<HashSet<String>, StoreError> {
    let filter = AppointmentFilter::for_day(doctor_id, date)
        .with_statuses(&[BookingStatus::Confirmed, BookingStatus::Completed]);

    Ok(tx
        .find_appointments(&filter)
        .await?
        .into_iter()
        .map(|appointment| appointment.time_slot)
        .collect())
}
