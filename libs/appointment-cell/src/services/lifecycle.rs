use tracing::{debug, warn};

use shared_models::BookingStatus;

use crate::models::BookingError;

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !current_status.can_transition_to(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(BookingError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Explains why a visit cannot be completed from its current status.
    pub fn completion_blocker(&self, current_status: BookingStatus) -> Option<BookingError> {
        match current_status {
            BookingStatus::Confirmed => None,
            BookingStatus::Pending => Some(BookingError::NotConfirmed),
            BookingStatus::Completed => Some(BookingError::PrescriptionExists),
            BookingStatus::Cancelled => Some(BookingError::AppointmentCancelled),
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
