pub mod booking;
pub mod lifecycle;
pub mod prescription;

pub use booking::BookingAdmissionController;
pub use lifecycle::AppointmentLifecycleService;
pub use prescription::PrescriptionService;
