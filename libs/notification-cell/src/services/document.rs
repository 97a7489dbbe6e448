use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared_models::{Appointment, Doctor, Invoice};

use crate::models::{Notification, NotificationKind};

const RULE: &str = "----------------------------------------";

/// Plain-text rendering of an invoice for the patient.
pub struct InvoiceDocument<'a> {
    pub invoice: &'a Invoice,
    pub appointment: &'a Appointment,
    pub doctor: Option<&'a Doctor>,
}

impl<'a> InvoiceDocument<'a> {
    pub fn new(invoice: &'a Invoice, appointment: &'a Appointment) -> Self {
        Self {
            invoice,
            appointment,
            doctor: None,
        }
    }

    pub fn with_doctor(mut self, doctor: &'a Doctor) -> Self {
        self.doctor = Some(doctor);
        self
    }

    pub fn render_due(&self) -> String {
        let mut out = self.header("Appointment Due Invoice");
        let _ = writeln!(out, "Booking Status:   {}", self.appointment.booking_status);
        let _ = writeln!(out, "Due date:         {}", self.invoice.due_date.format("%Y-%m-%d"));
        let _ = writeln!(out, "Grand Total:      {:.2}", self.invoice.total_amount);
        let _ = writeln!(out, "Balance due:      {:.2}", self.invoice.total_amount);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(
            out,
            "Thank you for initiating the appointment. To confirm your booking please make the payment."
        );
        out.push_str(&footer());
        out
    }

    pub fn render_paid(&self) -> String {
        let mut out = self.header("Appointment Payment Invoice");
        let _ = writeln!(out, "Booking Status:   {}", self.appointment.booking_status);
        let _ = writeln!(out, "Payment Method:   {}", self.invoice.payment_method);
        let _ = writeln!(out, "Payment Status:   {}", self.invoice.payment_status);
        let _ = writeln!(out, "Grand Total:      {:.2}", self.invoice.total_amount);
        let _ = writeln!(out, "Balance due:      {:.2}", Decimal::ZERO);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Your appointment is confirmed.");
        out.push_str(&footer());
        out
    }

    fn header(&self, title: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Invoice ID:       {}", self.invoice.id);
        if let Some(doctor) = self.doctor {
            let _ = writeln!(out, "Doctor Name:      {}", doctor.name);
            let _ = writeln!(out, "Specialization:   {}", doctor.specialization);
        }
        let _ = writeln!(out, "Appointment ID:   {}", self.appointment.id);
        let _ = writeln!(out, "Appointment Date: {}", self.appointment.date.format("%Y-%m-%d"));
        let _ = writeln!(out, "Time Slot:        {}", self.appointment.time_slot);
        let _ = writeln!(out, "{RULE}");
        out
    }
}

fn footer() -> String {
    format!("{RULE}\nThis is a computer generated invoice\n")
}

// ==============================================================================
// NOTIFICATION BUILDERS
// ==============================================================================

pub fn due_invoice_notification(document: &InvoiceDocument<'_>, now: DateTime<Utc>) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        kind: NotificationKind::InvoiceDue,
        recipient: document.appointment.patient_email.clone(),
        subject: "Payment due invoice".to_string(),
        body: document.render_due(),
        invoice_id: Some(document.invoice.id),
        created_at: now,
    }
}

pub fn paid_invoice_notification(document: &InvoiceDocument<'_>, now: DateTime<Utc>) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        kind: NotificationKind::InvoicePaid,
        recipient: document.appointment.patient_email.clone(),
        subject: "Payment confirmation".to_string(),
        body: document.render_paid(),
        invoice_id: Some(document.invoice.id),
        created_at: now,
    }
}

pub fn cancellation_notification(
    appointment: &Appointment,
    refund: Option<Decimal>,
    now: DateTime<Utc>,
) -> Notification {
    let mut body = format!(
        "Your appointment {} on {} at {} has been cancelled.\n",
        appointment.id,
        appointment.date.format("%Y-%m-%d"),
        appointment.time_slot
    );
    if let Some(amount) = refund {
        let _ = writeln!(body, "{:.2} has been credited to your wallet.", amount);
    }

    Notification {
        id: Uuid::new_v4(),
        kind: NotificationKind::AppointmentCancelled,
        recipient: appointment.patient_email.clone(),
        subject: "Appointment cancelled".to_string(),
        body,
        invoice_id: None,
        created_at: now,
    }
}
