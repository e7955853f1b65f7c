//! Appointment database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::booking::AppointmentLedger;
use crate::models::{parse_iso_date, Appointment, AppointmentStatus, TimeOfDay};

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                appointment_id, provider_id, patient_id, date, time, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                appointment.appointment_id,
                appointment.provider_id,
                appointment.patient_id,
                appointment.date.to_string(),
                appointment.time.to_string(),
                appointment.status.as_str(),
                appointment.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                r#"
                SELECT appointment_id, provider_id, patient_id, date, time, status, created_at
                FROM appointments
                WHERE appointment_id = ?
                "#,
                [appointment_id],
                AppointmentRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Set an appointment's status. Returns false if it doesn't exist.
    pub fn set_appointment_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?2 WHERE appointment_id = ?1",
            params![appointment_id, status.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Cancel an appointment, freeing its slot.
    pub fn cancel_appointment(&self, appointment_id: &str) -> DbResult<bool> {
        self.set_appointment_status(appointment_id, AppointmentStatus::Cancelled)
    }

    /// All appointments for a provider on a date, ordered by time.
    pub fn list_appointments_for_day(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT appointment_id, provider_id, patient_id, date, time, status, created_at
            FROM appointments
            WHERE provider_id = ? AND date = ?
            ORDER BY time
            "#,
        )?;

        let rows = stmt.query_map(params![provider_id, date.to_string()], AppointmentRow::from_row)?;

        rows.map(|r| r.map_err(DbError::from).and_then(Appointment::try_from))
            .collect()
    }

    /// Whether an active appointment holds the slot.
    pub fn is_slot_booked(
        &self,
        provider_id: &str,
        date: NaiveDate,
        time: TimeOfDay,
    ) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE provider_id = ?1 AND date = ?2 AND time = ?3 AND status != 'Cancelled'
            "#,
            params![provider_id, date.to_string(), time.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl AppointmentLedger for Database {
    type Error = DbError;

    fn is_booked(&self, provider_id: &str, date: NaiveDate, time: TimeOfDay) -> DbResult<bool> {
        self.is_slot_booked(provider_id, date, time)
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    appointment_id: String,
    provider_id: String,
    patient_id: String,
    date: String,
    time: String,
    status: String,
    created_at: String,
}

impl AppointmentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            appointment_id: row.get(0)?,
            provider_id: row.get(1)?,
            patient_id: row.get(2)?,
            date: row.get(3)?,
            time: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let date = parse_iso_date(&row.date)
            .map_err(|e| DbError::Constraint(format!("appointment {}: {}", row.appointment_id, e)))?;
        let time = row
            .time
            .parse::<TimeOfDay>()
            .map_err(|e| DbError::Constraint(format!("appointment {}: {}", row.appointment_id, e)))?;
        let status = AppointmentStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Invalid appointment status: {}", row.status))
        })?;

        Ok(Appointment {
            appointment_id: row.appointment_id,
            provider_id: row.provider_id,
            patient_id: row.patient_id,
            date,
            time,
            status,
            created_at: row.created_at,
        })
    }
}
