//! Attendance workflow - check-ins, scheduled lessons and lesson consumption.
//!
//! A quick check-in records a completed lesson for today; the scheduling form records
//! a future lesson that can later be marked completed, cancelled or no-show. Only
//! completed rows count as attended days against a plan.

use crate::{
    core::types::{AttendanceStatus, EnrollmentStatus, LicenseType, PaymentPlan},
    entities::{Attendance, Enrollment, Student, attendance, enrollment},
    errors::{Error, Result},
};
use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, warn};

/// Policy for a second check-in by the same student, for the same lesson type, on the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateCheckIn {
    /// Refuse the second check-in
    #[default]
    Reject,
    /// Record every check-in
    Allow,
}

/// A quick check-in at the counter.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInRequest {
    /// Student checking in
    pub student_id: i64,
    /// Vehicle for the lesson
    pub lesson_type: LicenseType,
    /// Day of the lesson
    pub lesson_date: NaiveDate,
    /// Time of the check-in
    pub lesson_time: NaiveTime,
    /// Lesson length in hours
    pub duration_hours: f64,
}

impl CheckInRequest {
    /// A check-in stamped with the current local date and time (to the minute).
    #[must_use]
    pub fn now(student_id: i64, lesson_type: LicenseType, duration_hours: f64) -> Self {
        let now = Local::now().naive_local();
        let lesson_time = now
            .time()
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or_else(|| now.time());
        Self {
            student_id,
            lesson_type,
            lesson_date: now.date(),
            lesson_time,
            duration_hours,
        }
    }
}

/// A lesson booked through the scheduling form.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonSchedule {
    /// Student taking the lesson
    pub student_id: i64,
    /// Vehicle for the lesson
    pub lesson_type: LicenseType,
    /// Day of the lesson
    pub lesson_date: NaiveDate,
    /// Start time
    pub lesson_time: NaiveTime,
    /// Lesson length in hours
    pub duration_hours: f64,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Lesson consumption against the plans a student holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonProgress {
    /// Completed lessons of this type
    pub attended: u64,
    /// Lessons covered by the student's active plans of this type
    pub planned: u64,
    /// Lessons left, never negative
    pub remaining: u64,
}

/// One line of the daily roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    /// Attendance row id
    pub attendance_id: i64,
    /// Student id
    pub student_id: i64,
    /// Student name, or "Unknown" if the student row is gone
    pub full_name: String,
    /// Student phone
    pub phone: String,
    /// Lesson start time
    pub lesson_time: NaiveTime,
    /// Lesson state
    pub status: AttendanceStatus,
}

/// Everyone with a lesson on one day, split by vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRoster {
    /// Day of the roster
    pub date: NaiveDate,
    /// Car lessons, latest time first
    pub car: Vec<RosterEntry>,
    /// Motorcycle lessons, latest time first
    pub motorcycle: Vec<RosterEntry>,
}

impl DailyRoster {
    /// Number of lessons on the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.car.len() + self.motorcycle.len()
    }

    /// True when nobody has a lesson that day.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.car.is_empty() && self.motorcycle.is_empty()
    }
}

fn validate_duration(duration_hours: f64) -> Result<()> {
    if !duration_hours.is_finite() || duration_hours <= 0.0 {
        return Err(Error::validation("Lesson duration must be greater than zero"));
    }
    Ok(())
}

/// Records a completed lesson for a student.
///
/// # Errors
/// `DuplicateCheckIn` when the policy is [`DuplicateCheckIn::Reject`] and the student already
/// has a completed lesson of this type on the same date.
pub async fn check_in(
    db: &DatabaseConnection,
    request: &CheckInRequest,
    policy: DuplicateCheckIn,
) -> Result<attendance::Model> {
    validate_duration(request.duration_hours)?;

    if policy == DuplicateCheckIn::Reject {
        let existing = Attendance::find()
            .filter(attendance::Column::StudentId.eq(request.student_id))
            .filter(attendance::Column::LessonDate.eq(request.lesson_date))
            .filter(attendance::Column::LessonType.eq(request.lesson_type))
            .filter(attendance::Column::Status.eq(AttendanceStatus::Completed))
            .count(db)
            .await?;

        if existing > 0 {
            warn!(
                "Rejected duplicate check-in for student {} on {}",
                request.student_id, request.lesson_date
            );
            return Err(Error::DuplicateCheckIn {
                student_id: request.student_id,
                lesson_type: request.lesson_type.as_str().to_string(),
                date: request.lesson_date,
            });
        }
    }

    let record = attendance::ActiveModel {
        student_id: Set(request.student_id),
        lesson_date: Set(request.lesson_date),
        lesson_time: Set(request.lesson_time),
        lesson_type: Set(request.lesson_type),
        duration_hours: Set(request.duration_hours),
        status: Set(AttendanceStatus::Completed),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Checked in student {} for {} lesson on {}",
        request.student_id,
        request.lesson_type.as_str(),
        request.lesson_date
    );
    Ok(record)
}

/// Books a future lesson with status `scheduled`.
pub async fn schedule_lesson(
    db: &DatabaseConnection,
    schedule: &LessonSchedule,
) -> Result<attendance::Model> {
    validate_duration(schedule.duration_hours)?;

    let notes = schedule
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    attendance::ActiveModel {
        student_id: Set(schedule.student_id),
        lesson_date: Set(schedule.lesson_date),
        lesson_time: Set(schedule.lesson_time),
        lesson_type: Set(schedule.lesson_type),
        duration_hours: Set(schedule.duration_hours),
        status: Set(AttendanceStatus::Scheduled),
        notes: Set(notes),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Moves a lesson to a new status (e.g. scheduled → completed).
pub async fn set_attendance_status(
    db: &DatabaseConnection,
    attendance_id: i64,
    status: AttendanceStatus,
) -> Result<attendance::Model> {
    let existing = Attendance::find_by_id(attendance_id)
        .one(db)
        .await?
        .ok_or(Error::AttendanceNotFound { id: attendance_id })?;

    let mut active_model: attendance::ActiveModel = existing.into();
    active_model.status = Set(status);
    active_model.update(db).await.map_err(Into::into)
}

/// Permanently deletes an attendance record.
pub async fn delete_attendance(db: &DatabaseConnection, attendance_id: i64) -> Result<()> {
    let result = Attendance::delete_by_id(attendance_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::AttendanceNotFound { id: attendance_id });
    }
    Ok(())
}

/// Retrieves a student's lessons, most recent first.
pub async fn get_attendance_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<attendance::Model>> {
    Attendance::find()
        .filter(attendance::Column::StudentId.eq(student_id))
        .order_by_desc(attendance::Column::LessonDate)
        .order_by_desc(attendance::Column::LessonTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts completed lessons of one type among already-fetched records.
#[must_use]
pub fn count_days_attended(records: &[attendance::Model], lesson_type: LicenseType) -> u64 {
    records
        .iter()
        .filter(|r| r.lesson_type == lesson_type && r.status == AttendanceStatus::Completed)
        .count() as u64
}

/// Counts a student's completed lessons of one type.
pub async fn days_attended(
    db: &DatabaseConnection,
    student_id: i64,
    lesson_type: LicenseType,
) -> Result<u64> {
    Attendance::find()
        .filter(attendance::Column::StudentId.eq(student_id))
        .filter(attendance::Column::LessonType.eq(lesson_type))
        .filter(attendance::Column::Status.eq(AttendanceStatus::Completed))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Lessons left on a plan after `attended` completed lessons.
#[must_use]
pub fn remaining_lessons(plan: PaymentPlan, attended: u64) -> u64 {
    u64::from(plan.days()).saturating_sub(attended)
}

/// Attended, planned and remaining lessons of one type across the student's active plans.
pub async fn lesson_progress(
    db: &DatabaseConnection,
    student_id: i64,
    lesson_type: LicenseType,
) -> Result<LessonProgress> {
    let plans = Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::LicenseType.eq(lesson_type))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active))
        .all(db);
    let attended = days_attended(db, student_id, lesson_type);
    let (plans, attended) = tokio::try_join!(async { plans.await.map_err(Error::from) }, attended)?;

    let planned = plans
        .iter()
        .map(|e| u64::from(e.payment_plan.days()))
        .sum::<u64>();

    Ok(LessonProgress {
        attended,
        planned,
        remaining: planned.saturating_sub(attended),
    })
}

/// Counts lessons recorded on a date, any status.
pub async fn count_lessons_on(db: &DatabaseConnection, date: NaiveDate) -> Result<u64> {
    Attendance::find()
        .filter(attendance::Column::LessonDate.eq(date))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Builds the roster for one day, joined with student names.
pub async fn get_daily_roster(db: &DatabaseConnection, date: NaiveDate) -> Result<DailyRoster> {
    let rows = Attendance::find()
        .filter(attendance::Column::LessonDate.eq(date))
        .order_by_desc(attendance::Column::LessonTime)
        .find_also_related(Student)
        .all(db)
        .await?;

    let mut roster = DailyRoster {
        date,
        car: Vec::new(),
        motorcycle: Vec::new(),
    };

    for (record, student) in rows {
        let (full_name, phone) = student.map_or_else(
            || ("Unknown".to_string(), String::new()),
            |s| (s.full_name, s.phone),
        );
        let entry = RosterEntry {
            attendance_id: record.id,
            student_id: record.student_id,
            full_name,
            phone,
            lesson_time: record.lesson_time,
            status: record.status,
        };
        match record.lesson_type {
            LicenseType::Car => roster.car.push(entry),
            LicenseType::Bike => roster.motorcycle.push(entry),
        }
    }

    Ok(roster)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn request_at(student_id: i64, lesson_type: LicenseType, date: NaiveDate, hour: u32) -> CheckInRequest {
        CheckInRequest {
            student_id,
            lesson_type,
            lesson_date: date,
            lesson_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            duration_hours: 1.0,
        }
    }

    #[tokio::test]
    async fn test_check_in_records_completed_lesson() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let record = check_in(
            &db,
            &request_at(student.id, LicenseType::Bike, date, 9),
            DuplicateCheckIn::Reject,
        )
        .await?;

        assert_eq!(record.status, AttendanceStatus::Completed);
        assert_eq!(record.lesson_type, LicenseType::Bike);
        assert_eq!(record.lesson_date, date);
        assert_eq!(days_attended(&db, student.id, LicenseType::Bike).await?, 1);
        assert_eq!(days_attended(&db, student.id, LicenseType::Car).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_same_day_check_in_policy() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        check_in(&db, &request_at(student.id, LicenseType::Car, date, 9), DuplicateCheckIn::Reject)
            .await?;

        let second = check_in(
            &db,
            &request_at(student.id, LicenseType::Car, date, 15),
            DuplicateCheckIn::Reject,
        )
        .await;
        assert!(matches!(
            second,
            Err(Error::DuplicateCheckIn { student_id, .. }) if student_id == student.id
        ));

        // Another lesson type or another day is not a duplicate
        check_in(&db, &request_at(student.id, LicenseType::Bike, date, 15), DuplicateCheckIn::Reject)
            .await?;
        let next_day = date.succ_opt().unwrap();
        check_in(&db, &request_at(student.id, LicenseType::Car, next_day, 9), DuplicateCheckIn::Reject)
            .await?;

        // Allow policy records the second same-day check-in
        check_in(&db, &request_at(student.id, LicenseType::Car, date, 17), DuplicateCheckIn::Allow)
            .await?;
        assert_eq!(days_attended(&db, student.id, LicenseType::Car).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_duration_fails_before_store_call() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut request = request_at(1, LicenseType::Car, date, 9);
        request.duration_hours = 0.0;

        let result = check_in(&db, &request, DuplicateCheckIn::Reject).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_scheduled_lessons_count_only_once_completed() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let schedule = LessonSchedule {
            student_id: student.id,
            lesson_type: LicenseType::Car,
            lesson_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            lesson_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            duration_hours: 0.5,
            notes: Some("  parallel parking  ".to_string()),
        };

        let lesson = schedule_lesson(&db, &schedule).await?;
        assert_eq!(lesson.status, AttendanceStatus::Scheduled);
        assert_eq!(lesson.notes.as_deref(), Some("parallel parking"));
        assert_eq!(days_attended(&db, student.id, LicenseType::Car).await?, 0);

        let done = set_attendance_status(&db, lesson.id, AttendanceStatus::Completed).await?;
        assert_eq!(done.status, AttendanceStatus::Completed);
        assert_eq!(days_attended(&db, student.id, LicenseType::Car).await?, 1);

        set_attendance_status(&db, lesson.id, AttendanceStatus::NoShow).await?;
        assert_eq!(days_attended(&db, student.id, LicenseType::Car).await?, 0);

        Ok(())
    }

    #[test]
    fn test_remaining_lessons_never_negative() {
        assert_eq!(remaining_lessons(PaymentPlan::SevenDays, 3), 4);
        assert_eq!(remaining_lessons(PaymentPlan::SevenDays, 7), 0);
        assert_eq!(remaining_lessons(PaymentPlan::OneDay, 4), 0);
    }

    #[tokio::test]
    async fn test_lesson_progress_across_active_plans() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        insert_enrollment(&db, student.id, LicenseType::Car, 3000.0).await?; // 7-day plan
        insert_enrollment(&db, student.id, LicenseType::Bike, 1800.0).await?;

        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        check_in(&db, &request_at(student.id, LicenseType::Car, date, 9), DuplicateCheckIn::Reject)
            .await?;
        check_in(
            &db,
            &request_at(student.id, LicenseType::Car, date.succ_opt().unwrap(), 9),
            DuplicateCheckIn::Reject,
        )
        .await?;

        let progress = lesson_progress(&db, student.id, LicenseType::Car).await?;
        assert_eq!(
            progress,
            LessonProgress {
                attended: 2,
                planned: 7,
                remaining: 5
            }
        );

        let records = get_attendance_for_student(&db, student.id).await?;
        assert_eq!(count_days_attended(&records, LicenseType::Car), 2);
        assert_eq!(records[0].lesson_date, date.succ_opt().unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_roster_split_by_vehicle() -> Result<()> {
        let db = setup_test_db().await?;
        let asha = create_test_student(&db, "Asha Rai").await?;
        let bikram = create_test_student(&db, "Bikram Thapa").await?;
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        check_in(&db, &request_at(asha.id, LicenseType::Car, date, 8), DuplicateCheckIn::Reject)
            .await?;
        check_in(&db, &request_at(bikram.id, LicenseType::Car, date, 11), DuplicateCheckIn::Reject)
            .await?;
        check_in(&db, &request_at(bikram.id, LicenseType::Bike, date, 14), DuplicateCheckIn::Reject)
            .await?;
        check_in(
            &db,
            &request_at(asha.id, LicenseType::Bike, date.succ_opt().unwrap(), 9),
            DuplicateCheckIn::Reject,
        )
        .await?;

        let roster = get_daily_roster(&db, date).await?;
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.car.len(), 2);
        assert_eq!(roster.car[0].full_name, "Bikram Thapa");
        assert_eq!(roster.car[1].full_name, "Asha Rai");
        assert_eq!(roster.motorcycle.len(), 1);
        assert_eq!(roster.motorcycle[0].student_id, bikram.id);
        assert_eq!(count_lessons_on(&db, date).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_attendance() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let record = check_in(
            &db,
            &request_at(student.id, LicenseType::Car, date, 9),
            DuplicateCheckIn::Reject,
        )
        .await?;

        delete_attendance(&db, record.id).await?;
        assert_eq!(days_attended(&db, student.id, LicenseType::Car).await?, 0);
        assert!(matches!(
            delete_attendance(&db, record.id).await,
            Err(Error::AttendanceNotFound { .. })
        ));

        // A fresh check-in is allowed once the old one is gone
        check_in(&db, &request_at(student.id, LicenseType::Car, date, 10), DuplicateCheckIn::Reject)
            .await?;
        Ok(())
    }
}
