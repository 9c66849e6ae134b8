//! Enrollment workflow - turning a course selection into a priced enrollment.
//!
//! The selection form is a small state machine: a course must be chosen before a
//! session time, and a session time before a plan. Changing an earlier choice drops
//! the later ones, so a half-filled form can never be submitted with a stale price.
//! The price is read from the injected [`PricingTable`] once, at creation, and stored
//! on the row; later price edits never touch existing enrollments.

use crate::{
    core::{
        pricing::PricingTable,
        types::{Course, EnrollmentStatus, LicenseType, PaymentPlan, SessionTime},
    },
    entities::{Enrollment, enrollment},
    errors::{Error, Result},
};
use chrono::{Days, Local, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// A complete, valid course selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CourseSelection {
    /// Course chosen
    pub course: Course,
    /// Session length chosen
    pub session_time: SessionTime,
    /// Day plan chosen
    pub plan: PaymentPlan,
}

impl CourseSelection {
    /// Price of this selection in the given table.
    #[must_use]
    pub const fn price(&self, pricing: &PricingTable) -> u32 {
        pricing.get_price(self.course, self.session_time, self.plan)
    }
}

/// State of the dependent course → session time → plan dropdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrollmentForm {
    /// Nothing chosen yet
    #[default]
    Empty,
    /// Course chosen
    CourseSelected {
        /// Course chosen
        course: Course,
    },
    /// Course and session time chosen
    SessionTimeSelected {
        /// Course chosen
        course: Course,
        /// Session length chosen
        session_time: SessionTime,
    },
    /// Everything chosen; the form can be priced and submitted
    PlanSelected(CourseSelection),
}

impl EnrollmentForm {
    /// Chooses a course. Any session time or plan picked earlier is cleared.
    #[must_use]
    pub const fn select_course(self, course: Course) -> Self {
        Self::CourseSelected { course }
    }

    /// Chooses a session time. Requires a course; clears any plan picked earlier.
    pub fn select_session_time(self, session_time: SessionTime) -> Result<Self> {
        let course = self
            .course()
            .ok_or_else(|| Error::validation("Select a course before the session time"))?;
        Ok(Self::SessionTimeSelected {
            course,
            session_time,
        })
    }

    /// Chooses a plan. Requires a course and a session time.
    pub fn select_plan(self, plan: PaymentPlan) -> Result<Self> {
        match self {
            Self::SessionTimeSelected {
                course,
                session_time,
            }
            | Self::PlanSelected(CourseSelection {
                course,
                session_time,
                ..
            }) => Ok(Self::PlanSelected(CourseSelection {
                course,
                session_time,
                plan,
            })),
            Self::Empty | Self::CourseSelected { .. } => Err(Error::validation(
                "Select a course and session time before the payment plan",
            )),
        }
    }

    /// Course chosen so far, if any.
    #[must_use]
    pub const fn course(&self) -> Option<Course> {
        match self {
            Self::Empty => None,
            Self::CourseSelected { course } | Self::SessionTimeSelected { course, .. } => {
                Some(*course)
            }
            Self::PlanSelected(selection) => Some(selection.course),
        }
    }

    /// The complete selection, once every field is chosen.
    #[must_use]
    pub const fn selection(&self) -> Option<CourseSelection> {
        match self {
            Self::PlanSelected(selection) => Some(*selection),
            _ => None,
        }
    }

    /// Price preview shown next to the form; `None` until the form is complete.
    #[must_use]
    pub fn quote(&self, pricing: &PricingTable) -> Option<u32> {
        self.selection().map(|s| s.price(pricing))
    }

    /// Validates that every field is chosen.
    ///
    /// # Errors
    /// Returns a validation error naming the first missing field.
    pub fn submit(&self) -> Result<CourseSelection> {
        match self {
            Self::PlanSelected(selection) => Ok(*selection),
            Self::Empty => Err(Error::validation("Course is required")),
            Self::CourseSelected { .. } => Err(Error::validation("Session time is required")),
            Self::SessionTimeSelected { .. } => Err(Error::validation("Payment plan is required")),
        }
    }
}

/// End date of a plan starting on `start_date`: exact calendar-day addition.
#[must_use]
pub fn plan_end_date(start_date: NaiveDate, plan: PaymentPlan) -> Option<NaiveDate> {
    start_date.checked_add_days(Days::new(u64::from(plan.days())))
}

/// Creates an enrollment starting today (local date).
pub async fn create_enrollment(
    db: &DatabaseConnection,
    pricing: &PricingTable,
    student_id: i64,
    form: &EnrollmentForm,
) -> Result<enrollment::Model> {
    create_enrollment_starting(db, pricing, student_id, form, Local::now().date_naive()).await
}

/// Creates an enrollment with an explicit start date.
///
/// The form is validated before any store call. A store rejection (for example an
/// unknown student) is returned unchanged and nothing is retried.
pub async fn create_enrollment_starting(
    db: &DatabaseConnection,
    pricing: &PricingTable,
    student_id: i64,
    form: &EnrollmentForm,
    start_date: NaiveDate,
) -> Result<enrollment::Model> {
    let selection = form.submit()?;
    let total_amount = selection.price(pricing);
    let end_date = plan_end_date(start_date, selection.plan)
        .ok_or_else(|| Error::validation("Plan end date is out of range"))?;

    let new_enrollment = enrollment::ActiveModel {
        student_id: Set(student_id),
        license_type: Set(LicenseType::from(selection.course)),
        session_time: Set(selection.session_time),
        payment_plan: Set(selection.plan),
        total_amount: Set(f64::from(total_amount)),
        start_date: Set(start_date),
        end_date: Set(end_date),
        status: Set(EnrollmentStatus::Active),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = new_enrollment.insert(db).await?;
    info!(
        "Enrolled student {} in {} {} {}-day plan for {}",
        student_id,
        selection.course.key(),
        selection.session_time.key(),
        selection.plan.days(),
        total_amount
    );
    Ok(result)
}

/// Retrieves a student's enrollments, oldest start date first.
pub async fn get_enrollments_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<enrollment::Model>> {
    Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .order_by_asc(enrollment::Column::StartDate)
        .order_by_asc(enrollment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a student's active enrollments.
pub async fn get_active_enrollments_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<enrollment::Model>> {
    Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active))
        .order_by_asc(enrollment::Column::StartDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every enrollment in the school.
pub async fn get_all_enrollments(db: &DatabaseConnection) -> Result<Vec<enrollment::Model>> {
    Enrollment::find()
        .order_by_asc(enrollment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific enrollment by its unique ID.
pub async fn get_enrollment_by_id(
    db: &DatabaseConnection,
    enrollment_id: i64,
) -> Result<Option<enrollment::Model>> {
    Enrollment::find_by_id(enrollment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Changes an enrollment's status. The price is left untouched.
pub async fn update_enrollment_status(
    db: &DatabaseConnection,
    enrollment_id: i64,
    status: EnrollmentStatus,
) -> Result<enrollment::Model> {
    let existing = Enrollment::find_by_id(enrollment_id)
        .one(db)
        .await?
        .ok_or(Error::EnrollmentNotFound { id: enrollment_id })?;

    let mut active_model: enrollment::ActiveModel = existing.into();
    active_model.status = Set(status);
    active_model.update(db).await.map_err(Into::into)
}

/// Deletes an enrollment.
pub async fn delete_enrollment(db: &DatabaseConnection, enrollment_id: i64) -> Result<()> {
    let result = Enrollment::delete_by_id(enrollment_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::EnrollmentNotFound { id: enrollment_id });
    }
    Ok(())
}
