//! Dashboard aggregators - revenue by course, monthly revenue, dues and discounts.
//!
//! Everything here is recomputed from freshly fetched collections on each load.
//! Transactions are not linked to an enrollment, so revenue is attributed to a
//! course by looking at which license types the paying student holds.

use crate::{
    config::settings::AppConfig,
    core::{
        attendance::count_lessons_on,
        balance::{DiscountRule, StudentBalance, balances_by_student},
        enrollment::get_all_enrollments,
        student::get_all_students,
        transaction::get_all_transactions,
        types::{EnrollmentStatus, LicenseType, StudentStatus, TransactionStatus},
    },
    entities::{enrollment, student, transaction},
    errors::Result,
};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Revenue split across the two courses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RevenueByCourse {
    /// Attributed to car training
    pub car: f64,
    /// Attributed to motorcycle training
    pub motorcycle: f64,
    /// Paid by students with no enrollment on record
    pub unattributed: f64,
}

impl RevenueByCourse {
    /// Sum of all buckets.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.car + self.motorcycle + self.unattributed
    }
}

/// Name and phone shown next to dashboard rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentContact {
    /// Full name
    pub full_name: String,
    /// Phone number
    pub phone: String,
}

impl StudentContact {
    fn unknown() -> Self {
        Self {
            full_name: "Unknown".to_string(),
            phone: String::new(),
        }
    }
}

/// Indexes student contacts by id.
#[must_use]
pub fn contacts_by_id(students: &[student::Model]) -> HashMap<i64, StudentContact> {
    students
        .iter()
        .map(|s| {
            (
                s.id,
                StudentContact {
                    full_name: s.full_name.clone(),
                    phone: s.phone.clone(),
                },
            )
        })
        .collect()
}

fn contact_for(contacts: &HashMap<i64, StudentContact>, student_id: i64) -> StudentContact {
    contacts
        .get(&student_id)
        .cloned()
        .unwrap_or_else(StudentContact::unknown)
}

/// An active enrollment near or past its end date whose student still owes money.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueSoon {
    /// The enrollment
    pub enrollment: enrollment::Model,
    /// Who to call
    pub contact: StudentContact,
    /// The student's outstanding balance across all enrollments
    pub remaining: f64,
    /// Days until `end_date`; negative once it has passed
    pub days_left: i64,
}

/// A discount row with the student it was granted to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountRow {
    /// The ledger row
    pub transaction: transaction::Model,
    /// Who received it
    pub contact: StudentContact,
}

/// Headline numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    /// Every student on record
    pub total_students: u64,
    /// Students with status `active`
    pub active_students: u64,
    /// Lessons recorded for today, any status
    pub todays_lessons: u64,
    /// Payments received since the first of the month
    pub monthly_revenue: f64,
}

/// Full dashboard as shown after a refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Headline numbers
    pub stats: DashboardStats,
    /// All-time revenue by course
    pub revenue: RevenueByCourse,
    /// Revenue since the first of the month, by course
    pub monthly: RevenueByCourse,
    /// Enrollments needing a reminder
    pub due_soon: Vec<DueSoon>,
    /// Every discount granted, newest first
    pub discounts: Vec<DiscountRow>,
}

fn is_revenue(transaction: &transaction::Model, rule: DiscountRule) -> bool {
    transaction.status == TransactionStatus::Completed && !rule.is_discount(transaction)
}

/// Attributes completed payments to car or motorcycle.
///
/// A student holding one license type gets all their payments attributed to it;
/// a student holding both has each payment split evenly.
#[must_use]
pub fn attribute_revenue(
    enrollments: &[enrollment::Model],
    transactions: &[transaction::Model],
    rule: DiscountRule,
) -> RevenueByCourse {
    let mut held: HashMap<i64, HashSet<LicenseType>> = HashMap::new();
    for e in enrollments {
        held.entry(e.student_id).or_default().insert(e.license_type);
    }

    let mut revenue = RevenueByCourse::default();
    for t in transactions.iter().filter(|t| is_revenue(t, rule)) {
        let Some(types) = held.get(&t.student_id) else {
            revenue.unattributed += t.amount;
            continue;
        };
        match (types.contains(&LicenseType::Car), types.contains(&LicenseType::Bike)) {
            (true, true) => {
                revenue.car += t.amount / 2.0;
                revenue.motorcycle += t.amount / 2.0;
            }
            (true, false) => revenue.car += t.amount,
            (false, true) => revenue.motorcycle += t.amount,
            (false, false) => revenue.unattributed += t.amount,
        }
    }
    revenue
}

/// Start of the calendar month containing `now`, in `now`'s own time zone.
#[must_use]
pub fn month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let first = now
        .date_naive()
        .with_day(1)
        .unwrap_or_else(|| now.date_naive())
        .and_time(NaiveTime::MIN);

    now.timezone()
        .from_local_datetime(&first)
        .earliest()
        .map_or_else(|| first.and_utc(), |start| start.with_timezone(&Utc))
}

/// Revenue by course for transactions dated on or after `since`.
#[must_use]
pub fn monthly_revenue(
    enrollments: &[enrollment::Model],
    transactions: &[transaction::Model],
    rule: DiscountRule,
    since: DateTime<Utc>,
) -> RevenueByCourse {
    let recent: Vec<transaction::Model> = transactions
        .iter()
        .filter(|t| t.transaction_date >= since)
        .cloned()
        .collect();
    attribute_revenue(enrollments, &recent, rule)
}

/// Active enrollments ending within `window_days` of `today` (or already ended)
/// whose student has a positive remaining balance, soonest first.
///
/// One row per enrollment; a student with two qualifying enrollments appears twice.
#[must_use]
pub fn due_soon(
    enrollments: &[enrollment::Model],
    balances: &HashMap<i64, StudentBalance>,
    contacts: &HashMap<i64, StudentContact>,
    today: NaiveDate,
    window_days: u32,
) -> Vec<DueSoon> {
    let cutoff = today
        .checked_add_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MAX);

    let mut rows: Vec<DueSoon> = enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Active && e.end_date <= cutoff)
        .filter_map(|e| {
            let balance = balances.get(&e.student_id)?;
            balance.has_outstanding().then(|| DueSoon {
                enrollment: e.clone(),
                contact: contact_for(contacts, e.student_id),
                remaining: balance.remaining(),
                days_left: (e.end_date - today).num_days(),
            })
        })
        .collect();

    rows.sort_by_key(|row| (row.enrollment.end_date, row.enrollment.id));
    rows
}

/// Every discount row joined with its student, in input order.
#[must_use]
pub fn discount_list(
    transactions: &[transaction::Model],
    contacts: &HashMap<i64, StudentContact>,
    rule: DiscountRule,
) -> Vec<DiscountRow> {
    transactions
        .iter()
        .filter(|t| rule.is_discount(t))
        .map(|t| DiscountRow {
            transaction: t.clone(),
            contact: contact_for(contacts, t.student_id),
        })
        .collect()
}

/// An active student still being taught or still owing money.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveStudent {
    /// Student id
    pub student_id: i64,
    /// Name and phone
    pub contact: StudentContact,
    /// Outstanding balance across all enrollments, never negative
    pub remaining: f64,
    /// Enrollments that keep the student on the list
    pub enrollments: Vec<enrollment::Model>,
}

impl ActiveStudent {
    fn holds(&self, license_type: LicenseType) -> bool {
        self.enrollments
            .iter()
            .any(|e| e.license_type == license_type)
    }
}

/// Active students split by license type, alphabetical by name.
///
/// A student enrolled for both types appears in both columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActiveStudentList {
    /// Students with a car enrollment
    pub car: Vec<ActiveStudent>,
    /// Students with a motorcycle enrollment
    pub motorcycle: Vec<ActiveStudent>,
    /// Distinct students listed
    pub total: usize,
}

/// Lists active students with an enrollment that has not ended yet, or with any
/// enrollment at all while money is still owed.
#[must_use]
pub fn active_students(
    students: &[student::Model],
    enrollments: &[enrollment::Model],
    transactions: &[transaction::Model],
    rule: DiscountRule,
    today: NaiveDate,
) -> ActiveStudentList {
    let balances = balances_by_student(enrollments, transactions, rule);

    let mut listed: Vec<ActiveStudent> = students
        .iter()
        .filter(|s| s.status == StudentStatus::Active)
        .filter_map(|s| {
            let remaining = balances.get(&s.id).map_or(0.0, StudentBalance::remaining);
            let kept: Vec<enrollment::Model> = enrollments
                .iter()
                .filter(|e| e.student_id == s.id && (e.end_date > today || remaining > 0.0))
                .cloned()
                .collect();
            (!kept.is_empty()).then(|| ActiveStudent {
                student_id: s.id,
                contact: StudentContact {
                    full_name: s.full_name.clone(),
                    phone: s.phone.clone(),
                },
                remaining,
                enrollments: kept,
            })
        })
        .collect();
    listed.sort_by(|a, b| {
        a.contact
            .full_name
            .cmp(&b.contact.full_name)
            .then(a.student_id.cmp(&b.student_id))
    });

    ActiveStudentList {
        car: listed
            .iter()
            .filter(|s| s.holds(LicenseType::Car))
            .cloned()
            .collect(),
        motorcycle: listed
            .iter()
            .filter(|s| s.holds(LicenseType::Bike))
            .cloned()
            .collect(),
        total: listed.len(),
    }
}

/// Which courses a ledger row's student is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LedgerCourse {
    /// Car only
    Car,
    /// Motorcycle only
    Motorcycle,
    /// Both license types
    Both,
    /// No enrollment on record
    Unknown,
}

impl LedgerCourse {
    /// Column label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Motorcycle => "Motorcycle",
            Self::Both => "Car & Motorcycle",
            Self::Unknown => "Unknown",
        }
    }
}

/// A ledger row with its student and course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    /// The ledger row
    pub transaction: transaction::Model,
    /// Who paid
    pub contact: StudentContact,
    /// Courses the student is enrolled in
    pub course: LedgerCourse,
}

/// Joins every ledger row with its student and course, in input order.
#[must_use]
pub fn ledger_entries(
    transactions: &[transaction::Model],
    enrollments: &[enrollment::Model],
    contacts: &HashMap<i64, StudentContact>,
) -> Vec<LedgerEntry> {
    let mut held: HashMap<i64, HashSet<LicenseType>> = HashMap::new();
    for e in enrollments {
        held.entry(e.student_id).or_default().insert(e.license_type);
    }

    transactions
        .iter()
        .map(|t| {
            let types = held.get(&t.student_id);
            let has = |license_type: LicenseType| types.is_some_and(|set| set.contains(&license_type));
            let course = match (has(LicenseType::Car), has(LicenseType::Bike)) {
                (true, true) => LedgerCourse::Both,
                (true, false) => LedgerCourse::Car,
                (false, true) => LedgerCourse::Motorcycle,
                (false, false) => LedgerCourse::Unknown,
            };
            LedgerEntry {
                transaction: t.clone(),
                contact: contact_for(contacts, t.student_id),
                course,
            }
        })
        .collect()
}

/// Builds the dashboard from already-fetched collections.
#[must_use]
pub fn build_dashboard<Tz: TimeZone>(
    students: &[student::Model],
    enrollments: &[enrollment::Model],
    transactions: &[transaction::Model],
    todays_lessons: u64,
    config: &AppConfig,
    now: &DateTime<Tz>,
) -> Dashboard {
    let rule = config.billing.discount_rule;
    let contacts = contacts_by_id(students);
    let balances = balances_by_student(enrollments, transactions, rule);
    let monthly = monthly_revenue(enrollments, transactions, rule, month_start(now));

    let stats = DashboardStats {
        total_students: students.len() as u64,
        active_students: students
            .iter()
            .filter(|s| s.status == StudentStatus::Active)
            .count() as u64,
        todays_lessons,
        monthly_revenue: monthly.total(),
    };

    Dashboard {
        stats,
        revenue: attribute_revenue(enrollments, transactions, rule),
        monthly,
        due_soon: due_soon(
            enrollments,
            &balances,
            &contacts,
            now.date_naive(),
            config.billing.due_soon_window_days,
        ),
        discounts: discount_list(transactions, &contacts, rule),
    }
}

/// Fetches students, enrollments, transactions and today's lessons concurrently
/// and builds the dashboard.
pub async fn load_dashboard<Tz: TimeZone>(
    db: &DatabaseConnection,
    config: &AppConfig,
    now: &DateTime<Tz>,
) -> Result<Dashboard> {
    let (students, enrollments, transactions, todays_lessons) = tokio::try_join!(
        get_all_students(db),
        get_all_enrollments(db),
        get_all_transactions(db),
        count_lessons_on(db, now.date_naive()),
    )?;

    debug!(
        "Dashboard load: {} students, {} enrollments, {} transactions",
        students.len(),
        enrollments.len(),
        transactions.len()
    );

    Ok(build_dashboard(
        &students,
        &enrollments,
        &transactions,
        todays_lessons,
        config,
        now,
    ))
}

/// Fetches what [`active_students`] needs and builds the list.
pub async fn load_active_students(
    db: &DatabaseConnection,
    rule: DiscountRule,
    today: NaiveDate,
) -> Result<ActiveStudentList> {
    let (students, enrollments, transactions) = tokio::try_join!(
        get_all_students(db),
        get_all_enrollments(db),
        get_all_transactions(db),
    )?;
    Ok(active_students(
        &students,
        &enrollments,
        &transactions,
        rule,
        today,
    ))
}

/// The full ledger, newest first, joined with students and courses.
pub async fn load_ledger(db: &DatabaseConnection) -> Result<Vec<LedgerEntry>> {
    let (students, enrollments, transactions) = tokio::try_join!(
        get_all_students(db),
        get_all_enrollments(db),
        get_all_transactions(db),
    )?;
    Ok(ledger_entries(
        &transactions,
        &enrollments,
        &contacts_by_id(&students),
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, clippy::unwrap_used)]
    use super::*;
    use crate::core::types::PaymentType;
    use crate::test_utils::*;

    fn ending(mut e: enrollment::Model, end_date: NaiveDate) -> enrollment::Model {
        e.end_date = end_date;
        e
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_car_only_student_gets_full_attribution() {
        let enrollments = vec![enrollment_fixture(1, 1, LicenseType::Car, 5000.0)];
        let transactions = vec![payment_fixture(1, 1, 1000.0)];

        let revenue = attribute_revenue(&enrollments, &transactions, DiscountRule::Tagged);
        assert_eq!(revenue.car, 1000.0);
        assert_eq!(revenue.motorcycle, 0.0);
    }

    #[test]
    fn test_student_with_both_types_splits_evenly() {
        let enrollments = vec![
            enrollment_fixture(1, 1, LicenseType::Car, 5000.0),
            enrollment_fixture(2, 1, LicenseType::Bike, 3000.0),
        ];
        let transactions = vec![payment_fixture(1, 1, 1000.0)];

        let revenue = attribute_revenue(&enrollments, &transactions, DiscountRule::Tagged);
        assert_eq!(revenue.car, 500.0);
        assert_eq!(revenue.motorcycle, 500.0);
        assert_eq!(revenue.total(), 1000.0);
    }

    #[test]
    fn test_discounts_and_pending_rows_are_not_revenue() {
        let enrollments = vec![enrollment_fixture(1, 1, LicenseType::Bike, 5000.0)];
        let mut pending = payment_fixture(2, 1, 700.0);
        pending.status = TransactionStatus::Pending;
        let transactions = vec![
            payment_fixture(1, 1, 300.0),
            pending,
            discount_fixture(3, 1, 200.0),
            payment_fixture(4, 9, 50.0),
        ];

        let revenue = attribute_revenue(&enrollments, &transactions, DiscountRule::Tagged);
        assert_eq!(revenue.motorcycle, 300.0);
        assert_eq!(revenue.car, 0.0);
        assert_eq!(revenue.unattributed, 50.0);
    }

    #[test]
    fn test_month_start_and_monthly_filter() {
        let now: DateTime<Utc> = "2024-05-18T15:30:00Z".parse().unwrap();
        let start = month_start(&now);
        assert_eq!(start, "2024-05-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap());

        let enrollments = vec![enrollment_fixture(1, 1, LicenseType::Car, 5000.0)];
        let mut april = payment_fixture(1, 1, 400.0);
        april.transaction_date = "2024-04-30T23:59:00Z".parse().unwrap();
        let mut may = payment_fixture(2, 1, 600.0);
        may.transaction_date = "2024-05-01T00:00:00Z".parse().unwrap();

        let monthly = monthly_revenue(&enrollments, &[april, may], DiscountRule::Tagged, start);
        assert_eq!(monthly.car, 600.0);
    }

    #[test]
    fn test_due_soon_window_and_balance_filter() {
        let today = day(2024, 5, 10);
        let enrollments = vec![
            // Student 1 owes; ends in 1 day
            ending(enrollment_fixture(1, 1, LicenseType::Car, 1000.0), day(2024, 5, 11)),
            // Student 1 owes; ends in 5 days
            ending(enrollment_fixture(2, 1, LicenseType::Bike, 500.0), day(2024, 5, 15)),
            // Student 2 is fully paid; ends in 1 day
            ending(enrollment_fixture(3, 2, LicenseType::Car, 800.0), day(2024, 5, 11)),
            // Student 3 owes; already ended
            ending(enrollment_fixture(4, 3, LicenseType::Car, 900.0), day(2024, 5, 7)),
        ];
        let mut cancelled = ending(enrollment_fixture(5, 3, LicenseType::Bike, 100.0), today);
        cancelled.status = EnrollmentStatus::Cancelled;
        let mut all = enrollments;
        all.push(cancelled);

        let transactions = vec![
            payment_fixture(1, 1, 200.0),
            payment_fixture(2, 2, 600.0),
            discount_fixture(3, 2, 200.0),
        ];
        let balances = balances_by_student(&all, &transactions, DiscountRule::Tagged);
        assert_eq!(balances[&2].remaining(), 0.0);

        let rows = due_soon(&all, &balances, &HashMap::new(), today, 2);
        let ids: Vec<i64> = rows.iter().map(|r| r.enrollment.id).collect();
        assert_eq!(ids, vec![4, 1]);
        assert_eq!(rows[0].days_left, -3);
        assert_eq!(rows[1].days_left, 1);
        assert_eq!(rows[1].remaining, 1300.0);
        assert_eq!(rows[1].contact.full_name, "Unknown");
    }

    #[test]
    fn test_due_soon_lists_each_enrollment() {
        let today = day(2024, 5, 10);
        let enrollments = vec![
            ending(enrollment_fixture(1, 1, LicenseType::Car, 1000.0), today),
            ending(enrollment_fixture(2, 1, LicenseType::Bike, 500.0), day(2024, 5, 12)),
        ];
        let balances = balances_by_student(&enrollments, &[], DiscountRule::Tagged);

        let rows = due_soon(&enrollments, &balances, &HashMap::new(), today, 2);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.enrollment.student_id == 1));
    }

    #[tokio::test]
    async fn test_load_dashboard() -> Result<()> {
        let db = setup_test_db().await?;
        let asha = create_test_student(&db, "Asha Rai").await?;
        let bikram = create_test_student(&db, "Bikram Thapa").await?;
        crate::core::student::update_student_status(&db, bikram.id, StudentStatus::Completed)
            .await?;

        insert_enrollment(&db, asha.id, LicenseType::Car, 3000.0).await?;
        insert_enrollment(&db, asha.id, LicenseType::Bike, 1800.0).await?;
        insert_enrollment(&db, bikram.id, LicenseType::Car, 1000.0).await?;

        insert_transaction(&db, asha.id, 1000.0, PaymentType::Tuition).await?;
        insert_transaction(&db, asha.id, 300.0, PaymentType::Discount).await?;
        insert_transaction(&db, bikram.id, 1000.0, PaymentType::Tuition).await?;
        let old = insert_transaction(&db, bikram.id, 999.0, PaymentType::Tuition).await?;
        set_transaction_date(&db, old.id, "2020-01-15T10:00:00Z".parse().unwrap()).await?;

        let now = Utc::now();
        crate::core::attendance::check_in(
            &db,
            &crate::core::attendance::CheckInRequest {
                student_id: asha.id,
                lesson_type: LicenseType::Car,
                lesson_date: now.date_naive(),
                lesson_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                duration_hours: 1.0,
            },
            crate::core::attendance::DuplicateCheckIn::Reject,
        )
        .await?;

        let dashboard = load_dashboard(&db, &AppConfig::default(), &now).await?;

        assert_eq!(dashboard.stats.total_students, 2);
        assert_eq!(dashboard.stats.active_students, 1);
        assert_eq!(dashboard.stats.todays_lessons, 1);
        assert_eq!(dashboard.stats.monthly_revenue, 2000.0);

        assert_eq!(dashboard.revenue.car, 500.0 + 1000.0 + 999.0);
        assert_eq!(dashboard.revenue.motorcycle, 500.0);
        assert_eq!(dashboard.monthly.car, 1500.0);

        assert_eq!(dashboard.discounts.len(), 1);
        assert_eq!(dashboard.discounts[0].contact.full_name, "Asha Rai");
        assert_eq!(dashboard.discounts[0].transaction.amount, 300.0);

        // Fixture enrollments start today on a 7-day plan
        assert!(dashboard.due_soon.is_empty());
        Ok(())
    }

    fn student_fixture(id: i64, full_name: &str, status: StudentStatus) -> student::Model {
        student::Model {
            id,
            full_name: full_name.to_string(),
            phone: format!("98000000{id:02}"),
            email: None,
            status,
            enrollment_date: day(2024, 5, 1),
            created_at: "2024-05-01T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_active_students_by_schedule_or_balance() {
        let today = day(2024, 5, 10);
        let students = vec![
            student_fixture(1, "Sita", StudentStatus::Active),
            student_fixture(2, "Asha", StudentStatus::Active),
            student_fixture(3, "Bikram", StudentStatus::Active),
            student_fixture(4, "Dropped", StudentStatus::Dropped),
            student_fixture(5, "No Enrollment", StudentStatus::Active),
        ];
        let enrollments = vec![
            // Sita: paid up, car still running, bike finished
            ending(enrollment_fixture(1, 1, LicenseType::Car, 1000.0), day(2024, 5, 12)),
            ending(enrollment_fixture(2, 1, LicenseType::Bike, 500.0), day(2024, 5, 8)),
            // Asha: ended, still owes
            ending(enrollment_fixture(3, 2, LicenseType::Bike, 800.0), day(2024, 5, 1)),
            // Bikram: ended and paid up
            ending(enrollment_fixture(4, 3, LicenseType::Car, 700.0), today),
            // Dropped student owes
            ending(enrollment_fixture(5, 4, LicenseType::Car, 900.0), day(2024, 5, 20)),
        ];
        let transactions = vec![
            payment_fixture(1, 1, 1500.0),
            payment_fixture(2, 2, 300.0),
            payment_fixture(3, 3, 500.0),
            discount_fixture(4, 3, 200.0),
        ];

        let list = active_students(
            &students,
            &enrollments,
            &transactions,
            DiscountRule::Tagged,
            today,
        );

        assert_eq!(list.total, 2);
        let car: Vec<&str> = list.car.iter().map(|s| s.contact.full_name.as_str()).collect();
        let bike: Vec<&str> = list
            .motorcycle
            .iter()
            .map(|s| s.contact.full_name.as_str())
            .collect();
        assert_eq!(car, vec!["Sita"]);
        assert_eq!(bike, vec!["Asha"]);

        assert_eq!(list.car[0].remaining, 0.0);
        assert_eq!(list.car[0].enrollments.len(), 1);
        assert_eq!(list.motorcycle[0].remaining, 500.0);
    }

    #[test]
    fn test_student_owing_on_both_types_is_in_both_columns() {
        let today = day(2024, 5, 10);
        let students = vec![student_fixture(1, "Asha", StudentStatus::Active)];
        let enrollments = vec![
            ending(enrollment_fixture(1, 1, LicenseType::Car, 1000.0), day(2024, 5, 1)),
            ending(enrollment_fixture(2, 1, LicenseType::Bike, 500.0), day(2024, 5, 2)),
        ];

        let list = active_students(&students, &enrollments, &[], DiscountRule::Tagged, today);
        assert_eq!(list.total, 1);
        assert_eq!(list.car.len(), 1);
        assert_eq!(list.motorcycle.len(), 1);
        assert_eq!(list.car[0].remaining, 1500.0);
    }

    #[test]
    fn test_ledger_entries_carry_contact_and_course() {
        let students = vec![
            student_fixture(1, "Asha", StudentStatus::Active),
            student_fixture(2, "Bikram", StudentStatus::Active),
            student_fixture(3, "Sita", StudentStatus::Active),
        ];
        let enrollments = vec![
            enrollment_fixture(1, 1, LicenseType::Car, 1000.0),
            enrollment_fixture(2, 1, LicenseType::Car, 1000.0),
            enrollment_fixture(3, 2, LicenseType::Car, 1000.0),
            enrollment_fixture(4, 2, LicenseType::Bike, 500.0),
            enrollment_fixture(5, 3, LicenseType::Bike, 500.0),
        ];
        let transactions = vec![
            payment_fixture(10, 3, 100.0),
            discount_fixture(11, 2, 50.0),
            payment_fixture(12, 1, 200.0),
            payment_fixture(13, 9, 10.0),
        ];

        let entries = ledger_entries(&transactions, &enrollments, &contacts_by_id(&students));

        let ids: Vec<i64> = entries.iter().map(|e| e.transaction.id).collect();
        assert_eq!(ids, vec![10, 11, 12, 13]);

        let courses: Vec<&str> = entries.iter().map(|e| e.course.label()).collect();
        assert_eq!(
            courses,
            vec!["Motorcycle", "Car & Motorcycle", "Car", "Unknown"]
        );

        assert_eq!(entries[0].contact.full_name, "Sita");
        assert_eq!(entries[0].contact.phone, "9800000003");
        assert_eq!(entries[3].contact.full_name, "Unknown");
    }

    #[tokio::test]
    async fn test_load_ledger_and_active_students() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        insert_enrollment(&db, student.id, LicenseType::Car, 2000.0).await?;
        let first = insert_transaction(&db, student.id, 500.0, PaymentType::Tuition).await?;
        set_transaction_date(&db, first.id, "2024-01-01T09:00:00Z".parse().unwrap()).await?;
        let second = insert_transaction(&db, student.id, 100.0, PaymentType::Discount).await?;

        let ledger = load_ledger(&db).await?;
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].transaction.id, second.id);
        assert_eq!(ledger[0].course, LedgerCourse::Car);
        assert_eq!(ledger[0].contact.full_name, "Test Student");

        let list =
            load_active_students(&db, DiscountRule::Tagged, Utc::now().date_naive()).await?;
        assert_eq!(list.total, 1);
        assert_eq!(list.car[0].remaining, 1400.0);
        assert!(list.motorcycle.is_empty());
        Ok(())
    }
}
