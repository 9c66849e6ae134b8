//! Application context - shared state handed to whichever front end drives the school.
//!
//! Holds the database connection, the loaded settings, the pricing table and the
//! payment event channel, and wires them into the core workflows so callers do not
//! have to thread configuration through every call.

use crate::{
    config::{
        database::{connect, create_connection, create_tables},
        settings::AppConfig,
    },
    core::{
        attendance::{self, CheckInRequest},
        balance::{self, StudentBalance},
        dashboard::{self, ActiveStudentList, Dashboard, LedgerEntry},
        enrollment::{self, EnrollmentForm},
        payment::{self, PaymentEvents, PaymentOutcome, PaymentRecorded, PaymentRequest},
        pricing::{self, PricingTable},
        receipt::{self, ReceiptData},
        types::{Course, LicenseType, PaymentPlan, SessionTime},
    },
    entities::{attendance as attendance_entity, enrollment as enrollment_entity},
    errors::Result,
};
use chrono::Local;
use sea_orm::DatabaseConnection;
use tokio::sync::{RwLock, broadcast};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this more than
/// once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Shared state for all workflows.
#[derive(Debug)]
pub struct App {
    /// Database connection for all store operations
    pub database: DatabaseConnection,
    /// Loaded settings
    pub config: AppConfig,
    pricing: RwLock<PricingTable>,
    events: PaymentEvents,
}

impl App {
    /// Wraps an already-initialized connection and pricing table.
    #[must_use]
    pub fn new(database: DatabaseConnection, config: AppConfig, pricing: PricingTable) -> Self {
        Self {
            database,
            config,
            pricing: RwLock::new(pricing),
            events: PaymentEvents::default(),
        }
    }

    /// Connects to `DATABASE_URL` (or the default file), creates missing tables and
    /// loads the saved pricing table.
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        let database = create_connection().await?;
        Self::initialize(database, config).await
    }

    /// Like [`App::bootstrap`], against an explicit database URL.
    pub async fn bootstrap_with_url(database_url: &str, config: AppConfig) -> Result<Self> {
        let database = connect(database_url).await?;
        Self::initialize(database, config).await
    }

    async fn initialize(database: DatabaseConnection, config: AppConfig) -> Result<Self> {
        create_tables(&database).await?;
        let pricing = pricing::load_pricing(&database).await?;
        info!("{} ready", config.school.name);
        Ok(Self::new(database, config, pricing))
    }

    /// Copy of the current pricing table.
    pub async fn pricing(&self) -> PricingTable {
        self.pricing.read().await.clone()
    }

    /// Edits one price and saves the table.
    pub async fn set_price(
        &self,
        course: Course,
        session: SessionTime,
        plan: PaymentPlan,
        amount: u32,
    ) -> Result<()> {
        let mut table = self.pricing.write().await;
        pricing::update_price(&self.database, &mut table, course, session, plan, amount).await
    }

    /// Restores and saves the default prices.
    pub async fn reset_pricing(&self) -> Result<()> {
        let mut table = self.pricing.write().await;
        pricing::reset_pricing(&self.database, &mut table).await
    }

    /// Enrolls a student starting today at the current price.
    pub async fn enroll(
        &self,
        student_id: i64,
        form: &EnrollmentForm,
    ) -> Result<enrollment_entity::Model> {
        let table = self.pricing.read().await;
        enrollment::create_enrollment(&self.database, &table, student_id, form).await
    }

    /// Fresh balance for one student under the configured discount rule.
    pub async fn balance(&self, student_id: i64) -> Result<StudentBalance> {
        balance::get_student_balance(&self.database, student_id, self.config.billing.discount_rule)
            .await
    }

    /// Records a payment and publishes its event.
    pub async fn record_payment(&self, request: &PaymentRequest) -> Result<PaymentOutcome> {
        payment::record_payment(
            &self.database,
            request,
            self.config.billing.discount_rule,
            Some(&self.events),
        )
        .await
    }

    /// Subscribes to payment events, e.g. for a receipt printer.
    #[must_use]
    pub fn subscribe_payments(&self) -> broadcast::Receiver<PaymentRecorded> {
        self.events.subscribe()
    }

    /// Builds the receipt for a recorded payment.
    pub async fn receipt(&self, event: &PaymentRecorded) -> Result<ReceiptData> {
        receipt::build_receipt(&self.database, event, &self.config.school).await
    }

    /// Quick check-in for today with the configured lesson length and duplicate policy.
    pub async fn check_in(
        &self,
        student_id: i64,
        lesson_type: LicenseType,
    ) -> Result<attendance_entity::Model> {
        let request = CheckInRequest::now(
            student_id,
            lesson_type,
            self.config.attendance.default_lesson_hours,
        );
        attendance::check_in(
            &self.database,
            &request,
            self.config.attendance.duplicate_check_in,
        )
        .await
    }

    /// Loads the dashboard as of now (local time).
    pub async fn dashboard(&self) -> Result<Dashboard> {
        dashboard::load_dashboard(&self.database, &self.config, &Local::now()).await
    }

    /// Active students still in training or owing money, as of today (local time).
    pub async fn active_students(&self) -> Result<ActiveStudentList> {
        dashboard::load_active_students(
            &self.database,
            self.config.billing.discount_rule,
            Local::now().date_naive(),
        )
        .await
    }

    /// The full ledger with student names and courses, newest first.
    pub async fn ledger(&self) -> Result<Vec<LedgerEntry>> {
        dashboard::load_ledger(&self.database).await
    }
}
