//! Entity module - SeaORM entity definitions for the school's tables.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attendance;
pub mod enrollment;
pub mod instructor;
pub mod local_setting;
pub mod student;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use attendance::{Column as AttendanceColumn, Entity as Attendance, Model as AttendanceModel};
pub use enrollment::{Column as EnrollmentColumn, Entity as Enrollment, Model as EnrollmentModel};
pub use instructor::{Column as InstructorColumn, Entity as Instructor, Model as InstructorModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use local_setting::{
    Column as LocalSettingColumn, Entity as LocalSetting, Model as LocalSettingModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
