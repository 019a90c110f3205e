pub mod forms;
pub mod installment;
pub mod supplier;
pub mod user;

pub use forms::{CancelForm, CreatePlanForm, EditForm, SettleForm};
pub use installment::{GroupId, Installment, InstallmentId, InstallmentStatus, SupplierId};
pub use supplier::Supplier;
