pub mod use_cases;

pub use use_cases::profile_columns::ProfileColumnsUseCase;
pub use use_cases::provision_plan::{ProvisionPlan, Step, StepAction};
pub use use_cases::provisioner::{Provisioner, RunSummary};
