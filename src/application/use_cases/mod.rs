pub mod profile_columns;
pub mod provision_plan;
pub mod provisioner;
