pub(crate) mod processing;
pub(crate) mod scheduler;
