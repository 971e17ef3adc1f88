pub(crate) mod job_queue;
pub(crate) mod storage;
