//! Key layout for the `jobs` partition: `job:{job_id}` -> JobSnapshot (JSON)

const JOB_PREFIX: &str = "job:";

pub fn encode_job_key(job_id: &str) -> Vec<u8> {
    format!("{JOB_PREFIX}{job_id}").into_bytes()
}

pub fn decode_job_key(key: &[u8]) -> Option<String> {
    std::str::from_utf8(key)
        .ok()?
        .strip_prefix(JOB_PREFIX)
        .map(String::from)
}
