use serde::{Deserialize, Serialize};

/// Hidden study-page fields the progress endpoint expects alongside the
/// record id. Obtained by the discovery step; opaque to the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StudyParams {
    /// Library reference id of the course (`refId`).
    pub ref_id: String,
    pub student_id: String,
    /// Pass line in minutes as the platform reports it (`Mins`).
    pub pass_line: String,
    /// Study time already recorded (`StydyTime`, spelled as the server expects).
    pub study_time: String,
    pub session_id: String,
}

impl StudyParams {
    /// Query pairs for one submission, excluding the record id and seconds.
    pub fn query_pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("Mins", self.pass_line.as_str()),
            ("refId", self.ref_id.as_str()),
            ("StudentId", self.student_id.as_str()),
            ("StydyTime", self.study_time.as_str()),
            ("SessionId", self.session_id.as_str()),
        ]
    }
}
