//! HTTP implementation of [`SubmissionClient`](coursepace_core::SubmissionClient)
//! for the platform's `updateTime.ashx` progress endpoint.

pub mod classify;
pub mod http;
pub mod params;

pub use classify::{classify_response, classify_transport_error};
pub use http::HttpSubmissionClient;
pub use params::StudyParams;
