//! Upload request handling, independent of any HTTP server.
//!
//! A host framework turns its multipart body into a [`MergeRequest`] and
//! sends the returned [`MergeResponse`] back unchanged.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::MergeConfig;
use crate::error::XlmergeError;
use crate::merge::merge_workbooks;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One part of the repeated `files` field.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    /// Client-supplied file name, if any.
    pub name: Option<String>,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MergeRequest {
    pub files: Vec<UploadedFile>,
    /// Raw JSON text of the `config` field.
    pub config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MergeResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn error(status: u16, message: &str) -> Self {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            error: &'a str,
        }
        let body = serde_json::to_vec(&ErrorBody { error: message })
            .unwrap_or_else(|_| message.as_bytes().to_vec());
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }
}

/// Run one merge request to completion.
///
/// * no files: 400, the merge engine is not invoked
/// * unreadable config: 400 with the validation message
/// * any merge failure: 500 with a generic message
pub fn handle_merge_request(request: MergeRequest) -> MergeResponse {
    let MergeRequest { files, config } = request;
    if files.is_empty() {
        return MergeResponse::error(400, &XlmergeError::NoInput.to_string());
    }

    let config = match config.as_deref().map(str::trim) {
        None | Some("") => MergeConfig::default(),
        Some(json) => match MergeConfig::from_json(json) {
            Ok(config) => config,
            Err(err) => {
                log::debug!("rejecting merge request: {err}");
                return MergeResponse::error(400, &err.to_string());
            }
        },
    };

    for file in &files {
        if let Some(ct) = file.content_type.as_deref().filter(|ct| *ct != XLSX_CONTENT_TYPE) {
            log::debug!(
                "upload {:?} declared content type {ct}; parsing anyway",
                file.name.as_deref().unwrap_or("<unnamed>")
            );
        }
    }

    let sources: Vec<&[u8]> = files.iter().map(|f| f.bytes.as_slice()).collect();
    match merge_workbooks(&sources, &config) {
        Ok(bytes) => {
            let today = chrono::Local::now().date_naive();
            let first_name = files.first().and_then(|f| f.name.as_deref());
            let filename = download_name(first_name, today);
            MergeResponse {
                status: 200,
                headers: vec![
                    ("Content-Type".to_string(), XLSX_CONTENT_TYPE.to_string()),
                    (
                        "Content-Disposition".to_string(),
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                body: bytes,
            }
        }
        Err(err) => {
            log::error!("merge failed: {err}");
            MergeResponse::error(500, "failed to merge the uploaded workbooks")
        }
    }
}

/// `merged_<stem>.xlsx` from the first upload's name, or
/// `merged_<YYYYMMDD>.xlsx` when no usable name was supplied.
pub fn download_name(first_name: Option<&str>, today: NaiveDate) -> String {
    let stem = first_name
        .and_then(|name| Path::new(name).file_stem())
        .map(|stem| {
            stem.to_string_lossy()
                .chars()
                .filter(|c| !c.is_control() && !matches!(c, '"' | '\\' | '/'))
                .collect::<String>()
        })
        .filter(|stem| !stem.trim().is_empty());

    match stem {
        Some(stem) => format!("merged_{stem}.xlsx"),
        None => format!("merged_{}.xlsx", today.format("%Y%m%d")),
    }
}
