//! Command types for the sitewarden protocol

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use warden_util::{Domain, WardenError};

use crate::{BlockDirective, Settings, API_VERSION};

/// Request wrapper with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    /// The command
    pub command: Command,
}

fn default_api_version() -> u32 {
    API_VERSION
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.result, ResponseResult::Ok(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<WardenError> for ErrorInfo {
    fn from(error: WardenError) -> Self {
        let code = match &error {
            WardenError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            WardenError::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            WardenError::StoreError(_) => ErrorCode::StoreError,
            WardenError::HostError(_) => ErrorCode::HostError,
            WardenError::Internal(_) => ErrorCode::InternalError,
        };
        Self::new(code, error.to_string())
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    UnsupportedVersion,
    StoreError,
    HostError,
    InternalError,
}

/// Commands sent by the extension UI or by a page's enforcement script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Flush the current session now (UI refresh)
    SaveSession,

    /// Today's domain -> seconds totals
    GetTodayData,

    /// Flip the global kill switch
    ToggleExtension { enabled: bool },

    /// Add a domain to the block list (if given) and sweep open pages
    SiteBlocked {
        #[serde(default)]
        domain: Option<Domain>,
    },

    /// Remove a domain from the block list and reload its pages
    SiteUnblocked {
        #[serde(default)]
        domain: Option<Domain>,
    },

    /// Set a domain's daily budget in minutes (0 means no limit)
    SetLimit { domain: Domain, minutes: u32 },

    /// Drop a domain's daily budget
    RemoveLimit { domain: Domain },

    /// Replace the user settings
    UpdateSettings { settings: Settings },

    /// Block list, budgets and settings, for the options page
    GetConfiguration,

    /// Initial-load check from a page's enforcement script
    CheckPage { url: String },

    /// Kill switch state and currently tracked domain
    GetStatus,
}

/// Response payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    Success,
    TodayData {
        data: BTreeMap<Domain, u64>,
    },
    PageStatus {
        block: Option<BlockDirective>,
    },
    Status {
        enabled: bool,
        tracking: Option<Domain>,
    },
    Configuration {
        blocked_sites: Vec<Domain>,
        limits: BTreeMap<Domain, u32>,
        settings: Settings,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_from_extension_json() {
        let req: Request = serde_json::from_str(
            r#"{"request_id": 9, "command": {"action": "toggleExtension", "enabled": false}}"#,
        )
        .unwrap();

        assert_eq!(req.request_id, 9);
        assert_eq!(req.api_version, API_VERSION);
        assert_eq!(req.command, Command::ToggleExtension { enabled: false });
    }

    #[test]
    fn site_unblocked_domain_is_optional() {
        let cmd: Command = serde_json::from_str(r#"{"action":"siteUnblocked"}"#).unwrap();
        assert_eq!(cmd, Command::SiteUnblocked { domain: None });

        let cmd: Command =
            serde_json::from_str(r#"{"action":"siteUnblocked","domain":"A.com"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::SiteUnblocked {
                domain: Some(Domain::new("a.com"))
            }
        );
    }

    #[test]
    fn configuration_commands_from_extension_json() {
        let cmd: Command =
            serde_json::from_str(r#"{"action":"siteBlocked","domain":"X.com"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::SiteBlocked {
                domain: Some(Domain::new("x.com"))
            }
        );

        let cmd: Command =
            serde_json::from_str(r#"{"action":"setLimit","domain":"video.example","minutes":30}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::SetLimit {
                domain: Domain::new("video.example"),
                minutes: 30,
            }
        );

        let cmd: Command = serde_json::from_str(
            r#"{"action":"updateSettings","settings":{"notifications":false,"warningThreshold":0.8}}"#,
        )
        .unwrap();
        let Command::UpdateSettings { settings } = cmd else {
            panic!("unexpected command");
        };
        assert!(!settings.notifications);
        assert!(settings.tracking_enabled);

        let cmd: Command = serde_json::from_str(r#"{"action":"removeLimit","domain":"a.com"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::RemoveLimit {
                domain: Domain::new("a.com")
            }
        );
    }

    #[test]
    fn response_serialization() {
        let mut data = BTreeMap::new();
        data.insert(Domain::new("a.com"), 120);
        let resp = Response::success(1, ResponsePayload::TodayData { data });

        let json = serde_json::to_string(&resp).unwrap();
        let parsed: Response = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.request_id, 1);
        assert!(parsed.is_ok());
    }

    #[test]
    fn error_info_from_warden_error() {
        let info: ErrorInfo = WardenError::invalid_request("missing domain").into();
        assert_eq!(info.code, ErrorCode::InvalidRequest);
        assert_eq!(info.message, "Invalid request: missing domain");

        let info: ErrorInfo = WardenError::UnsupportedVersion(7).into();
        assert_eq!(info.code, ErrorCode::UnsupportedVersion);
    }
}
