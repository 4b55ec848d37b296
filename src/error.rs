use crate::inquiry::TransitionError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Validation Error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Geocoding Error: {0}")]
    Geocoding(String),

    #[error("Store Error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                MarketError::NotFound(format!("{}/{}", collection, id))
            }
            StoreError::VersionMismatch { .. } | StoreError::AlreadyExists { .. } => {
                MarketError::Conflict(err.to_string())
            }
            other => MarketError::Store(other),
        }
    }
}

impl MarketError {
    /// User-facing message shown by the UI
    pub fn localized(&self) -> String {
        match self {
            MarketError::Validation(errors) => {
                format!("입력값을 확인해주세요: {}", errors.join(", "))
            }
            MarketError::Unauthenticated => "로그인이 필요합니다.".to_string(),
            MarketError::Forbidden(_) => "권한이 없습니다.".to_string(),
            MarketError::NotFound(_) => "요청한 항목을 찾을 수 없습니다.".to_string(),
            MarketError::InvalidRequest(_) => "잘못된 요청입니다.".to_string(),
            MarketError::Transition(TransitionError::NotAllowed { .. }) => {
                "이 작업을 수행할 권한이 없습니다.".to_string()
            }
            MarketError::Transition(_) => "이미 종료된 문의입니다.".to_string(),
            MarketError::Conflict(_) => {
                "다른 사용자가 먼저 변경했습니다. 새로고침 후 다시 시도해주세요.".to_string()
            }
            MarketError::Geocoding(_) => "위치 정보를 가져오지 못했습니다.".to_string(),
            MarketError::Store(_) => {
                "일시적인 오류가 발생했습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
        }
    }
}

pub type Result<T, E = MarketError> = std::result::Result<T, E>;
