//! Domain error types.

/// Top-level error type for papertrade.
#[derive(Debug, thiserror::Error)]
pub enum PapertradeError {
    #[error("invalid price: {value}")]
    InvalidPrice { value: f64 },

    #[error("invalid quantity: {value}")]
    InvalidQuantity { value: f64 },

    #[error("invalid levels for {side} entry {entry}: stop-loss {stop_loss:?}, take-profit {take_profit:?}")]
    InvalidLevels {
        side: String,
        entry: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    },

    #[error("position already open for {symbol}")]
    DuplicatePosition { symbol: String },

    #[error("no such position: {id}")]
    UnknownPosition { id: String },

    #[error("no open position for {symbol}")]
    NoOpenPosition { symbol: String },

    #[error("no price available for {symbol}")]
    PriceUnavailable { symbol: String },

    #[error("tool {id} cannot {action} while {status}")]
    InvalidToolState {
        id: String,
        action: String,
        status: String,
    },

    #[error("tool {id} fails level validation and cannot be activated")]
    InvalidTool { id: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("store error: {reason}")]
    Store { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PapertradeError> for std::process::ExitCode {
    fn from(err: &PapertradeError) -> Self {
        let code: u8 = match err {
            PapertradeError::Io(_) => 1,
            PapertradeError::ConfigParse { .. } | PapertradeError::ConfigInvalid { .. } => 2,
            PapertradeError::Store { .. } => 3,
            PapertradeError::InvalidPrice { .. }
            | PapertradeError::InvalidQuantity { .. }
            | PapertradeError::InvalidLevels { .. }
            | PapertradeError::InvalidTool { .. } => 4,
            PapertradeError::DuplicatePosition { .. }
            | PapertradeError::UnknownPosition { .. }
            | PapertradeError::NoOpenPosition { .. }
            | PapertradeError::PriceUnavailable { .. }
            | PapertradeError::InvalidToolState { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
