mod types;

pub use types::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
