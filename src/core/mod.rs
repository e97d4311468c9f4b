pub mod chatbot;
pub mod countries;
pub mod export;
pub mod form;
pub mod render;
pub mod results;
pub mod retry;
pub mod summary;

pub use crate::domain::model::Record;
pub use crate::domain::ports::{ConfigProvider, TariffApi};
pub use crate::utils::error::Result;
