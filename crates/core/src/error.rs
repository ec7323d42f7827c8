use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::model::QuestionError;
use crate::timer::TimerError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Timer(#[from] TimerError),
}
