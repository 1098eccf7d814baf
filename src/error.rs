use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum FlowerError {
    #[error("a flower needs at least one stem")]
    NoStems,

    #[error("stem {index} has invalid growth parameters (target {target_length}, rate {growth_rate})")]
    InvalidStem {
        index: usize,
        target_length: f32,
        growth_rate: f32,
    },
}
