#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Decode(String),

    #[error("Failed to write {0}")]
    Write(String),
}
