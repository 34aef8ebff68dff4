use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializerError {
    /// The text is not valid JSON, or it does not fit the requested type.
    #[error("json format error: {0}")]
    Format(#[source] serde_json::Error),
    #[error("json io error: {0}")]
    Io(#[source] serde_json::Error),
}

impl SerializerError {
    pub fn is_format(&self) -> bool {
        matches!(self, SerializerError::Format(_))
    }
}

impl From<serde_json::Error> for SerializerError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            SerializerError::Io(e)
        } else {
            SerializerError::Format(e)
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConverterError {
    #[error(
        "Input timespan is not in an expected format : expected d.hh:mm:ss:FFF. Please retrieve this key as a string and parse manually."
    )]
    TimespanFormat,
    #[error("{type_name} cannot be read from a json {found}")]
    UnexpectedShape { type_name: &'static str, found: &'static str },
}
