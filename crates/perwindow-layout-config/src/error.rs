use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(perwindow_layout::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(perwindow_layout::config::invalid))]
    Invalid { message: String },

    #[error("Missing value for option: {option}")]
    #[diagnostic(code(perwindow_layout::config::missing_value))]
    MissingValue { option: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
