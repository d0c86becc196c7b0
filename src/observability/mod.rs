pub mod diagnostics;
pub mod tracing;

pub use diagnostics::{
    DiagnosticEvent, Diagnostics, Edge, Level, RecordingDiagnostics, TracingDiagnostics,
};
pub use self::tracing::init_tracing;
