//! Report assembly: resolve cards for a request, generate each section in
//! order, and hand the finished document to the renderer.

mod error;
pub use error::ReportError;

pub mod chunks;
pub mod pipeline;
pub mod prompt;
pub mod reading;
pub mod service;
pub mod spec;

pub use chunks::{ChunkDescriptor, plan};
pub use pipeline::{Report, ReportAssemblyPipeline, ReportChunk, ReportState};
pub use reading::{ReportData, SubjectReading};
pub use service::{GeneratedReport, ReportService, ServiceConfig};
pub use spec::{ReportKind, ReportSpecification, Subject};
