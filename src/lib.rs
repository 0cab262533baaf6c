//! # u-analysis
//!
//! Statistical analysis dispatch engine.
//!
//! Given a parsed tabular dataset and a request naming a method plus one or
//! two columns, the engine checks preconditions, runs the matching
//! statistical procedure and returns a uniformly shaped [`ResultRecord`],
//! optionally with a renderer-agnostic [`PlotDescriptor`]. It knows nothing
//! about uploads, sessions, templates or export formats.
//!
//! ## Modules
//!
//! - [`dataset`]: Immutable typed view over tabular input
//! - [`registry`]: Closed catalog of methods and their column requirements
//! - [`request`]: Method and column names as supplied by the caller
//! - [`validate`]: Precondition checks producing a missing-free sample
//! - [`dispatch`]: Per-method procedures, rounding and decisions
//! - [`plot`]: Plot descriptors (kind, series, labels, title)
//! - [`result`]: Result record, decisions, significance level
//! - [`engine`]: Facade chaining validation, dispatch and plotting
//! - [`config`]: Engine options
//! - [`error`]: Failure taxonomy
//! - [`hypothesis`]: Test procedures over plain `f64` samples
//! - [`distributions`]: Tail probabilities of t, F, χ², normal and signed-rank
//! - [`special`]: Log-gamma and regularized incomplete beta/gamma
//! - [`stats`]: Compensated sums, Welford variance, average ranks
//!
//! ## Example
//!
//! ```
//! use u_analysis::{AnalysisRequest, DatasetView, Decision, Engine};
//!
//! let ds = DatasetView::from_text_columns(vec![
//!     ("A", vec!["1", "1", "2", "2"]),
//!     ("B", vec!["1", "1", "2", "2"]),
//! ])
//! .unwrap();
//! let record = Engine::default()
//!     .analyze(&ds, &AnalysisRequest::pair("chi_square", "A", "B"))
//!     .unwrap();
//! assert_eq!(record.statistic(), Some(4.0));
//! assert_eq!(record.decision(), &Decision::RejectNull);
//! ```
//!
//! ## Design Philosophy
//!
//! - **Closed method set**: methods are an enum with one registry entry and
//!   one dispatch arm each
//! - **Explicit failures**: every failure is a typed [`AnalysisError`] with a
//!   kind and a message, never a default or partial result
//! - **Numerical stability**: Kahan summation and Welford variance underneath
//!   every procedure
//! - **Property-based testing**: invariants verified via proptest

pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod distributions;
pub mod engine;
pub mod error;
pub mod hypothesis;
pub mod plot;
pub mod registry;
pub mod request;
pub mod result;
pub mod special;
pub mod stats;
pub mod validate;

pub use config::{EngineConfig, GroupPolicy};
pub use dataset::{ColumnKind, DatasetView, Value};
pub use engine::Engine;
pub use error::{AnalysisError, ErrorKind, Result};
pub use plot::{PlotDescriptor, PlotKind, Series, SeriesMode};
pub use registry::Method;
pub use request::AnalysisRequest;
pub use result::{Decision, LinearFit, ResultRecord, ALPHA};
pub use validate::{validate, Prepared};
