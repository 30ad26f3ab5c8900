//! Audio analysis, multi-effect processing and similarity scoring.
//!
//! The three engines share nothing but [`SampleBuffer`] and [`FeatureSet`]:
//!
//! - [`EffectChain`] applies [`EffectParameters`] to a buffer in a fixed order.
//! - [`FeatureExtractor`] reduces a buffer to a [`FeatureSet`].
//! - [`compare::compare`] scores two feature sets against the metric table.
//!
//! Every call is a pure computation over memory-resident buffers; decoding and
//! writing files live in [`audio::decode`] and [`audio::encode`].

pub mod analysis;
pub mod audio;
pub mod compare;
pub mod effects;
pub mod error;
pub mod keys;

pub use analysis::{AnalysisSettings, FeatureExtractor, FeatureSet, FeatureValue};
pub use audio::buffer::SampleBuffer;
pub use compare::{compare, ComparisonResult, MetricComparison, Status};
pub use effects::{EffectChain, EffectParameters, Stage};
pub use error::{Error, Result};
