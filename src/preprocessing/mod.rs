//! Feature preprocessing
//!
//! Provides the pieces that turn a raw screening request into the numeric
//! feature vector a trained model expects:
//! - Label encoders for categorical columns and the target
//! - The encoder set persisted alongside each model
//! - The request codec with an explicit lenient/strict policy

mod codec;
mod encoder;

pub use codec::{EncodingPolicy, FeatureCodec, FeatureVector, RawStudentInput};
pub use encoder::{CategoryEncoder, EncoderSet};
