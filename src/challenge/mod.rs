mod codec;
mod errors;
mod types;

pub use codec::{decode, encode};
pub use errors::DecodeError;
pub use types::{
    Challenge, ChallengePayload, DeviceChallenge, FieldError, FlowInfo, StageResponse,
};
