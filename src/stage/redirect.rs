use crate::definition::RedirectConfig;

use super::errors::StageError;
use super::types::StageResult;

/// A redirect stage has nothing to validate; any well-formed response
/// acknowledges the redirect and ends the flow.
pub(super) fn validate(config: &RedirectConfig) -> Result<StageResult, StageError> {
    Ok(StageResult::Redirect(config.target.clone()))
}
