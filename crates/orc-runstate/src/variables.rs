// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effective-variable resolution for a run (§4.3).

use crate::repository::VariableSource;
use orc_core::{Id, RunVariable};
use orc_error::CoreError;

/// Resolve the effective variable set for a new run: namespace-inherited
/// variables, overridden by `run_supplied` on key collision.
pub async fn effective_variables(
    workspace_id: Id,
    run_supplied: &[RunVariable],
    variables: &dyn VariableSource,
) -> Result<Vec<RunVariable>, CoreError> {
    let inherited = variables.inherited_variables(workspace_id).await?;
    Ok(orc_core::variables::collate(&inherited, run_supplied))
}
